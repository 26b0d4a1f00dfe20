use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use super::dto::InquiryRequest;
use crate::{
    error::{AppError, AppResult},
    response::{ApiJson, MessageResponse},
    state::AppState,
};

pub fn inquiry_routes() -> Router<AppState> {
    Router::new().route("/inquiry", post(submit))
}

/// Validates the form, notifies the site owner, then sends the auto-reply.
#[instrument(skip(state, payload))]
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<InquiryRequest>,
) -> AppResult<Json<MessageResponse>> {
    let inquiry = payload.validate()?;
    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Inquiry email is not configured".into()))?;

    mailer
        .send(inquiry.admin_notification())
        .await
        .map_err(AppError::MailDelivery)?;
    mailer
        .send(inquiry.auto_reply())
        .await
        .map_err(AppError::MailDelivery)?;

    info!(email = %inquiry.email, subject = %inquiry.subject, "inquiry sent");
    Ok(Json(MessageResponse::ok(
        "Inquiry sent successfully! We'll get back to you soon.",
    )))
}
