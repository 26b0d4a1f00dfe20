use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{delete, post},
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use super::services::{delete_profile_picture, upload_profile_picture};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    products::handlers::MAX_UPLOAD_BYTES,
    state::AppState,
    upload::MultipartForm,
    users::repo_types::PublicUser,
};

pub const PICTURE_FIELD: &str = "profilePicture";

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile/upload", post(upload))
        .route("/profile/picture", delete(remove))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[instrument(skip(state, auth, mp), fields(user_id = %auth.0.user_id))]
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    mp: Multipart,
) -> AppResult<Json<ProfileResponse>> {
    let form = MultipartForm::read(mp, PICTURE_FIELD).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::validation("No file uploaded"))?;

    let user = upload_profile_picture(&state, auth.0.user_id, file).await?;
    Ok(Json(ProfileResponse {
        success: true,
        message: "Profile picture uploaded successfully".into(),
        user: user.into(),
    }))
}

#[instrument(skip(state, auth), fields(user_id = %auth.0.user_id))]
pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    let user = delete_profile_picture(&state, auth.0.user_id).await?;
    Ok(Json(ProfileResponse {
        success: true,
        message: "Profile picture deleted successfully".into(),
        user: user.into(),
    }))
}
