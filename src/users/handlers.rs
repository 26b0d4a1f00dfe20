use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    repo_types::PublicUser,
    services::{create_user, remove_user, update_user},
};
use crate::{
    auth::extractors::AdminUser,
    error::AppResult,
    pagination::{PageQuery, PageRequest, PageResponse},
    response::{parse_id, ApiJson, DataResponse, MessageResponse},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create))
        .route("/users/:id", put(update).delete(delete))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn list_users(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<PageResponse<PublicUser>>> {
    let req = PageRequest::from(q);
    let page = state.users.list(req).await?.map(PublicUser::from);
    Ok(Json(PageResponse::new(req, page)))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.user_id))]
pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PublicUser>>)> {
    let input = payload.validate()?;
    let role = input.role.unwrap_or_default();
    let user = create_user(&state, input, role).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(user.into()))))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.user_id))]
pub async fn update(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<PublicUser>>> {
    let id = parse_id(&id, "User not found")?;
    let user = update_user(&state, id, payload.validate()?).await?;
    Ok(Json(DataResponse::new(user.into())))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, "User not found")?;
    remove_user(&state, id).await?;
    Ok(Json(MessageResponse::ok("User deleted")))
}
