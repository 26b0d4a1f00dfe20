use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{new_product, product_changes, IMAGE_FIELD},
    repo_types::Product,
    services::{create_product, delete_product, update_product},
};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::{AppError, AppResult},
    pagination::{PageQuery, PageRequest, PageResponse},
    response::{parse_id, DataResponse, MessageResponse},
    state::AppState,
    upload::MultipartForm,
};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create))
        .route(
            "/products/:id",
            get(get_product).put(update).delete(delete),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[instrument(skip(state, _auth))]
pub async fn list_products(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<PageResponse<Product>>> {
    let req = PageRequest::from(q);
    let page = state.products.list(req).await?;
    Ok(Json(PageResponse::new(req, page)))
}

#[instrument(skip(state, _auth))]
pub async fn get_product(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Product>>> {
    let id = parse_id(&id, "Product not found")?;
    let product = state
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    Ok(Json(DataResponse::new(product)))
}

#[instrument(skip(state, admin, mp), fields(admin_id = %admin.0.user_id))]
pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    mp: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Product>>)> {
    let form = MultipartForm::read(mp, IMAGE_FIELD).await?;
    let input = new_product(&form)?;
    let product = create_product(&state, input, form.file).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(product, "Product created successfully")),
    ))
}

#[instrument(skip(state, admin, mp), fields(admin_id = %admin.0.user_id))]
pub async fn update(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    mp: Multipart,
) -> AppResult<Json<DataResponse<Product>>> {
    let id = parse_id(&id, "Product not found")?;
    let form = MultipartForm::read(mp, IMAGE_FIELD).await?;
    let changes = product_changes(&form)?;
    let product = update_product(&state, id, changes, form.file).await?;
    Ok(Json(DataResponse::with_message(product, "Product updated successfully")))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, "Product not found")?;
    delete_product(&state, id).await?;
    Ok(Json(MessageResponse::ok("Product deleted successfully")))
}
