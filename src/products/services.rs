use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::{NewProduct, Product, ProductChanges};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    storage::UploadedFile,
};

pub const PRODUCT_FOLDER: &str = "products";

pub async fn create_product(
    st: &AppState,
    input: NewProduct,
    image: Option<UploadedFile>,
) -> AppResult<Product> {
    let stored = match image {
        Some(file) => Some(
            st.storage
                .put_object(PRODUCT_FOLDER, file)
                .await
                .map_err(AppError::Storage)?,
        ),
        None => None,
    };

    let product = st.products.create(input, stored).await?;
    info!(product_id = %product.id, has_image = product.image_key.is_some(), "product created");
    Ok(product)
}

/// Applies a partial update. A new image supersedes the old one: the old
/// object is removed first (best effort), then the new one is uploaded.
pub async fn update_product(
    st: &AppState,
    id: Uuid,
    changes: ProductChanges,
    image: Option<UploadedFile>,
) -> AppResult<Product> {
    let existing = st
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let stored = match image {
        Some(file) => {
            if let Some(old_key) = existing.image_key.as_deref() {
                if let Err(e) = st.storage.delete_object(old_key).await {
                    warn!(error = %e, product_id = %id, key = old_key, "failed to delete superseded product image");
                }
            }
            Some(
                st.storage
                    .put_object(PRODUCT_FOLDER, file)
                    .await
                    .map_err(AppError::Storage)?,
            )
        }
        None => None,
    };

    let product = st
        .products
        .update(id, changes, stored)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    info!(product_id = %product.id, "product updated");
    Ok(product)
}

/// Removes the stored image, then the record. A storage failure aborts
/// before anything is deleted from the catalog.
pub async fn delete_product(st: &AppState, id: Uuid) -> AppResult<()> {
    let existing = st
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    if let Some(key) = existing.image_key.as_deref() {
        st.storage
            .delete_object(key)
            .await
            .map_err(AppError::Storage)?;
    }

    st.products
        .delete(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    info!(product_id = %id, "product deleted");
    Ok(())
}
