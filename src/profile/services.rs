use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    storage::UploadedFile,
    users::repo_types::User,
};

pub const PROFILE_FOLDER: &str = "profile-pictures";

/// Replaces the caller's picture. Losing the old object is only logged; a
/// failed upload of the new one fails the request.
pub async fn upload_profile_picture(
    st: &AppState,
    user_id: Uuid,
    file: UploadedFile,
) -> AppResult<User> {
    let user = st
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if let Some(old_key) = user.profile_picture_key.as_deref().filter(|k| !k.is_empty()) {
        if let Err(e) = st.storage.delete_object(old_key).await {
            error!(error = %e, %user_id, key = old_key, "error deleting old profile picture");
        }
    }

    let stored = st
        .storage
        .put_object(PROFILE_FOLDER, file)
        .await
        .map_err(AppError::Storage)?;

    let user = st
        .users
        .set_profile_picture(user_id, Some(stored))
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!(%user_id, "profile picture uploaded");
    Ok(user)
}

pub async fn delete_profile_picture(st: &AppState, user_id: Uuid) -> AppResult<User> {
    let user = st
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if let Some(key) = user.profile_picture_key.as_deref().filter(|k| !k.is_empty()) {
        st.storage
            .delete_object(key)
            .await
            .map_err(AppError::Storage)?;
    }

    let user = st
        .users
        .set_profile_picture(user_id, None)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!(%user_id, "profile picture deleted");
    Ok(user)
}
