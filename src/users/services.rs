use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{ValidUser, ValidUserUpdate},
    repo::DUPLICATE_EMAIL_MESSAGE,
    repo_types::{NewUser, Role, User, UserChanges},
};
use crate::{
    auth::password::hash_password_blocking,
    error::{AppError, AppResult},
    state::AppState,
};

/// Inserts a user with a freshly hashed password.
///
/// The lookup only gives a friendlier fast path; the store's unique
/// constraint is what actually guarantees one account per email.
pub async fn create_user(st: &AppState, input: ValidUser, role: Role) -> AppResult<User> {
    if st.users.find_by_email(&input.email).await?.is_some() {
        warn!(email = %input.email, "email already registered");
        return Err(AppError::DuplicateEmail(DUPLICATE_EMAIL_MESSAGE.into()));
    }

    let password_hash = hash_password_blocking(input.password).await?;
    let user = st
        .users
        .create(NewUser {
            email: input.email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            age: input.age,
            gender: input.gender,
            birth_date: input.birth_date,
            role,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "user created");
    Ok(user)
}

pub async fn update_user(st: &AppState, id: Uuid, input: ValidUserUpdate) -> AppResult<User> {
    let password_hash = match input.password {
        Some(plain) => Some(hash_password_blocking(plain).await?),
        None => None,
    };
    let changes = UserChanges {
        email: input.email,
        password_hash,
        first_name: input.first_name,
        last_name: input.last_name,
        phone: input.phone,
        age: input.age,
        gender: input.gender,
        birth_date: input.birth_date,
        role: input.role,
    };

    let user = st
        .users
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!(user_id = %user.id, "user updated");
    Ok(user)
}

/// Deletes the record, then makes a best-effort attempt to remove its
/// stored profile picture.
pub async fn remove_user(st: &AppState, id: Uuid) -> AppResult<User> {
    let user = st
        .users
        .delete(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if let Some(key) = user.profile_picture_key.as_deref().filter(|k| !k.is_empty()) {
        if let Err(e) = st.storage.delete_object(key).await {
            warn!(error = %e, user_id = %user.id, key, "failed to delete profile picture of removed user");
        }
    }

    info!(user_id = %user.id, email = %user.email, "user deleted");
    Ok(user)
}
