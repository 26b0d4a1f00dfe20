use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookie::{removal_cookie, session_cookie},
        dto::{AuthResponse, LoginRequest, UserResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::verify_password_blocking,
    },
    error::{AppError, AppResult},
    response::{ApiJson, MessageResponse},
    state::AppState,
    users::{
        dto::{normalize_email, CreateUserRequest},
        repo_types::{Role, User},
        services::{create_user, remove_user},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_me))
        .route("/auth/delete-account", delete(delete_account))
}

fn sign_in(state: &AppState, jar: CookieJar, user: &User) -> AppResult<(CookieJar, String)> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.issue(user)?;
    let cookie = session_cookie(
        token.clone(),
        state.config.environment,
        state.config.jwt.ttl_days,
    );
    Ok((jar.add(cookie), token))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let input = payload.validate()?;

    let role = match input.role {
        Some(Role::Admin) if state.config.allow_admin_signup => Role::Admin,
        Some(Role::Admin) => {
            warn!(email = %input.email, "self-registration as admin ignored");
            Role::User
        }
        _ => Role::User,
    };

    let user = create_user(&state, input, role).await?;
    let (jar, token) = sign_in(&state, jar, &user)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully".into(),
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let (Some(email), Some(password)) = (
        payload.email.map(|e| normalize_email(&e)).filter(|e| !e.is_empty()),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation("Please provide email and password"));
    };

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Authentication(INVALID_CREDENTIALS.into()));
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::Authentication(INVALID_CREDENTIALS.into()));
    }

    let (jar, token) = sign_in(&state, jar, &user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            message: "Login successful".into(),
            token,
            user: user.into(),
        }),
    ))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(removal_cookie()),
        Json(MessageResponse::ok("Logged out successfully")),
    )
}

#[instrument(skip(state, auth), fields(user_id = %auth.0.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .users
        .find_by_id(auth.0.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserResponse {
        success: true,
        message: None,
        user: user.into(),
    }))
}

#[instrument(skip(state, auth, jar), fields(user_id = %auth.0.user_id))]
pub async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    remove_user(&state, auth.0.user_id).await?;
    Ok((
        jar.add(removal_cookie()),
        Json(MessageResponse::ok("Account deleted successfully")),
    ))
}
