use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::Environment;

pub const AUTH_COOKIE: &str = "auth_token";

pub fn session_cookie(token: String, env: Environment, max_age_days: i64) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(env.is_production())
        .max_age(time::Duration::days(max_age_days))
        .build()
}

/// Expired `auth_token`; path must match the one it was set with.
pub fn removal_cookie() -> Cookie<'static> {
    let mut c = Cookie::build((AUTH_COOKIE, "")).path("/").http_only(true).build();
    c.make_removal();
    c
}
