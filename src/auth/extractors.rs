use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::{claims::Identity, cookie::AUTH_COOKIE, jwt::JwtKeys};
use crate::{
    error::AppError,
    users::repo_types::Role,
};

/// Finds the session token: `auth_token` cookie first, then `Authorization: Bearer`.
pub fn locate_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(c) = jar.get(AUTH_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(c.value().to_string());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Authorization gate for admin-only endpoints.
pub fn require_admin(identity: Option<&Identity>) -> Result<(), AppError> {
    let identity = identity
        .ok_or_else(|| AppError::Authentication("Authentication required".into()))?;
    if identity.role != Role::Admin {
        warn!(user_id = %identity.user_id, role = %identity.role, "admin access denied");
        return Err(AppError::Authorization(
            "Access denied. Admin privileges required.".into(),
        ));
    }
    Ok(())
}

/// Verified identity of the caller.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(AuthUser(identity.clone()));
        }

        let token = locate_token(&parts.headers)
            .ok_or_else(|| AppError::Authentication("Access denied. No token provided.".into()))?;

        let keys = JwtKeys::from_ref(state);
        let identity: Identity = match keys.verify(&token) {
            Ok(claims) => claims.into(),
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                return Err(AppError::Authentication("Invalid or expired token".into()));
            }
        };

        parts.extensions.insert(identity.clone());
        Ok(AuthUser(identity))
    }
}

/// Authenticated caller holding the `admin` role. Rejects before the handler runs.
pub struct AdminUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        require_admin(Some(&identity))?;
        Ok(AdminUser(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.append(*k, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn cookie_wins_over_bearer_header() {
        let h = headers(&[
            ("cookie", "theme=dark; auth_token=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(locate_token(&h).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_header_is_the_fallback() {
        let h = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(locate_token(&h).as_deref(), Some("abc.def.ghi"));

        let h = headers(&[("cookie", "auth_token="), ("authorization", "Bearer xyz")]);
        assert_eq!(locate_token(&h).as_deref(), Some("xyz"));
    }

    #[test]
    fn no_token_or_other_scheme_yields_none() {
        assert_eq!(locate_token(&HeaderMap::new()), None);
        let h = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(locate_token(&h), None);
    }

    #[test]
    fn admin_gate_distinguishes_missing_and_wrong_role() {
        let user = Identity {
            user_id: Uuid::new_v4(),
            email: "u@example.com".into(),
            role: Role::User,
        };
        let admin = Identity { role: Role::Admin, ..user.clone() };

        assert!(matches!(require_admin(None), Err(AppError::Authentication(_))));
        assert!(matches!(require_admin(Some(&user)), Err(AppError::Authorization(_))));
        assert!(require_admin(Some(&admin)).is_ok());
    }
}
