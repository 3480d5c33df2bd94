//! Access-control gates.
//!
//! `require_auth` verifies the bearer token and attaches the caller's
//! [`Identity`] to the request extensions; `require_admin` reads it back and
//! rejects anyone who is not an admin. Both are thin wrappers over the pure
//! functions [`authenticate`] and [`authorize_admin`].

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::{claims::Identity, jwt::JwtKeys};
use crate::{error::AppError, state::AppState};

/// Pulls the token out of `Authorization: Bearer <token>`, the only carrier
/// the server accepts.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<Identity, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthenticated)?;
    keys.verify(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        AppError::from(e)
    })
}

pub fn authorize_admin(identity: Option<&Identity>) -> Result<(), AppError> {
    match identity {
        Some(id) if id.is_admin() => Ok(()),
        Some(id) => {
            warn!(user_id = id.user_id, role = %id.role, "admin route denied");
            Err(AppError::Forbidden("admin role required".into()))
        }
        None => Err(AppError::Forbidden("no authenticated identity".into())),
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(request.headers(), &state.keys)?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    authorize_admin(request.extensions().get::<Identity>())?;
    Ok(next.run(request).await)
}

/// The identity the auth gate attached to this request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(AuthUser)
            .ok_or(AppError::Unauthenticated)
    }
}
