//! Request extractors. `AuthUser` is the authenticated caller; the JSON and
//! path wrappers route binding failures through `ApiError`.

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity of a verified caller. Taking this as a handler argument is what
/// makes a route protected: extraction fails with 401 before the handler
/// body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                debug!("Missing or unreadable Authorization header");
                ApiError::Unauthenticated
            })?;

        // The raw token is expected; a Bearer scheme is tolerated.
        let header_value = header_value.trim();
        let token = header_value.strip_prefix("Bearer ").unwrap_or(header_value);

        let claims = state.tokens.verify(token)?;
        Ok(Self {
            id: claims.sub,
            username: claims.username,
        })
    }
}

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
