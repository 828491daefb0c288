//! axum extractor that turns the session cookie into an [`Identity`].

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::Identity;
use super::cookie::{SESSION_COOKIE, read_cookie};
use crate::error::ServerError;
use crate::state::AppState;

impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = read_cookie(&parts.headers, SESSION_COOKIE).map(str::to_owned) else {
            return Ok(Identity::Anonymous);
        };
        Ok(state
            .auth
            .resolve_session(&token)
            .await?
            .map_or(Identity::Anonymous, Identity::User))
    }
}
