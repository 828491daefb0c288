//! Per-user history: list, delete one, delete all.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use minijinja::context;
use tracing::info;

use super::{Flash, redirect_with_notice, render_page};
use crate::auth::Identity;
use crate::config::DeletePolicy;
use crate::entities::CodeStore;
use crate::error::ServerError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/past", get(past))
        .route("/delete_past/{id}", get(delete_past).post(delete_past))
        .route("/delete_all_past", get(delete_all_past).post(delete_all_past))
}

pub async fn past(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    flash: Flash,
) -> Result<Response, ServerError> {
    let Some(user) = identity.user() else {
        return Ok(redirect_with_notice("/", "You must be logged in to view past code."));
    };
    let code = state.store.list_codes_by_owner(&user.id).await?;
    render_page(&state, "past.html", &identity, flash, None, context! { code => code })
}

/// Delete one record by id.
///
/// Under [`DeletePolicy::Unrestricted`] any caller may delete any record;
/// under [`DeletePolicy::OwnerOnly`] records the caller does not own are
/// reported as missing.
pub async fn delete_past(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let not_found = || ServerError::NotFound(format!("record '{id}' not found"));

    if state.config.delete_policy == DeletePolicy::OwnerOnly {
        let record = state.store.get_code(&id).await?.ok_or_else(not_found)?;
        if record.owner_id.as_deref() != identity.user_id() || !identity.is_authenticated() {
            return Err(not_found());
        }
    }

    if state.store.delete_code(&id).await? == 0 {
        return Err(not_found());
    }
    info!(record_id = %id, by = ?identity.user_id(), "record deleted");
    Ok(redirect_with_notice("/past", "Successfully deleted."))
}

pub async fn delete_all_past(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Response, ServerError> {
    let Some(user) = identity.user() else {
        return Ok(redirect_with_notice("/past", "You must be logged in to delete history."));
    };
    let removed = state.store.delete_codes_by_owner(&user.id).await?;
    info!(user_id = %user.id, removed, "history cleared");
    Ok(redirect_with_notice("/past", "Successfully deleted all history."))
}
