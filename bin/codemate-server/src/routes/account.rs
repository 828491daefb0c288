//! Login, logout, registration and the welcome page.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue};
use axum::http::header::SET_COOKIE;
use axum::response::Response;
use axum::routing::get;
use axum::{Form, Router};
use minijinja::context;
use tracing::info;
use validator::Validate;

use super::{Flash, redirect_with_notice, render_page};
use crate::assist::Action;
use crate::auth::cookie::{SESSION_COOKIE, clear_cookie, read_cookie, session_cookie};
use crate::auth::{AuthError, AuthUser, Identity};
use crate::error::ServerError;
use crate::schemas::forms::{LoginForm, SignUpForm, error_messages};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route("/register", get(register_form).post(register))
        .route("/welcome", get(welcome))
}

/// The login box lives in the page header, so a bare GET shows the fix form.
pub async fn login_form(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    flash: Flash,
) -> Result<Response, ServerError> {
    let action = Action::Fix;
    render_page(
        &state,
        action.template(),
        &identity,
        flash,
        None,
        context! {
            action_path => action.path(),
            submit_label => action.label(),
        },
    )
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ServerError> {
    match state.auth.authenticate(&form.username, &form.password).await? {
        Some(user) => start_session(&state, &user, "You are logged in.").await,
        None => Ok(redirect_with_notice("/", "Login error. Please try again...")),
    }
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    if let Some(token) = read_cookie(&headers, SESSION_COOKIE) {
        state.auth.close_session(token).await?;
    }
    let mut response = redirect_with_notice("/", "You are logged out.");
    if let Ok(value) = HeaderValue::from_str(&clear_cookie(SESSION_COOKIE)) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

pub async fn register_form(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    flash: Flash,
) -> Result<Response, ServerError> {
    render_page(&state, "register.html", &identity, flash, None, context! {})
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    flash: Flash,
    Form(form): Form<SignUpForm>,
) -> Result<Response, ServerError> {
    let errors = match form.validate() {
        Ok(()) => match state.auth.register(form.clone().into_new_user()).await {
            Ok(user) => return start_session(&state, &user, "You are registered!").await,
            Err(AuthError::UsernameTaken) => vec![AuthError::UsernameTaken.to_string()],
            Err(e) => return Err(e.into()),
        },
        Err(errs) => error_messages(&errs),
    };
    render_page(
        &state,
        "register.html",
        &identity,
        flash,
        None,
        context! {
            form => form,
            errors => errors,
        },
    )
}

pub async fn welcome(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    flash: Flash,
) -> Result<Response, ServerError> {
    render_page(&state, "welcome.html", &identity, flash, None, context! {})
}

/// Open a session for `user` and send them to the welcome page.
async fn start_session(state: &AppState, user: &AuthUser, notice: &str) -> Result<Response, ServerError> {
    let ttl = state.config.session_ttl();
    let token = state.auth.open_session(user, ttl).await?;
    info!(user_id = %user.id, username = %user.username, "session opened");

    let mut response = redirect_with_notice("/welcome", notice);
    if let Ok(value) = HeaderValue::from_str(&session_cookie(&token, ttl.num_seconds())) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}
