//! Axum router construction and the helpers shared by page handlers.
//!
//! [`build`] assembles the complete application router:
//! - per-request trace span (see [`crate::middleware::trace`])
//! - `Cache-Control: no-store` on every response, since pages carry
//!   per-user history
//! - health, assist, share, account and history routes

mod account;
mod assist;
mod health;
mod history;

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{CACHE_CONTROL, HOST, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Router;
use minijinja::{Value, context};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::auth::Identity;
use crate::auth::cookie::{NOTICE_COOKIE, clear_cookie, notice_cookie, read_notice};
use crate::error::ServerError;
use crate::middleware::trace;
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(assist::router())
        .merge(account::router())
        .merge(history::router())
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

// ── Notices ───────────────────────────────────────────────────────────────────

/// Notice left by the previous response, read from its cookie.
#[derive(Debug, Clone, Default)]
pub struct Flash(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Flash(read_notice(&parts.headers)))
    }
}

/// Redirect to `to`, carrying `notice` to the page rendered there.
pub fn redirect_with_notice(to: &str, notice: &str) -> Response {
    let mut response = Redirect::to(to).into_response();
    if let Ok(value) = HeaderValue::from_str(&notice_cookie(notice)) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

/// Render `template` inside the site layout.
///
/// `notice` takes precedence over a pending [`Flash`]; a pending flash is
/// consumed either way.
pub fn render_page(
    state: &AppState,
    template: &str,
    identity: &Identity,
    flash: Flash,
    notice: Option<&str>,
    ctx: Value,
) -> Result<Response, ServerError> {
    let shown = notice.map(str::to_owned).or_else(|| flash.0.clone());
    let body = state.templates.render(
        template,
        context! {
            user => identity.user().map(|u| u.username.clone()),
            notice => shown,
            lang_list => state.config.languages.clone(),
            ..ctx
        },
    )?;
    let mut response = Html(body).into_response();
    if flash.0.is_some() {
        if let Ok(value) = HeaderValue::from_str(&clear_cookie(NOTICE_COOKIE)) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    Ok(response)
}

// ── Share links ───────────────────────────────────────────────────────────────

/// Scheme and host used to build absolute share URLs, e.g. `http://localhost:8000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(pub String);

impl Origin {
    pub fn share_url(&self, record_id: &str) -> String {
        format!("{}/share/{record_id}", self.0)
    }

    /// Origin from `Host`, or from the `X-Forwarded-*` headers when the
    /// proxy in front of us is trusted to set them.
    fn from_headers(headers: &HeaderMap, trust_forwarded: bool) -> Self {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        let forwarded = |name: &str| if trust_forwarded { header(name) } else { None };

        let host = forwarded("x-forwarded-host")
            .or_else(|| header(HOST.as_str()))
            .unwrap_or("localhost");
        let scheme = forwarded("x-forwarded-proto").unwrap_or("http");
        Origin(format!("{scheme}://{host}"))
    }
}

impl FromRequestParts<Arc<AppState>> for Origin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(match &state.config.public_url {
            Some(url) => Origin(url.clone()),
            None => Origin::from_headers(&parts.headers, state.config.trust_forwarded_headers),
        })
    }
}

// ── Test support ──────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, Response, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::completion::{CompletionClient, CompletionError};
    use crate::config::Config;
    use crate::entities::SqliteStore;
    use crate::state::AppState;

    /// Completion client that records prompts and returns a canned result.
    pub struct StubCompletion {
        pub prompts: Mutex<Vec<String>>,
        reply: Result<String, String>,
    }

    impl StubCompletion {
        pub fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self { prompts: Mutex::new(Vec::new()), reply: Ok(text.to_owned()) })
        }

        pub fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self { prompts: Mutex::new(Vec::new()), reply: Err(message.to_owned()) })
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for StubCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_owned());
            self.reply.clone().map_err(CompletionError::Network)
        }
    }

    pub struct TestApp {
        pub state: Arc<AppState>,
        pub router: axum::Router,
    }

    impl TestApp {
        pub async fn new(completion: Arc<StubCompletion>) -> Self {
            Self::with_config(Config::default(), completion).await
        }

        pub async fn with_config(config: Config, completion: Arc<StubCompletion>) -> Self {
            let store = SqliteStore::in_memory().await;
            let state = Arc::new(AppState::with_completion(config, store, completion).unwrap());
            let router = super::build(state.clone());
            Self { state, router }
        }

        pub async fn send(&self, req: Request<Body>) -> Response<Body> {
            self.router.clone().oneshot(req).await.unwrap()
        }

        pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
            let mut req = Request::get(uri).header(header::HOST, "codemate.test");
            if let Some(c) = cookie {
                req = req.header(header::COOKIE, c);
            }
            self.send(req.body(Body::empty()).unwrap()).await
        }

        pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
            let mut req = Request::post(uri)
                .header(header::HOST, "codemate.test")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            if let Some(c) = cookie {
                req = req.header(header::COOKIE, c);
            }
            self.send(req.body(Body::from(form.to_owned())).unwrap()).await
        }

        /// Register `username` and return its `Cookie` header value.
        pub async fn login_as(&self, username: &str) -> String {
            let form = format!(
                "username={username}&password1=long-enough-pw&password2=long-enough-pw"
            );
            let resp = self.post_form("/register", &form, None).await;
            session_cookie(&resp).expect("session cookie after register")
        }
    }

    /// `name=value` pair of the session cookie set by `resp`, if any.
    pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
        set_cookie_pair(resp, crate::auth::cookie::SESSION_COOKIE)
    }

    pub fn set_cookie_pair(resp: &Response<Body>, name: &str) -> Option<String> {
        resp.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(&format!("{name}=")))
            .map(str::to_owned)
    }

    /// Response body with minijinja's `/` and `'` escapes undone so tests
    /// can match URLs and prose directly.
    pub async fn body_text(resp: Response<Body>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .replace("&#x2f;", "/")
            .replace("&#x27;", "'")
    }

    pub fn location(resp: &Response<Body>) -> &str {
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}
