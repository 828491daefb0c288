//! Fix / suggest / explain pages and the public share view.
//!
//! A submission runs: language check → prompt → completion call → store →
//! render. Completion and store failures do not become error responses; their
//! message is shown where the answer would have been.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Form, Router};
use chrono::Utc;
use minijinja::context;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::{Flash, Origin, render_page};
use crate::assist::{Action, finish_answer, selected_language};
use crate::auth::Identity;
use crate::completion::CompletionError;
use crate::entities::{CodeRecord, CodeStore};
use crate::error::ServerError;
use crate::schemas::forms::CodeForm;
use crate::state::AppState;

const SELECT_LANGUAGE_NOTICE: &str = "Please select a programming language.";

/// Register assist and share routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(fix_form).post(fix_code))
        .route("/suggest", get(suggest_form).post(suggest_code))
        .route("/explain", get(explain_form).post(explain_code))
        .route("/share/{id}", get(share))
}

/// Why a submission produced no stored answer.
#[derive(Debug, Error)]
enum AssistError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn fix_form(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    flash: Flash,
) -> Result<Response, ServerError> {
    show_form(&state, Action::Fix, &identity, flash)
}

pub async fn fix_code(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    origin: Origin,
    flash: Flash,
    Form(form): Form<CodeForm>,
) -> Result<Response, ServerError> {
    submit(&state, Action::Fix, &identity, &origin, flash, form).await
}

pub async fn suggest_form(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    flash: Flash,
) -> Result<Response, ServerError> {
    show_form(&state, Action::Suggest, &identity, flash)
}

pub async fn suggest_code(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    origin: Origin,
    flash: Flash,
    Form(form): Form<CodeForm>,
) -> Result<Response, ServerError> {
    submit(&state, Action::Suggest, &identity, &origin, flash, form).await
}

pub async fn explain_form(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    flash: Flash,
) -> Result<Response, ServerError> {
    show_form(&state, Action::Explain, &identity, flash)
}

pub async fn explain_code(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    origin: Origin,
    flash: Flash,
    Form(form): Form<CodeForm>,
) -> Result<Response, ServerError> {
    submit(&state, Action::Explain, &identity, &origin, flash, form).await
}

/// Public, read-only view of one record. No ownership check.
pub async fn share(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    origin: Origin,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let record = state
        .store
        .get_code(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("record '{id}' not found")))?;
    render_page(
        &state,
        "share.html",
        &identity,
        flash,
        None,
        context! {
            share_url => origin.share_url(&record.id),
            record => record,
        },
    )
}

// ── Shared flow ───────────────────────────────────────────────────────────────

fn show_form(
    state: &AppState,
    action: Action,
    identity: &Identity,
    flash: Flash,
) -> Result<Response, ServerError> {
    render_page(
        state,
        action.template(),
        identity,
        flash,
        None,
        context! {
            action_path => action.path(),
            submit_label => action.label(),
        },
    )
}

async fn submit(
    state: &AppState,
    action: Action,
    identity: &Identity,
    origin: &Origin,
    flash: Flash,
    form: CodeForm,
) -> Result<Response, ServerError> {
    let code = form.code.unwrap_or_default();

    let Some(lang) = selected_language(form.lang.as_deref()) else {
        return render_page(
            state,
            action.template(),
            identity,
            flash,
            Some(SELECT_LANGUAGE_NOTICE),
            context! {
                action_path => action.path(),
                submit_label => action.label(),
                code => code,
                lang => form.lang.as_deref(),
            },
        );
    };

    let ctx = match answer(state, action, identity, &code, lang).await {
        Ok(record) => context! {
            action_path => action.path(),
            submit_label => action.label(),
            lang => lang,
            share_url => origin.share_url(&record.id),
            response => record.code_answer,
        },
        Err(e) => {
            match &e {
                AssistError::Completion(c) => warn!(
                    action = action.name(),
                    retryable = c.is_retryable(),
                    error = %c,
                    "completion request failed"
                ),
                AssistError::Store(s) => warn!(action = action.name(), error = %s, "failed to save answer"),
            }
            context! {
                action_path => action.path(),
                submit_label => action.label(),
                lang => lang,
                response => e.to_string(),
            }
        }
    };

    render_page(state, action.template(), identity, flash, None, ctx)
}

/// Ask the completion API and store the answer; the record is only written
/// after the call succeeds.
async fn answer(
    state: &AppState,
    action: Action,
    identity: &Identity,
    code: &str,
    lang: &str,
) -> Result<CodeRecord, AssistError> {
    let prompt = action.prompt(lang, code);
    let raw = state.completion.complete(&prompt).await?;

    let record = CodeRecord {
        id: Uuid::new_v4().to_string(),
        question: code.to_owned(),
        code_answer: finish_answer(&raw),
        language: lang.to_owned(),
        owner_id: identity.user_id().map(str::to_owned),
        created_at: Utc::now(),
    };
    state.store.insert_code(record.clone()).await?;

    info!(
        action = action.name(),
        record_id = %record.id,
        language = %record.language,
        owner = ?record.owner_id,
        "answer saved"
    );
    Ok(record)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::StatusCode;

    use super::*;
    use crate::assist::LANGUAGE_PLACEHOLDER;
    use crate::routes::test_support::{StubCompletion, TestApp, body_text};

    /// Record id embedded in the first share link of a rendered page.
    fn shared_id(html: &str) -> Option<String> {
        let start = html.find("codemate.test/share/")? + "codemate.test/share/".len();
        Some(html[start..start + 36].to_owned())
    }

    fn placeholder_form(code: &str) -> String {
        format!("code={code}&lang={}", LANGUAGE_PLACEHOLDER.replace(' ', "+"))
    }

    #[tokio::test]
    async fn placeholder_language_rerenders_form_without_saving() {
        let stub = StubCompletion::answering("unused");
        let app = TestApp::new(stub.clone()).await;
        let cookie = app.login_as("ada").await;
        let user_id = app.state.auth.resolve_session(cookie.split('=').nth(1).unwrap()).await.unwrap().unwrap().id;

        for (action, heading) in [
            (Action::Fix, "Fix your code"),
            (Action::Suggest, "Ask for code"),
            (Action::Explain, "Explain code"),
        ] {
            let resp = app.post_form(action.path(), &placeholder_form("x%3D1"), Some(&cookie)).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let html = body_text(resp).await;
            assert!(html.contains(heading), "{action:?} should re-render its own form");
            assert!(html.contains(SELECT_LANGUAGE_NOTICE));
            assert!(html.contains(">x=1</textarea>"), "submitted code is preserved");
        }

        assert!(stub.prompts().is_empty());
        assert!(app.state.store.list_codes_by_owner(&user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fix_example_is_saved_and_shareable() {
        let stub = StubCompletion::answering("\n\ndef f(): pass\n");
        let app = TestApp::new(stub.clone()).await;

        let resp = app.post_form("/", "code=def+f%28%29%3A+pas&lang=Python", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("def f(): pass"));
        assert_eq!(stub.prompts(), vec!["Respond only with code. Fix this Python code: def f(): pas"]);

        let id = shared_id(&html).expect("share link rendered");
        let record = app.state.store.get_code(&id).await.unwrap().unwrap();
        assert_eq!(record.question, "def f(): pas");
        assert_eq!(record.language, "Python");
        assert_eq!(record.code_answer, "def f(): pass");
        assert_eq!(record.owner_id, None);

        let shared = body_text(app.get(&format!("/share/{id}"), None).await).await;
        assert!(shared.contains("def f(): pas"));
        assert!(shared.contains("def f(): pass"));
        assert!(shared.contains("Shared Python code"));
        assert!(shared.contains(&format!("http://codemate.test/share/{id}")));
    }

    #[tokio::test]
    async fn every_action_saves_exact_code_and_language_for_the_user() {
        let stub = StubCompletion::answering(" answer ");
        let app = TestApp::new(stub.clone()).await;
        let cookie = app.login_as("ada").await;

        for action in Action::ALL {
            let resp = app.post_form(action.path(), "code=++let+x+%3D+1%3B++&lang=Rust", Some(&cookie)).await;
            let html = body_text(resp).await;
            let id = shared_id(&html).expect("share link rendered");
            let record = app.state.store.get_code(&id).await.unwrap().unwrap();
            assert_eq!(record.question, "  let x = 1;  ", "{action:?}");
            assert_eq!(record.language, "Rust");
            assert_eq!(record.code_answer, "answer");
            assert!(record.owner_id.is_some());
        }
        assert_eq!(stub.prompts().len(), 3);
    }

    #[tokio::test]
    async fn completion_failure_is_rendered_in_page() {
        let app = TestApp::new(StubCompletion::failing("connection refused")).await;
        let cookie = app.login_as("ada").await;

        let resp = app.post_form("/suggest", "code=hello&lang=Python", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("network error: connection refused"));
        assert!(shared_id(&html).is_none());

        let session = cookie.split('=').nth(1).unwrap();
        let user = app.state.auth.resolve_session(session).await.unwrap().unwrap();
        assert!(app.state.store.list_codes_by_owner(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn explain_answer_keeps_newlines_and_renders_breaks() {
        let app = TestApp::new(StubCompletion::answering("\nFirst line.\nSecond <line>.\n")).await;
        let resp = app.post_form("/explain", "code=x&lang=Python", None).await;
        let html = body_text(resp).await;
        assert!(html.contains("First line.<br>Second &lt;line&gt;."));

        let id = shared_id(&html).unwrap();
        let record = app.state.store.get_code(&id).await.unwrap().unwrap();
        assert_eq!(record.code_answer, "First line.\nSecond <line>.");
    }

    #[tokio::test]
    async fn blank_answer_is_saved_and_still_shareable() {
        let app = TestApp::new(StubCompletion::answering("  \n ")).await;
        let cookie = app.login_as("ada").await;

        for action in Action::ALL {
            let html = body_text(app.post_form(action.path(), "code=x&lang=Python", Some(&cookie)).await).await;
            let id = shared_id(&html).unwrap_or_else(|| panic!("{action:?} should render a share link"));
            let record = app.state.store.get_code(&id).await.unwrap().unwrap();
            assert_eq!(record.code_answer, "");
        }
    }

    #[tokio::test]
    async fn share_page_keeps_answer_line_breaks() {
        let app = TestApp::new(StubCompletion::answering("fn a() {}\nfn b() {}")).await;
        let html = body_text(app.post_form("/", "code=x&lang=Rust", None).await).await;
        let id = shared_id(&html).unwrap();

        let shared = body_text(app.get(&format!("/share/{id}"), None).await).await;
        assert!(shared.contains("fn a() {}<br>fn b() {}"));
    }

    #[tokio::test]
    async fn forms_render_language_list() {
        let app = TestApp::new(StubCompletion::answering("")).await;
        for path in ["/", "/suggest", "/explain"] {
            let resp = app.get(path, None).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let html = body_text(resp).await;
            assert!(html.contains(LANGUAGE_PLACEHOLDER));
            assert!(html.contains(r#"<option value="python""#));
        }
    }

    #[tokio::test]
    async fn public_url_overrides_host_in_share_links() {
        let cfg = crate::config::Config {
            public_url: Some("https://codemate.example".into()),
            ..Default::default()
        };
        let app = TestApp::with_config(cfg, StubCompletion::answering("ok")).await;
        let html = body_text(app.post_form("/", "code=x&lang=Go", None).await).await;
        assert!(html.contains("https://codemate.example/share/"));
    }

    #[tokio::test]
    async fn unknown_share_id_is_not_found() {
        let app = TestApp::new(StubCompletion::answering("")).await;
        let resp = app.get("/share/does-not-exist", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
