//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::completion::{CompletionClient, OpenAiClient};
use crate::config::Config;
use crate::entities::SqliteStore;
use crate::templates::Templates;

/// State shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Code history store.
    pub store: Arc<SqliteStore>,
    /// External completion API.
    pub completion: Arc<dyn CompletionClient>,
    /// Credential checks and login sessions.
    pub auth: Arc<dyn AuthProvider>,
    pub templates: Arc<Templates>,
}

impl AppState {
    /// Production wiring: the store doubles as the auth provider and the
    /// completion client talks to the configured OpenAI-compatible API.
    pub fn new(config: Config, store: SqliteStore) -> Result<Self, minijinja::Error> {
        let completion = Arc::new(OpenAiClient::from_config(&config));
        Self::with_completion(config, store, completion)
    }

    pub fn with_completion(
        config: Config,
        store: SqliteStore,
        completion: Arc<dyn CompletionClient>,
    ) -> Result<Self, minijinja::Error> {
        let store = Arc::new(store);
        Ok(Self {
            config: Arc::new(config),
            auth: store.clone(),
            store,
            completion,
            templates: Arc::new(Templates::new()?),
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
