//! Server configuration, loaded from environment variables at startup.

use std::str::FromStr;

use chrono::Duration;

/// Languages offered in the form selector when `CODEMATE_LANGUAGES` is unset.
const DEFAULT_LANGUAGES: &[&str] = &[
    "c", "clike", "cpp", "csharp", "css", "dart", "django", "go", "html", "java", "javascript",
    "markup", "markdown", "matlab", "mongodb", "objectivec", "perl", "php", "powershell", "python",
    "r", "regex", "ruby", "rust", "sass", "scala", "sql", "swift", "yaml",
];

const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 14;
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Who may delete a history record by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Any identity may delete any record, including anonymous callers.
    #[default]
    Unrestricted,
    /// Only the owner may delete a record; other records look absent.
    OwnerOnly,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unrestricted" => Ok(Self::Unrestricted),
            "owner-only" | "owner_only" | "owner" => Ok(Self::OwnerOnly),
            other => Err(format!("unknown delete policy '{other}'")),
        }
    }
}

/// Runtime configuration for codemate-server.
///
/// Built once in `main` and shared read-only through [`crate::state::AppState`].
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// sqlx SQLite URL (default: `"sqlite://codemate.db"`).
    pub database_url: String,

    /// Upper bound on pooled SQLite connections.
    pub db_max_connections: u32,

    /// `tracing` filter string, e.g. `"info"` or `"debug,sqlx=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Credential for the completion API.
    pub openai_api_key: String,

    /// Base URL of the OpenAI-compatible completion API.
    pub openai_base_url: String,

    /// Completion model name.
    pub model: String,

    /// Labels offered in the language selector.
    pub languages: Vec<String>,

    /// Fixed origin for share links, e.g. `"https://codemate.example"`.
    /// When unset the origin is taken from the request headers.
    pub public_url: Option<String>,

    /// Honour `X-Forwarded-Host` / `X-Forwarded-Proto` when building share
    /// links. Only enable behind a proxy that overwrites them.
    pub trust_forwarded_headers: bool,

    /// Lifetime of a login session in hours, `1..=8760`.
    pub session_ttl_hours: i64,

    pub delete_policy: DeletePolicy,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("CODEMATE_BIND", "0.0.0.0:8000"),
            database_url: env_or("CODEMATE_DATABASE_URL", "sqlite://codemate.db"),
            db_max_connections: parse_env("CODEMATE_DB_MAX_CONNECTIONS", 5),
            log_level: env_or("CODEMATE_LOG", "info"),
            log_json: env_flag("CODEMATE_LOG_JSON"),
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model: env_or("CODEMATE_MODEL", "gpt-3.5-turbo-instruct"),
            languages: std::env::var("CODEMATE_LANGUAGES")
                .ok()
                .map(|v| parse_languages(&v))
                .filter(|langs| !langs.is_empty())
                .unwrap_or_else(default_languages),
            public_url: std::env::var("CODEMATE_PUBLIC_URL")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_owned())
                .filter(|v| !v.is_empty()),
            trust_forwarded_headers: env_flag("CODEMATE_TRUST_PROXY"),
            session_ttl_hours: session_ttl_hours(std::env::var("CODEMATE_SESSION_TTL_HOURS").ok().as_deref()),
            delete_policy: parse_env("CODEMATE_DELETE_POLICY", DeletePolicy::default()),
        }
    }
}

impl Config {
    /// Session lifetime, clamped to `1..=8760` hours whatever the field holds.
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".into(),
            database_url: "sqlite::memory:".into(),
            db_max_connections: 1,
            log_level: "info".into(),
            log_json: false,
            openai_api_key: String::new(),
            openai_base_url: "https://api.openai.com/v1".into(),
            model: "gpt-3.5-turbo-instruct".into(),
            languages: default_languages(),
            public_url: None,
            trust_forwarded_headers: false,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            delete_policy: DeletePolicy::default(),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn default_languages() -> Vec<String> {
    DEFAULT_LANGUAGES.iter().map(|s| (*s).to_owned()).collect()
}

fn parse_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse a session lifetime, rejecting values outside `1..=8760` hours.
fn session_ttl_hours(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_SESSION_TTL_HOURS;
    };
    match raw.trim().parse::<i64>() {
        Ok(hours) if (1..=MAX_SESSION_TTL_HOURS).contains(&hours) => hours,
        _ => {
            eprintln!(
                "WARN: CODEMATE_SESSION_TTL_HOURS='{raw}' is not between 1 and \
                 {MAX_SESSION_TTL_HOURS}; using {DEFAULT_SESSION_TTL_HOURS}"
            );
            DEFAULT_SESSION_TTL_HOURS
        }
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn languages_are_split_and_trimmed() {
        assert_eq!(
            parse_languages(" Python, Rust ,,Go "),
            vec!["Python".to_owned(), "Rust".to_owned(), "Go".to_owned()]
        );
    }

    #[test]
    fn delete_policy_parses_known_values() {
        assert_eq!("owner-only".parse::<DeletePolicy>(), Ok(DeletePolicy::OwnerOnly));
        assert_eq!("Unrestricted".parse::<DeletePolicy>(), Ok(DeletePolicy::Unrestricted));
        assert!("nobody".parse::<DeletePolicy>().is_err());
    }

    #[test]
    fn session_ttl_rejects_out_of_range_values() {
        assert_eq!(session_ttl_hours(None), DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(session_ttl_hours(Some(" 48 ")), 48);
        assert_eq!(session_ttl_hours(Some("10000000000")), DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(session_ttl_hours(Some("-5")), DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(session_ttl_hours(Some("0")), DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(session_ttl_hours(Some("soon")), DEFAULT_SESSION_TTL_HOURS);
    }

    #[test]
    fn session_ttl_is_clamped_when_set_directly() {
        let huge = Config { session_ttl_hours: 10_000_000_000, ..Default::default() };
        assert_eq!(huge.session_ttl(), Duration::hours(MAX_SESSION_TTL_HOURS));
        let negative = Config { session_ttl_hours: -3, ..Default::default() };
        assert_eq!(negative.session_ttl(), Duration::hours(1));
    }

    #[test]
    fn default_config_is_unrestricted_with_languages() {
        let cfg = Config::default();
        assert_eq!(cfg.delete_policy, DeletePolicy::Unrestricted);
        assert!(cfg.languages.iter().any(|l| l == "python"));
    }
}
