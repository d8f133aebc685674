//! Runtime configuration, read once from the environment at startup.

use std::time::Duration;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// NCBI E-utilities root.
pub const DEFAULT_ENTREZ_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
/// Number of PubMed records attached to every reply.
pub const DEFAULT_MAX_RESULTS: usize = 3;
/// Idle time after which a browser session is dropped.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address the web UI binds to (default: `"127.0.0.1:8501"`).
    pub bind_address: String,

    /// Bearer credential for the language-model service. Absence is not a
    /// startup error; every generation call fails instead.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,

    /// Contact address sent with every E-utilities call. Required at startup.
    pub entrez_email: Option<String>,
    /// Optional NCBI key that raises the per-second request allowance.
    pub ncbi_api_key: Option<String>,
    pub entrez_base_url: String,

    pub max_results: usize,
    pub session_ttl: Duration,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,
    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("PUBMED_CHAT_BIND", "127.0.0.1:8501"),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            entrez_email: env_opt("ENTREZ_EMAIL"),
            ncbi_api_key: env_opt("NCBI_API_KEY"),
            entrez_base_url: env_or("ENTREZ_BASE_URL", DEFAULT_ENTREZ_BASE_URL),
            max_results: parse_env("PUBMED_CHAT_MAX_RESULTS", DEFAULT_MAX_RESULTS),
            session_ttl: Duration::from_secs(parse_env(
                "PUBMED_CHAT_SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )),
            log_level: env_or("PUBMED_CHAT_LOG", "info"),
            log_json: std::env::var("PUBMED_CHAT_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8501".to_owned(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_owned(),
            entrez_email: None,
            ncbi_api_key: None,
            entrez_base_url: DEFAULT_ENTREZ_BASE_URL.to_owned(),
            max_results: DEFAULT_MAX_RESULTS,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            log_level: "info".to_owned(),
            log_json: false,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
