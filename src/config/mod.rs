//! Configuration management.
//!
//! Provider credentials and endpoints are resolved here, once, and handed to
//! adapter constructors as explicit values. Nothing below the binary reads the
//! process environment.

mod file_config;

pub use file_config::{find_config_file, save_config, write_default_config, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "SCHOLAR_MERGE";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_keys: ApiKeys,

    #[serde(default)]
    pub endpoints: Endpoints,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub enrichment: EnrichmentSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// API keys for the upstream services
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Clarivate Web of Science Starter API key
    #[serde(default)]
    pub web_of_science: Option<String>,

    /// Elsevier API key (Scopus Search)
    #[serde(default)]
    pub scopus: Option<String>,

    /// Optional Scopus institutional token
    #[serde(default)]
    pub scopus_inst_token: Option<String>,

    /// NCBI API key (optional, raises the E-utilities rate limit)
    #[serde(default)]
    pub ncbi: Option<String>,
}

/// Base URLs of the upstream services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_wos_url")]
    pub web_of_science: String,

    #[serde(default = "default_scopus_url")]
    pub scopus: String,

    #[serde(default = "default_pubmed_url")]
    pub pubmed: String,

    #[serde(default = "default_icite_url")]
    pub icite: String,

    /// Abstract classifier; the keyword heuristic is used when unset
    #[serde(default)]
    pub classifier: Option<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            web_of_science: default_wos_url(),
            scopus: default_scopus_url(),
            pubmed: default_pubmed_url(),
            icite: default_icite_url(),
            classifier: None,
        }
    }
}

fn default_wos_url() -> String {
    "https://api.clarivate.com/apis/wos-starter/v1".to_string()
}

fn default_scopus_url() -> String {
    "https://api.elsevier.com".to_string()
}

fn default_pubmed_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string()
}

fn default_icite_url() -> String {
    "https://icite.od.nih.gov/api".to_string()
}

/// Per-request search limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_max_results")]
    pub max_results_per_source: usize,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results_per_source: default_max_results(),
            request_timeout_secs: default_timeout(),
        }
    }
}

fn default_max_results() -> usize {
    100
}

fn default_timeout() -> u64 {
    30
}

/// Retry policy applied by every adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            attempt_timeout_secs: default_attempt_timeout(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_attempt_timeout() -> u64 {
    45
}

/// Citation-rate enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: default_batch_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    crate::enrich::ICITE_BATCH_SIZE
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `plain` (default) or `json`
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingSettings {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Load configuration from an optional file layered with `SCHOLAR_MERGE__*`
/// environment variables (e.g. `SCHOLAR_MERGE__API_KEYS__SCOPUS`)
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}
