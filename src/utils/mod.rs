//! Utility modules supporting provider adapters and the engine.
//!
//! - [`HttpClient`]: shared HTTP client with timeouts and a crate user agent
//! - [`fetch_text`]: send a request and map HTTP failures onto `SourceError`
//! - [`RetryConfig`] / [`with_retry`]: exponential backoff for transient errors
//! - [`normalize_text`], [`normalize_doi`], [`normalize_title`]: comparison keys
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use scholar_merge::utils::{with_retry, RetryConfig};
//! use scholar_merge::sources::SourceError;
//!
//! # async fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let config = RetryConfig::default().max_attempts(3);
//! let body = with_retry(config, || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod retry;
mod text;

pub use http::{fetch_text, HttpClient};
pub use retry::{with_retry, RetryConfig, TransientError};
pub use text::{doi_url, normalize_doi, normalize_text, normalize_title};
