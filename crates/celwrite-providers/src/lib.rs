//! celwrite-providers: scoring backends.
//!
//! Implements the `ScoringProvider` trait for Gemini, OpenAI and Anthropic,
//! plus a canned mock, and builds the configured one from `celwrite.toml`.

pub mod anthropic;
pub mod config;
pub mod error;
pub mod gemini;
pub mod mock;
pub mod openai;

pub use config::{
    create_provider, load_config, load_config_from, provider_by_name, CelwriteConfig, ProviderConfig,
};
pub use error::ProviderError;

/// Shared HTTP client. A `timeout_secs` of 0 leaves requests without a deadline.
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, ProviderError> {
    let mut builder = reqwest::Client::builder();
    if timeout_secs > 0 {
        builder = builder.timeout(std::time::Duration::from_secs(timeout_secs));
    }
    builder
        .build()
        .map_err(|e| ProviderError::ClientInit(e.to_string()))
}
