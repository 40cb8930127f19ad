use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// Default upstream chat-completions endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Global application state
pub struct RelayState {
    pub client: Client,
    /// Where requests are forwarded to
    pub upstream_url: String,
}

impl RelayState {
    pub fn new(upstream_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            upstream_url: upstream_url.into(),
        })
    }
}
