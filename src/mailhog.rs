//! Client for the MailHog-style mail-capture service.

use crate::{InboxMessage, MessageList, Result};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Read-only client for the mail-capture listing endpoint.
///
/// Captured mail is the observable side of account flows: every
/// registration, email change, and password reset produces a message
/// here, and tests read tokens back out of them.
#[derive(Debug, Clone)]
pub struct MailhogClient {
    http: reqwest::Client,
    base_url: String,
}

impl MailhogClient {
    /// Create a client with default settings against `base_url`
    /// (e.g. `http://localhost:5025`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        MailhogClientBuilder::new(base_url).build()
    }

    /// Create a builder for configuring the client.
    pub fn builder(base_url: impl Into<String>) -> MailhogClientBuilder {
        MailhogClientBuilder::new(base_url)
    }

    /// Fetch the full current list of captured messages.
    ///
    /// The listing is re-read in full on every call; there is no cursor or
    /// offset, so repeated calls always reflect the current inbox state.
    pub async fn messages(&self) -> Result<Vec<InboxMessage>> {
        let url = format!("{}/api/v2/messages", self.base_url);
        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let list: MessageList = serde_json::from_str(&body)?;

        tracing::debug!(total = list.total, count = list.count, "fetched inbox listing");
        Ok(list.items)
    }
}

/// Builder for configuring a [`MailhogClient`].
#[derive(Debug, Clone)]
pub struct MailhogClientBuilder {
    base_url: String,
    proxy: Option<String>,
    timeout: Duration,
}

impl MailhogClientBuilder {
    /// Create a new builder with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            proxy: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Route all requests through a proxy URL (e.g. "http://127.0.0.1:8080").
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Override the default 30-second request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<MailhogClient> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if let Some(proxy_url) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(MailhogClient {
            http: builder.build()?,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}
