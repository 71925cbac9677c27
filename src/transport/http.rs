//! reqwest-backed transport with cooperative cancellation

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{FetchFailure, FetchOutcome, Transport};
use crate::config::HttpConfig;
use crate::error::{ResolverError, ResolverResult};

/// HTTP GET transport.
///
/// Cancelling the token aborts in-flight requests and short-circuits all
/// later ones with [`FetchOutcome::Cancelled`]. A request that ends without
/// any HTTP status (connection refused, reset, DNS failure) is reported as
/// `Cancelled` as well; only timeouts surface as status-less failures.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    cancel: CancellationToken,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> ResolverResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ResolverError::Transport {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            cancel: CancellationToken::new(),
        })
    }

    pub fn from_config(config: &HttpConfig) -> ResolverResult<Self> {
        Self::new(Duration::from_secs(config.timeout_secs), &config.user_agent)
    }

    /// Share a token owned by the caller, e.g. one tied to Ctrl-C.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    async fn get_text(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return FetchOutcome::Failed(FetchFailure::network(e.to_string()));
            }
            // No HTTP status at all: treated like an aborted request
            Err(e) => {
                debug!("Request to {url} ended without a status: {e}");
                return FetchOutcome::Cancelled;
            }
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::Failed(FetchFailure::status(status.as_u16()));
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Completed(body),
            Err(e) => FetchOutcome::Failed(FetchFailure {
                status: Some(status.as_u16()),
                reason: format!("failed to read response body: {e}"),
            }),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        if self.cancel.is_cancelled() {
            debug!("Skipping fetch of {url}: transport cancelled");
            return FetchOutcome::Cancelled;
        }

        debug!("GET {url}");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => FetchOutcome::Cancelled,
            outcome = self.get_text(url) => outcome,
        }
    }
}
