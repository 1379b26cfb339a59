//! The request dispatch engine: ordered fallback across transports, bounded
//! retry rounds, and deadline enforcement.

use std::sync::Arc;
use std::time::Duration;

use serde_json::value::RawValue;
use serde_json::Value;
use tokio::time::{self, Instant};

use crate::error::{ClientError, ConfigError, TransportError};
use crate::transport::Transport;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default wait between retry rounds.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(5);
/// Default number of retry rounds after the initial attempt.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Multi-transport JSON-RPC client with ordered fallback and bounded retry.
///
/// Transports are tried in the order given. When every transport in the list
/// has failed, the client waits one polling interval and retries the whole
/// list again, up to `retry_count` additional rounds, all under a single
/// deadline. The first successful response wins.
#[derive(Clone)]
pub struct Client {
    transports: Vec<Arc<dyn Transport>>,
    timeout: Duration,
    polling_interval: Duration,
    retry_count: u32,
}

impl Client {
    /// Build a client over `transports` with default timing parameters.
    pub fn new(transports: Vec<Arc<dyn Transport>>) -> Result<Self, ConfigError> {
        Self::builder().transports(transports).build()
    }

    /// Start building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Number of configured transports.
    pub fn transport_count(&self) -> usize {
        self.transports.len()
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The wait between retry rounds.
    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    /// Number of retry rounds after the initial attempt.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Send `method` with positional `params`, bounded by the configured
    /// timeout, and return the raw JSON `result` payload.
    pub async fn request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Box<RawValue>, ClientError> {
        let deadline = Instant::now() + self.timeout;
        self.dispatch(method, params, deadline).await
    }

    /// Like [`request`](Self::request), but additionally bounded by a caller
    /// deadline. The effective deadline is whichever bound comes first.
    pub async fn request_with_deadline(
        &self,
        method: &str,
        params: Vec<Value>,
        deadline: Instant,
    ) -> Result<Box<RawValue>, ClientError> {
        let deadline = deadline.min(Instant::now() + self.timeout);
        self.dispatch(method, params, deadline).await
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Vec<Value>,
        deadline: Instant,
    ) -> Result<Box<RawValue>, ClientError> {
        let mut last_err: Option<TransportError> = None;

        for round in 0..=self.retry_count {
            if Instant::now() >= deadline {
                return Err(ClientError::DeadlineExceeded);
            }

            for transport in &self.transports {
                match time::timeout_at(deadline, transport.request(method, params.clone())).await {
                    Ok(Ok(result)) => return Ok(result),
                    Ok(Err(err)) => {
                        tracing::debug!(
                            endpoint = transport.endpoint(),
                            method,
                            error = %err,
                            "transport failed, falling through"
                        );
                        last_err = Some(err);
                    }
                    Err(_) => return Err(ClientError::DeadlineExceeded),
                }
            }

            if round < self.retry_count {
                tracing::warn!(
                    method,
                    round = round + 1,
                    "all transports failed, retrying in {:?}",
                    self.polling_interval
                );
                if time::timeout_at(deadline, time::sleep(self.polling_interval))
                    .await
                    .is_err()
                {
                    return Err(ClientError::DeadlineExceeded);
                }
            }
        }

        Err(ClientError::RetriesExhausted {
            attempts: self.retry_count + 1,
            source: last_err.expect("at least one transport configured"),
        })
    }
}

// `dyn Transport` carries no `Debug` bound; show endpoints instead.
impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let endpoints: Vec<&str> = self.transports.iter().map(|t| t.endpoint()).collect();
        f.debug_struct("Client")
            .field("transports", &endpoints)
            .field("timeout", &self.timeout)
            .field("polling_interval", &self.polling_interval)
            .field("retry_count", &self.retry_count)
            .finish()
    }
}

/// Builder for [`Client`]. Unset parameters fall back to the defaults.
pub struct ClientBuilder {
    transports: Vec<Arc<dyn Transport>>,
    timeout: Duration,
    polling_interval: Duration,
    retry_count: u32,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            transports: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            retry_count: DEFAULT_RETRY_COUNT,
        }
    }
}

impl ClientBuilder {
    /// Append one transport. Order of addition is fallback order.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transports.push(transport);
        self
    }

    /// Append several transports, preserving iteration order.
    pub fn transports(
        mut self,
        transports: impl IntoIterator<Item = Arc<dyn Transport>>,
    ) -> Self {
        self.transports.extend(transports);
        self
    }

    /// Per-request timeout. Must be positive.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wait between retry rounds. Must be positive.
    pub fn polling_interval(mut self, polling_interval: Duration) -> Self {
        self.polling_interval = polling_interval;
        self
    }

    /// Number of retry rounds after the initial attempt. Zero disables retry.
    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<Client, ConfigError> {
        if self.transports.is_empty() {
            return Err(ConfigError::NoTransports);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.polling_interval.is_zero() {
            return Err(ConfigError::InvalidPollingInterval);
        }
        Ok(Client {
            transports: self.transports,
            timeout: self.timeout,
            polling_interval: self.polling_interval,
            retry_count: self.retry_count,
        })
    }
}
