//! Public, transport-agnostic harness configuration.
//!
//! This type intentionally contains no transport-specific concepts
//! (e.g. Socket.IO client options). Transport layers are responsible for
//! interpreting this config into concrete connection settings.

use std::time::Duration;

/// Default endpoint when `PROMPT_HARNESS_ENDPOINT` is not set.
const DEFAULT_ENDPOINT: &str = "http://localhost:5001";

/// Reconnection policy handed to the underlying transport.
///
/// The correlator never reconnects on its own: a drop mid-wait fails the
/// current exchange. This only configures the transport's own policy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Whether the transport should attempt reconnection at all.
    pub enabled: bool,

    /// Maximum number of reconnection attempts.
    pub max_attempts: u8,

    /// Delay before the first reconnection attempt.
    pub min_delay: Duration,

    /// Cap on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    /// Mirrors the service's documented client settings: up to five
    /// attempts, one second apart.
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Harness configuration and connection parameters.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    // ---
    /// Endpoint address of the prompt service
    /// (e.g. `"http://localhost:5001"`).
    pub endpoint: String,

    /// How long `send_and_await` waits for a response before the exchange
    /// is abandoned.
    ///
    /// Default: 30 seconds
    pub response_timeout: Duration,

    /// Transport reconnection policy. Configured here, exercised only by
    /// the transport.
    pub reconnect: ReconnectConfig,
}

impl HarnessConfig {
    /// Create a config for the given endpoint with default timeout and
    /// reconnection policy.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            response_timeout: Duration::from_secs(30),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Read the endpoint from `PROMPT_HARNESS_ENDPOINT`, falling back to
    /// `http://localhost:5001`.
    pub fn from_env() -> Self {
        // ---
        let endpoint = std::env::var("PROMPT_HARNESS_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_owned());
        Self::new(endpoint)
    }

    /// Set the per-exchange response timeout.
    ///
    /// Default: 30 seconds
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Override the transport reconnection policy.
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}
