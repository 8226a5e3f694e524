use thiserror::Error;

/// Errors surfaced by one exchange.
///
/// Every failure settles the outstanding wait exactly once; callers observe
/// a single terminal signal per `send_and_await`.
#[derive(Error, Debug)]
pub enum Error {
    /// No response observed within the configured duration.
    ///
    /// The exchange is abandoned but the connection stays open; the already
    /// sent request is not retracted.
    #[error("timed out waiting for response")]
    Timeout,

    /// The transport could not connect, signaled an error, or dropped the
    /// connection while a wait was outstanding. The message carries the
    /// underlying cause.
    #[error("transport failure: {0}")]
    Transport(String),

    /// An inbound payload could not be interpreted as a JSON document.
    ///
    /// Settles the wait as a failure instead of leaving it hanging; the
    /// offending payload is kept for diagnostics.
    #[error("failed to decode response payload: {source}; payload: {payload}")]
    Decoding {
        source: serde_json::Error,
        payload: String,
    },

    /// A request was submitted while a prior wait was still unsettled.
    ///
    /// The harness is strictly sequential: at most one exchange in flight.
    #[error("an exchange is already in flight")]
    ExchangeInFlight,

    /// Outbound request serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, Error>;
