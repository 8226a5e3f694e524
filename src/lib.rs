//! Manual test harness for a Socket.IO-style prompt service.
//!
//! The harness connects to a remote endpoint, sends command payloads on a
//! fixed event channel, and awaits the correlated response on a second fixed
//! channel. The reusable core is the [`Correlator`]: it holds exactly one
//! pending exchange at a time, races response arrival against a timeout and
//! against transport failure, and lets a follow-up request be chained onto
//! the same conversation once the first exchange has settled.
//!

// Import all sub modules once...
mod correlator;
mod domain;
mod protocol;
mod transport;

mod harness_config;

mod error;
mod macros;

// Re-export main types
pub use correlator::{Correlator, Exchange};

pub use harness_config::{HarnessConfig, ReconnectConfig};

pub use error::{Error, Result};

pub use protocol::{
    //
    Request,
    RequestType,
    ResponseDigest,
    REQUEST_EVENT,
    RESPONSE_EVENT,
};

pub use transport::create_memory_transport;
pub use transport::MemoryPeer;

#[cfg(feature = "transport_socketio")]
pub use transport::create_socketio_transport;

// --- public re-exports
pub use domain::{
    //
    EventName,
    EventTransport,
    SubscriptionHandle,
    TransportEvent,
    TransportPtr,
};

pub(crate) use macros::{log_debug, log_info, log_warn};
