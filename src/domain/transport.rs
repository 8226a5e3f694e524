// src/domain/transport.rs

//! Transport domain abstractions.
//!
//! This module defines the event-channel interface the correlator runs
//! against. It intentionally avoids any reference to concrete protocols or
//! client libraries; the Socket.IO implementation lives under
//! `src/transport/` alongside the in-memory reference transport.
//!
//! The transport is responsible only for delivering named events in both
//! directions. Higher-level semantics — the single pending wait, timeouts,
//! chaining — are handled by the correlator.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::Result;

/// A named event channel.
///
/// Interpretation is transport-specific (a Socket.IO event name for the real
/// transport, an exact-match key for the memory transport). Names are
/// immutable, cheap to clone, and safe to share across tasks.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventName(pub Arc<str>);

impl<T> From<T> for EventName
where
    T: Into<Arc<str>>,
{
    fn from(value: T) -> Self {
        // ---
        EventName(value.into())
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One inbound occurrence delivered to a subscription.
///
/// Besides payloads on the subscribed channel, every open subscription also
/// observes connection-level trouble, so a waiter can fail fast instead of
/// sitting out its full timeout.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// A payload arrived on the subscribed channel. Raw bytes; decoding is
    /// the subscriber's concern.
    Message(Bytes),

    /// The transport signaled an error while the subscription was open.
    Error(String),

    /// The connection dropped. Carries the disconnect condition.
    Disconnected(String),
}

/// Handle returned from a successful subscription.
///
/// The subscription remains active until the handle is dropped or the
/// transport is closed; either closes the inbox.
pub struct SubscriptionHandle {
    // ---
    /// Receiver channel for events on this subscription.
    pub inbox: mpsc::Receiver<TransportEvent>,
}

/// Bidirectional event-channel transport.
///
/// Implementations must ensure that:
/// - Once `subscribe()` returns successfully, matching events emitted by the
///   peer *after* that point are deliverable.
/// - `emit()` means "queued for transmission", not "acknowledged".
/// - Connection errors and disconnects fan out to every open subscription.
///
/// The in-memory transport is the reference implementation of these
/// semantics.
#[async_trait::async_trait]
pub trait EventTransport: Send + Sync {
    // ---
    /// Queue an outbound payload on the named event channel.
    async fn emit(&self, event: &EventName, payload: Bytes) -> Result<()>;

    /// Register interest in inbound events on the named channel.
    async fn subscribe(&self, event: EventName) -> Result<SubscriptionHandle>;

    /// Release the connection. Best effort; called on every exit path.
    async fn close(&self) -> Result<()>;
}

/// Shared transport pointer.
///
/// An `Arc<dyn EventTransport>`: cloning is cheap and clones share the same
/// underlying connection.
pub type TransportPtr = Arc<dyn EventTransport>;
