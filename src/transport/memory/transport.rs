// src/transport/memory/transport.rs

//! In-memory transport implementation.
//!
//! This transport is the **reference implementation** of transport
//! semantics: subscriptions are registered immediately, delivery is
//! deterministic, and connection-level trouble (injected through the peer)
//! fans out to every open subscription. The Socket.IO transport is expected
//! to approximate this behavior as closely as the underlying library allows.
//!
//! ## Non-Goals
//!
//! - Network behavior, reconnection, or timing variability
//! - Exact emulation of Socket.IO framing

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};

use crate::{
    // ---
    log_debug,
    EventName,
    EventTransport,
    HarnessConfig,
    Result,
    SubscriptionHandle,
    TransportEvent,
    TransportPtr,
};

struct MemoryTransport {
    // ---
    subscriptions: RwLock<HashMap<EventName, Vec<mpsc::Sender<TransportEvent>>>>,

    /// Emitted payloads, readable from the peer side. A dropped peer closes
    /// the channel; emits are then discarded rather than failed, matching a
    /// socket whose remote stopped listening.
    outbound: mpsc::Sender<(EventName, Bytes)>,
}

impl MemoryTransport {
    // ---
    /// Deliver an inbound occurrence to subscriptions.
    ///
    /// `event` of `None` means a connection-level signal for every open
    /// subscription; `Some` delivers only on the exactly matching channel.
    async fn deliver(&self, event: Option<&EventName>, occurrence: TransportEvent) {
        // ---
        let subs = self.subscriptions.read().await;

        for (name, senders) in subs.iter() {
            if event.is_some_and(|wanted| wanted != name) {
                continue;
            }
            for sender in senders {
                // Ignore send failures; a closed channel indicates a
                // dropped SubscriptionHandle.
                let _ = sender.send(occurrence.clone()).await;
            }
        }
    }
}

#[async_trait::async_trait]
impl EventTransport for MemoryTransport {
    // ---

    /// Queue an outbound payload for the peer.
    async fn emit(&self, event: &EventName, payload: Bytes) -> Result<()> {
        // ---
        if self.outbound.send((event.clone(), payload)).await.is_err() {
            log_debug!("emit on {event} discarded: peer side dropped");
        }
        Ok(())
    }

    /// Register a subscription.
    ///
    /// Once this returns, any subsequent peer pushes on the matching
    /// channel (and any injected error or disconnect) are deliverable to
    /// the returned inbox.
    async fn subscribe(&self, event: EventName) -> Result<SubscriptionHandle> {
        // ---
        let (tx, rx) = mpsc::channel(16);

        let mut subs = self.subscriptions.write().await;
        subs.entry(event).or_default().push(tx);

        Ok(SubscriptionHandle { inbox: rx })
    }

    /// Close the transport.
    ///
    /// Clears all subscriptions, which closes every inbox.
    async fn close(&self) -> Result<()> {
        // ---
        let mut subs = self.subscriptions.write().await;
        subs.clear();
        Ok(())
    }
}

/// Server side of an in-memory connection.
///
/// Lets a test observe what the harness emitted and script the remote
/// peer's behavior: respond, misbehave, or drop the connection.
pub struct MemoryPeer {
    // ---
    outbound: mpsc::Receiver<(EventName, Bytes)>,
    transport: Arc<MemoryTransport>,
}

impl MemoryPeer {
    // ---
    /// Next payload the harness emitted, in transmission order.
    ///
    /// Returns `None` once the transport side has been dropped.
    pub async fn next_emit(&mut self) -> Option<(EventName, Bytes)> {
        // ---
        self.outbound.recv().await
    }

    /// Inject raw inbound bytes on the named channel.
    pub async fn push_raw(&self, event: impl Into<EventName>, payload: impl Into<Bytes>) {
        // ---
        let event = event.into();
        self.transport
            .deliver(Some(&event), TransportEvent::Message(payload.into()))
            .await;
    }

    /// Inject a JSON document on the named channel.
    pub async fn push_json(&self, event: impl Into<EventName>, value: &Value) {
        // ---
        // Serializing a Value cannot fail.
        let payload = serde_json::to_vec(value).unwrap_or_default();
        self.push_raw(event, payload).await;
    }

    /// Signal a socket error to every open subscription.
    pub async fn fail(&self, reason: impl Into<String>) {
        // ---
        self.transport
            .deliver(None, TransportEvent::Error(reason.into()))
            .await;
    }

    /// Drop the connection: every open subscription observes the
    /// disconnect condition.
    pub async fn drop_connection(&self, reason: impl Into<String>) {
        // ---
        self.transport
            .deliver(None, TransportEvent::Disconnected(reason.into()))
            .await;
    }
}

/// Create a connected in-memory transport/peer pair.
///
/// Always available and requires no external resources.
pub async fn create_transport(_config: &HarnessConfig) -> Result<(TransportPtr, MemoryPeer)> {
    // ---

    let (outbound_tx, outbound_rx) = mpsc::channel(16);

    let transport = Arc::new(MemoryTransport {
        // ---
        subscriptions: RwLock::new(HashMap::new()),
        outbound: outbound_tx,
    });

    let peer = MemoryPeer {
        // ---
        outbound: outbound_rx,
        transport: Arc::clone(&transport),
    };

    let transport: TransportPtr = transport;
    Ok((transport, peer))
}
