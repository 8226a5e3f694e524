// src/transport/socketio/transport.rs

//! Socket.IO transport implementation.
//!
//! Bridges `rust_socketio`'s callback-based delivery into the channel-based
//! `EventTransport` contract. The async Socket.IO client only accepts
//! handlers at build time, so the response channel and the lifecycle events
//! (error, close) are registered up front and routed into the subscription
//! map; `subscribe()` then just attaches an inbox to that map.
//!
//! Reconnection is the library's own policy, taken from
//! [`ReconnectConfig`](crate::ReconnectConfig). A disconnect observed while
//! a wait is outstanding still fails that wait; reconnection only matters
//! for whatever the caller does next.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use rust_socketio::asynchronous::{Client, ClientBuilder};
use rust_socketio::{Event, Payload, TransportType};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};

use crate::{
    // ---
    log_debug,
    log_warn,
    Error,
    EventName,
    EventTransport,
    HarnessConfig,
    Result,
    SubscriptionHandle,
    TransportEvent,
    TransportPtr,
    RESPONSE_EVENT,
};

type Subscriptions = Arc<RwLock<HashMap<EventName, Vec<mpsc::Sender<TransportEvent>>>>>;

/// Deliver an inbound occurrence to subscriptions. `event` of `None` means
/// a connection-level signal for every open subscription.
async fn deliver(subs: &Subscriptions, event: Option<&EventName>, occurrence: TransportEvent) {
    // ---
    let subs = subs.read().await;

    for (name, senders) in subs.iter() {
        if event.is_some_and(|wanted| wanted != name) {
            continue;
        }
        for sender in senders {
            let _ = sender.send(occurrence.clone()).await;
        }
    }
}

/// Payload of a data event, as raw bytes of one JSON document.
fn payload_bytes(payload: Payload) -> Bytes {
    // ---
    match payload {
        Payload::Binary(bin) => bin,
        Payload::Text(values) => {
            // Socket.IO events carry a list of arguments; the service sends
            // exactly one document per response event.
            let value = values.into_iter().next().unwrap_or(Value::Null);
            Bytes::from(serde_json::to_vec(&value).unwrap_or_default())
        }
        _ => Bytes::new(),
    }
}

/// Payload of a lifecycle event, as display text.
fn payload_text(payload: Payload) -> String {
    // ---
    match payload {
        Payload::Binary(bin) => String::from_utf8_lossy(&bin).into_owned(),
        Payload::Text(values) => values
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

struct SocketIoTransport {
    // ---
    client: Client,
    subscriptions: Subscriptions,
}

#[async_trait::async_trait]
impl EventTransport for SocketIoTransport {
    // ---
    async fn emit(&self, event: &EventName, payload: Bytes) -> Result<()> {
        // ---
        // The service speaks JSON documents, not binary attachments.
        let value: Value = serde_json::from_slice(&payload).map_err(Error::Serialization)?;

        self.client
            .emit(&*event.0, value)
            .await
            .map_err(|err| Error::Transport(format!("emit on {event} failed: {err}")))
    }

    async fn subscribe(&self, event: EventName) -> Result<SubscriptionHandle> {
        // ---
        if &*event.0 != RESPONSE_EVENT {
            log_warn!("subscription on {event}: only {RESPONSE_EVENT} is routed by this transport");
        }

        let (tx, rx) = mpsc::channel(16);

        let mut subs = self.subscriptions.write().await;
        subs.entry(event).or_default().push(tx);

        Ok(SubscriptionHandle { inbox: rx })
    }

    async fn close(&self) -> Result<()> {
        // ---
        let disconnected = self.client.disconnect().await;

        // Close the inboxes even if the disconnect itself failed.
        let mut subs = self.subscriptions.write().await;
        subs.clear();

        disconnected.map_err(|err| Error::Transport(format!("disconnect failed: {err}")))
    }
}

/// Connect to the configured endpoint and return the transport.
///
/// # Errors
///
/// Returns `Error::Transport` if the connection cannot be established.
pub async fn create_transport(config: &HarnessConfig) -> Result<TransportPtr> {
    // ---
    let subscriptions: Subscriptions = Arc::new(RwLock::new(HashMap::new()));

    let response_subs = Arc::clone(&subscriptions);
    let error_subs = Arc::clone(&subscriptions);
    let close_subs = Arc::clone(&subscriptions);

    let reconnect = &config.reconnect;

    let client = ClientBuilder::new(config.endpoint.clone())
        .transport_type(TransportType::Websocket)
        .reconnect(reconnect.enabled)
        .reconnect_on_disconnect(reconnect.enabled)
        .max_reconnect_attempts(reconnect.max_attempts)
        .reconnect_delay(
            reconnect.min_delay.as_millis() as u64,
            reconnect.max_delay.as_millis() as u64,
        )
        .on(RESPONSE_EVENT, move |payload: Payload, _client: Client| {
            // ---
            let subs = Arc::clone(&response_subs);
            async move {
                let event = EventName::from(RESPONSE_EVENT);
                deliver(&subs, Some(&event), TransportEvent::Message(payload_bytes(payload))).await;
            }
            .boxed()
        })
        .on(Event::Error, move |payload: Payload, _client: Client| {
            // ---
            let subs = Arc::clone(&error_subs);
            async move {
                deliver(&subs, None, TransportEvent::Error(payload_text(payload))).await;
            }
            .boxed()
        })
        .on(Event::Close, move |payload: Payload, _client: Client| {
            // ---
            let subs = Arc::clone(&close_subs);
            async move {
                let mut cause = payload_text(payload);
                if cause.is_empty() {
                    cause = "connection closed".to_owned();
                }
                deliver(&subs, None, TransportEvent::Disconnected(cause)).await;
            }
            .boxed()
        })
        .connect()
        .await
        .map_err(|err| Error::Transport(format!("connect to {} failed: {err}", config.endpoint)))?;

    log_debug!("connected to {}", config.endpoint);

    Ok(Arc::new(SocketIoTransport {
        // ---
        client,
        subscriptions,
    }))
}
