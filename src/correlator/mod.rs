// src/correlator/mod.rs

//! Request/response correlation.
//!
//! This module contains the core [`Correlator`] type which bridges the
//! event-driven transport into a sequential, awaitable request/response
//! exchange.
//!
//! # Architecture
//!
//! The correlator subscribes to the fixed response channel and runs a
//! background receive loop. There is no message-level correlation
//! identifier on the wire: the contract is "the next message on the
//! response channel answers the one outstanding request", so the pending
//! state is a single slot rather than a map.
//!
//! Each `send_and_await` arms the slot with a fresh oneshot channel,
//! transmits the request, and suspends until one of three competing
//! completion sources settles it: response arrival, transport failure
//! (error or disconnect), or timeout. First writer wins; later signals on a
//! settled slot are discarded.
//!
//! # Concurrency
//!
//! Strictly sequential by design — arming the slot while a prior wait is
//! unsettled fails with [`Error::ExchangeInFlight`]. Mutual exclusion is
//! structural (one flow, one slot); the mutex around the slot only guards
//! against the receive loop and the caller touching it simultaneously.

mod pending;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time;

use crate::{
    // ---
    log_debug,
    log_info,
    log_warn,
    Error,
    EventName,
    EventTransport,
    HarnessConfig,
    Request,
    ResponseDigest,
    Result,
    TransportEvent,
    TransportPtr,
    REQUEST_EVENT,
    RESPONSE_EVENT,
};

use pending::PendingWait;

/// One completed round trip.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Conversation identifier the request carried. A follow-up chained
    /// onto this exchange reuses it.
    pub chat_id: i64,

    /// The decoded response document, verbatim.
    pub raw: Value,

    /// Diagnostic view over the well-known optional fields.
    pub digest: ResponseDigest,
}

/// Running correlator instance.
///
/// Cheap to clone (internally `Arc`-backed).
#[derive(Clone)]
pub struct Correlator {
    inner: Arc<Inner>,
}

struct Inner {
    // ---
    transport: TransportPtr,
    config: HarnessConfig,
    pending: Arc<PendingWait>,

    /// Receive loop handle. Kept so the task isn't immediately dropped;
    /// the loop exits on its own once the transport closes its inbox.
    _rx_task: JoinHandle<()>,
}

impl Correlator {
    // ---
    /// Create a correlator on an established transport.
    ///
    /// Subscribes to the response channel and spawns the receive loop that
    /// settles the pending slot.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the response subscription cannot be
    /// established.
    pub async fn with_transport(transport: TransportPtr, config: HarnessConfig) -> Result<Self> {
        // ---
        let mut handle = transport.subscribe(EventName::from(RESPONSE_EVENT)).await?;

        let pending = Arc::new(PendingWait::new());
        let pending_for_task = Arc::clone(&pending);

        let rx_task = tokio::spawn(async move {
            // ---
            while let Some(event) = handle.inbox.recv().await {
                match event {
                    TransportEvent::Message(payload) => {
                        // ---
                        let outcome = match serde_json::from_slice::<Value>(&payload) {
                            Ok(value) => Ok(value),
                            Err(source) => Err(Error::Decoding {
                                source,
                                payload: String::from_utf8_lossy(&payload).into_owned(),
                            }),
                        };

                        if !pending_for_task.settle(outcome) {
                            log_debug!("response arrived with no exchange outstanding; dropped");
                        }
                    }
                    TransportEvent::Error(cause) => {
                        // ---
                        let settled = pending_for_task
                            .settle(Err(Error::Transport(format!("socket error: {cause}"))));

                        if !settled {
                            log_warn!("transport error outside an exchange: {cause}");
                        }
                    }
                    TransportEvent::Disconnected(cause) => {
                        // ---
                        let settled = pending_for_task
                            .settle(Err(Error::Transport(format!("connection dropped: {cause}"))));

                        if !settled {
                            log_info!("disconnected: {cause}");
                        }
                    }
                }
            }

            log_debug!("transport closed or subscription dropped");
        });

        Ok(Self {
            inner: Arc::new(Inner {
                transport,
                config,
                pending,
                _rx_task: rx_task,
            }),
        })
    }

    /// Send a request and await its response with the configured timeout.
    ///
    /// See [`send_and_await_with_timeout`](Self::send_and_await_with_timeout).
    pub async fn send_and_await(&self, request: &Request) -> Result<Exchange> {
        // ---
        self.send_and_await_with_timeout(request, self.inner.config.response_timeout)
            .await
    }

    /// Send a request and await the next response on the response channel.
    ///
    /// Arms the pending slot, transmits the request, and suspends until the
    /// slot settles or `timeout` elapses. Exactly one of {response,
    /// failure, timeout} is observed.
    ///
    /// # Errors
    ///
    /// - `Error::ExchangeInFlight` — a prior wait is still unsettled; the
    ///   request is not transmitted.
    /// - `Error::Serialization` — the request could not be encoded; the
    ///   request is not transmitted.
    /// - `Error::Timeout` — no response within `timeout`. The connection is
    ///   left open and the already sent request is not retracted; a late
    ///   response is silently dropped.
    /// - `Error::Transport` — emit failed, the transport signaled an error,
    ///   or the connection dropped mid-wait (the message carries the cause).
    /// - `Error::Decoding` — the response was not a valid JSON document.
    pub async fn send_and_await_with_timeout(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Exchange> {
        // ---
        // Encode before arming so a malformed request leaves the slot free.
        let payload = Bytes::from(serde_json::to_vec(request)?);

        let rx = self.inner.pending.arm()?;

        let outbound = EventName::from(REQUEST_EVENT);
        if let Err(err) = self.inner.transport.emit(&outbound, payload).await {
            // Nothing was queued; free the slot for the next attempt.
            self.inner.pending.disarm();
            return Err(err);
        }

        log_debug!(
            "request transmitted (chat_id: {}); awaiting response",
            request.chat_id()
        );

        let outcome = match time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_closed)) => {
                // Slot dropped without settling: the receive loop is gone.
                return Err(Error::Transport(
                    "receive loop stopped while a wait was outstanding".into(),
                ));
            }
            Err(_elapsed) => {
                // Timeout is final. Clearing the slot here is what makes a
                // late response a dropped message instead of the answer to
                // some future request.
                self.inner.pending.disarm();
                return Err(Error::Timeout);
            }
        };

        let raw = outcome?;
        let digest = ResponseDigest::from_value(&raw);

        Ok(Exchange {
            chat_id: request.chat_id(),
            raw,
            digest,
        })
    }

    /// Send a follow-up request on the conversation of a completed exchange.
    ///
    /// Not a distinct mechanism — the follow-up's `chat_id` is rebound to
    /// `previous.chat_id` and a fresh `send_and_await` is performed. Because
    /// the pending slot is single-occupancy and `previous` is already
    /// settled, the follow-up cannot interleave with the first exchange.
    pub async fn chain(&self, previous: &Exchange, follow_up: Request) -> Result<Exchange> {
        // ---
        let follow_up = follow_up.with_chat_id(previous.chat_id);
        self.send_and_await(&follow_up).await
    }

    /// The config this correlator was created with.
    pub fn config(&self) -> &HarnessConfig {
        &self.inner.config
    }
}
