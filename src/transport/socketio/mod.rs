// src/transport/socketio/mod.rs

//! Socket.IO transport, backed by `rust_socketio`.
//!
//! Enabled with the `transport_socketio` feature.

mod transport;

pub use transport::create_transport;
