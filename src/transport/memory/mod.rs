// src/transport/memory/mod.rs

//! In-memory transport.
//!
//! Simulates the remote endpoint entirely within the process. The returned
//! [`MemoryPeer`] plays the server side: it observes what the harness
//! emits and injects responses, socket errors, and disconnects.

mod transport;

pub use transport::{create_transport, MemoryPeer};
