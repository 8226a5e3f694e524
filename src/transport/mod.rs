//! Transport implementations.
//!
//! Concrete implementations of the domain-level `EventTransport` trait.
//! The real Socket.IO transport is hidden behind a feature flag; the
//! in-memory transport is always available and defines the reference
//! semantics.
//!
//! Domain code must not depend on transport-specific types.

mod memory;

#[cfg(feature = "transport_socketio")]
mod socketio;

pub use memory::{create_transport as create_memory_transport, MemoryPeer};

#[cfg(feature = "transport_socketio")]
pub use socketio::create_transport as create_socketio_transport;
