// src/domain/mod.rs

//! Domain abstractions shared by the correlator and the transports.

mod transport;

pub use transport::{
    //
    EventName,
    EventTransport,
    SubscriptionHandle,
    TransportEvent,
    TransportPtr,
};
