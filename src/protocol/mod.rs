// src/protocol/mod.rs

//! Wire contract with the prompt service.
//!
//! Every request goes out on [`REQUEST_EVENT`]; every response comes back on
//! [`RESPONSE_EVENT`]. There is no per-message correlation identifier — the
//! contract is "the next message on the response channel answers the one
//! outstanding request", which is why the correlator allows only a single
//! exchange in flight.

mod request;
mod response;

pub use request::{Request, RequestType};
pub use response::ResponseDigest;

/// Fixed outbound channel name, shared by every command.
pub const REQUEST_EVENT: &str = "message";

/// Fixed inbound channel name carrying response payloads.
pub const RESPONSE_EVENT: &str = "message_response";
