//! The `tsn_bus` crate provides the data-transfer back-end for
//! communication between the TSN tools. `tsnd` listens on a local unix
//! socket; the CLI and the web API use it for all interaction with the
//! daemon.
//!
//! A session consists of connecting and sending a single [`BusSession`]
//! (serialized with `bincode`, length-prefix framed) containing one or
//! more [`BusRequest`] objects. The reply is a [`BusReply`] with one
//! [`BusResponse`] per request, in request order. The connection then
//! terminates. Protocol versioning/negotiation is intentionally
//! skipped.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

mod bus;

pub use bus::client::{bus_request, bus_request_at};
pub use bus::unix_socket_server::{UnixSocketServer, UnixSocketServerError};
pub use bus::{
    cookie_value, decode_reply, decode_session, encode_reply, encode_session, BusClientError,
    BusReply, BusRequest, BusResponse, BusSession, BUS_SOCKET_PATH,
};
