use serde::{Deserialize, Serialize};
use tsn_compiler::InterfaceDescriptor;

/// A `BusResponse` is returned for each `BusRequest` in a session,
/// in request order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum BusResponse {
    /// The request succeeded and has no payload.
    Ack,

    /// The request failed; the string is the rendered typed error.
    Fail(String),

    /// Compiled descriptors, one per matched interface.
    InterfaceInfo(Vec<InterfaceDescriptor>),

    /// The configuration document, as YAML text.
    ConfigText(String),
}
