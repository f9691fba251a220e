use crate::BusResponse;
use serde::{Deserialize, Serialize};

/// A single reply, always generated in response to a `BusSession`
/// request. Echoes the `auth_cookie` back to ensure that connectivity
/// is valid, and contains one `BusResponse` per request, in request
/// order.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BusReply {
    /// Auth cookie, echoed from the session.
    pub auth_cookie: u32,

    /// A list of `BusResponse` objects generated in response to the
    /// requests that started the session.
    pub responses: Vec<BusResponse>,
}
