use crate::BusRequest;
use serde::{Deserialize, Serialize};

/// `BusSession` represents a complete session with `tsnd`. It must
/// contain a cookie value (defined in the `cookie_value()` function),
/// which serves as a sanity check that the connection is valid.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BusSession {
    /// Auth cookie, which should match the output of the
    /// `cookie_value()` function.
    pub auth_cookie: u32,

    /// A list of requests to include in this session.
    pub requests: Vec<BusRequest>,
}
