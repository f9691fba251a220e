use serde::{Deserialize, Serialize};

/// One or more `BusRequest` objects must be included in a `BusSession`.
/// Each represents a single request for action or data.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum BusRequest {
    /// A generic "is it alive?" test. Returns an `Ack`.
    Ping,

    /// Create the VLAN link for an interface and install its compiled
    /// shaping discipline. Returns `Ack` or `Fail`.
    CreateInterface {
        /// The physical interface the configuration was compiled for.
        ifname: String,
        /// VLAN id to create on top of it.
        vlan_id: u16,
    },

    /// Tear down the VLAN link and the root qdisc of an interface.
    DeleteInterface {
        /// The physical interface.
        ifname: String,
        /// VLAN id to remove.
        vlan_id: u16,
    },

    /// Retrieve the compiled descriptors, either for one interface or
    /// for all of them. Returns `BusResponse::InterfaceInfo`.
    GetInterfaceInfo {
        /// Restrict the reply to one interface when set.
        ifname: Option<String>,
    },

    /// Retrieve the raw configuration document text. Returns
    /// `BusResponse::ConfigText`.
    GetConfig,

    /// Replace the configuration document with the given YAML text.
    /// The daemon validates by compiling first; an invalid document is
    /// rejected without touching the running configuration.
    UpdateConfig(String),

    /// Re-read the configuration file and recompile.
    ReloadConfig,
}
