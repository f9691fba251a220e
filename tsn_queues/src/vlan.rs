use crate::commands::{shaping_commands, teardown_commands, vlan_add_commands, vlan_link_name};
use crate::tc_control::{execute, QueueError};
use std::collections::BTreeMap;
use tracing::info;
use tsn_compiler::InterfaceDescriptor;

/// The VLAN link name for an interface/VLAN pair, e.g. `eth1.10`.
pub fn vlan_name(ifname: &str, vlan_id: u16) -> String {
    vlan_link_name(ifname, vlan_id)
}

/// Create the VLAN link for a compiled interface and install its
/// shaping discipline. Commands run in order; the first failure
/// aborts the sequence.
pub fn create_vlan(
    descriptor: &InterfaceDescriptor,
    vlan_id: u16,
    egress_qos_map: &BTreeMap<u8, u8>,
) -> Result<(), QueueError> {
    info!(
        "Creating {} with {} traffic class(es)",
        vlan_name(&descriptor.ifname, vlan_id),
        descriptor.num_tc()
    );
    for command in vlan_add_commands(&descriptor.ifname, vlan_id, egress_qos_map) {
        execute(&command)?;
    }
    for command in shaping_commands(descriptor) {
        execute(&command)?;
    }
    Ok(())
}

/// Remove the VLAN link and the interface's root qdisc.
pub fn delete_vlan(ifname: &str, vlan_id: u16) -> Result<(), QueueError> {
    info!("Deleting {}", vlan_name(ifname, vlan_id));
    for command in teardown_commands(ifname, vlan_id) {
        execute(&command)?;
    }
    Ok(())
}
