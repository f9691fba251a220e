//! Pure construction of the `tc`/`ip` command lines a descriptor
//! installs. Nothing here executes anything.

use crate::tc_control::ShellCommand;
use std::collections::BTreeMap;
use tsn_compiler::{GateEntry, InterfaceDescriptor, ShapingConfig};

/// Major number of the root qdisc handle for both shapers.
pub const ROOT_HANDLE: u16 = 100;

/// Fixed earliest-txtime delta handed to the `etf` child of each `cbs`
/// class, nanoseconds.
pub const CBS_ETF_DELTA_NS: i64 = 500_000;

/// `taprio` flag bit selecting txtime-assist mode; required for
/// `txtime-delay` to be accepted.
const TAPRIO_FLAGS_TXTIME_ASSIST: u32 = 0x1;

/// The VLAN link name for an interface/VLAN pair, e.g. `eth1.10`.
pub fn vlan_link_name(ifname: &str, vlan_id: u16) -> String {
    format!("{ifname}.{vlan_id}")
}

/// Commands creating the VLAN link with its egress priority map and
/// bringing it up.
pub fn vlan_add_commands(
    ifname: &str,
    vlan_id: u16,
    egress_qos_map: &BTreeMap<u8, u8>,
) -> Vec<ShellCommand> {
    let name = vlan_link_name(ifname, vlan_id);
    let mut add = vec![
        "link".to_string(),
        "add".to_string(),
        "link".to_string(),
        ifname.to_string(),
        "name".to_string(),
        name.clone(),
        "type".to_string(),
        "vlan".to_string(),
        "id".to_string(),
        vlan_id.to_string(),
    ];
    if !egress_qos_map.is_empty() {
        add.push("egress-qos-map".to_string());
        for (skb_priority, vlan_priority) in egress_qos_map {
            add.push(format!("{skb_priority}:{vlan_priority}"));
        }
    }
    vec![
        ShellCommand::new("ip", add),
        ShellCommand::new("ip", ["link", "set", "up", name.as_str()]),
    ]
}

/// Commands tearing the VLAN link and the root qdisc back down.
pub fn teardown_commands(ifname: &str, vlan_id: u16) -> Vec<ShellCommand> {
    let name = vlan_link_name(ifname, vlan_id);
    vec![
        ShellCommand::new("ip", ["link", "del", name.as_str()]),
        ShellCommand::new("tc", ["qdisc", "delete", "dev", ifname, "root"]),
    ]
}

/// Commands installing a descriptor's shaping discipline. Empty for an
/// unshaped interface.
pub fn shaping_commands(descriptor: &InterfaceDescriptor) -> Vec<ShellCommand> {
    match &descriptor.shaping {
        ShapingConfig::None => Vec::new(),
        ShapingConfig::Cbs { credits, .. } => {
            let mut commands = vec![mqprio_command(descriptor)];
            for class_credit in credits {
                // tc queue indices are 1-based under the root handle
                let queue = class_credit.tc + 1;
                let child_handle = ROOT_HANDLE + queue as u16;
                commands.push(ShellCommand::new(
                    "tc",
                    [
                        "qdisc".to_string(),
                        "replace".to_string(),
                        "dev".to_string(),
                        descriptor.ifname.clone(),
                        "parent".to_string(),
                        format!("{ROOT_HANDLE}:{queue}"),
                        "handle".to_string(),
                        format!("{child_handle}:"),
                        "cbs".to_string(),
                        "idleslope".to_string(),
                        class_credit.credit.idleslope.to_string(),
                        "sendslope".to_string(),
                        class_credit.credit.sendslope.to_string(),
                        "hicredit".to_string(),
                        class_credit.credit.hicredit.to_string(),
                        "locredit".to_string(),
                        class_credit.credit.locredit.to_string(),
                        "offload".to_string(),
                        "1".to_string(),
                    ],
                ));
                commands.push(ShellCommand::new(
                    "tc",
                    [
                        "qdisc".to_string(),
                        "add".to_string(),
                        "dev".to_string(),
                        descriptor.ifname.clone(),
                        "parent".to_string(),
                        format!("{child_handle}:1"),
                        "etf".to_string(),
                        "clockid".to_string(),
                        "CLOCK_TAI".to_string(),
                        "delta".to_string(),
                        CBS_ETF_DELTA_NS.to_string(),
                        "offload".to_string(),
                    ],
                ));
            }
            commands
        }
        ShapingConfig::Tas {
            base_time,
            txtime_delay_ns,
            entries,
        } => {
            let mut args = vec![
                "qdisc".to_string(),
                "replace".to_string(),
                "dev".to_string(),
                descriptor.ifname.clone(),
                "parent".to_string(),
                "root".to_string(),
                "handle".to_string(),
                format!("{ROOT_HANDLE}"),
                "taprio".to_string(),
                "num_tc".to_string(),
                descriptor.num_tc().to_string(),
                "map".to_string(),
            ];
            args.extend(descriptor.tc_map.as_array().iter().map(|tc| tc.to_string()));
            args.push("queues".to_string());
            args.extend(descriptor.queues.iter().cloned());
            args.push("base-time".to_string());
            args.push(base_time.to_string());
            for entry in entries {
                args.extend(sched_entry(entry));
            }
            args.extend([
                "flags".to_string(),
                format!("0x{TAPRIO_FLAGS_TXTIME_ASSIST:x}"),
                "txtime-delay".to_string(),
                txtime_delay_ns.to_string(),
                "clockid".to_string(),
                "CLOCK_TAI".to_string(),
            ]);

            vec![
                ShellCommand::new("tc", args),
                ShellCommand::new(
                    "tc",
                    [
                        "qdisc".to_string(),
                        "replace".to_string(),
                        "dev".to_string(),
                        descriptor.ifname.clone(),
                        "parent".to_string(),
                        format!("{ROOT_HANDLE}:1"),
                        "etf".to_string(),
                        "clockid".to_string(),
                        "CLOCK_TAI".to_string(),
                        "delta".to_string(),
                        txtime_delay_ns.to_string(),
                        "offload".to_string(),
                        "skip_sock_check".to_string(),
                    ],
                ),
            ]
        }
    }
}

fn mqprio_command(descriptor: &InterfaceDescriptor) -> ShellCommand {
    let mut args = vec![
        "qdisc".to_string(),
        "add".to_string(),
        "dev".to_string(),
        descriptor.ifname.clone(),
        "parent".to_string(),
        "root".to_string(),
        "handle".to_string(),
        format!("{ROOT_HANDLE}"),
        "mqprio".to_string(),
        "num_tc".to_string(),
        descriptor.num_tc().to_string(),
        "map".to_string(),
    ];
    args.extend(descriptor.tc_map.as_array().iter().map(|tc| tc.to_string()));
    args.push("queues".to_string());
    args.extend(descriptor.queues.iter().cloned());
    args.push("hw".to_string());
    args.push("0".to_string());
    ShellCommand::new("tc", args)
}

fn sched_entry(entry: &GateEntry) -> [String; 4] {
    // tc parses the gate mask in base 16, so it must be rendered as hex
    [
        "sched-entry".to_string(),
        "S".to_string(),
        format!("{:#x}", entry.gate_mask),
        entry.duration_ns.to_string(),
    ]
}

#[cfg(test)]
mod test {
    use super::*;
    use tsn_compiler::{compile_document, FixedLinkSpeed};
    use tsn_config::ConfigDocument;

    fn compile(yaml: &str) -> InterfaceDescriptor {
        let doc = ConfigDocument::parse(yaml).unwrap();
        compile_document(&doc, &FixedLinkSpeed(1_000_000_000))
            .unwrap()
            .remove(0)
    }

    fn rendered(commands: &[ShellCommand]) -> Vec<String> {
        commands.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn cbs_command_sequence() {
        let desc = compile(
            r#"
nics:
  eth1:
    cbs:
      2: { class: b, bandwidth: 50Mbps, max_frame: 1542B }
      3: { class: a, bandwidth: 100Mbps, max_frame: 1542B }
"#,
        );
        let commands = rendered(&shaping_commands(&desc));
        assert_eq!(commands.len(), 5);
        assert_eq!(
            commands[0],
            "tc qdisc add dev eth1 parent root handle 100 mqprio num_tc 3 \
             map 2 2 1 0 2 2 2 2 2 2 2 2 2 2 2 2 queues 1@0 1@1 1@2 hw 0"
        );
        assert_eq!(
            commands[1],
            "tc qdisc replace dev eth1 parent 100:1 handle 101: cbs \
             idleslope 100000000 sendslope -900000000 hicredit 1234 locredit -11102 offload 1"
        );
        assert_eq!(
            commands[2],
            "tc qdisc add dev eth1 parent 101:1 etf clockid CLOCK_TAI delta 500000 offload"
        );
        assert_eq!(
            commands[3],
            "tc qdisc replace dev eth1 parent 100:2 handle 102: cbs \
             idleslope 50000000 sendslope -950000000 hicredit 1303 locredit -11719 offload 1"
        );
        assert_eq!(
            commands[4],
            "tc qdisc add dev eth1 parent 102:1 etf clockid CLOCK_TAI delta 500000 offload"
        );
    }

    #[test]
    fn taprio_command_sequence() {
        let desc = compile(
            r#"
nics:
  eth2:
    tas:
      txtime_delay: 500us
      schedule:
        - { time: 100us, prio: [3] }
        - { time: 100us, prio: [] }
"#,
        );
        let commands = rendered(&shaping_commands(&desc));
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0],
            "tc qdisc replace dev eth2 parent root handle 100 taprio num_tc 2 \
             map 1 1 1 0 1 1 1 1 1 1 1 1 1 1 1 1 queues 1@0 1@1 base-time 0 \
             sched-entry S 0x1 100000 sched-entry S 0x0 100000 \
             flags 0x1 txtime-delay 500000 clockid CLOCK_TAI"
        );
        assert_eq!(
            commands[1],
            "tc qdisc replace dev eth2 parent 100:1 etf clockid CLOCK_TAI \
             delta 500000 offload skip_sock_check"
        );
    }

    #[test]
    fn unshaped_interface_emits_nothing() {
        let desc = compile("nics:\n  eth9: {}\n");
        assert!(shaping_commands(&desc).is_empty());
    }

    #[test]
    fn vlan_lifecycle_commands() {
        let mut qos_map = BTreeMap::new();
        qos_map.insert(1u8, 3u8);
        qos_map.insert(2u8, 5u8);

        let commands = rendered(&vlan_add_commands("eth1", 10, &qos_map));
        assert_eq!(
            commands,
            vec![
                "ip link add link eth1 name eth1.10 type vlan id 10 egress-qos-map 1:3 2:5",
                "ip link set up eth1.10",
            ]
        );

        let commands = rendered(&teardown_commands("eth1", 10));
        assert_eq!(
            commands,
            vec!["ip link del eth1.10", "tc qdisc delete dev eth1 root"]
        );
    }
}
