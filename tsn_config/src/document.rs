use crate::{ConfigError, Magnitude};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// The whole configuration document: one entry per physical interface.
///
/// `BTreeMap` rather than `HashMap` throughout: interface and priority
/// iteration order feeds traffic-class allocation, which must be
/// identical on every compile of the same document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Interface name to per-interface shaping configuration.
    #[serde(default)]
    pub nics: BTreeMap<String, NicConfig>,
}

/// Per-interface configuration. At most one of `cbs`/`tas` may be
/// present; the descriptor assembler rejects the combination.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NicConfig {
    /// Credit-based shaper section: priority value to stream entry.
    #[serde(default)]
    pub cbs: Option<BTreeMap<u8, CbsPriority>>,

    /// Time-aware shaper section.
    #[serde(default)]
    pub tas: Option<TasSection>,

    /// VLAN id to skb-priority -> VLAN-priority egress map, consumed
    /// by the emitter when the VLAN link is created.
    #[serde(default, rename = "egress-qos-map")]
    pub egress_qos_map: BTreeMap<u16, BTreeMap<u8, u8>>,
}

/// The shaping class a stream belongs to. Class A is the
/// higher-priority reservation; class B only transmits in the gaps
/// class A leaves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamClass {
    /// SR class A.
    A,
    /// SR class B.
    B,
}

/// One stream reservation keyed by priority inside a `cbs` section.
///
/// Leaves are `Option` so the assembler can report precisely which key
/// is missing instead of failing the whole document parse.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CbsPriority {
    /// Which SR class the stream belongs to.
    pub class: Option<StreamClass>,
    /// Reserved bandwidth (rate magnitude).
    pub bandwidth: Option<Magnitude>,
    /// Largest frame the stream will send (size magnitude).
    pub max_frame: Option<Magnitude>,
}

/// A `tas` section: a cyclic schedule plus the earliest-txtime fudge
/// handed to the `etf` child qdisc.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TasSection {
    /// Delta handed to `etf` (time magnitude).
    pub txtime_delay: Option<Magnitude>,
    /// Gate windows in cycle order.
    pub schedule: Option<Vec<ScheduleEntry>>,
}

/// One window of the gate schedule: how long it lasts and which
/// priorities may transmit. An empty `prio` list is a valid guard
/// band during which nothing transmits.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Window duration (time magnitude).
    pub time: Option<Magnitude>,
    /// Priorities whose gates are open during this window.
    #[serde(default)]
    pub prio: Vec<i64>,
}

impl ConfigDocument {
    /// Load and parse a document from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let document = Self::parse(&raw)?;
        info!(
            "Loaded configuration for {} interface(s) from {}",
            document.nics.len(),
            path.display()
        );
        Ok(document)
    }

    /// Parse a document from YAML text.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const EXAMPLE: &str = r#"
nics:
  eth1:
    egress-qos-map:
      10:
        1: 3
        2: 5
    cbs:
      3:
        class: a
        bandwidth: 100Mbps
        max_frame: 1542B
      2:
        class: b
        bandwidth: 50Mbps
        max_frame: 1542B
  eth2:
    tas:
      txtime_delay: 500us
      schedule:
        - time: 100us
          prio: [3]
        - time: 100us
          prio: []
"#;

    #[test]
    fn parses_example_document() {
        let doc = ConfigDocument::parse(EXAMPLE).unwrap();
        assert_eq!(doc.nics.len(), 2);

        let eth1 = &doc.nics["eth1"];
        let cbs = eth1.cbs.as_ref().unwrap();
        assert_eq!(cbs[&3].class, Some(StreamClass::A));
        assert_eq!(cbs[&3].bandwidth.as_ref().unwrap().as_bps().unwrap(), 100_000_000);
        assert_eq!(eth1.egress_qos_map[&10][&1], 3);

        let eth2 = &doc.nics["eth2"];
        let tas = eth2.tas.as_ref().unwrap();
        assert_eq!(
            tas.txtime_delay.as_ref().unwrap().as_nanos().unwrap(),
            500_000
        );
        let schedule = tas.schedule.as_ref().unwrap();
        assert_eq!(schedule.len(), 2);
        assert!(schedule[1].prio.is_empty());
    }

    #[test]
    fn integer_magnitudes_are_accepted() {
        let doc = ConfigDocument::parse(
            "nics:\n  eth0:\n    tas:\n      txtime_delay: 500000\n      schedule: []\n",
        )
        .unwrap();
        let tas = doc.nics["eth0"].tas.as_ref().unwrap();
        assert_eq!(tas.txtime_delay, Some(Magnitude::Count(500_000)));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(ConfigDocument::parse("nics: [not a mapping").is_err());
    }
}
