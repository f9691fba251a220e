//! The descriptor assembler: walks the configuration document, decides
//! each interface's shaping mode, invokes the class allocator plus
//! exactly one of the credit calculator or the schedule compiler, and
//! returns one immutable descriptor per interface.
//!
//! Compilation is all-or-nothing across the document: one bad interface
//! fails the whole pass, so the emitter can never see a mix of compiled
//! and uncompiled interfaces from a single run.

use crate::cbs::{calc_credits, CreditDescriptor, Stream};
use crate::linkspeed::{LinkSpeedProvider, DEFAULT_LINKSPEED_BPS};
use crate::tas::{compile_schedule, GateEntry};
use crate::tc_map::{TcMapBuilder, TrafficClassMap, PRIORITY_COUNT};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tsn_config::{
    CbsPriority, ConfigDocument, ConfigError, NicConfig, StreamClass, TasSection,
};

/// Credit parameters for one SR class, tied to the traffic class (and
/// therefore hardware queue) the allocator gave it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCredit {
    /// Which SR class these parameters belong to.
    pub class: StreamClass,
    /// The traffic-class index the class's priorities map to.
    pub tc: u8,
    /// The computed credit parameters.
    pub credit: CreditDescriptor,
}

/// Which shaper an interface runs, with its compiled parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapingConfig {
    /// No shaper section present; only the VLAN/egress map applies.
    None,
    /// Credit-based shaper (IEEE 802.1Qav).
    Cbs {
        /// Link speed the credits were derived from, bits/sec.
        linkspeed: i64,
        /// Per-class credit parameters, class A first when present.
        credits: Vec<ClassCredit>,
    },
    /// Time-aware shaper (IEEE 802.1Qbv).
    Tas {
        /// Cycle start anchor, nanoseconds. Interfaces compile
        /// independently, so this is always zero for now.
        base_time: i64,
        /// Earliest-txtime delta for the `etf` child, nanoseconds.
        txtime_delay_ns: i64,
        /// The cyclic gate-control list.
        entries: Vec<GateEntry>,
    },
}

/// The assembled, immutable compile result for one interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    /// Interface the descriptor was compiled for.
    pub ifname: String,
    /// Priority -> traffic-class mapping.
    pub tc_map: TrafficClassMap,
    /// `count@offset` queue ranges, one per traffic class.
    pub queues: Vec<String>,
    /// The shaper and its parameters.
    pub shaping: ShapingConfig,
}

impl InterfaceDescriptor {
    /// Total number of traffic classes, fallback included.
    pub fn num_tc(&self) -> u8 {
        self.tc_map.num_tc()
    }
}

/// Compile every interface in the document. Interfaces are visited in
/// name order (the document stores them in a `BTreeMap`), so repeated
/// compiles of the same document yield identical descriptors.
pub fn compile_document(
    document: &ConfigDocument,
    linkspeed: &dyn LinkSpeedProvider,
) -> Result<Vec<InterfaceDescriptor>, ConfigError> {
    document
        .nics
        .iter()
        .map(|(ifname, nic)| compile_nic(ifname, nic, linkspeed))
        .collect()
}

fn compile_nic(
    ifname: &str,
    nic: &NicConfig,
    linkspeed: &dyn LinkSpeedProvider,
) -> Result<InterfaceDescriptor, ConfigError> {
    match (&nic.cbs, &nic.tas) {
        (Some(_), Some(_)) => Err(ConfigError::ModeConflict(ifname.to_string())),
        (Some(cbs), None) => compile_cbs(ifname, cbs, linkspeed),
        (None, Some(tas)) => compile_tas(ifname, tas),
        (None, None) => {
            let tc_map = TcMapBuilder::new().build();
            Ok(InterfaceDescriptor {
                ifname: ifname.to_string(),
                queues: tc_map.queues(),
                tc_map,
                shaping: ShapingConfig::None,
            })
        }
    }
}

fn resolve_linkspeed(ifname: &str, provider: &dyn LinkSpeedProvider) -> i64 {
    match provider.linkspeed_bps(ifname) {
        Some(speed) => {
            debug!("{ifname}: link speed {speed} bit/s");
            speed
        }
        None => {
            warn!(
                "{ifname}: unable to determine link speed, assuming {} bit/s",
                DEFAULT_LINKSPEED_BPS
            );
            DEFAULT_LINKSPEED_BPS
        }
    }
}

fn compile_cbs(
    ifname: &str,
    cbs: &std::collections::BTreeMap<u8, CbsPriority>,
    provider: &dyn LinkSpeedProvider,
) -> Result<InterfaceDescriptor, ConfigError> {
    let mut priorities_a = Vec::new();
    let mut priorities_b = Vec::new();
    let mut streams_a = Vec::new();
    let mut streams_b = Vec::new();

    // BTreeMap iteration gives ascending priority order, which fixes
    // the class allocation order.
    for (&priority, entry) in cbs {
        if priority as usize >= PRIORITY_COUNT {
            return Err(ConfigError::PriorityOutOfRange(priority as i64));
        }
        let path = |leaf: &str| format!("nics.{ifname}.cbs.{priority}.{leaf}");
        let class = entry
            .class
            .ok_or_else(|| ConfigError::missing_key(path("class")))?;
        let stream = Stream {
            bandwidth: entry
                .bandwidth
                .as_ref()
                .ok_or_else(|| ConfigError::missing_key(path("bandwidth")))?
                .as_bps()?,
            max_frame: entry
                .max_frame
                .as_ref()
                .ok_or_else(|| ConfigError::missing_key(path("max_frame")))?
                .as_bits()?,
        };
        match class {
            StreamClass::A => {
                priorities_a.push(priority);
                streams_a.push(stream);
            }
            StreamClass::B => {
                priorities_b.push(priority);
                streams_b.push(stream);
            }
        }
    }

    // Class A gets the first traffic class, B the next, so the shaped
    // queues sit in front of the best-effort fallback.
    let mut builder = TcMapBuilder::new();
    let tc_a = builder.assign_group(priorities_a.iter().copied())?;
    let tc_b = builder.assign_group(priorities_b.iter().copied())?;
    let tc_map = builder.build();

    let linkspeed = resolve_linkspeed(ifname, provider);
    let (credits_a, credits_b) = calc_credits(ifname, &streams_a, &streams_b, linkspeed)?;

    let mut credits = Vec::new();
    if let (Some(tc), Some(credit)) = (tc_a, credits_a) {
        credits.push(ClassCredit {
            class: StreamClass::A,
            tc,
            credit,
        });
    }
    if let (Some(tc), Some(credit)) = (tc_b, credits_b) {
        credits.push(ClassCredit {
            class: StreamClass::B,
            tc,
            credit,
        });
    }

    Ok(InterfaceDescriptor {
        ifname: ifname.to_string(),
        queues: tc_map.queues(),
        tc_map,
        shaping: ShapingConfig::Cbs { linkspeed, credits },
    })
}

fn compile_tas(ifname: &str, tas: &TasSection) -> Result<InterfaceDescriptor, ConfigError> {
    let txtime_delay_ns = tas
        .txtime_delay
        .as_ref()
        .ok_or_else(|| ConfigError::missing_key(format!("nics.{ifname}.tas.txtime_delay")))?
        .as_nanos()?;
    let schedule = tas
        .schedule
        .as_ref()
        .ok_or_else(|| ConfigError::missing_key(format!("nics.{ifname}.tas.schedule")))?;

    let mut builder = TcMapBuilder::new();
    let mut windows = Vec::with_capacity(schedule.len());
    for (index, entry) in schedule.iter().enumerate() {
        let duration_ns = entry
            .time
            .as_ref()
            .ok_or_else(|| {
                ConfigError::missing_key(format!("nics.{ifname}.tas.schedule[{index}].time"))
            })?
            .as_nanos()?;
        let mut priorities = Vec::with_capacity(entry.prio.len());
        for &priority in &entry.prio {
            if !(0..PRIORITY_COUNT as i64).contains(&priority) {
                return Err(ConfigError::PriorityOutOfRange(priority));
            }
            priorities.push(priority as u8);
        }
        builder.open_group(priorities.iter().copied())?;
        windows.push((duration_ns, priorities));
    }
    let tc_map = builder.build();
    let entries = compile_schedule(&windows, &tc_map);

    Ok(InterfaceDescriptor {
        ifname: ifname.to_string(),
        queues: tc_map.queues(),
        tc_map,
        shaping: ShapingConfig::Tas {
            base_time: 0,
            txtime_delay_ns,
            entries,
        },
    })
}
