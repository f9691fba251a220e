//! The `tsn_config` crate provides the configuration document model for
//! the TSN shaping daemon. A document is a YAML file with a top-level
//! `nics` mapping, one entry per interface, each carrying at most one of
//! a `cbs` (credit-based shaper, IEEE 802.1Qav) or `tas` (time-aware
//! shaper, IEEE 802.1Qbv) section plus VLAN egress priority maps.
//!
//! Human-friendly magnitudes ("100Mbps", "1522B", "125us") are modelled
//! by [`Magnitude`] and normalized once, at compile time, into canonical
//! integer units (bits/sec, bits, nanoseconds) by the `units` module.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

mod document;
mod errors;
pub mod units;

pub use document::{
    CbsPriority, ConfigDocument, NicConfig, ScheduleEntry, StreamClass, TasSection,
};
pub use errors::{ConfigError, ParseError};
pub use units::Magnitude;
