//! The configuration compiler: turns a validated [`ConfigDocument`]
//! into one immutable [`InterfaceDescriptor`] per interface, carrying
//! exactly the parameters the queue emitter needs: a dense 0-based
//! priority-to-traffic-class map, plus per-class IEEE 802.1Qav credit
//! parameters or a compiled cyclic gate-control list.
//!
//! The compiler is a pure, synchronous transformation. It performs no
//! I/O of its own; link speed is resolved through the injected
//! [`LinkSpeedProvider`] capability so the whole pipeline is testable
//! without touching real interfaces.
//!
//! [`ConfigDocument`]: tsn_config::ConfigDocument

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

mod cbs;
mod compile;
mod linkspeed;
mod tas;
mod tc_map;

pub use cbs::{calc_credits, CreditDescriptor, Stream};
pub use compile::{compile_document, ClassCredit, InterfaceDescriptor, ShapingConfig};
pub use linkspeed::{FixedLinkSpeed, LinkSpeedProvider, DEFAULT_LINKSPEED_BPS};
pub use tas::GateEntry;
pub use tc_map::{TcMapBuilder, TrafficClassMap, PRIORITY_COUNT};
