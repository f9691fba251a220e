//! Turns compiled [`InterfaceDescriptor`]s into the Linux `tc` and
//! `ip` commands that install them: an `mqprio` or `taprio` root
//! qdisc, per-class `cbs` shapers with `etf` children, and the VLAN
//! link with its egress priority map.
//!
//! Command construction is pure and lives in `commands`; only
//! `tc_control` actually shells out, so everything above it is
//! testable without touching real interfaces.
//!
//! [`InterfaceDescriptor`]: tsn_compiler::InterfaceDescriptor

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod commands;
mod linkspeed;
mod tc_control;
mod vlan;

pub use linkspeed::EthtoolLinkSpeed;
pub use tc_control::{execute, QueueError, ShellCommand};
pub use vlan::{create_vlan, delete_vlan, vlan_name};
