//! Gate-control list compilation for the time-aware shaper.

use crate::TrafficClassMap;
use serde::{Deserialize, Serialize};

/// One interval of the cyclic gate-control list: for `duration_ns`,
/// exactly the classes set in `gate_mask` may transmit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateEntry {
    /// Interval length, nanoseconds.
    pub duration_ns: i64,
    /// Bitset over traffic classes, `num_tc` bits wide. Zero is a
    /// valid guard band: no class transmits.
    pub gate_mask: u32,
}

/// Compile normalized `(duration_ns, priorities)` windows into gate
/// entries. Each entry's mask is the union of the classes its open
/// priorities map to; the caller has already validated the priorities
/// and fed the same windows, in the same order, to the class allocator.
pub(crate) fn compile_schedule(
    windows: &[(i64, Vec<u8>)],
    tc_map: &TrafficClassMap,
) -> Vec<GateEntry> {
    windows
        .iter()
        .map(|(duration_ns, priorities)| GateEntry {
            duration_ns: *duration_ns,
            gate_mask: priorities
                .iter()
                .fold(0u32, |mask, &priority| mask | 1 << tc_map.class_of(priority)),
        })
        .collect()
}
