//! Traffic-class allocation. Priorities that appear in the
//! configuration are grouped into a compact set of 0-based class
//! indices, in order of first appearance, with one extra class appended
//! at the end as the best-effort fallback for everything unmatched.
//!
//! Allocation is driven purely by the caller's iteration order, so the
//! same document always produces the same map and the emitted `tc`
//! commands are stable across daemon restarts.

use serde::{Deserialize, Serialize};
use tsn_config::ConfigError;

/// Number of link-level priority values (0-15).
pub const PRIORITY_COUNT: usize = 16;

/// The completed priority -> traffic-class mapping for one interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficClassMap {
    classes: [u8; PRIORITY_COUNT],
    num_tc: u8,
}

impl TrafficClassMap {
    /// Total number of traffic classes, fallback included.
    pub fn num_tc(&self) -> u8 {
        self.num_tc
    }

    /// The class index a priority maps to.
    pub fn class_of(&self, priority: u8) -> u8 {
        self.classes[priority as usize & (PRIORITY_COUNT - 1)]
    }

    /// The best-effort class index. Always the last-allocated one.
    pub fn fallback_class(&self) -> u8 {
        self.num_tc - 1
    }

    /// The full 16-entry map, in priority order, as `tc ... map` wants it.
    pub fn as_array(&self) -> &[u8; PRIORITY_COUNT] {
        &self.classes
    }

    /// `count@offset` queue ranges, one hardware queue per class.
    pub fn queues(&self) -> Vec<String> {
        (0..self.num_tc).map(|tc| format!("1@{tc}")).collect()
    }
}

/// Accumulates priority groups into a [`TrafficClassMap`].
///
/// Two grouping flavours exist because the two shapers treat repeats
/// differently: a gate schedule may open the same priority in many
/// windows ([`open_group`]), while the CBS class assignment must map
/// each priority to exactly one class ([`assign_group`]).
///
/// [`open_group`]: TcMapBuilder::open_group
/// [`assign_group`]: TcMapBuilder::assign_group
#[derive(Clone, Debug, Default)]
pub struct TcMapBuilder {
    assigned: [Option<u8>; PRIORITY_COUNT],
    next_class: u8,
}

impl TcMapBuilder {
    /// An empty builder. `build()` on it yields a single best-effort
    /// class covering every priority.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group whose not-yet-seen priorities share one new class.
    /// Priorities seen in an earlier group keep their class; this is
    /// how a schedule may re-open a priority later in the cycle.
    ///
    /// Returns the class index the group's new members were given, or
    /// `None` when every member was already assigned (or the group was
    /// empty).
    pub fn open_group<I>(&mut self, priorities: I) -> Result<Option<u8>, ConfigError>
    where
        I: IntoIterator<Item = u8>,
    {
        self.group(priorities, false)
    }

    /// Add a group whose members must not already belong to another
    /// class. Used for the CBS class assignment, where a priority in
    /// both class A and class B would split one stream's reservation.
    pub fn assign_group<I>(&mut self, priorities: I) -> Result<Option<u8>, ConfigError>
    where
        I: IntoIterator<Item = u8>,
    {
        self.group(priorities, true)
    }

    fn group<I>(&mut self, priorities: I, exclusive: bool) -> Result<Option<u8>, ConfigError>
    where
        I: IntoIterator<Item = u8>,
    {
        let mut allocated = None;
        for priority in priorities {
            if priority as usize >= PRIORITY_COUNT {
                return Err(ConfigError::PriorityOutOfRange(priority as i64));
            }
            match self.assigned[priority as usize] {
                Some(existing) if exclusive && Some(existing) != allocated => {
                    return Err(ConfigError::DuplicatePriority(priority));
                }
                Some(_) => {}
                None => {
                    let class = match allocated {
                        Some(class) => class,
                        None => {
                            // Reserve room for the fallback class: at most
                            // 15 explicit classes fit in 16 queues.
                            if self.next_class as usize >= PRIORITY_COUNT - 1 {
                                return Err(ConfigError::TooManyClasses(
                                    self.next_class as usize + 2,
                                ));
                            }
                            let class = self.next_class;
                            self.next_class += 1;
                            allocated = Some(class);
                            class
                        }
                    };
                    self.assigned[priority as usize] = Some(class);
                }
            }
        }
        Ok(allocated)
    }

    /// Append the best-effort fallback class and finish the map.
    pub fn build(self) -> TrafficClassMap {
        let fallback = self.next_class;
        let mut classes = [0u8; PRIORITY_COUNT];
        for (priority, slot) in self.assigned.iter().enumerate() {
            classes[priority] = slot.unwrap_or(fallback);
        }
        TrafficClassMap {
            classes,
            num_tc: fallback + 1,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fallback_only_when_nothing_grouped() {
        let map = TcMapBuilder::new().build();
        assert_eq!(map.num_tc(), 1);
        assert_eq!(map.fallback_class(), 0);
        assert!(map.as_array().iter().all(|&tc| tc == 0));
        assert_eq!(map.queues(), vec!["1@0"]);
    }

    #[test]
    fn groups_allocate_in_first_appearance_order() {
        let mut builder = TcMapBuilder::new();
        assert_eq!(builder.open_group([5, 6]).unwrap(), Some(0));
        assert_eq!(builder.open_group([3]).unwrap(), Some(1));
        // 5 was seen before, so the group adds nothing new
        assert_eq!(builder.open_group([5]).unwrap(), None);
        let map = builder.build();

        assert_eq!(map.num_tc(), 3);
        assert_eq!(map.class_of(5), 0);
        assert_eq!(map.class_of(6), 0);
        assert_eq!(map.class_of(3), 1);
        // everything else lands on the fallback class
        assert_eq!(map.class_of(0), 2);
        assert_eq!(map.class_of(15), 2);
        assert_eq!(map.queues(), vec!["1@0", "1@1", "1@2"]);
    }

    #[test]
    fn allocation_is_order_deterministic() {
        let alloc = || {
            let mut builder = TcMapBuilder::new();
            builder.open_group([2, 4]).unwrap();
            builder.open_group([7]).unwrap();
            builder.open_group([]).unwrap();
            builder.build()
        };
        assert_eq!(alloc(), alloc());
    }

    #[test]
    fn exclusive_groups_reject_reassignment() {
        let mut builder = TcMapBuilder::new();
        builder.assign_group([3]).unwrap();
        let err = builder.assign_group([3, 2]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePriority(3)));
    }

    #[test]
    fn priorities_above_fifteen_are_rejected() {
        let mut builder = TcMapBuilder::new();
        let err = builder.open_group([16]).unwrap_err();
        assert!(matches!(err, ConfigError::PriorityOutOfRange(16)));
    }

    #[test]
    fn class_count_is_capped_by_queue_space() {
        let mut builder = TcMapBuilder::new();
        for priority in 0..15 {
            builder.open_group([priority]).unwrap();
        }
        let err = builder.open_group([15]).unwrap_err();
        assert!(matches!(err, ConfigError::TooManyClasses(_)));
    }
}
