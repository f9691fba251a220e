//! Link-speed resolution capability. The compiler never shells out
//! itself: callers inject a provider (the daemon wires in an ethtool
//! probe, tests wire in a fixed value).

/// Fallback applied when the negotiated speed cannot be determined:
/// 1 Gbit/s.
pub const DEFAULT_LINKSPEED_BPS: i64 = 1_000_000_000;

/// Resolves the negotiated link speed of an interface.
pub trait LinkSpeedProvider {
    /// The speed in bits/sec, or `None` when it cannot be determined.
    /// Probe failure is not a compile error; the compiler substitutes
    /// [`DEFAULT_LINKSPEED_BPS`] and logs a warning.
    fn linkspeed_bps(&self, ifname: &str) -> Option<i64>;
}

/// A provider that reports the same speed for every interface. Handy
/// for tests and for deployments with a known uniform link rate.
#[derive(Copy, Clone, Debug)]
pub struct FixedLinkSpeed(pub i64);

impl LinkSpeedProvider for FixedLinkSpeed {
    fn linkspeed_bps(&self, _ifname: &str) -> Option<i64> {
        Some(self.0)
    }
}
