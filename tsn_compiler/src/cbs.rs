//! IEEE 802.1Qav credit-based shaper math.
//!
//! Historical variants of this calculation disagreed on two points: some
//! used a fixed non-SR frame constant where the standard uses the
//! class's own measured max frame, and some scaled the slopes by 1/1000.
//! This implementation follows the standard formulas; the slopes stay in
//! bits/sec and the credits derive from the measured frame sums.

use serde::{Deserialize, Serialize};
use tsn_config::ConfigError;

/// One stream reservation, already normalized to canonical units.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Stream {
    /// Reserved bandwidth, bits/sec.
    pub bandwidth: i64,
    /// Largest frame, bits.
    pub max_frame: i64,
}

/// Computed credit parameters for one SR class, in the units the `cbs`
/// qdisc expects (slopes in bits/sec, credits in bits).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditDescriptor {
    /// Credit accrual rate while waiting to transmit.
    pub idleslope: i64,
    /// Credit depletion rate while transmitting. `idleslope - linkspeed`,
    /// so non-positive whenever the reservation fits the link.
    pub sendslope: i64,
    /// Upper credit bound.
    pub hicredit: i64,
    /// Lower credit bound (non-positive).
    pub locredit: i64,
}

/// Compute credit parameters for both SR classes.
///
/// Class B's high credit is inflated by the worst-case blocking from
/// class A's largest frame: B only transmits in the gaps A leaves, so
/// the class-B term divides by the link capacity left over after A's
/// reservation. A class-A reservation at or above the link rate makes
/// that denominator meaningless and fails compilation outright.
///
/// A class with no streams gets no descriptor.
pub fn calc_credits(
    ifname: &str,
    streams_a: &[Stream],
    streams_b: &[Stream],
    linkspeed: i64,
) -> Result<(Option<CreditDescriptor>, Option<CreditDescriptor>), ConfigError> {
    let idleslope_a: i64 = streams_a.iter().map(|s| s.bandwidth).sum();
    let max_frame_a: i64 = streams_a.iter().map(|s| s.max_frame).sum();

    if idleslope_a >= linkspeed {
        return Err(ConfigError::Oversubscribed {
            ifname: ifname.to_string(),
            idleslope: idleslope_a,
            linkspeed,
        });
    }

    let credits_a = if streams_a.is_empty() {
        None
    } else {
        let sendslope_a = idleslope_a - linkspeed;
        Some(CreditDescriptor {
            idleslope: idleslope_a,
            sendslope: sendslope_a,
            hicredit: ceil_div(idleslope_a as f64 * max_frame_a as f64, linkspeed as f64),
            locredit: ceil_div(sendslope_a as f64 * max_frame_a as f64, linkspeed as f64),
        })
    };

    let credits_b = if streams_b.is_empty() {
        None
    } else {
        let idleslope_b: i64 = streams_b.iter().map(|s| s.bandwidth).sum();
        let max_frame_b: i64 = streams_b.iter().map(|s| s.max_frame).sum();
        let sendslope_b = idleslope_b - linkspeed;
        let hicredit_b = (idleslope_b as f64
            * (max_frame_b as f64 / (linkspeed - idleslope_a) as f64
                + max_frame_a as f64 / linkspeed as f64))
            .ceil() as i64;
        Some(CreditDescriptor {
            idleslope: idleslope_b,
            sendslope: sendslope_b,
            hicredit: hicredit_b,
            locredit: ceil_div(sendslope_b as f64 * max_frame_b as f64, linkspeed as f64),
        })
    };

    Ok((credits_a, credits_b))
}

fn ceil_div(numerator: f64, denominator: f64) -> i64 {
    (numerator / denominator).ceil() as i64
}

#[cfg(test)]
mod test {
    use super::*;

    const GIGABIT: i64 = 1_000_000_000;

    #[test]
    fn reference_scenario() {
        // 1 Gbit link, one 100 Mbit class-A stream and one 50 Mbit
        // class-B stream, both with 1542-byte (12336-bit) frames.
        let a = [Stream {
            bandwidth: 100_000_000,
            max_frame: 12_336,
        }];
        let b = [Stream {
            bandwidth: 50_000_000,
            max_frame: 12_336,
        }];
        let (credits_a, credits_b) = calc_credits("eth1", &a, &b, GIGABIT).unwrap();
        let credits_a = credits_a.unwrap();
        let credits_b = credits_b.unwrap();

        assert_eq!(credits_a.idleslope, 100_000_000);
        assert_eq!(credits_a.sendslope, -900_000_000);
        // ceil(100e6 * 12336 / 1e9)
        assert_eq!(credits_a.hicredit, 1_234);
        // ceil(-900e6 * 12336 / 1e9)
        assert_eq!(credits_a.locredit, -11_102);

        assert_eq!(credits_b.idleslope, 50_000_000);
        assert_eq!(credits_b.sendslope, -950_000_000);
        // ceil(50e6 * (12336/900e6 + 12336/1e9))
        assert_eq!(credits_b.hicredit, 1_303);
        // ceil(-950e6 * 12336 / 1e9)
        assert_eq!(credits_b.locredit, -11_719);
    }

    #[test]
    fn slopes_signed_as_expected_below_link_rate() {
        let a = [Stream {
            bandwidth: 1_000_000,
            max_frame: 12_336,
        }];
        let (credits_a, _) = calc_credits("eth1", &a, &[], GIGABIT).unwrap();
        let credits_a = credits_a.unwrap();
        assert!(credits_a.sendslope < 0);
        assert!(credits_a.hicredit >= 0);
        assert!(credits_a.locredit <= 0);
    }

    #[test]
    fn class_b_alone_is_fine() {
        let b = [Stream {
            bandwidth: 50_000_000,
            max_frame: 12_336,
        }];
        let (credits_a, credits_b) = calc_credits("eth1", &[], &b, GIGABIT).unwrap();
        assert!(credits_a.is_none());
        let credits_b = credits_b.unwrap();
        assert_eq!(credits_b.idleslope, 50_000_000);
        // no class A: the blocking term degenerates to the plain formula
        assert_eq!(credits_b.hicredit, 617);
    }

    #[test]
    fn class_a_at_link_rate_fails() {
        let a = [Stream {
            bandwidth: GIGABIT,
            max_frame: 12_336,
        }];
        let err = calc_credits("eth1", &a, &[], GIGABIT).unwrap_err();
        assert!(matches!(err, ConfigError::Oversubscribed { .. }));
    }

    #[test]
    fn class_a_reservations_accumulate() {
        let a = [
            Stream {
                bandwidth: 600_000_000,
                max_frame: 12_336,
            },
            Stream {
                bandwidth: 500_000_000,
                max_frame: 12_336,
            },
        ];
        let err = calc_credits("eth1", &a, &[], GIGABIT).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Oversubscribed {
                idleslope: 1_100_000_000,
                ..
            }
        ));
    }
}
