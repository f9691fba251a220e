use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use tsn_compiler::LinkSpeedProvider;
use tsn_config::Magnitude;

// ethtool prints e.g. "Speed: 1000Mb/s"; older versions used "Mbps".
static SPEED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Speed: (?P<speed>\d+(?:|k|M|G)b[p/]s)").expect("static regex")
});

/// A hung probe must not stall a compile pass.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolves link speed by shelling out to `ethtool`. Any failure --
/// missing tool, no negotiated link, unparseable output, timeout --
/// reports `None`, which the compiler turns into the documented
/// 1 Gbit/s default.
#[derive(Copy, Clone, Debug, Default)]
pub struct EthtoolLinkSpeed;

impl LinkSpeedProvider for EthtoolLinkSpeed {
    fn linkspeed_bps(&self, ifname: &str) -> Option<i64> {
        match run_ethtool(ifname) {
            Ok(stdout) => parse_ethtool_output(ifname, &stdout),
            Err(e) => {
                warn!("{ifname}: ethtool probe failed: {e}");
                None
            }
        }
    }
}

/// Run `ethtool <ifname>` with a deadline, killing it on expiry.
fn run_ethtool(ifname: &str) -> std::io::Result<String> {
    let mut child = Command::new("ethtool")
        .arg(ifname)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let deadline = Instant::now() + PROBE_TIMEOUT;
    while child.try_wait()?.is_none() {
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "probe exceeded deadline",
            ));
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    // ethtool output is well under the pipe buffer, so reading after
    // exit cannot deadlock.
    let mut stdout = String::new();
    if let Some(mut pipe) = child.stdout.take() {
        pipe.read_to_string(&mut stdout)?;
    }
    Ok(stdout)
}

fn parse_ethtool_output(ifname: &str, output: &str) -> Option<i64> {
    let Some(caps) = SPEED_RE.captures(output) else {
        warn!("{ifname}: no negotiated speed in ethtool output");
        return None;
    };
    let speed = &caps["speed"];
    match Magnitude::from(speed).as_bps() {
        Ok(bps) => {
            debug!("{ifname}: ethtool reports {speed}");
            Some(bps)
        }
        Err(e) => {
            warn!("{ifname}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ETHTOOL_OUTPUT: &str = "Settings for eth1:
\tSupported ports: [ TP ]
\tSpeed: 1000Mb/s
\tDuplex: Full
\tLink detected: yes
";

    #[test]
    fn parses_negotiated_speed() {
        assert_eq!(
            parse_ethtool_output("eth1", ETHTOOL_OUTPUT),
            Some(1_000_000_000)
        );
    }

    #[test]
    fn no_link_reports_none() {
        assert_eq!(
            parse_ethtool_output("eth1", "Settings for eth1:\n\tSpeed: Unknown!\n"),
            None
        );
    }
}
