// src/core/scanner/rtt_scanner.rs

use std::net::IpAddr;

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::core::config::ScanConfig;
use crate::core::models::{ProbeOutcome, RttRange};
use crate::core::scanner::runner::{CommandOutput, CommandRunner};

const SHELL: &str = "bash";

/// `real<TAB>0m0.123s` as printed by the shell `time` keyword.
static RE_REAL_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"real\s+(\d+)m(\d+(?:\.\d+)?)s").unwrap());

/// Opens a telnet session to the TLS port and closes it immediately, under `time`.
fn timing_script(address: IpAddr, port: u16) -> String {
    format!(r"time (printf '\035close\r\n' | telnet {address} {port})")
}

/// Messages telnet prints when it never reached the remote end.
const CONNECT_FAILURES: &[&str] = &["Unable to connect", "could not resolve", "Name or service not known"];

/// True when telnet gave up before a connection was established.
fn connect_failed(output: &CommandOutput) -> bool {
    CONNECT_FAILURES
        .iter()
        .any(|marker| output.stderr.contains(marker) || output.stdout.contains(marker))
}

/// Converts the elapsed wall time reported by `time` to milliseconds.
pub fn parse_elapsed_ms(stderr: &str) -> Option<f64> {
    let caps = RE_REAL_TIME.captures(stderr)?;
    let minutes: f64 = caps[1].parse().ok()?;
    let seconds: f64 = caps[2].parse().ok()?;
    Some(60.0 * 1000.0 * minutes + 1000.0 * seconds)
}

/// Times a connection to every address concurrently and keeps the extremes.
///
/// Addresses that time out, refuse the connection, or print nothing
/// recognizable contribute no sample. A missing shell or telnet fails the whole call.
pub async fn rtt_range<R: CommandRunner>(
    runner: &R,
    config: &ScanConfig,
    addresses: &[IpAddr],
) -> ProbeOutcome<RttRange> {
    let outcomes = join_all(addresses.iter().map(|&address| {
        let args = vec!["-c".to_string(), timing_script(address, config.https_port)];
        async move { (address, runner.run(SHELL, &args).await) }
    }))
    .await;

    let mut samples = Vec::with_capacity(outcomes.len());
    for (address, outcome) in outcomes {
        let Some(output) = outcome? else {
            debug!(%address, "No timing sample.");
            continue;
        };
        if connect_failed(&output) {
            debug!(%address, "Connection failed; no timing sample.");
            continue;
        }
        match parse_elapsed_ms(&output.stderr) {
            Some(ms) => samples.push(ms),
            None => debug!(%address, "Unrecognized timing output."),
        }
    }

    let range = RttRange::from_samples(&samples);
    info!(samples = samples.len(), ?range, "RTT probe finished.");
    Ok(range)
}
