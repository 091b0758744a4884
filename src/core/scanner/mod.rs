// src/core/scanner/mod.rs

// Each probe lives in its own module; this file assembles their outcomes into
// one `HostRecord` per hostname.
pub mod dns_scanner;
pub mod geo_scanner;
pub mod http_scanner;
pub mod rtt_scanner;
pub mod runner;
pub mod tls_scanner;

use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use hickory_resolver::proto::rr::RecordType;
use tracing::{debug, info, warn};

use crate::core::config::ScanConfig;
use crate::core::models::{HostRecord, ProbeOutcome};
use self::geo_scanner::GeoLocator;
use self::runner::CommandRunner;

/// Seconds since the Unix epoch, floored to two decimals.
pub fn scan_timestamp() -> f64 {
    let centis = Utc::now().timestamp_millis().div_euclid(10);
    centis as f64 / 100.0
}

/// Drives every probe for a host and enforces the all-or-nothing record rule.
pub struct Scanner<R> {
    runner: R,
    geo: Box<dyn GeoLocator>,
    config: ScanConfig,
}

impl<R: CommandRunner> Scanner<R> {
    pub fn new(runner: R, geo: Box<dyn GeoLocator>, config: ScanConfig) -> Self {
        Self { runner, geo, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Runs the full probe sequence against one hostname.
    ///
    /// # Returns
    /// * `Ok(Some(record))` - every probe ran; the record is ready to persist.
    /// * `Ok(None)` - the host has no IPv4 address and is skipped.
    /// * `Err(_)` - a probe could not run; the host is discarded.
    pub async fn create_entry(&self, hostname: &str) -> ProbeOutcome<HostRecord> {
        let scan_time = scan_timestamp();
        let runner = &self.runner;
        let config = &self.config;

        let Some(ipv4) = dns_scanner::resolve(runner, config, hostname, RecordType::A).await? else {
            return Ok(None);
        };

        let (ipv6, insecure_http, tls_versions, hsts, rdns_names, rtt_range) = tokio::join!(
            dns_scanner::resolve(runner, config, hostname, RecordType::AAAA),
            http_scanner::insecure_http_reachable(config, hostname),
            tls_scanner::supported_versions(runner, config, hostname),
            http_scanner::hsts_present(config, hostname),
            dns_scanner::rdns_names(runner, &ipv4),
            rtt_scanner::rtt_range(runner, config, &ipv4),
        );

        let speaks_tls = matches!(&tls_versions, Ok(Some(v)) if !v.is_empty());
        let (http_server, redirect_to_https, root_ca) = tokio::join!(
            http_scanner::server_banner(config, hostname, insecure_http),
            http_scanner::redirects_to_https(config, hostname, insecure_http),
            async {
                if speaks_tls {
                    tls_scanner::certificate_issuer(runner, config, hostname).await
                } else {
                    Ok(None)
                }
            },
        );

        let geo_locations = geo_scanner::geolocations(self.geo.as_ref(), &ipv4);

        // Every probe has finished; only now does a hard failure void the record.
        let record = HostRecord {
            scan_time,
            ipv4: to_strings(&ipv4),
            ipv6: to_strings(&ipv6?.unwrap_or_default()),
            insecure_http,
            http_server,
            redirect_to_https,
            hsts,
            tls_versions: tls_versions?.unwrap_or_default(),
            root_ca: root_ca?,
            rdns_names: rdns_names?.unwrap_or_default(),
            rtt_range: rtt_range?,
            geo_locations,
        };
        Ok(Some(record))
    }

    /// Scans every hostname and keeps the records that survived.
    ///
    /// `on_start` is called as each hostname begins. Hosts run one at a time
    /// unless `host_concurrency` allows more.
    pub async fn scan_hosts<F>(&self, hostnames: &[String], on_start: F) -> BTreeMap<String, HostRecord>
    where
        F: Fn(&str),
    {
        let on_start = &on_start;
        let mut entries = stream::iter(hostnames)
            .map(|hostname| async move {
                on_start(hostname);
                (hostname, self.create_entry(hostname).await)
            })
            .buffered(self.config.host_concurrency.max(1));

        let mut results = BTreeMap::new();
        while let Some((hostname, outcome)) = entries.next().await {
            match outcome {
                Ok(Some(record)) => {
                    info!(hostname = %hostname, "Host record emitted.");
                    results.insert(hostname.clone(), record);
                }
                Ok(None) => info!(hostname = %hostname, "Host skipped: no IPv4 address."),
                Err(e) => warn!(hostname = %hostname, error = %e, "Host discarded."),
            }
        }
        debug!(scanned = hostnames.len(), kept = results.len(), "Scan finished.");
        results
    }
}

fn to_strings(addresses: &[IpAddr]) -> Vec<String> {
    addresses.iter().map(IpAddr::to_string).collect()
}
