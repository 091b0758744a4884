// src/core/config.rs

use std::path::PathBuf;
use std::time::Duration;

/// Public resolvers queried in parallel for every forward lookup.
pub const PUBLIC_DNS_RESOLVERS: &[&str] = &[
    "208.67.222.222",
    "1.1.1.1",
    "8.8.8.8",
    "8.26.56.26",
    "9.9.9.9",
    "64.6.65.6",
    "91.239.100.100",
    "185.228.168.168",
    "77.88.8.7",
    "156.154.70.1",
    "198.101.242.72",
    "176.103.130.130",
];

/// How many times each resolver is asked the same question.
pub const DEFAULT_DNS_REPEATS: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_REDIRECT_HOPS: usize = 10;
pub const DEFAULT_GEO_DATABASE: &str = "GeoLite2-City.mmdb";

/// Runtime settings for a scan. Built once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub resolvers: Vec<String>,
    pub dns_repeats: usize,
    /// Deadline for every external command.
    pub command_timeout: Duration,
    /// Deadline for every HTTP request.
    pub http_timeout: Duration,
    pub http_port: u16,
    pub https_port: u16,
    pub max_redirect_hops: usize,
    pub geo_database: PathBuf,
    pub host_concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            resolvers: PUBLIC_DNS_RESOLVERS.iter().map(|r| r.to_string()).collect(),
            dns_repeats: DEFAULT_DNS_REPEATS,
            command_timeout: DEFAULT_TIMEOUT,
            http_timeout: DEFAULT_TIMEOUT,
            http_port: 80,
            https_port: 443,
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
            geo_database: PathBuf::from(DEFAULT_GEO_DATABASE),
            host_concurrency: 1,
        }
    }
}

impl ScanConfig {
    /// Base URL of the plaintext endpoint of `hostname`.
    pub fn http_url(&self, hostname: &str) -> String {
        format!("http://{}:{}", hostname, self.http_port)
    }

    /// Base URL of the TLS endpoint of `hostname`.
    pub fn https_url(&self, hostname: &str) -> String {
        format!("https://{}:{}", hostname, self.https_port)
    }
}
