// src/core/models.rs

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

// --- Probe Result Types ---

/// Raised when a probe could not run at all because the external program it
/// relies on is missing from the scanning machine.
///
/// This is the only failure that travels upward: a single `HardFailure` voids
/// the whole record of the host being scanned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("required program `{program}` is not available")]
pub struct HardFailure {
    pub program: String,
}

impl HardFailure {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

/// The three-way result shared by every command-backed probe.
///
/// * `Ok(Some(value))` - the probe produced data.
/// * `Ok(None)` - no data: a timeout or a benign absence such as no TLS support.
/// * `Err(HardFailure)` - the probe could not be executed.
pub type ProbeOutcome<T> = Result<Option<T>, HardFailure>;

// --- TLS Protocol Versions ---

/// The fixed enumeration of protocol labels a host record may carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    Display, EnumString, EnumIter, AsRefStr,
)]
pub enum TlsVersion {
    #[serde(rename = "SSLv2")]
    #[strum(serialize = "SSLv2")]
    Ssl2,
    #[serde(rename = "SSLv3")]
    #[strum(serialize = "SSLv3")]
    Ssl3,
    #[serde(rename = "TLSv1.0")]
    #[strum(serialize = "TLSv1.0")]
    Tls10,
    #[serde(rename = "TLSv1.1")]
    #[strum(serialize = "TLSv1.1")]
    Tls11,
    #[serde(rename = "TLSv1.2")]
    #[strum(serialize = "TLSv1.2")]
    Tls12,
    #[serde(rename = "TLSv1.3")]
    #[strum(serialize = "TLSv1.3")]
    Tls13,
}

impl TlsVersion {
    /// Versions that are actively probed with a restricted handshake.
    pub const PROBED: [TlsVersion; 4] = [
        TlsVersion::Tls10,
        TlsVersion::Tls11,
        TlsVersion::Tls12,
        TlsVersion::Tls13,
    ];

    /// The `openssl s_client` switch that restricts a handshake to this version.
    pub fn s_client_flag(self) -> Option<&'static str> {
        match self {
            TlsVersion::Ssl2 | TlsVersion::Ssl3 => None,
            TlsVersion::Tls10 => Some("-tls1"),
            TlsVersion::Tls11 => Some("-tls1_1"),
            TlsVersion::Tls12 => Some("-tls1_2"),
            TlsVersion::Tls13 => Some("-tls1_3"),
        }
    }
}

// --- Round-Trip Time ---

/// A `[min, max]` round-trip-time range in milliseconds.
///
/// Serialized as a two-element JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RttRange(pub f64, pub f64);

impl RttRange {
    /// Reduces a set of samples to their extremes. Returns `None` for no samples.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let mut iter = samples.iter().copied();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s)));
        Some(RttRange(min, max))
    }

    pub fn min_ms(&self) -> f64 {
        self.0
    }

    pub fn max_ms(&self) -> f64 {
        self.1
    }
}

// --- Host Record ---

/// Everything learned about one hostname during a scan.
///
/// A record only exists if every probe ran; hosts hit by a [`HardFailure`] are
/// never turned into a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Unix time in seconds, floored to two decimals.
    pub scan_time: f64,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
    pub insecure_http: bool,
    /// `None` when no `Server` header was observed.
    pub http_server: Option<String>,
    pub redirect_to_https: bool,
    pub hsts: bool,
    pub tls_versions: Vec<TlsVersion>,
    /// Organization of the certificate issuer, if any TLS version is supported.
    pub root_ca: Option<String>,
    pub rdns_names: Vec<String>,
    /// `None` when no address answered the timing probe.
    pub rtt_range: Option<RttRange>,
    pub geo_locations: Vec<String>,
}
