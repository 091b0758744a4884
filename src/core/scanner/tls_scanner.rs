// src/core/scanner/tls_scanner.rs

use futures::future::join_all;
use tracing::{debug, info};

use crate::core::config::ScanConfig;
use crate::core::models::{ProbeOutcome, TlsVersion};
use crate::core::scanner::runner::{CommandOutput, CommandRunner};

const OPENSSL: &str = "openssl";

/// Marker `openssl` prints on its diagnostic channel when a handshake is refused.
const PROTOCOL_ERROR_MARKER: &str = ":error:";

fn s_client_args(config: &ScanConfig, hostname: &str, version: Option<TlsVersion>) -> Vec<String> {
    let mut args = vec!["s_client".to_string()];
    if let Some(flag) = version.and_then(TlsVersion::s_client_flag) {
        args.push(flag.to_string());
    }
    args.push("-connect".to_string());
    args.push(format!("{}:{}", hostname, config.https_port));
    args
}

/// Attempts one handshake per probed protocol version, all at once.
///
/// # Returns
/// The versions the host accepted, or `Ok(None)` when it accepted none.
pub async fn supported_versions<R: CommandRunner>(
    runner: &R,
    config: &ScanConfig,
    hostname: &str,
) -> ProbeOutcome<Vec<TlsVersion>> {
    debug!(hostname, "Probing TLS protocol versions.");
    let attempts = join_all(TlsVersion::PROBED.iter().map(|&version| {
        let args = s_client_args(config, hostname, Some(version));
        async move { (version, runner.run(OPENSSL, &args).await) }
    }))
    .await;

    let mut supported = Vec::new();
    for (version, outcome) in attempts {
        if handshake_accepted(outcome?.as_ref()) {
            supported.push(version);
        }
    }

    info!(hostname, versions = ?supported, "TLS version probe finished.");
    Ok(if supported.is_empty() { None } else { Some(supported) })
}

/// Reads the issuer organization from an unrestricted handshake.
pub async fn certificate_issuer<R: CommandRunner>(
    runner: &R,
    config: &ScanConfig,
    hostname: &str,
) -> ProbeOutcome<String> {
    let args = s_client_args(config, hostname, None);
    let Some(output) = runner.run(OPENSSL, &args).await? else {
        return Ok(None);
    };
    let issuer = parse_issuer_organization(&output.stderr);
    debug!(hostname, ?issuer, "Parsed certificate issuer.");
    Ok(issuer)
}

/// A handshake counts only if it left diagnostics and none of them is an error.
fn handshake_accepted(output: Option<&CommandOutput>) -> bool {
    match output {
        Some(out) if !out.stderr.is_empty() => !out.stderr.contains(PROTOCOL_ERROR_MARKER),
        _ => false,
    }
}

/// Extracts the `O = ...` value from the first line of `openssl` diagnostics.
///
/// Quoted values run to the closing quote, bare values to the next comma or
/// the end of the line.
pub fn parse_issuer_organization(stderr: &str) -> Option<String> {
    let line = stderr.lines().next()?;
    let start = find_organization_field(line)?;
    let value = &line[start..];

    let org = if let Some(quoted) = value.strip_prefix('"') {
        &quoted[..quoted.find('"')?]
    } else {
        value.split(',').next().unwrap_or(value)
    };
    let org = org.trim();
    (!org.is_empty()).then(|| org.to_string())
}

/// Offset just past `O = ` where it begins a field, so `CO = ` and `OU = ` never match.
fn find_organization_field(line: &str) -> Option<usize> {
    const FIELD: &str = "O = ";
    line.match_indices(FIELD)
        .find(|&(idx, _)| {
            line[..idx]
                .chars()
                .next_back()
                .is_none_or(|c| c == ',' || c.is_whitespace())
        })
        .map(|(idx, _)| idx + FIELD.len())
}
