// src/core/scanner/dns_scanner.rs

use std::collections::HashSet;
use std::net::IpAddr;

use futures::future::join_all;
use hickory_resolver::proto::rr::RecordType;
use tracing::{debug, info, warn};

use crate::core::config::ScanConfig;
use crate::core::models::ProbeOutcome;
use crate::core::scanner::runner::{CommandOutput, CommandRunner};

const NSLOOKUP: &str = "nslookup";

/// Resolves `hostname` by asking every configured resolver, several times each.
///
/// Answers are amalgamated by union: an address reported by any successful
/// query is kept, in the order it was first seen. A single sub-query that
/// hard-fails fails the whole call, even if others succeeded.
///
/// # Returns
/// `Ok(None)` when no query produced an address of the requested family.
pub async fn resolve<R: CommandRunner>(
    runner: &R,
    config: &ScanConfig,
    hostname: &str,
    record_type: RecordType,
) -> ProbeOutcome<Vec<IpAddr>> {
    debug!(hostname, %record_type, resolvers = config.resolvers.len(), "Fanning out DNS queries.");

    let type_arg = format!("-type={record_type}");
    let queries = config.resolvers.iter().flat_map(|resolver| {
        (0..config.dns_repeats).map(move |_| resolver)
    });
    let outcomes = join_all(queries.map(|resolver| {
        let args = vec![type_arg.clone(), hostname.to_string(), resolver.clone()];
        async move { runner.run(NSLOOKUP, &args).await }
    }))
    .await;

    let mut seen = HashSet::new();
    let mut addresses = Vec::new();
    for outcome in outcomes {
        let Some(output) = outcome? else { continue };
        for address in parse_addresses(&output, record_type) {
            if seen.insert(address) {
                addresses.push(address);
            }
        }
    }

    if addresses.is_empty() {
        info!(hostname, %record_type, "No addresses resolved.");
        return Ok(None);
    }
    info!(hostname, %record_type, count = addresses.len(), "Resolved addresses.");
    Ok(Some(addresses))
}

/// Looks up the pointer names of `address` through the system resolver.
pub async fn reverse_resolve<R: CommandRunner>(runner: &R, address: IpAddr) -> ProbeOutcome<Vec<String>> {
    let args = vec![format!("-type={}", RecordType::PTR), address.to_string()];
    let Some(output) = runner.run(NSLOOKUP, &args).await? else {
        return Ok(None);
    };
    let names = parse_pointer_names(&output);
    if names.is_empty() {
        debug!(%address, "No PTR records.");
        return Ok(None);
    }
    Ok(Some(names))
}

/// Reverse-resolves every address concurrently and merges the names.
pub async fn rdns_names<R: CommandRunner>(runner: &R, addresses: &[IpAddr]) -> ProbeOutcome<Vec<String>> {
    let outcomes = join_all(addresses.iter().map(|&a| reverse_resolve(runner, a))).await;

    let mut names: Vec<String> = Vec::new();
    for outcome in outcomes {
        for name in outcome?.unwrap_or_default() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(if names.is_empty() { None } else { Some(names) })
}

/// Extracts addresses of the requested family from an `nslookup` answer.
///
/// The leading block describing the resolver itself is skipped. Lines that do
/// not carry a parseable address are ignored.
fn parse_addresses(output: &CommandOutput, record_type: RecordType) -> Vec<IpAddr> {
    answer_lines(&output.stdout)
        .filter_map(|line| {
            let (_, rest) = line.split_once("Address:")?;
            let token = rest.split_whitespace().next()?;
            match token.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    warn!(line, "Skipping unparseable nslookup address line.");
                    None
                }
            }
        })
        .filter(|ip| match record_type {
            RecordType::A => ip.is_ipv4(),
            RecordType::AAAA => ip.is_ipv6(),
            _ => true,
        })
        .collect()
}

fn parse_pointer_names(output: &CommandOutput) -> Vec<String> {
    answer_lines(&output.stdout)
        .filter_map(|line| {
            let (_, name) = line.split_once("name = ")?;
            let name = name.trim().trim_end_matches('.');
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Lines after the resolver header, which ends at the first blank line.
fn answer_lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.lines().skip_while(|l| !l.trim().is_empty()).skip(1)
}
