// src/report/mod.rs

//! Renders a scan record file into plain-text tables.
//!
//! The output is a pure function of the records, so rendering the same file
//! twice produces identical bytes.

pub mod ranking;

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat};
use color_eyre::eyre::{Result, WrapErr};
use comfy_table::{Table, presets::ASCII_FULL};
use tracing::info;

use crate::core::models::{HostRecord, RttRange};
use crate::core::store::{self, ScanRecords};

const NONE: &str = "none";

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table
}

fn lines<T: ToString>(values: &[T]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

fn optional(value: Option<&str>) -> String {
    value.unwrap_or(NONE).to_string()
}

fn format_rtt(range: &RttRange) -> String {
    format!("[{:.2}, {:.2}]", range.min_ms(), range.max_ms())
}

fn format_scan_time(scan_time: f64) -> String {
    let millis = (scan_time * 1000.0).round() as i64;
    match DateTime::from_timestamp_millis(millis) {
        Some(dt) => format!("{:.2} ({})", scan_time, dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => format!("{scan_time:.2}"),
    }
}

/// One two-column table listing every field of a record, in key order.
fn host_table(hostname: &str, record: &HostRecord) -> Table {
    let rows: Vec<(&str, String)> = vec![
        ("hostname", hostname.to_string()),
        ("geo_locations", lines(&record.geo_locations)),
        ("hsts", record.hsts.to_string()),
        ("http_server", optional(record.http_server.as_deref())),
        ("insecure_http", record.insecure_http.to_string()),
        ("ipv4", lines(&record.ipv4)),
        ("ipv6", lines(&record.ipv6)),
        ("rdns_names", lines(&record.rdns_names)),
        ("redirect_to_https", record.redirect_to_https.to_string()),
        ("root_ca", optional(record.root_ca.as_deref())),
        ("rtt_range", record.rtt_range.as_ref().map_or_else(|| NONE.to_string(), format_rtt)),
        ("scan_time", format_scan_time(record.scan_time)),
        ("tls_versions", lines(&record.tls_versions)),
    ];

    let mut table = new_table();
    for (key, value) in rows {
        table.add_row(vec![key.to_string(), value]);
    }
    table
}

fn rtt_table(records: &ScanRecords) -> Table {
    let mut table = new_table();
    table.set_header(vec!["hostname", "min rtt (ms)", "max rtt (ms)"]);
    for (host, range) in ranking::rtt_ranking(records) {
        table.add_row(vec![
            host.to_string(),
            format!("{:.2}", range.min_ms()),
            format!("{:.2}", range.max_ms()),
        ]);
    }
    table
}

fn frequency_table(label: &str, ranked: Vec<(String, usize)>) -> Table {
    let mut table = new_table();
    table.set_header(vec![label, "occurrences"]);
    for (value, count) in ranked {
        table.add_row(vec![value, count.to_string()]);
    }
    table
}

fn summary_table(records: &ScanRecords) -> Table {
    let mut table = new_table();
    table.set_header(ranking::summary_labels());
    table.add_row(
        ranking::adoption_fractions(records)
            .into_iter()
            .map(|f| format!("{f:.3}"))
            .collect::<Vec<_>>(),
    );
    table
}

/// Renders every section of the report, separated by blank lines.
pub fn render_report(records: &ScanRecords) -> String {
    let mut sections: Vec<String> = records
        .iter()
        .map(|(host, record)| host_table(host, record).to_string())
        .collect();
    sections.push(rtt_table(records).to_string());
    sections.push(frequency_table("root_ca", ranking::root_ca_frequencies(records)).to_string());
    sections.push(frequency_table("http server", ranking::server_frequencies(records)).to_string());
    sections.push(summary_table(records).to_string());
    sections.join("\n\n")
}

/// Reads the record file at `input` and writes the rendered report to `output`.
pub fn generate_report(input: &Path, output: &Path) -> Result<()> {
    let records = store::read_records(input)?;
    info!(hosts = records.len(), "Rendering report.");
    let report = render_report(&records);
    fs::write(output, report).wrap_err_with(|| format!("failed to write report: {}", output.display()))
}
