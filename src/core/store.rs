// src/core/store.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use hickory_resolver::proto::rr::Name;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::warn;

use crate::core::models::HostRecord;

/// Records keyed by hostname, in sorted key order.
pub type ScanRecords = BTreeMap<String, HostRecord>;

/// Parses the hostname list: one name per line.
///
/// Surrounding whitespace is trimmed and blank lines are ignored. Lines that
/// are not valid DNS names are dropped with a warning, since every name ends
/// up as an argument to external tools.
pub fn parse_hostnames(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let valid = is_valid_hostname(line);
            if !valid {
                warn!(line, "Skipping invalid hostname.");
            }
            valid
        })
        .map(str::to_string)
        .collect()
}

/// ASCII names are checked without IDNA rules, so labels such as `my_host` survive.
fn is_valid_hostname(name: &str) -> bool {
    if name.starts_with('-') || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    if name.is_ascii() {
        Name::from_ascii(name).is_ok()
    } else {
        Name::from_utf8(name).is_ok()
    }
}

pub fn load_hostnames(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read hostname list: {}", path.display()))?;
    Ok(parse_hostnames(&content))
}

/// Serializes records with every object's keys sorted and four-space indentation.
pub fn records_to_json(records: &ScanRecords) -> Result<String> {
    // Going through `Value` sorts the fields of each record as well.
    let value = serde_json::to_value(records).wrap_err("failed to encode host records")?;
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser).wrap_err("failed to format host records")?;
    String::from_utf8(buf).wrap_err("host records are not valid UTF-8")
}

pub fn write_records(path: &Path, records: &ScanRecords) -> Result<()> {
    let json = records_to_json(records)?;
    fs::write(path, json).wrap_err_with(|| format!("failed to write records: {}", path.display()))
}

pub fn read_records(path: &Path) -> Result<ScanRecords> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read records: {}", path.display()))?;
    serde_json::from_str(&content).wrap_err_with(|| format!("malformed record file: {}", path.display()))
}
