// src/report/ranking.rs

use std::cmp::Ordering;
use std::collections::HashMap;

use strum::IntoEnumIterator;

use crate::core::models::{RttRange, TlsVersion};
use crate::core::store::ScanRecords;

/// Counts each distinct value, most frequent first; equal counts sort by value.
pub fn rank_by_frequency<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().map(|(v, c)| (v.to_string(), c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

pub fn root_ca_frequencies(records: &ScanRecords) -> Vec<(String, usize)> {
    rank_by_frequency(records.values().filter_map(|r| r.root_ca.as_deref()))
}

pub fn server_frequencies(records: &ScanRecords) -> Vec<(String, usize)> {
    rank_by_frequency(records.values().filter_map(|r| r.http_server.as_deref()))
}

/// Hosts with a measured RTT, fastest first. Ties fall back to the maximum,
/// then to the hostname.
pub fn rtt_ranking(records: &ScanRecords) -> Vec<(&str, RttRange)> {
    let mut rows: Vec<(&str, RttRange)> = records
        .iter()
        .filter_map(|(host, r)| r.rtt_range.map(|range| (host.as_str(), range)))
        .collect();
    rows.sort_by(|a, b| compare_rtt(a, b));
    rows
}

fn compare_rtt(a: &(&str, RttRange), b: &(&str, RttRange)) -> Ordering {
    a.1.min_ms()
        .total_cmp(&b.1.min_ms())
        .then_with(|| a.1.max_ms().total_cmp(&b.1.max_ms()))
        .then_with(|| a.0.cmp(b.0))
}

/// Labels of the adoption summary, in column order.
pub fn summary_labels() -> Vec<String> {
    TlsVersion::iter()
        .map(|v| v.to_string())
        .chain(["plain http", "https redirect", "hsts", "ipv6"].map(String::from))
        .collect()
}

/// Fraction of hosts showing each property of [`summary_labels`].
///
/// An empty record set yields zeros rather than dividing by zero.
pub fn adoption_fractions(records: &ScanRecords) -> Vec<f64> {
    let total = records.len();
    let mut counts: Vec<usize> = TlsVersion::iter()
        .map(|version| records.values().filter(|r| r.tls_versions.contains(&version)).count())
        .collect();
    counts.push(records.values().filter(|r| r.insecure_http).count());
    counts.push(records.values().filter(|r| r.redirect_to_https).count());
    counts.push(records.values().filter(|r| r.hsts).count());
    counts.push(records.values().filter(|r| !r.ipv6.is_empty()).count());

    counts
        .into_iter()
        .map(|c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_frequent_first() {
        let values = std::iter::repeat_n("A", 5)
            .chain(std::iter::repeat_n("B", 9))
            .chain(std::iter::repeat_n("C", 2));
        let ranked = rank_by_frequency(values);
        assert_eq!(
            ranked,
            vec![("B".to_string(), 9), ("A".to_string(), 5), ("C".to_string(), 2)]
        );
    }

    #[test]
    fn equal_counts_sort_by_name() {
        let ranked = rank_by_frequency(["nginx", "apache", "nginx", "apache", "caddy"]);
        let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["apache", "nginx", "caddy"]);
    }

    #[test]
    fn summary_has_ten_columns() {
        let labels = summary_labels();
        assert_eq!(labels.len(), 10);
        assert_eq!(labels[0], "SSLv2");
        assert_eq!(labels[5], "TLSv1.3");
        assert_eq!(labels[9], "ipv6");
        assert_eq!(adoption_fractions(&ScanRecords::new()), vec![0.0; 10]);
    }
}
