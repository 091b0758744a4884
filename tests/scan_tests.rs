mod common;

use std::net::IpAddr;
use std::time::Duration;

use common::{NXDOMAIN, ScriptedRunner, closed_port, missing, nslookup_answer, response, serve, stderr, stdout};
use hostprobe::core::config::ScanConfig;
use hostprobe::core::models::{ProbeOutcome, TlsVersion};
use hostprobe::core::scanner::Scanner;
use hostprobe::core::scanner::geo_scanner::{GeoLocator, NoGeoLocator};
use hostprobe::core::scanner::runner::CommandOutput;

const HOST: &str = "127.0.0.1";
const ISSUER: &str = "depth=1 C = US, O = Let's Encrypt, CN = R3\nverify return:1\n";

struct OneCity;

impl GeoLocator for OneCity {
    fn locate(&self, _address: IpAddr) -> Option<String> {
        Some("Evanston, Illinois, United States".into())
    }
}

async fn local_config(http_port: u16) -> ScanConfig {
    ScanConfig {
        resolvers: vec!["10.53.0.1".into()],
        dns_repeats: 2,
        http_port,
        https_port: closed_port().await,
        http_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

/// A host with one IPv4 address, TLS 1.2 and 1.3, and a reachable timing probe.
fn healthy_host(program: &str, args: &[String]) -> ProbeOutcome<CommandOutput> {
    match program {
        "nslookup" if args[0] == "-type=A" => stdout(&nslookup_answer(HOST, &["192.0.2.10"])),
        "nslookup" if args[0] == "-type=AAAA" => stdout(NXDOMAIN),
        "nslookup" => stdout(
            "Server:\t\t8.8.8.8\nAddress:\t8.8.8.8#53\n\nNon-authoritative answer:\n10.2.0.192.in-addr.arpa\tname = web.example.net.\n\n",
        ),
        "openssl" => match args.get(1).map(String::as_str) {
            Some("-tls1_2") | Some("-tls1_3") | Some("-connect") => stderr(ISSUER),
            _ => stderr("140:error:0A000102:SSL routines::unsupported protocol\n"),
        },
        "bash" => stderr("\nreal\t0m0.021s\nuser\t0m0.000s\nsys\t0m0.001s\n"),
        other => missing(other),
    }
}

#[tokio::test]
async fn complete_record_carries_every_probe() {
    let ok = response("200 OK", &[("Server", "Apache"), ("Strict-Transport-Security", "max-age=600")]);
    let addr = serve(vec![("/", ok.as_str())]).await;
    let scanner = Scanner::new(ScriptedRunner::new(healthy_host), Box::new(OneCity), local_config(addr.port()).await);

    let record = scanner.create_entry(HOST).await.unwrap().unwrap();

    assert!(record.scan_time > 1_600_000_000.0);
    let centis = record.scan_time * 100.0;
    assert!((centis - centis.round()).abs() < 1e-3);
    assert_eq!(record.ipv4, vec!["192.0.2.10"]);
    assert!(record.ipv6.is_empty());
    assert!(record.insecure_http);
    assert_eq!(record.http_server.as_deref(), Some("Apache"));
    assert!(!record.redirect_to_https);
    assert!(record.hsts);
    assert_eq!(record.tls_versions, vec![TlsVersion::Tls12, TlsVersion::Tls13]);
    assert_eq!(record.root_ca.as_deref(), Some("Let's Encrypt"));
    assert_eq!(record.rdns_names, vec!["web.example.net"]);
    let rtt = record.rtt_range.unwrap();
    assert!((rtt.min_ms() - 21.0).abs() < 1e-6 && (rtt.max_ms() - 21.0).abs() < 1e-6);
    assert_eq!(record.geo_locations, vec!["Evanston, Illinois, United States"]);
}

#[tokio::test]
async fn host_without_ipv4_is_skipped() {
    let runner = ScriptedRunner::new(|_, _| stdout(NXDOMAIN));
    let scanner = Scanner::new(runner, Box::new(NoGeoLocator), local_config(closed_port().await).await);
    assert_eq!(scanner.create_entry("nope.invalid").await, Ok(None));
}

#[tokio::test]
async fn one_missing_tool_discards_the_host() {
    let runner = ScriptedRunner::new(|program, args| match program {
        "bash" => missing("bash"),
        _ => healthy_host(program, args),
    });
    let scanner = Scanner::new(runner, Box::new(NoGeoLocator), local_config(closed_port().await).await);
    assert!(scanner.create_entry(HOST).await.is_err());
}

#[tokio::test]
async fn no_tls_means_no_issuer_probe() {
    let runner = ScriptedRunner::new(|program, args| match program {
        "openssl" if args.get(1).map(String::as_str) == Some("-connect") => missing("openssl"),
        "openssl" => Ok(None),
        _ => healthy_host(program, args),
    });
    let scanner = Scanner::new(runner, Box::new(NoGeoLocator), local_config(closed_port().await).await);

    let record = scanner.create_entry(HOST).await.unwrap().unwrap();
    assert!(record.tls_versions.is_empty());
    assert_eq!(record.root_ca, None);
    assert!(!record.insecure_http);
    assert_eq!(record.http_server, None);
    assert!(record.geo_locations.is_empty());
}

#[tokio::test]
async fn scan_keeps_only_complete_records() {
    let runner = ScriptedRunner::new(|program, args| {
        let host = args.get(1).cloned().unwrap_or_default();
        match program {
            "nslookup" if host == "broken.test" => missing("nslookup"),
            "nslookup" if host == "nope.invalid" => stdout(NXDOMAIN),
            _ => healthy_host(program, args),
        }
    });
    let scanner = Scanner::new(runner, Box::new(NoGeoLocator), local_config(closed_port().await).await);
    let hostnames: Vec<String> = ["broken.test", HOST, "nope.invalid"].iter().map(|h| h.to_string()).collect();

    let started = std::sync::Mutex::new(Vec::new());
    let records = scanner
        .scan_hosts(&hostnames, |h| started.lock().unwrap().push(h.to_string()))
        .await;

    assert_eq!(started.into_inner().unwrap(), hostnames);
    assert_eq!(records.keys().collect::<Vec<_>>(), vec![HOST]);
}
