// src/core/scanner/http_scanner.rs

use reqwest::header::{HeaderMap, LOCATION, SERVER, STRICT_TRANSPORT_SECURITY};
use reqwest::{Client, redirect::Policy};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::core::config::ScanConfig;

/// Builds the short-lived client each check uses. Redirects are never followed
/// automatically so that every hop can be inspected.
fn build_client(config: &ScanConfig) -> Option<Client> {
    match Client::builder()
        .redirect(Policy::none())
        .timeout(config.http_timeout)
        .user_agent(concat!("hostprobe/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(c) => Some(c),
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client.");
            None
        }
    }
}

/// Reads a header as text, tolerating values that are not valid UTF-8.
fn header_text(headers: &HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<String> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(s) => Some(s.to_string()),
        Err(_) => {
            warn!("Header contained invalid UTF-8.");
            Some(String::from_utf8_lossy(value.as_bytes()).into_owned())
        }
    }
}

/// Resolves a `Location` header against the URL that produced it.
fn next_location(current: &str, location: &str) -> Option<String> {
    let base = Url::parse(current).ok()?;
    base.join(location).ok().map(String::from)
}

/// True when a plaintext request to the host completes, whatever its status.
pub async fn insecure_http_reachable(config: &ScanConfig, hostname: &str) -> bool {
    let Some(client) = build_client(config) else { return false };
    let url = config.http_url(hostname);
    match client.get(&url).send().await {
        Ok(response) => {
            debug!(url = %url, status = %response.status(), "Plaintext HTTP answered.");
            true
        }
        Err(e) => {
            debug!(url = %url, error = %e, "Plaintext HTTP unreachable.");
            false
        }
    }
}

/// Reports the `Server` banner, preferring the plaintext endpoint when it is reachable.
///
/// # Returns
/// `None` when neither endpoint sends the header, or when a request fails.
pub async fn server_banner(config: &ScanConfig, hostname: &str, insecure_reachable: bool) -> Option<String> {
    let client = build_client(config)?;

    if insecure_reachable {
        let url = config.http_url(hostname);
        match client.get(&url).send().await {
            Ok(response) => {
                if let Some(server) = header_text(response.headers(), SERVER) {
                    debug!(url = %url, server = %server, "Server banner found.");
                    return Some(server);
                }
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Banner request failed.");
                return None;
            }
        }
    }

    let url = config.https_url(hostname);
    match client.get(&url).send().await {
        Ok(response) => header_text(response.headers(), SERVER),
        Err(e) => {
            debug!(url = %url, error = %e, "Banner request failed.");
            None
        }
    }
}

/// Follows plaintext redirects until one points at an `https` location.
///
/// Every response in the 300-309 range is followed, at most
/// `config.max_redirect_hops` requests in total.
pub async fn redirects_to_https(config: &ScanConfig, hostname: &str, insecure_reachable: bool) -> bool {
    if !insecure_reachable {
        return false;
    }
    let Some(client) = build_client(config) else { return false };

    let mut location = config.http_url(hostname);
    for hop in 0..config.max_redirect_hops {
        let response = match client.get(&location).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(url = %location, hop, error = %e, "Redirect probe failed.");
                return false;
            }
        };
        let status = response.status().as_u16();
        if !(300..310).contains(&status) {
            debug!(url = %location, hop, status, "Chain ended without an https redirect.");
            return false;
        }
        let Some(target) = header_text(response.headers(), LOCATION) else {
            debug!(url = %location, status, "Redirect without Location header.");
            return false;
        };
        if target.contains("https") {
            info!(hostname, hop, target = %target, "Redirects to HTTPS.");
            return true;
        }
        let Some(next) = next_location(&location, &target) else { return false };
        location = next;
    }
    debug!(hostname, "Redirect hop budget exhausted.");
    false
}

/// Detects HSTS on the plaintext endpoint.
///
/// A 301/302 towards an `https` location counts as HSTS; other redirects are
/// followed. The first non-redirect response decides by carrying, or not, the
/// `Strict-Transport-Security` header.
pub async fn hsts_present(config: &ScanConfig, hostname: &str) -> bool {
    let Some(client) = build_client(config) else { return false };

    let mut location = config.http_url(hostname);
    for hop in 0..config.max_redirect_hops {
        let response = match client.get(&location).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(url = %location, hop, error = %e, "HSTS probe failed.");
                return false;
            }
        };
        let status = response.status().as_u16();
        if status != 301 && status != 302 {
            let present = response.headers().contains_key(STRICT_TRANSPORT_SECURITY);
            debug!(url = %location, hop, status, present, "HSTS header checked.");
            return present;
        }
        let Some(target) = header_text(response.headers(), LOCATION) else { return false };
        if target.contains("https") {
            return true;
        }
        let Some(next) = next_location(&location, &target) else { return false };
        location = next;
    }
    false
}
