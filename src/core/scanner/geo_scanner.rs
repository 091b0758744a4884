// src/core/scanner/geo_scanner.rs

use std::net::IpAddr;
use std::path::Path;

use maxminddb::{Reader, geoip2};
use tracing::{debug, info, warn};

/// Maps an address to a `"City, Region, Country"` description.
pub trait GeoLocator: Send + Sync {
    fn locate(&self, address: IpAddr) -> Option<String>;
}

/// Geolocation backed by a MaxMind GeoLite2-City database file.
pub struct MaxMindLocator {
    reader: Reader<Vec<u8>>,
}

impl MaxMindLocator {
    pub fn open(path: &Path) -> Result<Self, maxminddb::MaxMindDBError> {
        let reader = Reader::open_readfile(path)?;
        info!(path = %path.display(), "Opened geolocation database.");
        Ok(Self { reader })
    }
}

impl GeoLocator for MaxMindLocator {
    fn locate(&self, address: IpAddr) -> Option<String> {
        let city: geoip2::City = match self.reader.lookup(address) {
            Ok(c) => c,
            Err(e) => {
                debug!(%address, error = %e, "No geolocation entry.");
                return None;
            }
        };
        let name = city.city?.names?.get("en").copied()?;
        let region = city.subdivisions?.into_iter().next()?.names?.get("en").copied()?;
        let country = city.country?.names?.get("en").copied()?;
        Some(format!("{name}, {region}, {country}"))
    }
}

/// Used when no database is available: every lookup misses.
pub struct NoGeoLocator;

impl GeoLocator for NoGeoLocator {
    fn locate(&self, _address: IpAddr) -> Option<String> {
        None
    }
}

/// Opens the database at `path`, falling back to [`NoGeoLocator`] if it cannot be read.
pub fn open_locator(path: &Path) -> Box<dyn GeoLocator> {
    match MaxMindLocator::open(path) {
        Ok(locator) => Box::new(locator),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Geolocation disabled.");
            Box::new(NoGeoLocator)
        }
    }
}

/// Looks up every address and returns the distinct descriptions found.
pub fn geolocations(locator: &dyn GeoLocator, addresses: &[IpAddr]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for &address in addresses {
        if let Some(place) = locator.locate(address) {
            if !found.contains(&place) {
                found.push(place);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedLocator(HashMap<IpAddr, String>);

    impl GeoLocator for FixedLocator {
        fn locate(&self, address: IpAddr) -> Option<String> {
            self.0.get(&address).cloned()
        }
    }

    #[test]
    fn misses_are_skipped_and_hits_deduplicated() {
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        let c: IpAddr = "10.0.0.3".parse().unwrap();
        let locator = FixedLocator(HashMap::from([
            (a, "Ashburn, Virginia, United States".to_string()),
            (b, "Ashburn, Virginia, United States".to_string()),
        ]));
        assert_eq!(
            geolocations(&locator, &[a, b, c]),
            vec!["Ashburn, Virginia, United States".to_string()]
        );
    }

    #[test]
    fn missing_database_disables_lookup() {
        let locator = open_locator(Path::new("/nonexistent/GeoLite2-City.mmdb"));
        assert!(locator.locate("8.8.8.8".parse().unwrap()).is_none());
    }
}
