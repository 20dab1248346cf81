#[cfg(test)]
#[path = "geocoder_test.rs"]
mod tests;

pub mod amap;
pub mod cities;
pub mod nominatim;
pub mod photon;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use tokio::time;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Coordinate;
use crate::domain::models::GeocodeResult;
use crate::domain::models::Provenance;
use crate::domain::models::Waypoint;

/// One remote geocoding backend in the fallback chain.
#[async_trait]
pub trait GeocodingProvider: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;
    fn provenance(&self) -> Provenance;
    async fn geocode(&self, waypoint: &Waypoint) -> Result<Coordinate>;
}

/// The ordered fallback chain. Providers run strictly sequentially, each under
/// its own timeout; every stage failure is logged and swallowed. The city
/// fallback at the end always produces a coordinate, so `geocode` never fails —
/// callers check `GeocodeResult::is_guess` when they need to tell a real match
/// from a city-level guess.
#[derive(Debug)]
pub struct Geocoder {
    providers: Vec<Box<dyn GeocodingProvider>>,
    fallback: CityFallback,
    timeout: Duration,
}

impl Default for Geocoder {
    fn default() -> Geocoder {
        return Geocoder::new(
            vec![
                Box::<nominatim::Nominatim>::default(),
                Box::<photon::Photon>::default(),
                Box::<amap::Amap>::default(),
            ],
            CityFallback::default(),
            Duration::from_millis(Config::get_u64(ConfigKey::GeocodeTimeout, 3000)),
        );
    }
}

impl Geocoder {
    pub fn new(
        providers: Vec<Box<dyn GeocodingProvider>>,
        fallback: CityFallback,
        timeout: Duration,
    ) -> Geocoder {
        return Geocoder {
            providers,
            fallback,
            timeout,
        };
    }

    pub async fn geocode(&self, waypoint: &Waypoint) -> GeocodeResult {
        for provider in &self.providers {
            match time::timeout(self.timeout, provider.geocode(waypoint)).await {
                Ok(Ok(coordinate)) => {
                    return GeocodeResult {
                        coordinate,
                        provenance: provider.provenance(),
                    };
                }
                Ok(Err(err)) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %err,
                        keyword = waypoint.keyword,
                        "Geocoding provider failed, falling through"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        provider = provider.name(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        keyword = waypoint.keyword,
                        "Geocoding provider timed out, falling through"
                    );
                }
            }
        }

        return self.fallback.resolve(waypoint).await;
    }
}

#[derive(Default, Debug, Clone, Deserialize)]
struct CityPlace {
    lon: String,
    lat: String,
}

/// City-level degradation: a city-restricted Nominatim lookup, then the static
/// city table, then the Beijing default.
#[derive(Debug)]
pub struct CityFallback {
    nominatim_url: String,
    timeout: Duration,
}

impl Default for CityFallback {
    fn default() -> CityFallback {
        return CityFallback::new(
            &Config::get(ConfigKey::NominatimUrl),
            Duration::from_millis(Config::get_u64(ConfigKey::GeocodeTimeout, 3000)),
        );
    }
}

impl CityFallback {
    pub fn new(nominatim_url: &str, timeout: Duration) -> CityFallback {
        return CityFallback {
            nominatim_url: nominatim_url.to_string(),
            timeout,
        };
    }

    pub async fn resolve(&self, waypoint: &Waypoint) -> GeocodeResult {
        let city = match &waypoint.city {
            Some(city) if !city.is_empty() => city.to_string(),
            _ => {
                tracing::warn!(
                    keyword = waypoint.keyword,
                    "No city to fall back to, using the default coordinate"
                );
                return GeocodeResult {
                    coordinate: cities::default_coordinate(),
                    provenance: Provenance::DefaultCity,
                };
            }
        };

        match self.city_lookup(&city, waypoint.province.as_deref()).await {
            Ok(coordinate) => {
                return GeocodeResult {
                    coordinate,
                    provenance: Provenance::CityLookup,
                };
            }
            Err(err) => {
                tracing::warn!(city, error = %err, "City-level lookup failed, using the static table");
            }
        }

        if let Some(coordinate) = cities::lookup(&city) {
            return GeocodeResult {
                coordinate,
                provenance: Provenance::CityTable,
            };
        }

        tracing::warn!(city, "City not in the static table, using the default coordinate");
        return GeocodeResult {
            coordinate: cities::default_coordinate(),
            provenance: Provenance::DefaultCity,
        };
    }

    async fn city_lookup(&self, city: &str, province: Option<&str>) -> Result<Coordinate> {
        let query = match province {
            Some(province) if !province.is_empty() => format!("{city}, {province}"),
            _ => city.to_string(),
        };

        let res = reqwest::Client::new()
            .get(format!("{url}/search", url = self.nominatim_url))
            .header("User-Agent", nominatim::USER_AGENT)
            .timeout(self.timeout)
            .query(&[
                ("format", "json"),
                ("q", query.as_str()),
                ("limit", "1"),
                ("countrycodes", "cn"),
                ("featuretype", "city"),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(format!("city lookup failed: {}", res.status()));
        }

        let places = res.json::<Vec<CityPlace>>().await?;
        if places.is_empty() {
            bail!(format!("no city-level results for {query}"));
        }

        return Coordinate::new(
            places[0].lon.parse::<f64>()?,
            places[0].lat.parse::<f64>()?,
        );
    }
}
