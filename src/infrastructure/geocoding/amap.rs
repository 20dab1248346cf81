#[cfg(test)]
#[path = "amap_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;

use super::GeocodingProvider;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Coordinate;
use crate::domain::models::Provenance;
use crate::domain::models::Waypoint;

#[derive(Default, Debug, Clone, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    info: String,
    #[serde(default)]
    geocodes: Vec<AmapGeocode>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct AmapGeocode {
    #[serde(default)]
    location: String,
}

#[derive(Debug)]
pub struct Amap {
    url: String,
    key: String,
}

impl Default for Amap {
    fn default() -> Amap {
        return Amap {
            url: Config::get(ConfigKey::AmapGeocodeUrl),
            key: Config::get(ConfigKey::AmapWebApiKey),
        };
    }
}

impl Amap {
    pub fn with_url(url: String, key: String) -> Amap {
        return Amap { url, key };
    }
}

#[async_trait]
impl GeocodingProvider for Amap {
    fn name(&self) -> &'static str {
        return "amap";
    }

    fn provenance(&self) -> Provenance {
        return Provenance::Amap;
    }

    async fn geocode(&self, waypoint: &Waypoint) -> Result<Coordinate> {
        // A missing key is a configuration failure, not a transient one; fail
        // before spending any network time.
        if self.key.is_empty() {
            bail!("Amap web API key is not configured");
        }

        let city = waypoint.city.clone().unwrap_or_default();
        let res = reqwest::Client::new()
            .get(format!("{url}/v3/geocode/geo", url = self.url))
            .query(&[
                ("key", self.key.as_str()),
                ("address", waypoint.keyword.as_str()),
                ("city", city.as_str()),
                ("output", "json"),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(format!("amap request failed: {}", res.status()));
        }

        let data = res.json::<GeocodeResponse>().await?;
        if data.status != "1" || data.geocodes.is_empty() {
            bail!(format!("amap geocoding failed: {}", data.info));
        }

        let mut parts = data.geocodes[0].location.split(',');
        let lon = parts.next().unwrap_or("").parse::<f64>()?;
        let lat = parts.next().unwrap_or("").parse::<f64>()?;

        return Coordinate::new(lon, lat);
    }
}
