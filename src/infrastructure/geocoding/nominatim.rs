#[cfg(test)]
#[path = "nominatim_test.rs"]
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

pub const USER_AGENT: &str = concat!("wayfarer/", env!("CARGO_PKG_VERSION"));

#[derive(Default, Debug, Clone, Deserialize)]
pub struct Place {
    lon: String,
    lat: String,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default, rename = "type")]
    place_type: Option<String>,
}

#[derive(Debug)]
pub struct Nominatim {
    url: String,
}

impl Default for Nominatim {
    fn default() -> Nominatim {
        return Nominatim {
            url: Config::get(ConfigKey::NominatimUrl),
        };
    }
}

impl Nominatim {
    pub fn with_url(url: String) -> Nominatim {
        return Nominatim { url };
    }
}

#[async_trait]
impl GeocodingProvider for Nominatim {
    fn name(&self) -> &'static str {
        return "nominatim";
    }

    fn provenance(&self) -> Provenance {
        return Provenance::Nominatim;
    }

    async fn geocode(&self, waypoint: &Waypoint) -> Result<Coordinate> {
        let query = waypoint.search_query();
        let res = reqwest::Client::new()
            .get(format!("{url}/search", url = self.url))
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("format", "json"),
                ("q", query.as_str()),
                ("limit", "5"),
                ("countrycodes", "cn"),
                ("addressdetails", "1"),
                ("extratags", "1"),
                ("namedetails", "1"),
                ("dedupe", "1"),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(format!("nominatim request failed: {}", res.status()));
        }

        let places = res.json::<Vec<Place>>().await?;
        let best = match select_best(&places, waypoint) {
            Some(place) => place,
            None => bail!(format!("no nominatim results for {query}")),
        };

        return Coordinate::new(best.lon.parse::<f64>()?, best.lat.parse::<f64>()?);
    }
}

/// Greedy max-score pick; strictly-greater comparison keeps ties on the first
/// candidate in input order.
fn select_best<'a>(places: &'a [Place], waypoint: &Waypoint) -> Option<&'a Place> {
    let mut best: Option<(f64, &Place)> = None;
    for place in places {
        let s = score(place, waypoint);
        if best.map_or(true, |(top, _)| return s > top) {
            best = Some((s, place));
        }
    }

    return best.map(|(_, place)| return place);
}

fn score(place: &Place, waypoint: &Waypoint) -> f64 {
    let mut score = place.importance.unwrap_or(0.0) * 100.0;

    if let Some(display_name) = &place.display_name {
        let display_name = display_name.to_lowercase();
        if display_name.contains(&waypoint.keyword.to_lowercase()) {
            score += 20.0;
        }
        if let Some(city) = &waypoint.city {
            if !city.is_empty() && display_name.contains(&city.to_lowercase()) {
                score += 15.0;
            }
        }
        if let Some(province) = &waypoint.province {
            if !province.is_empty() && display_name.contains(&province.to_lowercase()) {
                score += 10.0;
            }
        }
    }

    if let Some(place_type) = &place.place_type {
        let place_type = place_type.to_lowercase();
        if place_type.contains("tourism") || place_type.contains("attraction") {
            score += 25.0;
        } else if place_type.contains("restaurant") || place_type.contains("food") {
            score += 15.0;
        } else if place_type.contains("hotel") || place_type.contains("accommodation") {
            score += 15.0;
        }
    }

    return score;
}
