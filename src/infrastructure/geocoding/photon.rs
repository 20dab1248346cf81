#[cfg(test)]
#[path = "photon_test.rs"]
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
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct Feature {
    geometry: Geometry,
    #[serde(default)]
    properties: Properties,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct Properties {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    feature_type: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
}

#[derive(Debug)]
pub struct Photon {
    url: String,
}

impl Default for Photon {
    fn default() -> Photon {
        return Photon {
            url: Config::get(ConfigKey::PhotonUrl),
        };
    }
}

impl Photon {
    pub fn with_url(url: String) -> Photon {
        return Photon { url };
    }
}

#[async_trait]
impl GeocodingProvider for Photon {
    fn name(&self) -> &'static str {
        return "photon";
    }

    fn provenance(&self) -> Provenance {
        return Provenance::Photon;
    }

    async fn geocode(&self, waypoint: &Waypoint) -> Result<Coordinate> {
        let query = waypoint.search_query();
        let res = reqwest::Client::new()
            .get(format!("{url}/api", url = self.url))
            .query(&[
                ("q", query.as_str()),
                ("limit", "5"),
                ("osm_tag", "tourism,amenity,shop"),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(format!("photon request failed: {}", res.status()));
        }

        let collection = res.json::<FeatureCollection>().await?;
        let best = match select_best(&collection.features, waypoint) {
            Some(feature) => feature,
            None => bail!(format!("no photon results for {query}")),
        };

        if best.geometry.coordinates.len() < 2 {
            bail!("photon feature carried no coordinates");
        }

        return Coordinate::new(best.geometry.coordinates[0], best.geometry.coordinates[1]);
    }
}

fn select_best<'a>(features: &'a [Feature], waypoint: &Waypoint) -> Option<&'a Feature> {
    let mut best: Option<(f64, &Feature)> = None;
    for feature in features {
        let s = score(feature, waypoint);
        if best.map_or(true, |(top, _)| return s > top) {
            best = Some((s, feature));
        }
    }

    return best.map(|(_, feature)| return feature);
}

fn score(feature: &Feature, waypoint: &Waypoint) -> f64 {
    let mut score = feature.properties.importance.unwrap_or(0.0) * 100.0;

    if let Some(name) = &feature.properties.name {
        if name.to_lowercase().contains(&waypoint.keyword.to_lowercase()) {
            score += 20.0;
        }
    }

    if let Some(feature_type) = &feature.properties.feature_type {
        let feature_type = feature_type.to_lowercase();
        if feature_type.contains("tourism") || feature_type.contains("attraction") {
            score += 25.0;
        }
    }

    return score;
}
