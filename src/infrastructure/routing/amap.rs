#[cfg(test)]
#[path = "amap_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;

use super::single_point_route;
use super::RoutingService;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Coordinate;
use crate::domain::models::Route;
use crate::domain::models::RouteStep;
use crate::domain::models::Waypoint;
use crate::infrastructure::geocoding::Geocoder;

// The Amap REST API returns numbers as JSON strings.
#[derive(Default, Debug, Clone, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    info: String,
    route: Option<AmapRoute>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct AmapRoute {
    #[serde(default)]
    paths: Vec<AmapPath>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct AmapPath {
    #[serde(default)]
    distance: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    steps: Vec<AmapStep>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct AmapStep {
    #[serde(default)]
    instruction: String,
    #[serde(default)]
    road: String,
    #[serde(default)]
    distance: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    polyline: String,
}

#[derive(Debug)]
pub struct AmapRouting {
    url: String,
    key: String,
    geocoder: Arc<Geocoder>,
}

impl AmapRouting {
    pub fn new(url: &str, key: &str, geocoder: Arc<Geocoder>) -> AmapRouting {
        return AmapRouting {
            url: url.to_string(),
            key: key.to_string(),
            geocoder,
        };
    }

    pub fn from_config(geocoder: Arc<Geocoder>) -> AmapRouting {
        return AmapRouting::new(
            &Config::get(ConfigKey::AmapDirectionsUrl),
            &Config::get(ConfigKey::AmapWebApiKey),
            geocoder,
        );
    }

    async fn fetch_route(&self, coordinates: &[Coordinate]) -> Result<Route> {
        let origin = coordinates[0].to_query();
        let destination = coordinates[coordinates.len() - 1].to_query();
        let via = coordinates[1..coordinates.len() - 1]
            .iter()
            .map(Coordinate::to_query)
            .collect::<Vec<String>>()
            .join(";");

        let res = reqwest::Client::new()
            .get(format!("{url}/v3/direction/driving", url = self.url))
            .query(&[
                ("key", self.key.as_str()),
                ("origin", origin.as_str()),
                ("destination", destination.as_str()),
                ("waypoints", via.as_str()),
                ("extensions", "base"),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(format!("amap directions request failed: {}", res.status()));
        }

        let data = res.json::<DirectionsResponse>().await?;
        if data.status != "1" {
            bail!(format!("amap route planning failed: {}", data.info));
        }

        let path = match data.route.as_ref().and_then(|route| return route.paths.first()) {
            Some(path) => path,
            None => bail!("amap route planning returned no paths"),
        };

        return Ok(format_route(path, coordinates));
    }
}

#[async_trait]
impl RoutingService for AmapRouting {
    async fn search(&self, waypoints: &[Waypoint]) -> Result<Route> {
        if waypoints.is_empty() {
            bail!("no waypoints provided");
        }

        let mut geocoded = vec![];
        for waypoint in waypoints {
            geocoded.push(self.geocoder.geocode(waypoint).await);
        }

        if geocoded.len() == 1 {
            return Ok(single_point_route(&geocoded[0], &waypoints[0].keyword));
        }

        let coordinates = geocoded
            .iter()
            .map(|result| return result.coordinate)
            .collect::<Vec<Coordinate>>();

        return self.fetch_route(&coordinates).await;
    }
}

fn format_route(path: &AmapPath, waypoints: &[Coordinate]) -> Route {
    let steps = path
        .steps
        .iter()
        .map(|step| {
            return RouteStep {
                path: decode_pairs(&step.polyline).unwrap_or_else(|err| {
                    tracing::warn!(error = %err, road = step.road, "Failed to parse step polyline");
                    return vec![];
                }),
                distance: step.distance.parse::<f64>().unwrap_or(0.0),
                duration: step.duration.parse::<f64>().unwrap_or(0.0),
                instruction: step.instruction.to_string(),
                road: step.road.to_string(),
            };
        })
        .collect();

    return Route {
        distance: path.distance.parse::<f64>().unwrap_or(0.0),
        duration: path.duration.parse::<f64>().unwrap_or(0.0),
        steps,
        waypoints: waypoints.to_vec(),
    };
}

/// Amap step geometry is plain `lon,lat;lon,lat` text rather than an encoded
/// polyline.
fn decode_pairs(polyline: &str) -> Result<Vec<Coordinate>> {
    let mut coordinates = vec![];
    for pair in polyline.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let mut parts = pair.split(',');
        let lon = parts.next().unwrap_or("").parse::<f64>()?;
        let lat = parts.next().unwrap_or("").parse::<f64>()?;
        coordinates.push(Coordinate::new(lon, lat)?);
    }

    return Ok(coordinates);
}
