#[cfg(test)]
#[path = "osrm_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;

use super::polyline;
use super::single_point_route;
use super::RoutingService;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Coordinate;
use crate::domain::models::Route;
use crate::domain::models::RouteStep;
use crate::domain::models::Waypoint;
use crate::infrastructure::geocoding::Geocoder;

#[derive(Default, Debug, Clone, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct OsrmRoute {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    geometry: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    maneuver: OsrmManeuver,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct OsrmManeuver {
    #[serde(default)]
    instruction: Option<String>,
}

#[derive(Debug)]
pub struct OsrmRouting {
    url: String,
    profile: String,
    geocoder: Arc<Geocoder>,
}

impl OsrmRouting {
    pub fn new(url: &str, profile: &str, geocoder: Arc<Geocoder>) -> OsrmRouting {
        return OsrmRouting {
            url: url.to_string(),
            profile: profile.to_string(),
            geocoder,
        };
    }

    pub fn from_config(geocoder: Arc<Geocoder>) -> OsrmRouting {
        return OsrmRouting::new(
            &Config::get(ConfigKey::OsrmUrl),
            &Config::get(ConfigKey::OsrmProfile),
            geocoder,
        );
    }

    async fn fetch_route(&self, coordinates: &[Coordinate]) -> Result<Route> {
        let coords = coordinates
            .iter()
            .map(Coordinate::to_query)
            .collect::<Vec<String>>()
            .join(";");

        let res = reqwest::Client::new()
            .get(format!(
                "{url}/route/v1/{profile}/{coords}",
                url = self.url,
                profile = self.profile,
            ))
            .query(&[
                ("overview", "full"),
                ("steps", "true"),
                ("alternatives", "false"),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(format!("osrm request failed: {}", res.status()));
        }

        let data = res.json::<RouteResponse>().await?;
        if data.code != "Ok" || data.routes.is_empty() {
            bail!(format!("osrm route planning failed: {}", data.code));
        }

        return Ok(format_route(&data.routes[0], coordinates));
    }
}

#[async_trait]
impl RoutingService for OsrmRouting {
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

fn format_route(route: &OsrmRoute, waypoints: &[Coordinate]) -> Route {
    let mut steps = vec![];
    for leg in &route.legs {
        for step in &leg.steps {
            // A malformed geometry degrades this step to an empty path rather
            // than failing the whole route.
            let path = polyline::decode(&step.geometry).unwrap_or_else(|err| {
                tracing::warn!(error = %err, road = step.name, "Failed to decode step geometry");
                return vec![];
            });

            steps.push(RouteStep {
                path,
                distance: step.distance,
                duration: step.duration,
                instruction: step.maneuver.instruction.clone().unwrap_or_default(),
                road: step.name.to_string(),
            });
        }
    }

    return Route {
        distance: route.distance,
        duration: route.duration,
        steps,
        waypoints: waypoints.to_vec(),
    };
}
