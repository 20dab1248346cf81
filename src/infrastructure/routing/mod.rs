pub mod amap;
pub mod osrm;
pub mod polyline;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::GeocodeResult;
use crate::domain::models::Route;
use crate::domain::models::RouteStep;
use crate::domain::models::Waypoint;

/// The uniform seam over routing backends: one operation, whatever the map
/// provider underneath.
#[async_trait]
pub trait RoutingService: std::fmt::Debug + Send + Sync {
    async fn search(&self, waypoints: &[Waypoint]) -> Result<Route>;
}

/// A degenerate zero-length "route" for a single waypoint, so callers can
/// render a lone marker through the same route-drawing path.
pub(crate) fn single_point_route(geocoded: &GeocodeResult, keyword: &str) -> Route {
    return Route {
        distance: 0.0,
        duration: 0.0,
        steps: vec![RouteStep {
            path: vec![geocoded.coordinate],
            distance: 0.0,
            duration: 0.0,
            instruction: "单点位置".to_string(),
            road: keyword.to_string(),
        }],
        waypoints: vec![geocoded.coordinate],
    };
}
