use super::Coordinate;

/// One leg-step of a formatted route. Read-only once built; a step whose
/// geometry failed to decode carries an empty path instead of aborting the
/// whole route.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteStep {
    pub path: Vec<Coordinate>,
    pub distance: f64,
    pub duration: f64,
    pub instruction: String,
    pub road: String,
}

/// A provider-agnostic route: totals in meters and seconds, plus the geocoded
/// waypoints it runs through.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub distance: f64,
    pub duration: f64,
    pub steps: Vec<RouteStep>,
    pub waypoints: Vec<Coordinate>,
}
