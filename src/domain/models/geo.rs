#[cfg(test)]
#[path = "geo_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

/// A WGS-84 point, always longitude first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Result<Coordinate> {
        if !(-180.0..=180.0).contains(&lon) {
            bail!(format!("longitude {lon} is out of range"));
        }
        if !(-90.0..=90.0).contains(&lat) {
            bail!(format!("latitude {lat} is out of range"));
        }

        return Ok(Coordinate { lon, lat });
    }

    /// The `lon,lat` form routing providers take in their URLs.
    pub fn to_query(&self) -> String {
        return format!("{},{}", self.lon, self.lat);
    }
}

/// Which stage of the fallback chain produced a coordinate. Anything from
/// `CityLookup` down is a guess at city granularity rather than a real match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provenance {
    Nominatim,
    Photon,
    Amap,
    CityLookup,
    CityTable,
    DefaultCity,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeocodeResult {
    pub coordinate: Coordinate,
    pub provenance: Provenance,
}

impl GeocodeResult {
    pub fn is_guess(&self) -> bool {
        return matches!(
            self.provenance,
            Provenance::CityLookup | Provenance::CityTable | Provenance::DefaultCity
        );
    }
}
