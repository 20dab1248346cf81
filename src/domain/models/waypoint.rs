#[cfg(test)]
#[path = "waypoint_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

/// A named place to geocode and route through. City and province narrow the
/// search when the keyword alone is ambiguous.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Waypoint {
    pub keyword: String,
    pub city: Option<String>,
    pub province: Option<String>,
}

impl Waypoint {
    pub fn new(keyword: &str) -> Waypoint {
        return Waypoint {
            keyword: keyword.to_string(),
            city: None,
            province: None,
        };
    }

    pub fn with_city(keyword: &str, city: &str) -> Waypoint {
        return Waypoint {
            keyword: keyword.to_string(),
            city: Some(city.to_string()),
            province: None,
        };
    }

    /// Parses `keyword[,city[,province]]`.
    pub fn parse(input: &str) -> Result<Waypoint> {
        let mut parts = input.split(',').map(str::trim);
        let keyword = parts.next().unwrap_or("");
        if keyword.is_empty() {
            bail!(format!("waypoint {input:?} has no keyword"));
        }

        let city = parts.next().filter(|part| return !part.is_empty());
        let province = parts.next().filter(|part| return !part.is_empty());

        return Ok(Waypoint {
            keyword: keyword.to_string(),
            city: city.map(str::to_string),
            province: province.map(str::to_string),
        });
    }

    /// Parses a semicolon-separated waypoint list.
    pub fn parse_list(input: &str) -> Result<Vec<Waypoint>> {
        return input
            .split(';')
            .map(str::trim)
            .filter(|part| return !part.is_empty())
            .map(Waypoint::parse)
            .collect();
    }

    /// The free-text query sent to search-style geocoders.
    pub fn search_query(&self) -> String {
        let mut query = self.keyword.to_string();
        if let Some(city) = &self.city {
            query = format!("{query}, {city}");
        }
        if let Some(province) = &self.province {
            query = format!("{query}, {province}");
        }

        return query;
    }
}
