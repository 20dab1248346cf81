#[cfg(test)]
#[path = "cities_test.rs"]
mod tests;

use crate::domain::models::Coordinate;

/// Tiananmen Square, the absolute last resort when nothing else matches.
pub const DEFAULT_CITY: (f64, f64) = (116.397, 39.905);

/// City-center coordinates for the major cities the assistant actually gets
/// asked about. Looked up only after every remote geocoder has failed.
const CITY_COORDINATES: &[(&str, f64, f64)] = &[
    ("北京", 116.397, 39.905),
    ("上海", 121.473, 31.230),
    ("广州", 113.264, 23.129),
    ("深圳", 114.057, 22.543),
    ("杭州", 120.155, 30.274),
    ("南京", 118.767, 32.041),
    ("苏州", 120.585, 31.299),
    ("成都", 104.066, 30.572),
    ("重庆", 106.551, 29.563),
    ("武汉", 114.305, 30.593),
    ("西安", 108.940, 34.341),
    ("天津", 117.200, 39.084),
    ("青岛", 120.382, 36.067),
    ("大连", 121.614, 38.914),
    ("厦门", 118.110, 24.490),
    ("宁波", 121.544, 29.868),
    ("福州", 119.306, 26.075),
    ("长沙", 112.982, 28.194),
    ("郑州", 113.625, 34.746),
    ("济南", 117.000, 36.651),
    ("沈阳", 123.429, 41.796),
    ("哈尔滨", 126.642, 45.756),
    ("长春", 125.324, 43.817),
    ("石家庄", 114.502, 38.045),
    ("太原", 112.549, 37.857),
    ("呼和浩特", 111.670, 40.818),
    ("兰州", 103.823, 36.058),
    ("西宁", 101.778, 36.623),
    ("银川", 106.278, 38.487),
    ("乌鲁木齐", 87.617, 43.792),
    ("拉萨", 91.140, 29.645),
    ("昆明", 102.833, 24.880),
    ("贵阳", 106.713, 26.578),
    ("南宁", 108.320, 22.824),
    ("海口", 110.331, 20.031),
    ("三亚", 109.508, 18.247),
    ("台北", 121.565, 25.033),
    ("香港", 114.173, 22.320),
    ("澳门", 113.549, 22.198),
];

pub fn default_coordinate() -> Coordinate {
    return Coordinate {
        lon: DEFAULT_CITY.0,
        lat: DEFAULT_CITY.1,
    };
}

/// Exact match first, then substring containment in either direction so that
/// "北京市" still finds "北京".
pub fn lookup(city: &str) -> Option<Coordinate> {
    for (name, lon, lat) in CITY_COORDINATES {
        if *name == city {
            return Some(Coordinate {
                lon: *lon,
                lat: *lat,
            });
        }
    }

    for (name, lon, lat) in CITY_COORDINATES {
        if city.contains(name) || name.contains(city) {
            return Some(Coordinate {
                lon: *lon,
                lat: *lat,
            });
        }
    }

    return None;
}
