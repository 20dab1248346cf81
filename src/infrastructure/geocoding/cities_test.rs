use super::default_coordinate;
use super::lookup;

#[test]
fn it_matches_exact_city_names() {
    let coord = lookup("上海").unwrap();

    assert_eq!(coord.lon, 121.473);
    assert_eq!(coord.lat, 31.230);
}

#[test]
fn it_matches_by_substring_in_both_directions() {
    // Query contains the table name.
    assert_eq!(lookup("北京市").unwrap().lon, 116.397);
    // Table name contains the query.
    assert_eq!(lookup("石家").unwrap().lon, 114.502);
}

#[test]
fn it_returns_none_for_unknown_cities() {
    assert!(lookup("XYZ").is_none());
}

#[test]
fn it_defaults_to_beijing_center() {
    let coord = default_coordinate();

    assert_eq!(coord.lon, 116.397);
    assert_eq!(coord.lat, 39.905);
}
