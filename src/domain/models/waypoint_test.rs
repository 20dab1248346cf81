use super::Waypoint;

#[test]
fn it_parses_a_full_waypoint() {
    let waypoint = Waypoint::parse("故宫, 北京, 北京市").unwrap();

    assert_eq!(waypoint.keyword, "故宫");
    assert_eq!(waypoint.city.as_deref(), Some("北京"));
    assert_eq!(waypoint.province.as_deref(), Some("北京市"));
    assert_eq!(waypoint.search_query(), "故宫, 北京, 北京市");
}

#[test]
fn it_parses_a_bare_keyword() {
    let waypoint = Waypoint::parse("外滩").unwrap();

    assert_eq!(waypoint.keyword, "外滩");
    assert_eq!(waypoint.city, None);
    assert_eq!(waypoint.search_query(), "外滩");
}

#[test]
fn it_rejects_empty_keywords() {
    assert!(Waypoint::parse("").is_err());
    assert!(Waypoint::parse(", 北京").is_err());
}

#[test]
fn it_parses_waypoint_lists() {
    let waypoints = Waypoint::parse_list("故宫,北京; 颐和园,北京;").unwrap();

    assert_eq!(waypoints.len(), 2);
    assert_eq!(waypoints[0].keyword, "故宫");
    assert_eq!(waypoints[1].keyword, "颐和园");
}
