use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use mockito::Matcher;
use tokio::time;

use super::CityFallback;
use super::Geocoder;
use super::GeocodingProvider;
use super::nominatim::Nominatim;
use super::photon::Photon;
use crate::domain::models::Coordinate;
use crate::domain::models::Provenance;
use crate::domain::models::Waypoint;

#[derive(Debug)]
struct StalledProvider {}

#[async_trait]
impl GeocodingProvider for StalledProvider {
    fn name(&self) -> &'static str {
        return "stalled";
    }

    fn provenance(&self) -> Provenance {
        return Provenance::Nominatim;
    }

    async fn geocode(&self, _waypoint: &Waypoint) -> Result<Coordinate> {
        time::sleep(Duration::from_secs(60)).await;
        bail!("unreachable");
    }
}

#[derive(Debug)]
struct FailingProvider {}

#[async_trait]
impl GeocodingProvider for FailingProvider {
    fn name(&self) -> &'static str {
        return "failing";
    }

    fn provenance(&self) -> Provenance {
        return Provenance::Photon;
    }

    async fn geocode(&self, _waypoint: &Waypoint) -> Result<Coordinate> {
        bail!("provider unavailable");
    }
}

fn fallback_to(server: &mockito::Server) -> CityFallback {
    return CityFallback::new(&server.url(), Duration::from_millis(500));
}

#[tokio::test]
async fn it_falls_through_a_timed_out_provider_to_the_next_one() -> Result<()> {
    let body = r#"{"features":[
        {"geometry":{"coordinates":[116.403,39.924]},"properties":{"name":"故宫","type":"tourism","importance":0.6}}
    ]}"#;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create();

    let geocoder = Geocoder::new(
        vec![
            Box::new(StalledProvider {}),
            Box::new(Photon::with_url(server.url())),
        ],
        fallback_to(&server),
        Duration::from_millis(100),
    );

    let result = geocoder
        .geocode(&Waypoint::with_city("故宫", "北京"))
        .await;

    mock.assert();
    assert_eq!(result.coordinate.lon, 116.403);
    assert_eq!(result.provenance, Provenance::Photon);
    assert!(!result.is_guess());
    return Ok(());
}

#[tokio::test]
async fn it_uses_the_city_level_lookup_when_all_providers_fail() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded(
            "featuretype".to_string(),
            "city".to_string(),
        ))
        .with_status(200)
        .with_body(r#"[{"lon":"120.155","lat":"30.274"}]"#)
        .create();

    let geocoder = Geocoder::new(
        vec![Box::new(FailingProvider {})],
        fallback_to(&server),
        Duration::from_millis(100),
    );

    let result = geocoder
        .geocode(&Waypoint::with_city("某个小店", "杭州"))
        .await;

    mock.assert();
    assert_eq!(result.coordinate.lon, 120.155);
    assert_eq!(result.provenance, Provenance::CityLookup);
    assert!(result.is_guess());
    return Ok(());
}

#[tokio::test]
async fn it_uses_the_static_table_when_the_city_lookup_fails() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(503)
        .create();

    let geocoder = Geocoder::new(
        vec![Box::new(FailingProvider {})],
        fallback_to(&server),
        Duration::from_millis(100),
    );

    let result = geocoder
        .geocode(&Waypoint::with_city("某个小店", "深圳"))
        .await;

    mock.assert();
    assert_eq!(result.coordinate.lon, 114.057);
    assert_eq!(result.provenance, Provenance::CityTable);
    return Ok(());
}

#[tokio::test]
async fn it_defaults_to_beijing_for_unlisted_cities() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create();

    let geocoder = Geocoder::new(
        vec![Box::new(FailingProvider {})],
        fallback_to(&server),
        Duration::from_millis(100),
    );

    let result = geocoder.geocode(&Waypoint::with_city("店", "XYZ")).await;

    assert_eq!(result.coordinate.lon, 116.397);
    assert_eq!(result.coordinate.lat, 39.905);
    assert_eq!(result.provenance, Provenance::DefaultCity);
    return Ok(());
}

#[tokio::test]
async fn it_defaults_to_beijing_without_a_city() -> Result<()> {
    let server = mockito::Server::new_async().await;

    let geocoder = Geocoder::new(
        vec![Box::new(FailingProvider {})],
        fallback_to(&server),
        Duration::from_millis(100),
    );

    let result = geocoder.geocode(&Waypoint::new("神秘地点")).await;

    assert_eq!(result.coordinate.lon, 116.397);
    assert_eq!(result.provenance, Provenance::DefaultCity);
    return Ok(());
}

#[tokio::test]
async fn it_prefers_the_first_provider_when_it_succeeds() -> Result<()> {
    let body = r#"[
        {"lon":"116.403","lat":"39.924","importance":0.6,"display_name":"故宫博物院","type":"tourism"}
    ]"#;

    let mut server = mockito::Server::new_async().await;
    let nominatim_mock = server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create();
    let photon_mock = server.mock("GET", "/api").expect(0).create();

    let geocoder = Geocoder::new(
        vec![
            Box::new(Nominatim::with_url(server.url())),
            Box::new(Photon::with_url(server.url())),
        ],
        fallback_to(&server),
        Duration::from_millis(500),
    );

    let result = geocoder.geocode(&Waypoint::new("故宫")).await;

    nominatim_mock.assert();
    photon_mock.assert();
    assert_eq!(result.provenance, Provenance::Nominatim);
    return Ok(());
}
