use anyhow::Result;
use mockito::Matcher;

use super::Amap;
use crate::domain::models::Waypoint;
use crate::infrastructure::geocoding::GeocodingProvider;

#[tokio::test]
async fn it_parses_location_pairs() -> Result<()> {
    let body = r#"{"status":"1","geocodes":[{"location":"116.403,39.924"}]}"#;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v3/geocode/geo")
        .match_query(Matcher::UrlEncoded("key".to_string(), "abc".to_string()))
        .with_status(200)
        .with_body(body)
        .create();

    let provider = Amap::with_url(server.url(), "abc".to_string());
    let coord = provider
        .geocode(&Waypoint::with_city("故宫", "北京"))
        .await?;

    mock.assert();
    assert_eq!(coord.lon, 116.403);
    assert_eq!(coord.lat, 39.924);
    return Ok(());
}

#[tokio::test]
async fn it_fails_fast_without_an_api_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/v3/geocode/geo").expect(0).create();

    let provider = Amap::with_url(server.url(), "".to_string());
    let res = provider.geocode(&Waypoint::new("故宫")).await;

    mock.assert();
    assert!(res.is_err());
}

#[tokio::test]
async fn it_fails_on_rejected_status() {
    let body = r#"{"status":"0","info":"INVALID_USER_KEY"}"#;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v3/geocode/geo")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create();

    let provider = Amap::with_url(server.url(), "abc".to_string());
    let res = provider.geocode(&Waypoint::new("故宫")).await;

    mock.assert();
    assert!(res.is_err());
}
