use anyhow::Result;
use mockito::Matcher;

use super::Photon;
use crate::domain::models::Waypoint;
use crate::infrastructure::geocoding::GeocodingProvider;

#[tokio::test]
async fn it_prefers_tourism_features_with_matching_names() -> Result<()> {
    let body = r#"{"features":[
        {"geometry":{"coordinates":[121.49,31.24]},"properties":{"name":"写字楼","type":"house","importance":0.7}},
        {"geometry":{"coordinates":[116.403,39.924]},"properties":{"name":"故宫","type":"tourism","importance":0.6}}
    ]}"#;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api")
        .match_query(Matcher::UrlEncoded("q".to_string(), "故宫".to_string()))
        .with_status(200)
        .with_body(body)
        .create();

    let provider = Photon::with_url(server.url());
    let coord = provider.geocode(&Waypoint::new("故宫")).await?;

    mock.assert();
    assert_eq!(coord.lon, 116.403);
    assert_eq!(coord.lat, 39.924);
    return Ok(());
}

#[tokio::test]
async fn it_fails_on_empty_feature_lists() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"features":[]}"#)
        .create();

    let provider = Photon::with_url(server.url());
    let res = provider.geocode(&Waypoint::new("不存在的地方")).await;

    mock.assert();
    assert!(res.is_err());
}
