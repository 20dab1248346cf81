use std::env;

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[tokio::test]
async fn it_loads_defaults_when_no_config_file_exists() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec![
        "wayfarer",
        "--config-file",
        "/definitely/not/a/real/path.toml",
    ])?;
    Config::load(&matches).await?;

    assert_eq!(Config::get(ConfigKey::MapProvider), "osm");
    assert_eq!(Config::get_u64(ConfigKey::GeocodeTimeout, 0), 3000);
    assert_eq!(
        Config::get(ConfigKey::NominatimUrl),
        "https://nominatim.openstreetmap.org"
    );
    return Ok(());
}

#[tokio::test]
async fn it_layers_config_file_and_cli_overrides() -> Result<()> {
    let config_path = env::temp_dir().join("wayfarer-config-test.toml");
    let mut file = fs::File::create(&config_path).await?;
    file.write_all(b"api-url = \"http://config-file:9999\"\nmap-provider = \"amap\"\n")
        .await?;

    let matches = cli::build().try_get_matches_from(vec![
        "wayfarer",
        "--config-file",
        config_path.to_str().unwrap(),
        "--map-provider",
        "osm",
    ])?;
    Config::load(&matches).await?;

    // File beats defaults, CLI beats the file.
    assert_eq!(Config::get(ConfigKey::ApiUrl), "http://config-file:9999");
    assert_eq!(Config::get(ConfigKey::MapProvider), "osm");

    fs::remove_file(config_path).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_on_a_malformed_config_file() -> Result<()> {
    let config_path = env::temp_dir().join("wayfarer-bad-config-test.toml");
    let mut file = fs::File::create(&config_path).await?;
    file.write_all(b"api-url = [not toml").await?;

    let matches = cli::build().try_get_matches_from(vec![
        "wayfarer",
        "--config-file",
        config_path.to_str().unwrap(),
    ])?;
    let res = Config::load(&matches).await;
    assert!(res.is_err());

    fs::remove_file(config_path).await?;
    return Ok(());
}
