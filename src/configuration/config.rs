#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::Result;
use clap::ArgMatches;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Eq, PartialEq, EnumIter, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    AmapDirectionsUrl,
    AmapEnabled,
    AmapGeocodeUrl,
    AmapWebApiKey,
    ApiUrl,
    AuthRefreshToken,
    AuthToken,
    ConfigFile,
    GeocodeTimeout,
    MapProvider,
    NominatimUrl,
    OsmEnabled,
    OsrmProfile,
    OsrmUrl,
    PageSize,
    PhotonUrl,
    SessionId,
    StreamThinkingTimeout,
    UserId,
    Username,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn get_u64(key: ConfigKey, fallback: u64) -> u64 {
        return Config::get(key).parse::<u64>().unwrap_or(fallback);
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        if key == ConfigKey::Username {
            let mut user = env::var("USER").unwrap_or_else(|_| return "".to_string());
            if user.is_empty() {
                user = "User".to_string();
            }

            return user;
        }

        let config_path = dirs::config_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join("wayfarer/config.toml");

        let res = match key {
            ConfigKey::AmapDirectionsUrl => "https://restapi.amap.com",
            ConfigKey::AmapEnabled => "true",
            ConfigKey::AmapGeocodeUrl => "https://restapi.amap.com",
            ConfigKey::AmapWebApiKey => "",
            ConfigKey::ApiUrl => "http://127.0.0.1:8080",
            ConfigKey::AuthRefreshToken => "",
            ConfigKey::AuthToken => "",
            ConfigKey::GeocodeTimeout => "3000",
            ConfigKey::MapProvider => "osm",
            ConfigKey::NominatimUrl => "https://nominatim.openstreetmap.org",
            ConfigKey::OsmEnabled => "true",
            ConfigKey::OsrmProfile => "driving",
            ConfigKey::OsrmUrl => "https://router.project-osrm.org",
            ConfigKey::PageSize => "10",
            ConfigKey::PhotonUrl => "https://photon.komoot.io",
            ConfigKey::SessionId => "",
            ConfigKey::StreamThinkingTimeout => "3000",
            ConfigKey::UserId => "",

            // Special
            ConfigKey::ConfigFile => config_path.to_str().unwrap_or(""),
            ConfigKey::Username => "",
        };

        return res.to_string();
    }

    /// Layers configuration: built-in defaults, then the TOML config file, then
    /// CLI overrides.
    pub async fn load(matches: &ArgMatches) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key));
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        if let Ok(Some(arg_config_file)) =
            matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
        {
            config_file = arg_config_file.to_string();
        }

        let config_path = path::PathBuf::from(&config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(item) = doc.get(&key.to_string()) {
                    if let Some(val) = item.as_str() {
                        Config::set(key, val);
                    } else {
                        // Numbers and booleans come back through their TOML
                        // display form.
                        Config::set(key, item.to_string().trim());
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                Config::set(key, val);
            }
        }

        return Ok(());
    }
}
