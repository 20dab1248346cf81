#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::infrastructure::geocoding::Geocoder;
use crate::infrastructure::routing::amap::AmapRouting;
use crate::infrastructure::routing::osrm::OsrmRouting;
use crate::infrastructure::routing::RoutingService;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MapProviderKind {
    Amap,
    Osm,
}

impl MapProviderKind {
    pub fn parse(input: &str) -> Result<MapProviderKind> {
        match input {
            "amap" => return Ok(MapProviderKind::Amap),
            "osm" => return Ok(MapProviderKind::Osm),
            _ => bail!(format!("unsupported map provider {input}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapState {
    Uninitialized,
    Initializing,
    Ready,
    Destroyed,
}

/// One map backend's lifecycle: bring up its routing service, tear it down.
#[async_trait]
pub trait MapBackend: Send + Sync {
    fn kind(&self) -> MapProviderKind;
    async fn init(&mut self) -> Result<Arc<dyn RoutingService>>;
    fn destroy(&mut self);
}

pub struct AmapBackend {
    enabled: bool,
    web_api_key: String,
    geocoder: Arc<Geocoder>,
}

impl AmapBackend {
    pub fn new(enabled: bool, web_api_key: &str, geocoder: Arc<Geocoder>) -> AmapBackend {
        return AmapBackend {
            enabled,
            web_api_key: web_api_key.to_string(),
            geocoder,
        };
    }

    pub fn from_config(geocoder: Arc<Geocoder>) -> AmapBackend {
        return AmapBackend::new(
            Config::get(ConfigKey::AmapEnabled) != "false",
            &Config::get(ConfigKey::AmapWebApiKey),
            geocoder,
        );
    }
}

#[async_trait]
impl MapBackend for AmapBackend {
    fn kind(&self) -> MapProviderKind {
        return MapProviderKind::Amap;
    }

    async fn init(&mut self) -> Result<Arc<dyn RoutingService>> {
        if !self.enabled {
            bail!("map provider amap is disabled in configuration");
        }
        if self.web_api_key.is_empty() {
            bail!("map provider amap requires a configured web API key");
        }

        return Ok(Arc::new(AmapRouting::from_config(self.geocoder.clone())));
    }

    fn destroy(&mut self) {}
}

pub struct OsmBackend {
    enabled: bool,
    osrm_url: String,
    geocoder: Arc<Geocoder>,
}

impl OsmBackend {
    pub fn new(enabled: bool, osrm_url: &str, geocoder: Arc<Geocoder>) -> OsmBackend {
        return OsmBackend {
            enabled,
            osrm_url: osrm_url.to_string(),
            geocoder,
        };
    }

    pub fn from_config(geocoder: Arc<Geocoder>) -> OsmBackend {
        return OsmBackend::new(
            Config::get(ConfigKey::OsmEnabled) != "false",
            &Config::get(ConfigKey::OsrmUrl),
            geocoder,
        );
    }
}

#[async_trait]
impl MapBackend for OsmBackend {
    fn kind(&self) -> MapProviderKind {
        return MapProviderKind::Osm;
    }

    async fn init(&mut self) -> Result<Arc<dyn RoutingService>> {
        if !self.enabled {
            bail!("map provider osm is disabled in configuration");
        }
        if self.osrm_url.is_empty() {
            bail!("map provider osm has no OSRM endpoint configured");
        }

        return Ok(Arc::new(OsrmRouting::new(
            &self.osrm_url,
            &Config::get(ConfigKey::OsrmProfile),
            self.geocoder.clone(),
        )));
    }

    fn destroy(&mut self) {}
}

/// Owns the active map backend. Exactly one backend is live at a time;
/// switching providers means destroy then init.
pub struct MapServiceManager {
    geocoder: Arc<Geocoder>,
    state: MapState,
    backend: Option<Box<dyn MapBackend>>,
    routing: Option<Arc<dyn RoutingService>>,
}

impl Default for MapServiceManager {
    fn default() -> MapServiceManager {
        return MapServiceManager::new(Arc::new(Geocoder::default()));
    }
}

impl MapServiceManager {
    pub fn new(geocoder: Arc<Geocoder>) -> MapServiceManager {
        return MapServiceManager {
            geocoder,
            state: MapState::Uninitialized,
            backend: None,
            routing: None,
        };
    }

    pub fn state(&self) -> MapState {
        return self.state;
    }

    pub fn current_provider(&self) -> Option<MapProviderKind> {
        return self.backend.as_ref().map(|backend| return backend.kind());
    }

    pub async fn init_map_service(&mut self, kind: MapProviderKind) -> Result<()> {
        let backend: Box<dyn MapBackend> = match kind {
            MapProviderKind::Amap => Box::new(AmapBackend::from_config(self.geocoder.clone())),
            MapProviderKind::Osm => Box::new(OsmBackend::from_config(self.geocoder.clone())),
        };

        return self.init_backend(backend).await;
    }

    pub async fn init_backend(&mut self, mut backend: Box<dyn MapBackend>) -> Result<()> {
        if self.state == MapState::Ready || self.state == MapState::Initializing {
            bail!("a map backend is already active, destroy it first");
        }

        self.state = MapState::Initializing;
        match backend.init().await {
            Ok(routing) => {
                self.routing = Some(routing);
                self.backend = Some(backend);
                self.state = MapState::Ready;
                return Ok(());
            }
            Err(err) => {
                self.state = MapState::Uninitialized;
                return Err(err);
            }
        }
    }

    /// The uniform `{ map, routingService }` handle, reduced to its routing
    /// half on this side of the wire.
    pub fn routing_service(&self) -> Result<Arc<dyn RoutingService>> {
        match &self.routing {
            Some(routing) if self.state == MapState::Ready => return Ok(routing.clone()),
            _ => bail!("no map backend is ready"),
        }
    }

    /// Releases the active backend. Safe to call repeatedly; calling it when
    /// nothing was ever initialized is a no-op.
    pub fn destroy(&mut self) {
        if self.state != MapState::Ready {
            return;
        }

        if let Some(backend) = self.backend.as_mut() {
            backend.destroy();
        }
        self.backend = None;
        self.routing = None;
        self.state = MapState::Destroyed;
    }
}
