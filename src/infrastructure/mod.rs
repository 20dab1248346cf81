pub mod api;
pub mod geocoding;
pub mod map;
pub mod routing;
