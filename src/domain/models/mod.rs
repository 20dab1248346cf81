mod author;
mod conversation;
mod geo;
mod message;
mod route;
mod session;
mod stream;
mod waypoint;

pub use author::*;
pub use conversation::*;
pub use geo::*;
pub use message::*;
pub use route::*;
pub use session::*;
pub use stream::*;
pub use waypoint::*;
