mod chat;
pub mod markdown;
mod reconciler;

pub use chat::*;
pub use reconciler::*;
