mod client;
mod credentials;

pub use client::*;
pub use credentials::*;
