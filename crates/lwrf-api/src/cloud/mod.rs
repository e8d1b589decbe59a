// Current-generation manager API (token-based REST)

pub mod client;
pub mod types;

pub use client::{CLOUD_HOST, CloudClient};
