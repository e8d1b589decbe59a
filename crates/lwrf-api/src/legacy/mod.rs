// Legacy manager (form POST + page scrape)

pub mod client;
pub mod models;
pub mod scrape;

pub use client::LegacyClient;
pub use models::ManagerSlot;
