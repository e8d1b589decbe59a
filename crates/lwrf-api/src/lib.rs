// lwrf-api: Async Rust clients for the LightwaveRF manager APIs (legacy + cloud)

pub mod cloud;
pub mod error;
pub mod legacy;
pub mod transport;

pub use cloud::{CLOUD_HOST, CloudClient};
pub use error::Error;
pub use legacy::{LegacyClient, ManagerSlot};
pub use transport::{TlsMode, TransportConfig};
