//! Client core for LightwaveRF Wi-Fi Link hubs.
//!
//! - **[`Hub`]**: Facade owning the whole lifecycle:
//!   [`start()`](Hub::start) binds the UDP sockets and spawns the dispatcher
//!   and receive tasks, typed operations (`turn_device_on`, `set_device_dim`,
//!   `request_energy`, ...) resolve when the hub answers, and
//!   [`close()`](Hub::close) fails whatever is still in flight.
//!
//! - **[`CommandQueue`]**: Coalesces duplicates, supersedes older commands
//!   for the same address and stays within its capacity. Owned by the
//!   dispatcher, which drains one command per configured interval.
//!
//! - **[`transport`]**: Sequence-coded datagrams out, reply correlation in,
//!   with a TTL sweep for listeners the hub never answers.
//!
//! - **[`sync`]**: Device inventory from either manager generation
//!   (legacy page scrape or cloud token API), normalized into [`Device`]s.

pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod hub;
pub mod model;
pub mod queue;
pub mod store;
pub mod sync;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Action, Address, HubCommand};
pub use config::{HubConfig, ManagerProtocol, OverflowPolicy};
pub use error::CoreError;
pub use hub::Hub;
pub use model::{Device, DeviceType, EnergyReading};
pub use queue::{Ack, CommandQueue};
pub use store::DeviceRegistry;
