// ── Domain model ──

pub mod device;
pub mod energy;

pub use device::{Device, DeviceType};
pub use energy::EnergyReading;
