// ── Device registry ──
//
// Lock-free device list. Readers take a snapshot; a sync or static load
// swaps in a whole new list at once.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::model::Device;

/// The hub's known devices, in room-major order.
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: ArcSwap<Vec<Arc<Device>>>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self {
            devices: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Replace the whole list.
    pub fn replace(&self, devices: Vec<Device>) {
        self.devices
            .store(Arc::new(devices.into_iter().map(Arc::new).collect()));
    }

    pub fn snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.load_full()
    }

    pub fn find(&self, room_id: u32, device_id: u32) -> Option<Arc<Device>> {
        self.devices
            .load()
            .iter()
            .find(|d| d.key() == (room_id, device_id))
            .cloned()
    }

    pub fn by_room(&self, room_id: u32) -> Vec<Arc<Device>> {
        self.devices
            .load()
            .iter()
            .filter(|d| d.room_id == room_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.load().is_empty()
    }
}
