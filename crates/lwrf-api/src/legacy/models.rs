// Legacy manager page data shapes.

/// Rooms defined by the legacy manager page.
pub const ROOM_COUNT: u32 = 8;

/// Device slots per room: devices 1-6, moods 1-3, all-off.
pub const SLOTS_PER_ROOM: u32 = 10;

/// One cell of the 8 x 10 room/slot grid scraped from the manager page.
///
/// `type_code` is the raw status letter:
/// `O` on/off, `D` dimmer, `R` radiator, `P` open/close, `I` inactive,
/// `m`/`M` mood (inactive/active), `o` all-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSlot {
    /// Room number, 1-based.
    pub room: u32,
    pub room_name: String,
    /// Slot number within the room, 1-based.
    pub slot: u32,
    pub device_name: String,
    pub type_code: String,
}
