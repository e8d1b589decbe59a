// ── Hub command grammar ──
//
// Every datagram body is `<address><action>`. Addresses name a room
// (`!R<room>`) or a device in a room (`!R<room>D<device>`); actions are
// short function codes terminated by a NUL byte.

pub mod energy;

use std::fmt;

/// Number of discrete dim levels the hub understands (0..=32).
pub const DIM_LEVELS: u8 = 32;

/// Target of a hub command. Also the queue's supersede key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    /// Every device in a room.
    Room(u32),
    /// One device slot in a room.
    Device { room_id: u32, device_id: u32 },
    /// The hub itself (registration, energy monitor). Renders empty.
    Hub,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room(room_id) => write!(f, "!R{room_id}"),
            Self::Device { room_id, device_id } => write!(f, "!R{room_id}D{device_id}"),
            Self::Hub => Ok(()),
        }
    }
}

/// What to do with the addressed target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Off,
    On,
    Open,
    Close,
    Stop,
    /// All devices in the room off; only valid with a room address.
    RoomOff,
    /// Dim to a level on the hub's 1..=32 scale.
    Dim(u8),
    /// Pair this client with the hub (the hub asks for confirmation on its display).
    Register,
    /// Ask the energy monitor for a reading.
    EnergyRequest,
}

impl Action {
    /// The wire body appended after the address.
    pub fn body(self) -> String {
        match self {
            Self::Off => "F0\0".into(),
            Self::On => "F1\0".into(),
            Self::Open => "F>\0".into(),
            Self::Close => "F<\0".into(),
            Self::Stop => "F^\0".into(),
            Self::RoomOff => "Fa\0".into(),
            Self::Dim(level) => format!("FdP{level}\0"),
            Self::Register => "!R1Fa".into(),
            Self::EnergyRequest => "@?\0".into(),
        }
    }
}

/// Convert a brightness percentage to the hub's dim scale.
///
/// Percentages above 100 are clamped; the result is `floor(percent * 0.32)`.
pub fn dim_level(percent: u8) -> u8 {
    let percent = u16::from(percent.min(100));
    u8::try_from(percent * u16::from(DIM_LEVELS) / 100).unwrap_or(DIM_LEVELS)
}

/// A fully addressed hub command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubCommand {
    pub address: Address,
    pub action: Action,
}

impl HubCommand {
    pub fn device(room_id: u32, device_id: u32, action: Action) -> Self {
        Self {
            address: Address::Device { room_id, device_id },
            action,
        }
    }

    pub fn on(room_id: u32, device_id: u32) -> Self {
        Self::device(room_id, device_id, Action::On)
    }

    pub fn off(room_id: u32, device_id: u32) -> Self {
        Self::device(room_id, device_id, Action::Off)
    }

    pub fn room_off(room_id: u32) -> Self {
        Self {
            address: Address::Room(room_id),
            action: Action::RoomOff,
        }
    }

    /// Dim a device to `percent`. A percentage that rounds down to
    /// level 0 turns the device off instead.
    pub fn dim(room_id: u32, device_id: u32, percent: u8) -> Self {
        match dim_level(percent) {
            0 => Self::off(room_id, device_id),
            level => Self::device(room_id, device_id, Action::Dim(level)),
        }
    }

    pub fn register() -> Self {
        Self {
            address: Address::Hub,
            action: Action::Register,
        }
    }

    pub fn energy() -> Self {
        Self {
            address: Address::Hub,
            action: Action::EnergyRequest,
        }
    }

    pub fn body(&self) -> String {
        self.action.body()
    }

    /// `<address><body>`, the datagram payload minus the sequence code.
    pub fn wire(&self) -> String {
        format!("{}{}", self.address, self.body())
    }

    /// Printable form for logs and errors (wire text without the NUL).
    pub fn label(&self) -> String {
        self.wire().trim_end_matches('\0').to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn device_actions_render_function_codes() {
        assert_eq!(HubCommand::on(2, 3).wire(), "!R2D3F1\0");
        assert_eq!(HubCommand::off(2, 3).wire(), "!R2D3F0\0");
        assert_eq!(HubCommand::device(1, 1, Action::Open).wire(), "!R1D1F>\0");
        assert_eq!(HubCommand::device(1, 1, Action::Close).wire(), "!R1D1F<\0");
        assert_eq!(HubCommand::device(1, 1, Action::Stop).wire(), "!R1D1F^\0");
    }

    #[test]
    fn room_off_uses_room_address() {
        let cmd = HubCommand::room_off(4);
        assert_eq!(cmd.address.to_string(), "!R4");
        assert_eq!(cmd.wire(), "!R4Fa\0");
    }

    #[test]
    fn dim_zero_turns_off() {
        assert_eq!(HubCommand::dim(1, 2, 0), HubCommand::off(1, 2));
        // 3% is below one dim step.
        assert_eq!(HubCommand::dim(1, 2, 3), HubCommand::off(1, 2));
    }

    #[test]
    fn dim_levels_scale_to_thirty_two() {
        assert_eq!(HubCommand::dim(1, 2, 50).wire(), "!R1D2FdP16\0");
        assert_eq!(HubCommand::dim(1, 2, 100).wire(), "!R1D2FdP32\0");
        assert_eq!(dim_level(4), 1);
        assert_eq!(dim_level(99), 31);
        assert_eq!(dim_level(250), 32);
    }

    #[test]
    fn hub_literals() {
        assert_eq!(HubCommand::register().wire(), "!R1Fa");
        assert_eq!(HubCommand::energy().wire(), "@?\0");
    }
}
