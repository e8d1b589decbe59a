// ── Device domain types ──

use serde::{Deserialize, Serialize};
use strum::Display;

/// Canonical device type -- normalized from both manager generations.
///
/// Serialized as the hub's letter code (`"O"`, `"D"`, `"P"`, or `""`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    /// `O` -- on/off switch or socket.
    #[strum(to_string = "on/off")]
    OnOff,
    /// `D` -- dimmer.
    #[strum(to_string = "dimmer")]
    Dimmer,
    /// `P` -- open/close (blinds, garage doors).
    #[strum(to_string = "open/close")]
    OpenClose,
    /// Any other code; not controllable through this client.
    #[strum(to_string = "unsupported")]
    Unsupported,
}

impl DeviceType {
    /// The hub's single-letter type code, if the type is supported.
    pub fn code(self) -> Option<char> {
        match self {
            Self::OnOff => Some('O'),
            Self::Dimmer => Some('D'),
            Self::OpenClose => Some('P'),
            Self::Unsupported => None,
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "O" => Self::OnOff,
            "D" => Self::Dimmer,
            "P" => Self::OpenClose,
            _ => Self::Unsupported,
        }
    }

    /// Map a cloud `device_type_id` to a device type.
    pub fn from_cloud_type_id(id: Option<u32>) -> Self {
        match id {
            Some(1 | 11 | 12) => Self::OnOff,
            Some(2) => Self::Dimmer,
            Some(3) => Self::OpenClose,
            _ => Self::Unsupported,
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl From<String> for DeviceType {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<DeviceType> for String {
    fn from(device_type: DeviceType) -> Self {
        device_type.code().map(String::from).unwrap_or_default()
    }
}

/// A controllable device on the hub, identified by `(room_id, device_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub room_id: u32,
    #[serde(default)]
    pub room_name: String,
    pub device_id: u32,
    #[serde(default)]
    pub device_name: String,
    pub device_type: DeviceType,
}

impl Device {
    pub fn key(&self) -> (u32, u32) {
        (self.room_id, self.device_id)
    }

    /// Display name: room name followed by device name.
    pub fn display_name(&self) -> String {
        match (self.room_name.is_empty(), self.device_name.is_empty()) {
            (false, false) => format!("{} {}", self.room_name, self.device_name),
            (true, false) => self.device_name.clone(),
            (false, true) => self.room_name.clone(),
            (true, true) => format!("R{}D{}", self.room_id, self.device_id),
        }
    }

    /// Same room and device, under the same names.
    pub fn same_identity(&self, other: &Device) -> bool {
        self.room_id == other.room_id
            && self.device_id == other.device_id
            && self.room_name == other.room_name
            && self.device_name == other.device_name
    }
}
