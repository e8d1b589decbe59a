// ── API-to-domain conversions ──
//
// Bridges raw `lwrf_api` shapes into `Device`s and merges statically
// configured devices with synchronized ones.

use lwrf_api::cloud::types::Room;
use lwrf_api::legacy::ManagerSlot;

use crate::model::{Device, DeviceType};

/// Legacy manager cells to devices. Only on/off and dimmer cells are kept;
/// grid order (room-major, slot-minor) is preserved.
pub fn devices_from_slots(slots: Vec<ManagerSlot>) -> Vec<Device> {
    slots
        .into_iter()
        .filter_map(|slot| {
            let device_type = DeviceType::from_code(&slot.type_code);
            matches!(device_type, DeviceType::OnOff | DeviceType::Dimmer).then(|| Device {
                room_id: slot.room,
                room_name: slot.room_name,
                device_id: slot.slot,
                device_name: slot.device_name,
                device_type,
            })
        })
        .collect()
}

/// Cloud profile rooms to devices, in API order. Devices with an unknown
/// type id are kept as [`DeviceType::Unsupported`].
pub fn devices_from_rooms(rooms: &[Room]) -> Vec<Device> {
    rooms
        .iter()
        .flat_map(|room| {
            room.devices.iter().map(move |device| Device {
                room_id: room.room_number,
                room_name: room.name.clone(),
                device_id: device.device_number,
                device_name: device.name.clone(),
                device_type: DeviceType::from_cloud_type_id(device.device_type_id),
            })
        })
        .collect()
}

/// Static devices first, then every synchronized device that is not
/// already present under the same ids and names.
pub fn merge_static(static_devices: &[Device], synced: Vec<Device>) -> Vec<Device> {
    let mut merged = static_devices.to_vec();
    merged.extend(
        synced
            .into_iter()
            .filter(|device| !static_devices.iter().any(|s| s.same_identity(device))),
    );
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn slot(room: u32, slot: u32, code: &str) -> ManagerSlot {
        ManagerSlot {
            room,
            room_name: format!("Room {room}"),
            slot,
            device_name: format!("Device {slot}"),
            type_code: code.into(),
        }
    }

    fn device(room_id: u32, device_id: u32, name: &str) -> Device {
        Device {
            room_id,
            room_name: "Lounge".into(),
            device_id,
            device_name: name.into(),
            device_type: DeviceType::OnOff,
        }
    }

    #[test]
    fn legacy_keeps_switches_and_dimmers_in_grid_order() {
        let devices = devices_from_slots(vec![
            slot(1, 1, "O"),
            slot(1, 2, "I"),
            slot(1, 3, "D"),
            slot(2, 1, "P"),
            slot(2, 2, "R"),
            slot(3, 4, "O"),
        ]);

        let keys: Vec<_> = devices.iter().map(|d| (d.key(), d.device_type)).collect();
        assert_eq!(
            keys,
            vec![
                ((1, 1), DeviceType::OnOff),
                ((1, 3), DeviceType::Dimmer),
                ((3, 4), DeviceType::OnOff),
            ]
        );
        assert_eq!(devices[0].room_name, "Room 1");
    }

    #[test]
    fn cloud_rooms_map_type_ids() {
        let rooms: Vec<Room> = serde_json::from_value(json!([
            { "name": "Lounge", "room_number": 1, "devices": [
                { "name": "Lamp", "device_number": 1, "device_type_id": 1 },
                { "name": "Spots", "device_number": 2, "device_type_id": 2 }
            ]},
            { "name": "Garage", "room_number": 4, "devices": [
                { "name": "Door", "device_number": 1, "device_type_id": 3 },
                { "name": "Heater", "device_number": 2, "device_type_id": 7 }
            ]}
        ]))
        .unwrap();

        let devices = devices_from_rooms(&rooms);
        let codes: Vec<_> = devices.iter().map(|d| d.device_type.code()).collect();
        assert_eq!(codes, vec![Some('O'), Some('D'), Some('P'), None]);
        assert_eq!(devices[2].room_id, 4);
        assert_eq!(devices[2].room_name, "Garage");
        assert_eq!(devices[2].device_name, "Door");
    }

    #[test]
    fn static_devices_win_on_identity() {
        let statics = vec![device(1, 1, "Lamp")];
        let synced = vec![device(1, 1, "Lamp"), device(1, 1, "Renamed"), device(1, 2, "Fan")];

        let merged = merge_static(&statics, synced);

        let names: Vec<_> = merged.iter().map(|d| d.device_name.as_str()).collect();
        assert_eq!(names, vec!["Lamp", "Renamed", "Fan"]);
    }
}
