// Response shapes for the LightwaveRF cloud API (`/v1/...`).
//
// Only the fields the synchronizer reads are modelled; everything else
// in the nested profile is ignored by serde.

use serde::{Deserialize, Deserializer};

use crate::error::Error;

/// `GET /v1/user`
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub application_key: String,
}

/// `GET /v1/auth`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// `GET /v1/user_profile?nested=1`
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfileResponse {
    #[serde(default)]
    pub content: ProfileContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileContent {
    #[serde(default)]
    pub estates: Option<Vec<Estate>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Estate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub locations: Option<Vec<Location>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub zones: Option<Vec<Zone>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rooms: Option<Vec<Room>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Room {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub room_number: u32,
    #[serde(default)]
    pub active: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub devices: Vec<ProfileDevice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDevice {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub device_number: u32,
    #[serde(default)]
    pub device_type_id: Option<u32>,
    #[serde(default)]
    pub active: Option<i64>,
}

/// The API sends `null` for empty rooms and unnamed entries.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl UserProfileResponse {
    /// Rooms of the first zone of the first location of the first estate.
    ///
    /// Any missing or empty level is a configuration problem on the
    /// account, reported as [`Error::MissingProfileLevel`].
    pub fn first_zone_rooms(&self) -> Result<&[Room], Error> {
        let estate = first(self.content.estates.as_deref(), "estate")?;
        let location = first(estate.locations.as_deref(), "location")?;
        let zone = first(location.zones.as_deref(), "zone")?;
        let rooms = zone
            .rooms
            .as_deref()
            .filter(|rooms| !rooms.is_empty())
            .ok_or(Error::MissingProfileLevel { level: "room" })?;
        Ok(rooms)
    }
}

fn first<'a, T>(items: Option<&'a [T]>, level: &'static str) -> Result<&'a T, Error> {
    items
        .and_then(<[T]>::first)
        .ok_or(Error::MissingProfileLevel { level })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: serde_json::Value) -> UserProfileResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn walks_first_estate_location_zone() {
        let p = profile(json!({
            "content": { "estates": [{ "locations": [{ "zones": [{ "rooms": [
                { "name": "Lounge", "room_number": 1, "devices": [
                    { "name": "Lamp", "device_number": 2, "device_type_id": 2 }
                ]},
                { "name": "Hall", "room_number": 3 }
            ]}]}]}]}
        }));

        let rooms = p.first_zone_rooms().unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].devices[0].device_type_id, Some(2));
        assert!(rooms[1].devices.is_empty());
    }

    #[test]
    fn null_devices_and_names_read_as_empty() {
        let p = profile(json!({
            "content": { "estates": [{ "locations": [{ "zones": [{ "rooms": [
                { "name": "Lounge", "room_number": 1, "devices": [
                    { "name": null, "device_number": 1, "device_type_id": 1 }
                ]},
                { "name": null, "room_number": 2, "devices": null }
            ]}]}]}]}
        }));

        let rooms = p.first_zone_rooms().unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].devices[0].name, "");
        assert_eq!(rooms[1].name, "");
        assert!(rooms[1].devices.is_empty());
    }

    #[test]
    fn missing_levels_are_reported_by_name() {
        let cases = [
            (json!({ "content": {} }), "estate"),
            (json!({ "content": { "estates": [] } }), "estate"),
            (json!({ "content": { "estates": [{}] } }), "location"),
            (json!({ "content": { "estates": [{ "locations": [] }] } }), "location"),
            (json!({ "content": { "estates": [{ "locations": [{}] }] } }), "zone"),
            (
                json!({ "content": { "estates": [{ "locations": [{ "zones": [{}] }] }] } }),
                "room",
            ),
            (
                json!({ "content": { "estates": [{ "locations": [{ "zones": [{ "rooms": [] }] }] }] } }),
                "room",
            ),
        ];

        for (value, expected) in cases {
            match profile(value).first_zone_rooms() {
                Err(Error::MissingProfileLevel { level }) => assert_eq!(level, expected),
                other => panic!("expected missing {expected}, got {other:?}"),
            }
        }
    }
}
