// Parser for the script variables embedded in the legacy manager page.
//
// The page defines three JavaScript arrays of quoted strings. This is a
// fixed micro-format, not JavaScript: each value runs from its marker to
// the next `;` and only the quoted strings inside it are read.

use crate::error::Error;
use crate::legacy::models::{ManagerSlot, ROOM_COUNT, SLOTS_PER_ROOM};

pub const ROOM_NAMES_MARKER: &str = "gRoomNames";
pub const DEVICE_NAMES_MARKER: &str = "gDeviceNames";
pub const DEVICE_STATUS_MARKER: &str = "gDeviceStatus";

/// Extract the full room/slot grid from a manager page body.
///
/// Fails closed: a page missing any of the three markers is rejected.
/// Arrays shorter than the grid yield empty names and type codes.
pub fn parse_manager_page(body: &str) -> Result<Vec<ManagerSlot>, Error> {
    let rooms = marker_value(body, ROOM_NAMES_MARKER)?;
    let devices = marker_value(body, DEVICE_NAMES_MARKER)?;
    let types = marker_value(body, DEVICE_STATUS_MARKER)?;

    let mut room_names = quoted_strings(rooms);
    let mut device_names = quoted_strings(devices);
    let mut type_codes = quoted_strings(types);

    let mut slots = Vec::with_capacity(usize::try_from(ROOM_COUNT * SLOTS_PER_ROOM).unwrap_or(0));
    for room in 1..=ROOM_COUNT {
        let room_name = room_names.next().unwrap_or_default();
        for slot in 1..=SLOTS_PER_ROOM {
            slots.push(ManagerSlot {
                room,
                room_name: room_name.to_owned(),
                slot,
                device_name: device_names.next().unwrap_or_default().to_owned(),
                type_code: type_codes.next().unwrap_or_default().to_owned(),
            });
        }
    }

    Ok(slots)
}

/// The statement assigning `marker`: from the marker up to the next `;`.
fn marker_value<'a>(body: &'a str, marker: &'static str) -> Result<&'a str, Error> {
    let start = body.find(marker).ok_or(Error::MissingMarker { marker })?;
    let rest = &body[start..];
    Ok(rest.find(';').map_or(rest, |end| &rest[..end]))
}

/// Iterate over the contents of every `"..."` pair, in order.
fn quoted_strings(value: &str) -> impl Iterator<Item = &str> {
    let mut rest = value;
    std::iter::from_fn(move || {
        let open = rest.find('"')?;
        let after = &rest[open + 1..];
        let close = after.find('"')?;
        let item = &after[..close];
        rest = &after[close + 1..];
        Some(item)
    })
}
