//! Device listing.

use std::sync::Arc;

use tabled::Tabled;
use tracing::{info, warn};

use lwrf_core::{Device, Hub};

use crate::cli::{DevicesArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Room")]
    room_id: u32,
    #[tabled(rename = "Room Name")]
    room_name: String,
    #[tabled(rename = "Device")]
    device_id: u32,
    #[tabled(rename = "Name")]
    device_name: String,
    #[tabled(rename = "Type")]
    device_type: String,
}

impl From<&Arc<Device>> for DeviceRow {
    fn from(d: &Arc<Device>) -> Self {
        Self {
            room_id: d.room_id,
            room_name: d.room_name.clone(),
            device_id: d.device_id,
            device_name: d.device_name.clone(),
            device_type: d.device_type.to_string(),
        }
    }
}

fn plain_id(d: &Arc<Device>) -> String {
    format!("R{}D{}", d.room_id, d.device_id)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(hub: &Hub, args: &DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.static_only {
        info!("skipping manager synchronization");
    } else {
        match hub.sync().await {
            Ok(devices) => info!(count = devices.len(), "device list synchronized"),
            Err(e) if e.is_configuration() => {
                warn!(error = %e, "manager has no usable devices, listing static devices");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let devices = hub.devices();
    let out = output::render_list(
        &global.output,
        &devices,
        |d| DeviceRow::from(d),
        plain_id,
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
