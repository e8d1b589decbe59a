// ── Configuration synchronizer ──
//
// Pulls the room/device inventory from the manager service. The legacy
// manager is scraped from an HTML page; the cloud API is walked through
// its token chain. Both produce the same `Device` list.

use lwrf_api::{CloudClient, LegacyClient, TransportConfig};
use secrecy::SecretString;
use tracing::{debug, info};
use url::Url;

use crate::config::{HubConfig, ManagerProtocol};
use crate::convert::{devices_from_rooms, devices_from_slots};
use crate::error::CoreError;
use crate::model::Device;

/// Base URL for a manager host. Bare host names get `https://`; values
/// that already carry a scheme are used as-is.
pub fn manager_base_url(host: &str) -> Result<Url, CoreError> {
    let raw = if host.contains("://") {
        host.to_owned()
    } else {
        format!("https://{host}")
    };
    Url::parse(&raw).map_err(|e| CoreError::Validation {
        message: format!("invalid manager host '{host}': {e}"),
    })
}

/// Fetch the device list for `config`.
///
/// Returns `Ok(None)` when email or PIN is missing; the caller then relies
/// on static devices.
pub async fn sync(config: &HubConfig) -> Result<Option<Vec<Device>>, CoreError> {
    let Some((email, pin)) = config.credentials() else {
        info!("no manager email/PIN configured, skipping device sync");
        return Ok(None);
    };

    let base_url = manager_base_url(&config.manager_host)?;
    let devices = match config.effective_protocol() {
        ManagerProtocol::V2 => sync_cloud(config, base_url, email, pin).await?,
        ManagerProtocol::V1 | ManagerProtocol::Auto => {
            sync_legacy(config, &base_url, email, pin).await?
        }
    };

    info!(count = devices.len(), host = %config.manager_host, "synchronized devices");
    Ok(Some(devices))
}

async fn sync_legacy(
    config: &HubConfig,
    base_url: &Url,
    email: &str,
    pin: &SecretString,
) -> Result<Vec<Device>, CoreError> {
    let transport = TransportConfig {
        timeout: config.http_timeout,
        ..TransportConfig::legacy()
    };
    let client = LegacyClient::new(base_url, &config.manager_host_path, &transport)?;
    debug!(url = %client.page_url(), "fetching legacy manager page");

    let slots = client.fetch_slots(email, pin).await?;
    Ok(devices_from_slots(slots))
}

async fn sync_cloud(
    config: &HubConfig,
    base_url: Url,
    email: &str,
    pin: &SecretString,
) -> Result<Vec<Device>, CoreError> {
    let transport = TransportConfig {
        tls: config.tls.clone(),
        timeout: config.http_timeout,
    };
    let client = CloudClient::new(base_url, &transport)?;
    let profile = client.fetch_profile(email, pin).await?;
    let rooms = profile.first_zone_rooms()?;
    Ok(devices_from_rooms(rooms))
}
