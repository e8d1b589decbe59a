// ── Runtime hub configuration ──
//
// Describes how to reach the hub and the manager service. Carries
// credentials but never touches disk: the CLI builds a `HubConfig`
// (usually through lwrf-config) and hands it in.

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

use lwrf_api::{CLOUD_HOST, TlsMode};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// UDP port the hub listens on for commands.
pub const HUB_COMMAND_PORT: u16 = 9760;
/// UDP port the hub sends replies to.
pub const HUB_REPLY_PORT: u16 = 9761;

pub const DEFAULT_MANAGER_HOST: &str = "web.trustsmartcloud.com";
pub const DEFAULT_MANAGER_PATH: &str = "/manager/index.php";
/// The co.uk manager serves its page under a different path.
pub const COCO_MANAGER_HOST: &str = "lightwaverfhost.co.uk";
pub const COCO_MANAGER_PATH: &str = "/cocomanager/index.php";

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_COMMAND_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_REPLY_TTL: Duration = Duration::from_secs(30);

/// Default page path for a manager host.
pub fn default_manager_path(host: &str) -> &'static str {
    if host.eq_ignore_ascii_case(COCO_MANAGER_HOST) {
        COCO_MANAGER_PATH
    } else {
        DEFAULT_MANAGER_PATH
    }
}

/// Which manager API generation to synchronize against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerProtocol {
    /// Cloud API for the cloud host, legacy page for anything else.
    #[default]
    Auto,
    /// Legacy form-scrape manager.
    V1,
    /// Token-authenticated cloud REST API.
    V2,
}

impl ManagerProtocol {
    /// Resolve `Auto` against the configured host.
    pub fn resolve(self, host: &str) -> Self {
        match self {
            Self::Auto if host.eq_ignore_ascii_case(CLOUD_HOST) => Self::V2,
            Self::Auto => Self::V1,
            explicit => explicit,
        }
    }
}

impl FromStr for ManagerProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "v1" | "legacy" => Ok(Self::V1),
            "v2" | "cloud" => Ok(Self::V2),
            other => Err(format!("unknown manager protocol '{other}' (expected auto, v1 or v2)")),
        }
    }
}

/// What to drop when the command queue is over capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued command.
    #[default]
    DropOldest,
    /// Reject the command that was just enqueued.
    DropNewest,
}

/// Configuration for talking to a single hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Hub address. A broadcast address works; replies are then only
    /// accepted from this exact address.
    pub ip: IpAddr,
    /// Manager account email. Sync is skipped without it.
    pub email: Option<String>,
    /// Manager account PIN. Sync is skipped without it.
    pub pin: Option<SecretString>,
    /// Manager host, or a full base URL (`http://127.0.0.1:8080`).
    pub manager_host: String,
    /// Page path for the legacy manager.
    pub manager_host_path: String,
    pub protocol: ManagerProtocol,
    /// Minimum gap between two datagrams to the hub.
    pub command_interval: Duration,
    pub queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
    /// How long a sent command waits for its reply.
    pub reply_ttl: Duration,
    /// TLS for the cloud API. The legacy manager always accepts invalid certs.
    pub tls: TlsMode,
    /// HTTP request timeout for synchronization.
    pub http_timeout: Duration,
    /// Hub command port. Only differs from [`HUB_COMMAND_PORT`] in tests.
    pub command_port: u16,
    /// Local reply port; 0 binds an ephemeral port.
    pub reply_port: u16,
}

impl HubConfig {
    /// Config for a hub at `ip` with every other setting at its default.
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            ..Self::default()
        }
    }

    /// Email and PIN, when both are configured.
    pub fn credentials(&self) -> Option<(&str, &SecretString)> {
        Some((self.email.as_deref()?, self.pin.as_ref()?))
    }

    pub fn effective_protocol(&self) -> ManagerProtocol {
        self.protocol.resolve(&self.manager_host)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::BROADCAST),
            email: None,
            pin: None,
            manager_host: DEFAULT_MANAGER_HOST.into(),
            manager_host_path: DEFAULT_MANAGER_PATH.into(),
            protocol: ManagerProtocol::Auto,
            command_interval: DEFAULT_COMMAND_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::DropOldest,
            reply_ttl: DEFAULT_REPLY_TTL,
            tls: TlsMode::System,
            http_timeout: Duration::from_secs(30),
            command_port: HUB_COMMAND_PORT,
            reply_port: HUB_REPLY_PORT,
        }
    }
}
