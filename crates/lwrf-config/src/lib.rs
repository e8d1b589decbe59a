//! Shared configuration for the lwrf tools.
//!
//! TOML profiles, PIN resolution (env + keyring + plaintext), static device
//! lists, and translation to `lwrf_core::HubConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lwrf_api::TlsMode;
use lwrf_core::config::{DEFAULT_MANAGER_HOST, default_manager_path};
use lwrf_core::{Device, HubConfig, ManagerProtocol, OverflowPolicy};

/// Keyring service name; entries are stored as `<profile>/pin`.
pub const KEYRING_SERVICE: &str = "lwrf";
pub const ENV_PREFIX: &str = "LWRF_";
pub const PIN_ENV: &str = "LWRF_PIN";
pub const EMAIL_ENV: &str = "LWRF_EMAIL";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found in config")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named hub profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: the explicit one, else the configured
    /// default, else `"default"`.
    pub fn profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(ToOwned::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Gap between hub commands, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout_ms() -> u64 {
    1000
}

/// A named hub profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Hub IP address (or the LAN broadcast address).
    pub hub_ip: Option<String>,

    /// Manager account email.
    pub email: Option<String>,

    /// Manager PIN (plaintext; prefer keyring or env var).
    pub pin: Option<String>,

    /// Environment variable name containing the PIN.
    pub pin_env: Option<String>,

    /// Manager host (default `web.trustsmartcloud.com`).
    pub manager_host: Option<String>,

    /// Manager page path for the legacy protocol.
    pub manager_host_path: Option<String>,

    /// `auto`, `v1` or `v2`.
    pub protocol: Option<String>,

    /// Override the command gap, in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Seconds to wait for a hub reply.
    pub reply_ttl_secs: Option<u64>,

    /// `drop-oldest` or `drop-newest`.
    pub overflow: Option<OverflowPolicy>,

    /// Path to a custom CA certificate for the cloud API.
    pub ca_cert: Option<PathBuf>,

    /// Devices known without synchronizing.
    #[serde(default)]
    pub devices: Vec<Device>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "lwrf", "lwrf").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lwrf");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` + environment. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Render a Config back to TOML (PINs redacted).
pub fn to_toml(cfg: &Config) -> Result<String, ConfigError> {
    let mut value = toml::Value::try_from(cfg)?;
    let profiles = value
        .get_mut("profiles")
        .and_then(toml::Value::as_table_mut);
    for profile in profiles.into_iter().flat_map(|p| p.iter_mut().map(|(_, v)| v)) {
        if let Some(pin) = profile.get_mut("pin") {
            *pin = toml::Value::String("********".into());
        }
    }
    Ok(toml::to_string_pretty(&value)?)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the manager PIN. `None` means sync will be skipped.
///
/// Order: the profile's `pin_env` variable, `LWRF_PIN`, the system
/// keyring, then the plaintext `pin`.
pub fn resolve_pin(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Some(ref env_name) = profile.pin_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(val) = std::env::var(PIN_ENV) {
        return Some(SecretString::from(val));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/pin")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    profile.pin.clone().map(SecretString::from)
}

/// Profile email, falling back to `LWRF_EMAIL`.
pub fn resolve_email(profile: &Profile) -> Option<String> {
    profile
        .email
        .clone()
        .or_else(|| std::env::var(EMAIL_ENV).ok())
}

// ── Profile → HubConfig ─────────────────────────────────────────────

/// Build a `HubConfig` from a profile, with no CLI overrides.
pub fn profile_to_hub_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<HubConfig, ConfigError> {
    let raw_ip = profile
        .hub_ip
        .as_deref()
        .ok_or_else(|| ConfigError::Validation {
            field: "hub_ip".into(),
            reason: format!("profile '{profile_name}' has no hub_ip"),
        })?;
    let ip = parse_hub_ip(raw_ip)?;

    let manager_host = profile
        .manager_host
        .clone()
        .unwrap_or_else(|| DEFAULT_MANAGER_HOST.into());
    let manager_host_path = profile
        .manager_host_path
        .clone()
        .unwrap_or_else(|| default_manager_path(&manager_host).into());

    let protocol = match profile.protocol.as_deref() {
        Some(raw) => raw
            .parse::<ManagerProtocol>()
            .map_err(|reason| ConfigError::Validation {
                field: "protocol".into(),
                reason,
            })?,
        None => ManagerProtocol::Auto,
    };

    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);

    let mut config = HubConfig {
        email: resolve_email(profile),
        pin: resolve_pin(profile, profile_name),
        manager_host,
        manager_host_path,
        protocol,
        command_interval: Duration::from_millis(profile.timeout_ms.unwrap_or(defaults.timeout_ms)),
        tls,
        ..HubConfig::new(ip)
    };
    if let Some(secs) = profile.reply_ttl_secs {
        config.reply_ttl = Duration::from_secs(secs);
    }
    if let Some(policy) = profile.overflow {
        config.overflow_policy = policy;
    }
    Ok(config)
}

pub fn parse_hub_ip(raw: &str) -> Result<IpAddr, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Validation {
        field: "hub_ip".into(),
        reason: format!("'{raw}' is not an IP address"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use lwrf_core::DeviceType;
    use lwrf_core::config::COCO_MANAGER_PATH;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
output = "json"

[profiles.home]
hub_ip = "192.168.1.50"
email = "user@example.com"
pin = "1234"
manager_host = "lightwaverfhost.co.uk"
protocol = "v1"
timeout_ms = 1500
overflow = "drop-newest"

[[profiles.home.devices]]
roomId = 1
roomName = "Lounge"
deviceId = 2
deviceName = "Lamp"
deviceType = "D"
"#;

    #[test]
    fn loads_profiles_and_static_devices() {
        let file = write_config(SAMPLE);
        let cfg = load_config_from(file.path()).unwrap();

        assert_eq!(cfg.profile_name(None), "home");
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.timeout_ms, 1000);
        let profile = cfg.profile("home").unwrap();
        assert_eq!(profile.devices.len(), 1);
        assert_eq!(profile.devices[0].device_type, DeviceType::Dimmer);
        assert!(matches!(cfg.profile("away"), Err(ConfigError::UnknownProfile { .. })));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.profile_name(None), "default");
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profile_translates_to_hub_config() {
        let file = write_config(SAMPLE);
        let cfg = load_config_from(file.path()).unwrap();
        let profile = cfg.profile("home").unwrap();

        let hub = profile_to_hub_config(profile, "home", &cfg.defaults).unwrap();

        assert_eq!(hub.ip.to_string(), "192.168.1.50");
        assert_eq!(hub.manager_host_path, COCO_MANAGER_PATH);
        assert_eq!(hub.protocol, ManagerProtocol::V1);
        assert_eq!(hub.command_interval, Duration::from_millis(1500));
        assert_eq!(hub.overflow_policy, OverflowPolicy::DropNewest);
        assert!(hub.pin.is_some());
    }

    #[test]
    fn plaintext_pin_is_last_resort() {
        let profile = Profile {
            pin: Some("9876".into()),
            pin_env: Some("LWRF_TEST_PIN_THAT_IS_NEVER_SET".into()),
            ..Profile::default()
        };
        // LWRF_PIN or a keyring entry on the host would take precedence.
        if std::env::var(PIN_ENV).is_err() {
            let pin = resolve_pin(&profile, "lwrf-config-test").unwrap();
            assert_eq!(pin.expose_secret(), "9876");
        }
    }

    #[test]
    fn invalid_values_are_reported_by_field() {
        let bad_ip = Profile {
            hub_ip: Some("not-an-ip".into()),
            ..Profile::default()
        };
        let err = profile_to_hub_config(&bad_ip, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "hub_ip"));

        let bad_protocol = Profile {
            hub_ip: Some("10.0.0.2".into()),
            protocol: Some("v3".into()),
            ..Profile::default()
        };
        let err = profile_to_hub_config(&bad_protocol, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "protocol"));
    }

    #[test]
    fn rendered_toml_hides_pins() {
        let file = write_config(SAMPLE);
        let cfg = load_config_from(file.path()).unwrap();
        let rendered = to_toml(&cfg).unwrap();
        assert!(rendered.contains("********"));
        assert!(!rendered.contains("1234"));
    }
}
