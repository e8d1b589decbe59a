//! CLI configuration: thin wrapper around `lwrf_config`.
//!
//! Layers `GlobalOpts` flag overrides (--hub-ip, --email, ...) on top of
//! the selected profile before building a `HubConfig`.

use lwrf_config::{Config, Profile, config_path, load_config, profile_to_hub_config};
use lwrf_core::{Device, HubConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything needed to stand up a `Hub` for one invocation.
#[derive(Debug)]
pub struct ResolvedHub {
    pub profile_name: String,
    pub config: HubConfig,
    pub static_devices: Vec<Device>,
}

/// Load the config file and resolve the active profile.
pub fn resolve_hub(global: &GlobalOpts) -> Result<ResolvedHub, CliError> {
    let config = load_config()?;
    resolve_hub_from(&config, global)
}

/// Resolve the active profile from an already-loaded config.
///
/// Flags take priority over profile values. Without a matching profile,
/// `--hub-ip` alone is enough to talk to a hub.
pub fn resolve_hub_from(config: &Config, global: &GlobalOpts) -> Result<ResolvedHub, CliError> {
    let profile_name = config.profile_name(global.profile.as_deref());

    let mut profile = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(config),
            });
        }
        None => Profile::default(),
    };

    if let Some(ref ip) = global.hub_ip {
        profile.hub_ip = Some(ip.clone());
    }
    if profile.hub_ip.is_none() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }
    if let Some(ref host) = global.manager_host {
        // The page path follows the host unless the host is unchanged.
        if profile.manager_host.as_deref() != Some(host.as_str()) {
            profile.manager_host_path = None;
        }
        profile.manager_host = Some(host.clone());
    }
    if let Some(ms) = global.timeout_ms {
        profile.timeout_ms = Some(ms);
    }

    let mut hub_config = profile_to_hub_config(&profile, &profile_name, &config.defaults)?;
    if let Some(protocol) = global.protocol {
        hub_config.protocol = protocol.into();
    }

    Ok(ResolvedHub {
        profile_name,
        config: hub_config,
        static_devices: profile.devices,
    })
}

fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use lwrf_core::{DeviceType, ManagerProtocol};

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["lwrf"];
        argv.extend_from_slice(args);
        argv.push("energy");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_home() -> Config {
        let mut config = Config::default();
        config.profiles.insert(
            "home".into(),
            Profile {
                hub_ip: Some("192.168.1.50".into()),
                manager_host: Some("lightwaverfhost.co.uk".into()),
                timeout_ms: Some(1500),
                devices: vec![Device {
                    room_id: 1,
                    room_name: "Lounge".into(),
                    device_id: 1,
                    device_name: "Lamp".into(),
                    device_type: DeviceType::Dimmer,
                }],
                ..Profile::default()
            },
        );
        config
    }

    #[test]
    fn profile_values_are_used() {
        let resolved = resolve_hub_from(&config_with_home(), &global(&["-p", "home"])).unwrap();

        assert_eq!(resolved.profile_name, "home");
        assert_eq!(resolved.config.ip.to_string(), "192.168.1.50");
        assert_eq!(resolved.config.manager_host_path, "/cocomanager/index.php");
        assert_eq!(resolved.config.command_interval, Duration::from_millis(1500));
        assert_eq!(resolved.static_devices.len(), 1);
    }

    #[test]
    fn flags_override_the_profile() {
        let resolved = resolve_hub_from(
            &config_with_home(),
            &global(&[
                "-p",
                "home",
                "--hub-ip",
                "10.0.0.9",
                "--manager-host",
                "web.trustsmartcloud.com",
                "--timeout-ms",
                "250",
                "--protocol",
                "v1",
            ]),
        )
        .unwrap();

        assert_eq!(resolved.config.ip.to_string(), "10.0.0.9");
        assert_eq!(resolved.config.manager_host_path, "/manager/index.php");
        assert_eq!(resolved.config.command_interval, Duration::from_millis(250));
        assert_eq!(resolved.config.protocol, ManagerProtocol::V1);
    }

    #[test]
    fn hub_ip_flag_works_without_a_profile() {
        let resolved = resolve_hub_from(&Config::default(), &global(&["--hub-ip", "10.0.0.2"])).unwrap();
        assert_eq!(resolved.profile_name, "default");
        assert!(resolved.static_devices.is_empty());
    }

    #[test]
    fn missing_hub_ip_is_reported() {
        let err = resolve_hub_from(&Config::default(), &global(&[])).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn unknown_explicit_profile_lists_available_ones() {
        let err = resolve_hub_from(&config_with_home(), &global(&["-p", "office"])).unwrap_err();
        match err {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "office");
                assert_eq!(available, "home");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
