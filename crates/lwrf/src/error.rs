//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use lwrf_config::ConfigError;
use lwrf_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Manager ──────────────────────────────────────────────────────
    #[error("Could not reach the LightwaveRF manager at {url}: {reason}")]
    #[diagnostic(
        code(lwrf::connection_failed),
        help(
            "Check the manager host and your network connection.\n\
             Use `lwrf devices --static-only` to list configured devices offline."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("The manager rejected the account credentials: {message}")]
    #[diagnostic(
        code(lwrf::auth_failed),
        help(
            "Verify the email and PIN for this profile.\n\
             Set the PIN with LWRF_PIN or store it in the system keyring under lwrf/<profile>/pin."
        )
    )]
    AuthFailed { message: String },

    #[error("Manager API error: {message}")]
    #[diagnostic(code(lwrf::api_error))]
    ApiError { message: String },

    #[error("Manager account is not usable: {message}")]
    #[diagnostic(
        code(lwrf::manager_configuration),
        help("Add rooms and devices in the LightwaveRF app, or list static devices in your profile.")
    )]
    ManagerConfiguration { message: String },

    // ── Hub ──────────────────────────────────────────────────────────
    #[error("Could not use the hub sockets")]
    #[diagnostic(
        code(lwrf::socket),
        help(
            "Replies arrive on UDP port 9761; another LightwaveRF client may already hold it.\n\
             Close it and retry."
        )
    )]
    Socket(#[source] std::io::Error),

    #[error("Hub did not answer command {code} within {seconds}s")]
    #[diagnostic(
        code(lwrf::timeout),
        help(
            "Check hub_ip and that this machine is paired with the hub.\n\
             Pair with: lwrf register"
        )
    )]
    HubTimeout { code: String, seconds: u64 },

    #[error("Command for {address} dropped: queue full ({capacity} entries)")]
    #[diagnostic(code(lwrf::queue_overflow))]
    QueueOverflow { address: String, capacity: usize },

    #[error("Hub connection closed")]
    #[diagnostic(code(lwrf::closed))]
    HubClosed,

    #[error("Unexpected hub reply: {content:?}")]
    #[diagnostic(code(lwrf::malformed_reply))]
    MalformedReply { content: String },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("Device not found: room {room} device {device}")]
    #[diagnostic(code(lwrf::not_found), help("Run: lwrf devices"))]
    NotFound { room: u32, device: u32 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lwrf::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(lwrf::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No hub configured")]
    #[diagnostic(
        code(lwrf::no_config),
        help(
            "Pass --hub-ip (or set LWRF_HUB_IP), or add a profile with hub_ip to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(lwrf::config))]
    Config(Box<ConfigError>),

    // ── Process ──────────────────────────────────────────────────────
    #[error("Interrupted")]
    #[diagnostic(code(lwrf::interrupted))]
    Interrupted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Socket(_) => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::HubTimeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Interrupted => exit_code::INTERRUPTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversion from library errors ───────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Api {
                message,
                status: Some(401 | 403),
            } => Self::AuthFailed { message },
            CoreError::Api { message, .. } => Self::ApiError { message },
            CoreError::Configuration { message } => Self::ManagerConfiguration { message },
            CoreError::Socket(e) => Self::Socket(e),
            CoreError::ReplyTimeout { code, ttl_secs } => Self::HubTimeout {
                code,
                seconds: ttl_secs,
            },
            CoreError::QueueOverflow { address, capacity } => {
                Self::QueueOverflow { address, capacity }
            }
            CoreError::HubClosed | CoreError::NotStarted => Self::HubClosed,
            CoreError::MalformedReply { content } => Self::MalformedReply { content },
            CoreError::DeviceNotFound {
                room_id,
                device_id,
            } => Self::NotFound {
                room: room_id,
                device: device_id,
            },
            CoreError::Validation { message } => Self::Validation {
                field: "command".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { profile } => Self::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            other => Self::Config(Box::new(other)),
        }
    }
}
