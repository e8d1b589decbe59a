// ── Core error types ──
//
// User-facing errors from lwrf-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<lwrf_api::Error>`
// impl translates manager-API errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Manager (HTTP) errors ────────────────────────────────────────
    #[error("Cannot reach the LightwaveRF manager at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// The remote account has no usable rooms; fall back to static devices.
    #[error("Remote configuration unusable: {message}")]
    Configuration { message: String },

    #[error("Manager API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Hub (UDP) errors ─────────────────────────────────────────────
    #[error("Hub socket error: {0}")]
    Socket(#[from] std::io::Error),

    #[error("Hub did not acknowledge command {code} within {ttl_secs}s")]
    ReplyTimeout { code: String, ttl_secs: u64 },

    #[error("Command for {address} dropped: queue full ({capacity} entries)")]
    QueueOverflow { address: String, capacity: usize },

    #[error("Hub connection closed")]
    HubClosed,

    #[error("Hub client not started; call start() first")]
    NotStarted,

    #[error("Malformed hub reply: {content:?}")]
    MalformedReply { content: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: room {room_id} device {device_id}")]
    DeviceNotFound { room_id: u32, device_id: u32 },

    #[error("Validation failed: {message}")]
    Validation { message: String },
}

impl CoreError {
    /// Returns `true` when the caller should fall back to static devices.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

// ── Conversion from manager-API errors ───────────────────────────────

impl From<lwrf_api::Error> for CoreError {
    fn from(err: lwrf_api::Error) -> Self {
        match err {
            lwrf_api::Error::Transport(ref e) => {
                if e.is_connect() || e.is_timeout() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            lwrf_api::Error::InvalidUrl(e) => CoreError::Validation {
                message: format!("Invalid manager URL: {e}"),
            },
            lwrf_api::Error::Tls(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {reason}"),
            },
            lwrf_api::Error::HttpStatus { status, endpoint } => CoreError::Api {
                message: format!("{endpoint} returned HTTP {status}"),
                status: Some(status),
            },
            err @ (lwrf_api::Error::ContentType { .. }
            | lwrf_api::Error::BodyTooLarge { .. }
            | lwrf_api::Error::LegacyApi { .. }) => CoreError::Api {
                message: err.to_string(),
                status: None,
            },
            lwrf_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Deserialization error: {message}"),
                status: None,
            },
            err @ (lwrf_api::Error::MissingMarker { .. }
            | lwrf_api::Error::MissingProfileLevel { .. }) => CoreError::Configuration {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_gaps_become_configuration_errors() {
        let err = CoreError::from(lwrf_api::Error::MissingProfileLevel { level: "zone" });
        assert!(err.is_configuration());
        assert!(err.to_string().contains("zone"));
    }

    #[test]
    fn http_status_keeps_code() {
        let err = CoreError::from(lwrf_api::Error::HttpStatus {
            status: 404,
            endpoint: "v1/auth".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(404), .. }));
    }
}
