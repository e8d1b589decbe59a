use thiserror::Error;

/// Top-level error type for the `lwrf-api` crate.
///
/// Covers every failure mode across both manager API generations:
/// transport, HTTP validation, body parsing, and the configuration
/// sentinels raised when the account has no usable rooms.
/// `lwrf-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP validation ─────────────────────────────────────────────
    /// The manager answered with something other than HTTP 200.
    #[error("Request failed with HTTP {status} at {endpoint}")]
    HttpStatus { status: u16, endpoint: String },

    /// The manager answered with a body that is not JSON.
    #[error("Invalid content-type at {endpoint}: expected application/json, got {content_type}")]
    ContentType {
        endpoint: String,
        content_type: String,
    },

    /// The response body exceeded the accepted size and the connection was dropped.
    #[error("Response body exceeded {limit} bytes")]
    BodyTooLarge { limit: usize },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Error from the legacy manager page (login rejected, unexpected page).
    #[error("Legacy manager error: {message}")]
    LegacyApi { message: String },

    // ── Configuration sentinels ─────────────────────────────────────
    /// A script variable the legacy page must define was not found.
    #[error("Legacy manager page does not define `{marker}`")]
    MissingMarker { marker: &'static str },

    /// The nested user profile lacks an estate, location, zone or room.
    #[error("No {level} defined for this account -- create one in the LightwaveRF app")]
    MissingProfileLevel { level: &'static str },
}

impl Error {
    /// Returns `true` for errors caused by the account's remote setup
    /// rather than by the network. Callers fall back to static devices.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingMarker { .. } | Self::MissingProfileLevel { .. }
        )
    }

    /// Returns `true` if the manager rejected the credentials.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 401 | 403, .. })
    }

    /// Returns `true` if this is a transient network error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
