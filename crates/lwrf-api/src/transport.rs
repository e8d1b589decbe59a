// Shared transport configuration for building reqwest::Client instances.
//
// Both the legacy and the cloud manager clients share TLS and timeout
// settings through this module, avoiding duplicated builder logic.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("lwrf/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (the legacy manager hosts are self-signed).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Transport for the legacy manager pages, which never had valid certificates.
    pub fn legacy() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Body helpers ─────────────────────────────────────────────────────

const PREVIEW_BYTES: usize = 200;

/// Read a response body chunk by chunk, giving up with
/// [`Error::BodyTooLarge`] as soon as it grows past `limit` bytes.
pub(crate) async fn read_capped(
    resp: &mut reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await.map_err(Error::Transport)? {
        body.extend_from_slice(&chunk);
        if body.len() > limit {
            return Err(Error::BodyTooLarge { limit });
        }
    }
    Ok(body)
}

/// At most the first 200 bytes of `body`, cut back to a char boundary.
pub(crate) fn body_preview(body: &str) -> &str {
    let mut end = body.len().min(PREVIEW_BYTES);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
