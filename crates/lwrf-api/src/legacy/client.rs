// Legacy manager HTTP client
//
// The first-generation LightwaveRF manager has no API. Logging in with a
// form POST returns an HTML page whose inline script holds the room and
// device configuration; `scrape` turns that page into grid slots.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::legacy::models::ManagerSlot;
use crate::legacy::scrape;
use crate::transport::{TransportConfig, body_preview, read_capped};

/// Upper bound on the manager page size; anything larger is not a manager page.
pub const MAX_BODY_BYTES: usize = 1_000_000;

/// Raw HTTP client for the legacy (form-scrape) manager.
pub struct LegacyClient {
    http: reqwest::Client,
    page_url: Url,
}

impl LegacyClient {
    /// Create a client for the manager page at `base_url` + `path`.
    ///
    /// `base_url` is the manager root (e.g. `https://web.trustsmartcloud.com`),
    /// `path` the page path (e.g. `/manager/index.php`).
    pub fn new(base_url: &Url, path: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url.join(path)?))
    }

    /// Create a legacy client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, page_url: Url) -> Self {
        Self { http, page_url }
    }

    /// The manager page URL.
    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    /// Log in and return the raw manager page.
    ///
    /// The body is read incrementally and the connection dropped as soon
    /// as it grows past [`MAX_BODY_BYTES`].
    pub async fn fetch_page(&self, email: &str, pin: &SecretString) -> Result<String, Error> {
        debug!("POST {}", self.page_url);

        let form = [("pin", pin.expose_secret()), ("email", email)];
        let mut resp = self
            .http
            .post(self.page_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = read_capped(&mut resp, MAX_BODY_BYTES).await;
        if !status.is_success() {
            // An oversized error page is reported by status alone.
            let detail = body
                .map(|b| body_preview(&String::from_utf8_lossy(&b)).to_owned())
                .unwrap_or_default();
            return Err(Error::LegacyApi {
                message: format!("HTTP {status}: {detail}"),
            });
        }

        let body = body.inspect_err(|e| {
            if matches!(e, Error::BodyTooLarge { .. }) {
                warn!(
                    limit = MAX_BODY_BYTES,
                    "manager page too large, dropping connection"
                );
            }
        })?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Log in and parse the manager page into the full 8 x 10 slot grid.
    pub async fn fetch_slots(
        &self,
        email: &str,
        pin: &SecretString,
    ) -> Result<Vec<ManagerSlot>, Error> {
        let body = self.fetch_page(email, pin).await?;
        scrape::parse_manager_page(&body).inspect_err(|e| {
            warn!(error = %e, body_preview = body_preview(&body), "unexpected manager page");
        })
    }
}
