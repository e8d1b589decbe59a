// Async HTTP client for the LightwaveRF cloud API.
//
// Base: https://control-api.lightwaverf.com/v1/
// Auth: application key -> token, then X-LWRF-* headers on every call.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::types::{AuthResponse, UserProfileResponse, UserResponse};
use crate::error::Error;
use crate::transport::{TransportConfig, body_preview};

/// Host name of the current-generation manager API.
pub const CLOUD_HOST: &str = "control-api.lightwaverf.com";

const TOKEN_HEADER: &str = "X-LWRF-token";
const PLATFORM_HEADER: &str = "X-LWRF-platform";
const SKIN_HEADER: &str = "X-LWRF-skin";
const PLATFORM: &str = "ios";
const SKIN: &str = "lightwaverf";

/// Async client for the LightwaveRF cloud API.
///
/// Starts unauthenticated; [`with_token`](Self::with_token) returns a
/// client that attaches the token headers to every request.
pub struct CloudClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl CloudClient {
    // ── Constructors ─────────────────────────────────────────────────

    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::from_reqwest(base_url, http))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: Url, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url,
            token: None,
        }
    }

    /// Attach a session token obtained from [`token`](Self::token).
    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    fn apply_token(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder
                .header(TOKEN_HEADER, token.expose_secret())
                .header(PLATFORM_HEADER, PLATFORM)
                .header(SKIN_HEADER, SKIN),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self
            .apply_token(self.http.get(url).query(params))
            .send()
            .await?;
        handle_response(path, resp).await
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// `GET /v1/user` -- exchange account credentials for an application key.
    pub async fn application_key(
        &self,
        email: &str,
        pin: &SecretString,
    ) -> Result<SecretString, Error> {
        let user: UserResponse = self
            .get(
                "v1/user",
                &[("password", pin.expose_secret()), ("username", email)],
            )
            .await?;
        Ok(SecretString::from(user.application_key))
    }

    /// `GET /v1/auth` -- exchange an application key for a session token.
    pub async fn token(&self, application_key: &SecretString) -> Result<SecretString, Error> {
        let auth: AuthResponse = self
            .get(
                "v1/auth",
                &[("application_key", application_key.expose_secret())],
            )
            .await?;
        Ok(SecretString::from(auth.token))
    }

    /// `GET /v1/device_type?nested=1` -- the catalogue of device types.
    pub async fn device_types(&self) -> Result<serde_json::Value, Error> {
        self.get("v1/device_type", &[("nested", "1")]).await
    }

    /// `GET /v1/user_profile?nested=1` -- the estate/location/zone/room tree.
    pub async fn user_profile(&self) -> Result<UserProfileResponse, Error> {
        self.get("v1/user_profile", &[("nested", "1")]).await
    }

    /// Run the full four-step chain and return the nested profile.
    ///
    /// Each step runs only if the previous one succeeded; nothing is retried.
    pub async fn fetch_profile(
        self,
        email: &str,
        pin: &SecretString,
    ) -> Result<UserProfileResponse, Error> {
        debug!("requesting application key");
        let application_key = self.application_key(email, pin).await?;

        debug!("requesting token");
        let token = self.token(&application_key).await?;
        let client = self.with_token(token);

        let device_types = client.device_types().await?;
        debug!(device_types = %device_types, "device type catalogue");

        debug!("requesting user profile");
        client.user_profile().await
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Require HTTP 200 and a JSON content type, then deserialize.
async fn handle_response<T: DeserializeOwned>(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            endpoint: endpoint.to_owned(),
        });
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    if !content_type.starts_with("application/json") {
        return Err(Error::ContentType {
            endpoint: endpoint.to_owned(),
            content_type,
        });
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", body_preview(&body)),
            body: body.clone(),
        }
    })
}
