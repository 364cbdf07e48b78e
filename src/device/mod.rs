//! HTTP transport for the device's web management interface.
//!
//! The device tracks the administrative session with a cookie set on the
//! first request to the root document; the underlying client stores it as a
//! transport side effect. Anti-forgery verification tokens travel in the
//! `__RequestVerificationToken` header and rotate across login phases.

pub mod login;
pub mod trust;
pub mod xml;

use crate::error::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Exact header name the device expects on outgoing requests.
pub const VERIFICATION_TOKEN: &str = "__RequestVerificationToken";
/// Alternate response header variant issued after the final login phase.
pub const VERIFICATION_TOKEN_ALT: &str = "__RequestVerificationTokenone";

/// Paths of the device endpoints the login protocol touches.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub root: String,
    pub token: String,
    pub challenge: String,
    pub authentication: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            root: "/".to_string(),
            token: "/api/webserver/token".to_string(),
            challenge: "/api/user/challenge_login".to_string(),
            authentication: "/api/user/authentication_login".to_string(),
        }
    }
}

/// Response wrapper for device requests.
#[derive(Debug)]
pub struct DeviceResponse {
    pub url: String,
    pub status: StatusCode,
    headers: HeaderMap,
    pub body: String,
}

impl DeviceResponse {
    /// Read a response header. Header names are matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct DeviceClient {
    client: reqwest::Client,
    base_url: String,
    endpoints: Endpoints,
}

impl DeviceClient {
    /// Build a client for the device at `base_url` with the default
    /// endpoint table.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_endpoints(base_url, Endpoints::default())
    }

    /// Build a client with a custom endpoint table.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_endpoints(base_url: &str, endpoints: Endpoints) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Session(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            endpoints,
        })
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// # Errors
    /// Returns an error if the base URL cannot be parsed, has no host, or
    /// uses an unsupported scheme.
    pub fn endpoint_url(&self, path: &str) -> Result<String> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Session(format!("invalid device URL: {e}")))?;

        let scheme = url.scheme();

        let host = url
            .host()
            .ok_or_else(|| Error::Session("invalid device URL: no host specified".to_string()))?
            .to_owned();

        let port = match url.port() {
            Some(p) => p,
            None => match scheme {
                "http" => 80,
                "https" => 443,
                _ => {
                    return Err(Error::Session(format!(
                        "invalid device URL: unsupported scheme {scheme}"
                    )))
                }
            },
        };

        Ok(format!("{scheme}://{host}:{port}{path}"))
    }

    /// Establish the device session by fetching the root document. The
    /// session cookie lands in the client's cookie store; this layer only
    /// judges the HTTP status.
    ///
    /// # Errors
    /// Returns `Error::Session` if the request fails or the device answers
    /// with a non-success status.
    #[instrument(skip(self))]
    pub async fn open_session(&self) -> Result<()> {
        let url = self.endpoint_url(&self.endpoints.root)?;
        debug!("opening device session: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Session(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Session(format!("{} - {}", url, response.status())));
        }

        Ok(())
    }

    /// Execute a request against the device. `token` is sent as the
    /// outgoing verification header; `body` as an XML document.
    ///
    /// # Errors
    /// Returns `Error::Protocol` if the request fails.
    #[instrument(skip(self, token, body))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> Result<DeviceResponse> {
        let url = self.endpoint_url(path)?;
        debug!("device request: {} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(token) = token {
            request = request.header(VERIFICATION_TOKEN, token);
        }
        if let Some(body) = body {
            request = request
                .header("Content-Type", "text/xml; charset=utf-8")
                .body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Protocol(format!("{url}: {e}")))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Protocol(format!("{url}: {e}")))?;

        Ok(DeviceResponse {
            url,
            status,
            headers,
            body,
        })
    }
}
