//! Reqwest-backed WeChat adapter.
//!
//! Owns transport concerns only: URL construction, timeouts, HTTP status
//! mapping and decoding into domain types.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use super::dto::{AccessTokenDto, Code2SessionDto, ErrorDto};
use crate::domain::ports::{QrCodeImage, QrCodeRequest, WeChatApi, WeChatApiError};
use crate::domain::{JsCode, PlatformAccessToken, SessionExchange};

/// Public WeChat API host.
pub const DEFAULT_API_BASE_URL: &str = "https://api.weixin.qq.com";

const CODE2SESSION_PATH: &str = "sns/jscode2session";
const TOKEN_PATH: &str = "cgi-bin/token";
const QR_UNLIMITED_PATH: &str = "wxa/getwxacodeunlimit";

/// Mini-program credentials issued by the WeChat console.
#[derive(Clone)]
pub struct WeChatCredentials {
    pub appid: String,
    pub secret: Zeroizing<String>,
}

impl std::fmt::Debug for WeChatCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeChatCredentials")
            .field("appid", &self.appid)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Errors raised while building the client.
#[derive(Debug, thiserror::Error)]
pub enum WeChatClientBuildError {
    #[error("invalid WeChat base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP implementation of [`WeChatApi`].
pub struct WeChatHttpClient {
    client: Client,
    base_url: Url,
    credentials: WeChatCredentials,
    clock: Arc<dyn Clock>,
}

impl WeChatHttpClient {
    /// Build a client against `base_url` with a per-request `timeout`.
    pub fn new(
        base_url: &str,
        credentials: WeChatCredentials,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WeChatClientBuildError> {
        // `Url::join` replaces the last segment unless the base ends in '/'.
        let normalised = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalised)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            credentials,
            clock,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, WeChatApiError> {
        self.base_url
            .join(path)
            .map_err(|err| WeChatApiError::transport(format!("invalid endpoint {path}: {err}")))
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, WeChatApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .query(query)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        ensure_success(status)?;
        // jscode2session answers with `text/plain`; decode by content.
        serde_json::from_slice(&body)
            .map_err(|err| WeChatApiError::decode(format!("invalid JSON from {path}: {err}")))
    }
}

fn map_transport_error(error: reqwest::Error) -> WeChatApiError {
    let timed_out = error.is_timeout();
    // Query strings carry the app secret; keep URLs out of messages.
    let message = error.without_url().to_string();
    if timed_out {
        WeChatApiError::timeout(message)
    } else {
        WeChatApiError::transport(message)
    }
}

fn ensure_success(status: StatusCode) -> Result<(), WeChatApiError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(WeChatApiError::status(status.as_u16()))
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| value.to_ascii_lowercase().contains("json"))
}

#[async_trait]
impl WeChatApi for WeChatHttpClient {
    async fn code_to_session(&self, js_code: &JsCode) -> Result<SessionExchange, WeChatApiError> {
        let dto: Code2SessionDto = self
            .get_json(
                CODE2SESSION_PATH,
                &[
                    ("appid", self.credentials.appid.as_str()),
                    ("secret", self.credentials.secret.as_str()),
                    ("js_code", js_code.as_ref()),
                    ("grant_type", "authorization_code"),
                ],
            )
            .await?;
        dto.into_exchange()
    }

    async fn fetch_access_token(&self) -> Result<PlatformAccessToken, WeChatApiError> {
        let dto: AccessTokenDto = self
            .get_json(
                TOKEN_PATH,
                &[
                    ("grant_type", "client_credential"),
                    ("appid", self.credentials.appid.as_str()),
                    ("secret", self.credentials.secret.as_str()),
                ],
            )
            .await?;
        let (value, expires_in) = dto.into_parts()?;
        Ok(PlatformAccessToken::new(value, expires_in, self.clock.utc()))
    }

    async fn create_unlimited_qr_code(
        &self,
        access_token: &str,
        request: &QrCodeRequest,
    ) -> Result<QrCodeImage, WeChatApiError> {
        let response = self
            .client
            .post(self.endpoint(QR_UNLIMITED_PATH)?)
            .query(&[("access_token", access_token)])
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.map_err(map_transport_error)?;
        ensure_success(status)?;

        if is_json(content_type.as_deref()) {
            let dto: ErrorDto = serde_json::from_slice(&body).map_err(|err| {
                WeChatApiError::decode(format!("invalid JSON from {QR_UNLIMITED_PATH}: {err}"))
            })?;
            return Err(dto.into_error());
        }
        debug!(bytes = body.len(), scene = %request.scene, "qr code received");
        Ok(QrCodeImage::new(body.to_vec(), content_type))
    }
}

#[cfg(test)]
#[path = "http_client_tests.rs"]
mod tests;
