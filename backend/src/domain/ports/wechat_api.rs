//! Driven port for the WeChat open platform.
//!
//! The domain owns the request and response shapes so the HTTP adapter can
//! be swapped for a scripted double in tests.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{JsCode, PlatformAccessToken, SessionExchange};

use super::define_port_error;

/// Content type assumed for QR images when the platform omits one.
pub const DEFAULT_QR_CONTENT_TYPE: &str = "image/jpeg";

/// Body of an unlimited mini-program code request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrCodeRequest {
    /// Mini-program page the code opens.
    pub path: String,
    /// Scene string handed to the page, e.g. `id=7`.
    pub scene: String,
}

/// Image returned by the QR endpoint, passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCodeImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl QrCodeImage {
    /// Wrap raw bytes, defaulting the content type to JPEG.
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.unwrap_or_else(|| DEFAULT_QR_CONTENT_TYPE.to_owned()),
        }
    }
}

define_port_error! {
    /// Errors surfaced while calling the WeChat platform.
    pub enum WeChatApiError {
        /// Network transport failed before a response arrived.
        Transport { message: String } => "wechat transport failed: {message}",
        /// The call exceeded the configured timeout.
        Timeout { message: String } => "wechat request timed out: {message}",
        /// The platform answered with a non-success HTTP status.
        Status { status: u16 } => "wechat returned HTTP {status}",
        /// The platform reported an `errcode` in its JSON body.
        Api { errcode: i64, errmsg: String } => "wechat api error {errcode}: {errmsg}",
        /// The response body could not be decoded.
        Decode { message: String } => "wechat response decode failed: {message}",
    }
}

/// Calls the mini-program backend needs from WeChat.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeChatApi: Send + Sync {
    /// Exchange a login code for the user's identity (`jscode2session`).
    async fn code_to_session(&self, js_code: &JsCode) -> Result<SessionExchange, WeChatApiError>;

    /// Obtain a fresh platform access token (`client_credential` grant).
    async fn fetch_access_token(&self) -> Result<PlatformAccessToken, WeChatApiError>;

    /// Generate an unlimited mini-program code.
    async fn create_unlimited_qr_code(
        &self,
        access_token: &str,
        request: &QrCodeRequest,
    ) -> Result<QrCodeImage, WeChatApiError>;
}
