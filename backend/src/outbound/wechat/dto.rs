//! Wire shapes of the WeChat open platform responses.
//!
//! Every endpoint reports failure as `{"errcode": n, "errmsg": "..."}` with
//! HTTP 200, so each DTO carries the pair and is checked before use.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::SessionExchange;
use crate::domain::ports::WeChatApiError;

fn check_errcode(errcode: Option<i64>, errmsg: Option<&str>) -> Result<(), WeChatApiError> {
    match errcode {
        None | Some(0) => Ok(()),
        Some(code) => Err(WeChatApiError::api(code, errmsg.unwrap_or_default())),
    }
}

/// `GET /sns/jscode2session`.
#[derive(Debug, Deserialize)]
pub(super) struct Code2SessionDto {
    openid: Option<String>,
    errcode: Option<i64>,
    errmsg: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl Code2SessionDto {
    pub(super) fn into_exchange(self) -> Result<SessionExchange, WeChatApiError> {
        check_errcode(self.errcode, self.errmsg.as_deref())?;
        Ok(SessionExchange {
            openid: self.openid,
            attributes: self.rest,
        })
    }
}

/// `GET /cgi-bin/token`.
#[derive(Debug, Deserialize)]
pub(super) struct AccessTokenDto {
    access_token: Option<String>,
    expires_in: Option<u64>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

impl AccessTokenDto {
    /// Token text and lifetime in seconds.
    pub(super) fn into_parts(self) -> Result<(String, Option<u64>), WeChatApiError> {
        check_errcode(self.errcode, self.errmsg.as_deref())?;
        let token = self
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| WeChatApiError::decode("access_token missing from response"))?;
        Ok((token, self.expires_in))
    }
}

/// JSON body the QR endpoint returns instead of an image.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorDto {
    errcode: Option<i64>,
    errmsg: Option<String>,
}

impl ErrorDto {
    pub(super) fn into_error(self) -> WeChatApiError {
        match check_errcode(self.errcode, self.errmsg.as_deref()) {
            Err(error) => error,
            Ok(()) => WeChatApiError::decode("expected image but received JSON"),
        }
    }
}
