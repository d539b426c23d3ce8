//! HTTP mapping for domain errors.
//!
//! Authorization-family failures (unknown session, missing card, foreign
//! card, duplicate card, WeChat failure) all surface as one indistinguishable
//! `403 {"code":"forbidden","message":"forbidden"}`. Internal errors are
//! redacted. The full error is logged before it is collapsed.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

pub(crate) const REJECTION_MESSAGE: &str = "forbidden";
pub(crate) const REDACTED_MESSAGE: &str = "Internal server error";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        code if code.is_rejection() => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn body_for(error: &Error) -> serde_json::Value {
    let code = error.code();
    if code.is_rejection() {
        return json!({ "code": ErrorCode::Forbidden, "message": REJECTION_MESSAGE });
    }
    let message = if matches!(code, ErrorCode::InternalError) {
        REDACTED_MESSAGE
    } else {
        error.message()
    };
    let mut body = json!({ "code": code, "message": message });
    if let (Some(details), false) = (error.details(), matches!(code, ErrorCode::InternalError)) {
        body["details"] = details.clone();
    }
    if let Some(id) = error.trace_id() {
        body["traceId"] = json!(id);
    }
    body
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = ?self.code(), message = self.message(), "request failed");
        } else {
            warn!(code = ?self.code(), message = self.message(), "request rejected");
        }
        HttpResponse::build(status).json(body_for(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal(REDACTED_MESSAGE)
    }
}
