//! Extractor configuration turning malformed parameters into `400`s.
//!
//! Without these, actix answers a bad `?id=abc` with its own plain-text
//! body and no error code.

use actix_web::{HttpRequest, error::QueryPayloadError, error::UrlencodedError, web};
use serde_json::json;

use crate::domain::Error;

/// Details discriminator for extractor failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MalformedQuery,
    MalformedForm,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MalformedQuery => "malformed_query",
            ErrorCode::MalformedForm => "malformed_form",
        }
    }
}

pub(crate) fn malformed(code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "code": code.as_str() }))
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    malformed(ErrorCode::MalformedQuery, err.to_string()).into()
}

fn form_error(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    malformed(ErrorCode::MalformedForm, err.to_string()).into()
}

/// Query extractor settings for the mini-program scope.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error)
}

/// Form extractor settings for the mini-program scope.
pub fn form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(form_error)
}
