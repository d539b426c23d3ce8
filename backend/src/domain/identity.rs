//! WeChat identity primitives: the login code a mini-program sends, the raw
//! result of exchanging it, and the validated payload a session holds.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Validation errors for identity primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityValidationError {
    /// The login code was missing or blank.
    #[error("js_code must not be empty")]
    EmptyJsCode,
    /// The openid was missing or blank.
    #[error("openid must not be empty")]
    EmptyOpenId,
}

/// Opaque per-user identity WeChat assigns within one mini-program.
///
/// ## Invariants
/// - Non-empty and free of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OpenId(String);

impl OpenId {
    /// Validate and construct an [`OpenId`].
    ///
    /// # Examples
    /// ```
    /// use backend::domain::OpenId;
    ///
    /// let id = OpenId::new(" oAbc123 ").unwrap();
    /// assert_eq!(id.as_ref(), "oAbc123");
    /// assert!(OpenId::new("  ").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityValidationError::EmptyOpenId);
        }
        if trimmed.len() == raw.len() {
            Ok(Self(raw))
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }
}

impl AsRef<str> for OpenId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for OpenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<OpenId> for String {
    fn from(value: OpenId) -> Self {
        value.0
    }
}

impl TryFrom<String> for OpenId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// One-shot login code produced by `wx.login()` on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsCode(String);

impl JsCode {
    /// Reject blank codes before any network call is made.
    pub fn new(raw: &str) -> Result<Self, IdentityValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityValidationError::EmptyJsCode);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for JsCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Parsed `jscode2session` result before the identity has been checked.
///
/// `attributes` holds every field other than `openid` (`session_key`,
/// `unionid`, ...) exactly as WeChat returned it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionExchange {
    pub openid: Option<String>,
    pub attributes: Map<String, Value>,
}

impl SessionExchange {
    /// Build an exchange result carrying only an openid.
    #[must_use]
    pub fn with_openid(openid: impl Into<String>) -> Self {
        Self {
            openid: Some(openid.into()),
            attributes: Map::new(),
        }
    }

    /// Attach one extra attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Login payload held by a session: a confirmed identity plus whatever
/// metadata the exchange returned. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginPayload {
    openid: OpenId,
    attributes: Map<String, Value>,
}

impl LoginPayload {
    /// Confirm the exchange carries an identity.
    pub fn from_exchange(exchange: SessionExchange) -> Result<Self, IdentityValidationError> {
        let SessionExchange { openid, attributes } = exchange;
        let openid = OpenId::new(openid.unwrap_or_default())?;
        Ok(Self { openid, attributes })
    }

    /// External identity of the logged-in user.
    pub fn openid(&self) -> &OpenId {
        &self.openid
    }

    /// Remaining exchange fields.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}
