//! Process-wide slot holding the most recent WeChat platform access token.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;

/// Credential WeChat issues for server-to-server calls.
#[derive(Clone, PartialEq, Eq)]
pub struct PlatformAccessToken {
    value: String,
    expires_in: Option<u64>,
    obtained_at: DateTime<Utc>,
}

impl PlatformAccessToken {
    pub fn new(value: impl Into<String>, expires_in: Option<u64>, obtained_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_in,
            obtained_at,
        }
    }

    /// Token text to pass as `access_token`.
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Lifetime in seconds as reported by the platform.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    /// Instant the platform stops honouring the token, when known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.expires_in?).ok()?;
        self.obtained_at.checked_add_signed(Duration::seconds(secs))
    }
}

impl fmt::Debug for PlatformAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformAccessToken")
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Single-writer, many-reader cell publishing the current token.
///
/// Readers always observe a whole token; a new publish replaces the old one
/// atomically.
///
/// # Examples
/// ```
/// use backend::domain::{AccessTokenCell, PlatformAccessToken};
///
/// let cell = AccessTokenCell::new();
/// assert!(cell.current().is_none());
/// cell.publish(PlatformAccessToken::new("t1", Some(7200), chrono::Utc::now()));
/// assert_eq!(cell.current().map(|t| t.value().to_owned()), Some("t1".to_owned()));
/// ```
#[derive(Debug, Clone)]
pub struct AccessTokenCell {
    sender: Arc<watch::Sender<Option<Arc<PlatformAccessToken>>>>,
}

impl AccessTokenCell {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the published token.
    pub fn publish(&self, token: PlatformAccessToken) {
        self.sender.send_replace(Some(Arc::new(token)));
    }

    /// The last published token; `None` before the first successful refresh.
    pub fn current(&self) -> Option<Arc<PlatformAccessToken>> {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<PlatformAccessToken>>> {
        self.sender.subscribe()
    }
}

impl Default for AccessTokenCell {
    fn default() -> Self {
        Self::new()
    }
}
