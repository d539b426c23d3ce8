//! In-process session registry mapping opaque tokens to login payloads.
//!
//! Tokens are 32 bytes from the operating-system RNG, hex encoded. Entries
//! optionally expire a fixed time after login; expired entries resolve as
//! unknown and are dropped lazily or by [`SessionRegistry::purge_expired`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use mockable::Clock;
use rand::RngCore;
use rand::rngs::OsRng;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use super::{IdentityValidationError, LoginPayload, OpenId, SessionExchange};

const TOKEN_BYTES: usize = 32;

/// Opaque bearer token handed to the mini-program after login.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionToken {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are credentials; keep them out of debug logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionToken({prefix}…)")
    }
}

/// Errors raised by [`SessionRegistry::login`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The exchange result carried no usable openid.
    #[error("session exchange carried no identity")]
    InvalidIdentity,
}

impl From<IdentityValidationError> for SessionError {
    fn from(_: IdentityValidationError) -> Self {
        Self::InvalidIdentity
    }
}

struct SessionEntry {
    payload: Arc<LoginPayload>,
    issued_at: DateTime<Utc>,
}

/// Convert a configured lifetime, capping values chrono cannot represent.
fn clamp_ttl(ttl: std::time::Duration) -> Duration {
    Duration::from_std(ttl).unwrap_or_else(|_| {
        warn!(ttl_secs = ttl.as_secs(), "session ttl out of range; capping");
        Duration::MAX
    })
}

/// Concurrent token registry shared through `Arc`.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use backend::domain::{SessionExchange, SessionRegistry};
///
/// let registry = SessionRegistry::new(Arc::new(mockable::DefaultClock), None);
/// let token = registry.login(SessionExchange::with_openid("abc")).unwrap();
/// assert_eq!(token.as_str().len(), 64);
/// assert_eq!(registry.resolve_identity(&token).map(String::from).as_deref(), Some("abc"));
/// ```
pub struct SessionRegistry {
    entries: DashMap<SessionToken, SessionEntry>,
    clock: Arc<dyn Clock>,
    ttl: Option<Duration>,
}

impl SessionRegistry {
    /// Build a registry; `ttl` of `None` keeps sessions until restart.
    pub fn new(clock: Arc<dyn Clock>, ttl: Option<std::time::Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            ttl: ttl.map(clamp_ttl),
        }
    }

    /// Record a successful exchange and mint a token for it.
    pub fn login(&self, exchange: SessionExchange) -> Result<SessionToken, SessionError> {
        let payload = Arc::new(LoginPayload::from_exchange(exchange)?);
        let issued_at = self.clock.utc();
        loop {
            match self.entries.entry(SessionToken::generate()) {
                Entry::Vacant(slot) => {
                    let token = slot.key().clone();
                    slot.insert(SessionEntry {
                        payload,
                        issued_at,
                    });
                    debug!(sessions = self.entries.len(), "session issued");
                    return Ok(token);
                }
                Entry::Occupied(_) => continue,
            }
        }
    }

    /// Identity behind `token`, or `None` when unknown or expired.
    pub fn resolve_identity(&self, token: &SessionToken) -> Option<OpenId> {
        self.payload(token).map(|payload| payload.openid().clone())
    }

    /// Full login payload behind `token`.
    pub fn payload(&self, token: &SessionToken) -> Option<Arc<LoginPayload>> {
        let now = self.clock.utc();
        let live = {
            let entry = self.entries.get(token)?;
            if self.is_expired(&entry, now) {
                None
            } else {
                Some(Arc::clone(&entry.payload))
            }
        };
        if live.is_none() {
            self.entries
                .remove_if(token, |_, entry| self.is_expired(entry, now));
        }
        live
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = self.clock.utc();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.is_expired(entry, now));
        before.saturating_sub(self.entries.len())
    }

    /// Purge expired entries every `period` until the task is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = self.purge_expired();
                if removed > 0 {
                    debug!(removed, remaining = self.len(), "expired sessions purged");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        self.ttl
            .is_some_and(|ttl| now.signed_duration_since(entry.issued_at) >= ttl)
    }
}
