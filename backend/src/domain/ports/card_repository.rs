//! Port for the card store: one record per WeChat identity, addressable by
//! surrogate id or by openid.

use async_trait::async_trait;

use crate::domain::{NewUserRecord, OpenId, UserId, UserRecord};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by card repository adapters.
    pub enum CardPersistenceError {
        /// The store could not be reached.
        Connection { message: String } => "card repository connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } => "card repository query failed: {message}",
        /// The write collided with the one-record-per-openid constraint.
        Conflict { message: String } => "card repository conflict: {message}",
    }
}

/// Storage contract for business cards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Fetch a record by surrogate id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, CardPersistenceError>;

    /// Fetch the record bound to an identity.
    async fn find_by_openid(
        &self,
        openid: &OpenId,
    ) -> Result<Option<UserRecord>, CardPersistenceError>;

    /// Whether a record with `id` exists.
    async fn exists_by_id(&self, id: UserId) -> Result<bool, CardPersistenceError>;

    /// Whether `openid` already owns a record.
    async fn exists_by_openid(&self, openid: &OpenId) -> Result<bool, CardPersistenceError>;

    /// Insert a new record; the store assigns the id.
    ///
    /// Returns [`CardPersistenceError::Conflict`] when `openid` already has
    /// a record.
    async fn insert(&self, record: &NewUserRecord) -> Result<UserRecord, CardPersistenceError>;

    /// Overwrite every profile column of an existing record.
    async fn update(&self, record: &UserRecord) -> Result<(), CardPersistenceError>;
}
