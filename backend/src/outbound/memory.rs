//! In-process `CardRepository` used when no database is configured.
//!
//! Keeps the same one-card-per-openid rule as the PostgreSQL table and hands
//! out ids from a monotonically increasing counter starting at 1.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{CardPersistenceError, CardRepository};
use crate::domain::{NewUserRecord, OpenId, UserId, UserRecord};

#[derive(Default)]
struct Cards {
    next_id: i32,
    by_id: BTreeMap<UserId, UserRecord>,
    by_openid: HashMap<OpenId, UserId>,
}

/// Card store held in memory; contents vanish on restart.
///
/// # Examples
/// ```
/// use backend::outbound::memory::InMemoryCardRepository;
///
/// let cards = InMemoryCardRepository::new();
/// assert_eq!(cards.len(), 0);
/// ```
#[derive(Default)]
pub struct InMemoryCardRepository {
    cards: Mutex<Cards>,
}

impl InMemoryCardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cards.
    pub fn len(&self) -> usize {
        self.lock().map(|cards| cards.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Cards>, CardPersistenceError> {
        self.cards
            .lock()
            .map_err(|_| CardPersistenceError::query("in-memory card store poisoned"))
    }
}

#[async_trait]
impl CardRepository for InMemoryCardRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, CardPersistenceError> {
        Ok(self.lock()?.by_id.get(&id).cloned())
    }

    async fn find_by_openid(
        &self,
        openid: &OpenId,
    ) -> Result<Option<UserRecord>, CardPersistenceError> {
        let cards = self.lock()?;
        Ok(cards
            .by_openid
            .get(openid)
            .and_then(|id| cards.by_id.get(id))
            .cloned())
    }

    async fn exists_by_id(&self, id: UserId) -> Result<bool, CardPersistenceError> {
        Ok(self.lock()?.by_id.contains_key(&id))
    }

    async fn exists_by_openid(&self, openid: &OpenId) -> Result<bool, CardPersistenceError> {
        Ok(self.lock()?.by_openid.contains_key(openid))
    }

    async fn insert(&self, record: &NewUserRecord) -> Result<UserRecord, CardPersistenceError> {
        let mut cards = self.lock()?;
        if cards.by_openid.contains_key(&record.openid) {
            return Err(CardPersistenceError::conflict(format!(
                "openid {} already has a card",
                record.openid
            )));
        }
        let next = cards
            .next_id
            .checked_add(1)
            .ok_or_else(|| CardPersistenceError::query("card id space exhausted"))?;
        let id = UserId::new(next).map_err(|err| CardPersistenceError::query(err.to_string()))?;
        cards.next_id = next;
        let stored = UserRecord {
            id,
            openid: record.openid.clone(),
            profile: record.profile.clone(),
        };
        cards.by_openid.insert(record.openid.clone(), id);
        cards.by_id.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: &UserRecord) -> Result<(), CardPersistenceError> {
        let mut cards = self.lock()?;
        let Some(existing) = cards.by_id.get_mut(&record.id) else {
            return Err(CardPersistenceError::query(format!(
                "card {} not found for update",
                record.id
            )));
        };
        existing.profile = record.profile.clone();
        Ok(())
    }
}
