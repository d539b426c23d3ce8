//! Resolves session tokens to card bindings and applies profile writes.
//!
//! A session is either unknown, authenticated but not yet bound to a card,
//! or bound to exactly one card through its openid. The first write for an
//! unbound session creates the card; later writes patch it in place.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::ports::{CardPersistenceError, CardRepository};
use crate::domain::{
    Error, NewUserRecord, OpenId, ProfilePatch, SessionRegistry, SessionToken, UserId, UserRecord,
};

/// Where a session token currently points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserBinding {
    /// The token is unknown or expired.
    Invalid,
    /// The session is authenticated but no card exists for its openid yet.
    Unbound(OpenId),
    /// The session's openid owns this card.
    Bound(UserId),
}

/// Map a repository failure onto the domain error vocabulary.
pub(crate) fn map_persistence_error(error: CardPersistenceError) -> Error {
    match error {
        CardPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("card repository unavailable: {message}"))
        }
        CardPersistenceError::Query { message } => {
            Error::internal(format!("card repository error: {message}"))
        }
        CardPersistenceError::Conflict { message } => {
            Error::conflict(format!("card already exists: {message}"))
        }
    }
}

/// Token → binding → record resolution over the session registry and the
/// card store.
#[derive(Clone)]
pub struct ProfileResolver {
    sessions: Arc<SessionRegistry>,
    cards: Arc<dyn CardRepository>,
}

impl ProfileResolver {
    pub fn new(sessions: Arc<SessionRegistry>, cards: Arc<dyn CardRepository>) -> Self {
        Self { sessions, cards }
    }

    /// Classify `token`. Only store failures produce an error.
    pub async fn resolve_user_id(&self, token: &SessionToken) -> Result<UserBinding, Error> {
        let Some(openid) = self.sessions.resolve_identity(token) else {
            return Ok(UserBinding::Invalid);
        };
        let binding = match self
            .cards
            .find_by_openid(&openid)
            .await
            .map_err(map_persistence_error)?
        {
            Some(record) => UserBinding::Bound(record.id),
            None => UserBinding::Unbound(openid),
        };
        Ok(binding)
    }

    /// Fetch a card by id.
    pub async fn get_profile(&self, id: UserId) -> Result<Option<UserRecord>, Error> {
        self.cards
            .find_by_id(id)
            .await
            .map_err(map_persistence_error)
    }

    /// Create or patch the card bound to `token`, returning the stored
    /// state as re-read after the write.
    pub async fn upsert_profile(
        &self,
        token: &SessionToken,
        patch: &ProfilePatch,
    ) -> Result<UserRecord, Error> {
        let openid = self
            .sessions
            .resolve_identity(token)
            .ok_or_else(|| Error::invalid_session("session is unknown or expired"))?;

        let existing = self
            .cards
            .find_by_openid(&openid)
            .await
            .map_err(map_persistence_error)?;

        match existing {
            Some(record) => self.patch_existing(record, patch).await?,
            None => self.insert_or_patch(&openid, patch).await?,
        }

        self.reread(&openid).await
    }

    async fn insert_or_patch(&self, openid: &OpenId, patch: &ProfilePatch) -> Result<(), Error> {
        let new_record = NewUserRecord {
            openid: openid.clone(),
            profile: patch.clone().into_profile(),
        };
        match self.cards.insert(&new_record).await {
            Ok(record) => {
                info!(user_id = %record.id, "card created");
                Ok(())
            }
            Err(CardPersistenceError::Conflict { message }) => {
                // A concurrent first write won the insert; fold this one in.
                warn!(%message, "card insert raced; retrying as update");
                let record = self
                    .cards
                    .find_by_openid(openid)
                    .await
                    .map_err(map_persistence_error)?
                    .ok_or_else(|| Error::internal("card missing after insert conflict"))?;
                self.patch_existing(record, patch).await
            }
            Err(error) => Err(map_persistence_error(error)),
        }
    }

    async fn patch_existing(&self, mut record: UserRecord, patch: &ProfilePatch) -> Result<(), Error> {
        if patch.is_empty() {
            debug!(user_id = %record.id, "empty patch; card unchanged");
            return Ok(());
        }
        patch.apply_to(&mut record.profile);
        self.cards
            .update(&record)
            .await
            .map_err(map_persistence_error)?;
        debug!(user_id = %record.id, "card updated");
        Ok(())
    }

    async fn reread(&self, openid: &OpenId) -> Result<UserRecord, Error> {
        self.cards
            .find_by_openid(openid)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| Error::internal("card missing after write"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockCardRepository;
    use crate::domain::{CardProfile, ErrorCode, SessionExchange};
    use crate::outbound::memory::InMemoryCardRepository;
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};

    fn openid(raw: &str) -> OpenId {
        OpenId::new(raw).expect("valid openid")
    }

    fn user_id(raw: i32) -> UserId {
        UserId::new(raw).expect("valid id")
    }

    fn record(id: i32, name: Option<&str>) -> UserRecord {
        UserRecord {
            id: user_id(id),
            openid: openid("abc"),
            profile: CardProfile {
                name: name.map(str::to_owned),
                ..CardProfile::default()
            },
        }
    }

    #[fixture]
    fn sessions() -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::new(Arc::new(mockable::DefaultClock), None))
    }

    fn login(sessions: &SessionRegistry) -> SessionToken {
        sessions
            .login(SessionExchange::with_openid("abc"))
            .expect("login succeeds")
    }

    fn name_patch(name: &str) -> ProfilePatch {
        ProfilePatch {
            name: Some(name.to_owned()),
            ..ProfilePatch::default()
        }
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_token_is_invalid_without_touching_the_store(sessions: Arc<SessionRegistry>) {
        let mut cards = MockCardRepository::new();
        cards.expect_find_by_openid().never();
        let resolver = ProfileResolver::new(sessions, Arc::new(cards));

        let binding = resolver
            .resolve_user_id(&SessionToken::from("nope"))
            .await
            .expect("lookup succeeds");

        assert_eq!(binding, UserBinding::Invalid);
    }

    #[rstest]
    #[tokio::test]
    async fn bindings_follow_the_store(sessions: Arc<SessionRegistry>) {
        let token = login(&sessions);
        let mut cards = MockCardRepository::new();
        let mut seq = mockall::Sequence::new();
        cards
            .expect_find_by_openid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        cards
            .expect_find_by_openid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(record(5, None))));
        let resolver = ProfileResolver::new(sessions, Arc::new(cards));

        let first = resolver.resolve_user_id(&token).await.expect("lookup");
        let second = resolver.resolve_user_id(&token).await.expect("lookup");

        assert_eq!(first, UserBinding::Unbound(openid("abc")));
        assert_eq!(second, UserBinding::Bound(user_id(5)));
    }

    #[rstest]
    #[tokio::test]
    async fn first_write_inserts_then_rereads(sessions: Arc<SessionRegistry>) {
        let token = login(&sessions);
        let mut cards = MockCardRepository::new();
        let mut seq = mockall::Sequence::new();
        cards
            .expect_find_by_openid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        cards
            .expect_insert()
            .withf(|new| new.openid.as_ref() == "abc" && new.profile.name.as_deref() == Some("Alice"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(record(1, Some("Alice"))));
        cards
            .expect_find_by_openid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(record(1, Some("Alice")))));
        let resolver = ProfileResolver::new(sessions, Arc::new(cards));

        let stored = resolver
            .upsert_profile(&token, &name_patch("Alice"))
            .await
            .expect("upsert succeeds");

        assert_eq!(stored, record(1, Some("Alice")));
    }

    #[rstest]
    #[tokio::test]
    async fn later_writes_patch_in_place(sessions: Arc<SessionRegistry>) {
        let token = login(&sessions);
        let mut cards = MockCardRepository::new();
        let mut seq = mockall::Sequence::new();
        cards
            .expect_find_by_openid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(record(1, Some("Alice")))));
        cards
            .expect_update()
            .with(eq(record(1, Some("Bob"))))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        cards
            .expect_find_by_openid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(record(1, Some("Bob")))));
        cards.expect_insert().never();
        let resolver = ProfileResolver::new(sessions, Arc::new(cards));

        let stored = resolver
            .upsert_profile(&token, &name_patch("Bob"))
            .await
            .expect("upsert succeeds");

        assert_eq!(stored.profile.name.as_deref(), Some("Bob"));
    }

    #[rstest]
    #[tokio::test]
    async fn lost_insert_race_is_retried_as_update(sessions: Arc<SessionRegistry>) {
        let token = login(&sessions);
        let mut cards = MockCardRepository::new();
        let mut seq = mockall::Sequence::new();
        cards
            .expect_find_by_openid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        cards
            .expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(CardPersistenceError::conflict("openid taken")));
        cards
            .expect_find_by_openid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(record(9, Some("Racer")))));
        cards
            .expect_update()
            .with(eq(record(9, Some("Alice"))))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        cards
            .expect_find_by_openid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(record(9, Some("Alice")))));
        let resolver = ProfileResolver::new(sessions, Arc::new(cards));

        let stored = resolver
            .upsert_profile(&token, &name_patch("Alice"))
            .await
            .expect("upsert succeeds");

        assert_eq!(stored.id, user_id(9));
    }

    #[rstest]
    #[tokio::test]
    async fn empty_patch_skips_the_write(sessions: Arc<SessionRegistry>) {
        let token = login(&sessions);
        let mut cards = MockCardRepository::new();
        cards
            .expect_find_by_openid()
            .times(2)
            .returning(|_| Ok(Some(record(1, Some("Alice")))));
        cards.expect_update().never();
        cards.expect_insert().never();
        let resolver = ProfileResolver::new(sessions, Arc::new(cards));

        let stored = resolver
            .upsert_profile(&token, &ProfilePatch::default())
            .await
            .expect("upsert succeeds");

        assert_eq!(stored, record(1, Some("Alice")));
    }

    /// Store that yields before every call so joined writers interleave.
    struct Interleaved(InMemoryCardRepository);

    #[async_trait::async_trait]
    impl CardRepository for Interleaved {
        async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, CardPersistenceError> {
            tokio::task::yield_now().await;
            self.0.find_by_id(id).await
        }

        async fn find_by_openid(
            &self,
            openid: &OpenId,
        ) -> Result<Option<UserRecord>, CardPersistenceError> {
            tokio::task::yield_now().await;
            self.0.find_by_openid(openid).await
        }

        async fn exists_by_id(&self, id: UserId) -> Result<bool, CardPersistenceError> {
            tokio::task::yield_now().await;
            self.0.exists_by_id(id).await
        }

        async fn exists_by_openid(&self, openid: &OpenId) -> Result<bool, CardPersistenceError> {
            tokio::task::yield_now().await;
            self.0.exists_by_openid(openid).await
        }

        async fn insert(&self, record: &NewUserRecord) -> Result<UserRecord, CardPersistenceError> {
            tokio::task::yield_now().await;
            self.0.insert(record).await
        }

        async fn update(&self, record: &UserRecord) -> Result<(), CardPersistenceError> {
            tokio::task::yield_now().await;
            self.0.update(record).await
        }
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_first_writes_leave_one_card() {
        let sessions = Arc::new(SessionRegistry::new(Arc::new(mockable::DefaultClock), None));
        let first = login(&sessions);
        let second = login(&sessions);
        let cards = Arc::new(Interleaved(InMemoryCardRepository::new()));
        let resolver = ProfileResolver::new(sessions, cards.clone());

        let alice = name_patch("Alice");
        let bob = name_patch("Bob");
        let (a, b) = tokio::join!(
            resolver.upsert_profile(&first, &alice),
            resolver.upsert_profile(&second, &bob),
        );

        let a = a.expect("first write succeeds");
        let b = b.expect("second write succeeds");
        assert_eq!(a.id, b.id);
        assert_eq!(cards.0.len(), 1);
        let stored = cards
            .0
            .find_by_openid(&openid("abc"))
            .await
            .expect("lookup succeeds")
            .expect("card stored");
        let name = stored.profile.name.as_deref();
        assert!(
            matches!(name, Some("Alice" | "Bob")),
            "last write wins, got {name:?}"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn upsert_rejects_unknown_tokens(sessions: Arc<SessionRegistry>) {
        let mut cards = MockCardRepository::new();
        cards.expect_find_by_openid().never();
        let resolver = ProfileResolver::new(sessions, Arc::new(cards));

        let error = resolver
            .upsert_profile(&SessionToken::from("nope"), &name_patch("x"))
            .await
            .expect_err("unknown token");

        assert_eq!(error.code(), ErrorCode::InvalidSession);
    }

    #[rstest]
    #[case(CardPersistenceError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[case(CardPersistenceError::query("syntax"), ErrorCode::InternalError)]
    #[case(CardPersistenceError::conflict("dup"), ErrorCode::Conflict)]
    fn persistence_errors_map_to_codes(#[case] error: CardPersistenceError, #[case] code: ErrorCode) {
        assert_eq!(map_persistence_error(error).code(), code);
    }
}
