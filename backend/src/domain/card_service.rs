//! Card service: the use-cases the HTTP layer drives.
//!
//! Composes the WeChat port, the session registry, the profile resolver and
//! the access-token cell. Every failure is reported as a domain [`Error`];
//! the inbound adapter decides how much of it a client may see.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::ports::{CardRepository, QrCodeImage, QrCodeRequest, WeChatApi};
use crate::domain::profile_resolver::map_persistence_error;
use crate::domain::{
    AccessTokenCell, Error, JsCode, NewUserRecord, ProfilePatch, ProfileResolver, SessionError,
    SessionRegistry, SessionToken, UserBinding, UserId, UserRecord,
};

/// Mini-program page a generated QR code opens when none is configured.
pub const DEFAULT_CARD_PAGE_PATH: &str = "pages/card/card";

/// Façade over the card use-cases.
#[derive(Clone)]
pub struct CardService {
    sessions: Arc<SessionRegistry>,
    cards: Arc<dyn CardRepository>,
    wechat: Arc<dyn WeChatApi>,
    tokens: AccessTokenCell,
    resolver: ProfileResolver,
    card_page_path: String,
}

impl CardService {
    pub fn new(
        sessions: Arc<SessionRegistry>,
        cards: Arc<dyn CardRepository>,
        wechat: Arc<dyn WeChatApi>,
        tokens: AccessTokenCell,
    ) -> Self {
        let resolver = ProfileResolver::new(Arc::clone(&sessions), Arc::clone(&cards));
        Self {
            sessions,
            cards,
            wechat,
            tokens,
            resolver,
            card_page_path: DEFAULT_CARD_PAGE_PATH.to_owned(),
        }
    }

    /// Override the page QR codes point at.
    #[must_use]
    pub fn with_card_page_path(mut self, path: impl Into<String>) -> Self {
        self.card_page_path = path.into();
        self
    }

    /// Exchange a login code with WeChat and open a session.
    pub async fn login(&self, js_code: &str) -> Result<SessionToken, Error> {
        let js_code = JsCode::new(js_code).map_err(|err| Error::invalid_request(err.to_string()))?;
        let exchange = self.wechat.code_to_session(&js_code).await.map_err(|err| {
            warn!(error = %err, "session exchange failed");
            Error::upstream(format!("session exchange failed: {err}"))
        })?;
        let token = self.sessions.login(exchange).map_err(|err| match err {
            SessionError::InvalidIdentity => Error::forbidden("session exchange returned no identity"),
        })?;
        info!("mini-program user logged in");
        Ok(token)
    }

    /// Id of the card bound to `token`.
    pub async fn get_user_id(&self, token: &SessionToken) -> Result<UserId, Error> {
        match self.resolver.resolve_user_id(token).await? {
            UserBinding::Bound(id) => Ok(id),
            UserBinding::Unbound(_) => Err(Error::not_found("session has no card yet")),
            UserBinding::Invalid => Err(Error::invalid_session("session is unknown or expired")),
        }
    }

    /// Card with the given id.
    pub async fn get_profile(&self, id: UserId) -> Result<UserRecord, Error> {
        self.resolver
            .get_profile(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("card {id} does not exist")))
    }

    /// Create or patch the caller's card.
    pub async fn set_profile(
        &self,
        token: &SessionToken,
        patch: &ProfilePatch,
    ) -> Result<UserRecord, Error> {
        self.resolver.upsert_profile(token, patch).await
    }

    /// Create the caller's card; fails if one already exists.
    pub async fn create_profile(
        &self,
        token: &SessionToken,
        patch: &ProfilePatch,
    ) -> Result<UserRecord, Error> {
        let openid = self
            .sessions
            .resolve_identity(token)
            .ok_or_else(|| Error::invalid_session("session is unknown or expired"))?;
        if self
            .cards
            .exists_by_openid(&openid)
            .await
            .map_err(map_persistence_error)?
        {
            return Err(Error::conflict("session already has a card"));
        }
        let record = self
            .cards
            .insert(&NewUserRecord {
                openid,
                profile: patch.clone().into_profile(),
            })
            .await
            .map_err(map_persistence_error)?;
        info!(user_id = %record.id, "card created");
        Ok(record)
    }

    /// Patch card `id`, which must be the one bound to `token`.
    pub async fn update_profile(
        &self,
        token: &SessionToken,
        id: UserId,
        patch: &ProfilePatch,
    ) -> Result<UserRecord, Error> {
        match self.resolver.resolve_user_id(token).await? {
            UserBinding::Bound(owned) if owned == id => {}
            UserBinding::Invalid => {
                return Err(Error::invalid_session("session is unknown or expired"));
            }
            UserBinding::Bound(_) | UserBinding::Unbound(_) => {
                return Err(Error::forbidden(format!("session does not own card {id}")));
            }
        }
        let mut record = self.get_profile(id).await?;
        patch.apply_to(&mut record.profile);
        self.cards
            .update(&record)
            .await
            .map_err(map_persistence_error)?;
        debug!(user_id = %id, "card updated");
        self.get_profile(id).await
    }

    /// QR code that opens card `id` in the mini-program.
    pub async fn get_qr_code(&self, id: UserId) -> Result<QrCodeImage, Error> {
        if !self
            .cards
            .exists_by_id(id)
            .await
            .map_err(map_persistence_error)?
        {
            return Err(Error::not_found(format!("card {id} does not exist")));
        }
        let token = self
            .tokens
            .current()
            .ok_or_else(|| Error::upstream("platform access token not yet available"))?;
        let request = QrCodeRequest {
            path: self.card_page_path.clone(),
            scene: format!("id={id}"),
        };
        self.wechat
            .create_unlimited_qr_code(token.value(), &request)
            .await
            .map_err(|err| {
                warn!(error = %err, user_id = %id, "qr code generation failed");
                Error::upstream(format!("qr code generation failed: {err}"))
            })
    }
}

#[cfg(test)]
#[path = "card_service_tests.rs"]
mod tests;
