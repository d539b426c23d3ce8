//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` so they depend only on the
//! card use-cases and stay testable without I/O.

use crate::domain::CardService;

/// Dependency bundle for the mini-program handlers.
#[derive(Clone)]
pub struct HttpState {
    pub cards: CardService,
}

impl HttpState {
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use backend::domain::{AccessTokenCell, CardService, SessionRegistry};
    /// use backend::inbound::http::state::HttpState;
    /// use backend::outbound::memory::InMemoryCardRepository;
    /// # use backend::domain::ports::{QrCodeImage, QrCodeRequest, WeChatApi, WeChatApiError};
    /// # use backend::domain::{JsCode, PlatformAccessToken, SessionExchange};
    /// # struct Offline;
    /// # #[async_trait::async_trait]
    /// # impl WeChatApi for Offline {
    /// #     async fn code_to_session(&self, _: &JsCode) -> Result<SessionExchange, WeChatApiError> {
    /// #         Err(WeChatApiError::transport("offline"))
    /// #     }
    /// #     async fn fetch_access_token(&self) -> Result<PlatformAccessToken, WeChatApiError> {
    /// #         Err(WeChatApiError::transport("offline"))
    /// #     }
    /// #     async fn create_unlimited_qr_code(&self, _: &str, _: &QrCodeRequest) -> Result<QrCodeImage, WeChatApiError> {
    /// #         Err(WeChatApiError::transport("offline"))
    /// #     }
    /// # }
    ///
    /// let sessions = Arc::new(SessionRegistry::new(Arc::new(mockable::DefaultClock), None));
    /// let service = CardService::new(
    ///     sessions,
    ///     Arc::new(InMemoryCardRepository::new()),
    ///     Arc::new(Offline),
    ///     AccessTokenCell::new(),
    /// );
    /// let state = HttpState::new(service);
    /// let _cards = state.cards.clone();
    /// ```
    pub fn new(cards: CardService) -> Self {
        Self { cards }
    }
}
