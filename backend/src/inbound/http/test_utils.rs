//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use mockable::DefaultClock;

use crate::Trace;
use crate::domain::ports::WeChatApi;
use crate::domain::{AccessTokenCell, CardService, SessionRegistry};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::cards;
use crate::outbound::memory::InMemoryCardRepository;

/// Collaborators behind a test app, kept so tests can seed and inspect them.
pub struct TestBackend {
    pub sessions: Arc<SessionRegistry>,
    pub cards: Arc<InMemoryCardRepository>,
    pub tokens: AccessTokenCell,
    pub state: web::Data<HttpState>,
}

impl TestBackend {
    /// In-memory store, sessions without expiry, and the given WeChat double.
    pub fn new(wechat: impl WeChatApi + 'static) -> Self {
        let sessions = Arc::new(SessionRegistry::new(Arc::new(DefaultClock), None));
        let cards = Arc::new(InMemoryCardRepository::new());
        let tokens = AccessTokenCell::new();
        let service = CardService::new(
            sessions.clone(),
            cards.clone(),
            Arc::new(wechat),
            tokens.clone(),
        );
        Self {
            sessions,
            cards,
            tokens,
            state: web::Data::new(HttpState::new(service)),
        }
    }

    /// App with the `/miniprogram` scope wired as in production.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.state.clone())
            .wrap(Trace)
            .service(web::scope("/miniprogram").configure(cards::configure))
    }
}
