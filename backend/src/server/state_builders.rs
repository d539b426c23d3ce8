//! Builders wiring ports into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use tracing::info;

use backend::domain::ports::{CardRepository, WeChatApi};
use backend::domain::{AccessTokenCell, CardService, SessionRegistry};
use backend::inbound::http::state::HttpState;
use backend::outbound::memory::InMemoryCardRepository;
use backend::outbound::persistence::DieselCardRepository;

use super::ServerConfig;

/// Long-lived collaborators shared between the server and background tasks.
#[derive(Clone)]
pub struct ServicePorts {
    pub sessions: Arc<SessionRegistry>,
    pub wechat: Arc<dyn WeChatApi>,
    pub tokens: AccessTokenCell,
}

/// Diesel-backed store when a pool is configured, in-memory otherwise.
fn build_card_repository(config: &ServerConfig) -> Arc<dyn CardRepository> {
    match &config.db_pool {
        Some(pool) => Arc::new(DieselCardRepository::new(pool.clone())),
        None => {
            info!("no database configured; cards are held in memory");
            Arc::new(InMemoryCardRepository::new())
        }
    }
}

pub(super) fn build_http_state(config: &ServerConfig, ports: ServicePorts) -> web::Data<HttpState> {
    let ServicePorts {
        sessions,
        wechat,
        tokens,
    } = ports;
    let service = CardService::new(sessions, build_card_repository(config), wechat, tokens);
    let service = match &config.card_page_path {
        Some(path) => service.with_card_page_path(path.clone()),
        None => service,
    };
    web::Data::new(HttpState::new(service))
}
