//! Backend entry-point: loads settings, wires adapters and background tasks,
//! then serves the mini-program API.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::domain::{AccessTokenCell, SessionRegistry, TokenRefresher};
use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use backend::outbound::wechat::WeChatHttpClient;
use server::{AppSettings, ServerConfig, ServicePorts, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| io::Error::other(format!("failed to load settings: {e}")))?;
    let credentials = settings.credentials().map_err(io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let wechat = Arc::new(
        WeChatHttpClient::new(
            settings.api_base_url(),
            credentials,
            settings.http_timeout(),
            clock.clone(),
        )
        .map_err(io::Error::other)?,
    );
    let sessions = Arc::new(SessionRegistry::new(clock, settings.session_ttl()));
    let tokens = AccessTokenCell::new();

    let mut config = ServerConfig::new(bind_addr).with_card_page_path(settings.card_page_path());
    if let Some(database_url) = settings.database_url() {
        run_pending_migrations(database_url)
            .await
            .map_err(io::Error::other)?;
        let pool = DbPool::new(
            PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
        )
        .await
        .map_err(io::Error::other)?;
        config = config.with_db_pool(pool);
    }

    let refresher =
        TokenRefresher::new(wechat.clone(), tokens.clone()).spawn(settings.token_refresh_period());
    let sweeper = settings
        .session_sweep_period()
        .map(|period| Arc::clone(&sessions).spawn_sweeper(period));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        config,
        ServicePorts {
            sessions,
            wechat,
            tokens,
        },
    )?;
    info!(%bind_addr, "card backend listening");

    let result = server.await;
    health_state.mark_unhealthy();
    refresher.abort();
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    result
}
