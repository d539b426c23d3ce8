//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) card_page_path: Option<String>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            card_page_path: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// Without one, cards live in process memory and vanish on restart.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Override the mini-program page encoded into card QR codes.
    #[must_use]
    pub fn with_card_page_path(mut self, path: impl Into<String>) -> Self {
        self.card_page_path = Some(path.into());
        self
    }

    #[cfg_attr(
        not(test),
        expect(dead_code, reason = "read by server tests to find the bound port")
    )]
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
