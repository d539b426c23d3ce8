//! PostgreSQL card store built on Diesel, `diesel-async` and a `bb8` pool.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//! private; only the repository, the pool and the migration runner are
//! exported.
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselCardRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/cards")).await?;
//! let cards = DieselCardRepository::new(pool);
//! ```

mod diesel_card_repository;
mod diesel_error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_card_repository::DieselCardRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
