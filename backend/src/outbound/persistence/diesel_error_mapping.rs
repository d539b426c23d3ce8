//! Translation of pool and Diesel failures into `CardPersistenceError`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::CardPersistenceError;

use super::pool::PoolError;

pub(super) fn map_pool_error(error: PoolError) -> CardPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            CardPersistenceError::connection(message)
        }
    }
}

pub(super) fn map_diesel_error(error: DieselError) -> CardPersistenceError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            CardPersistenceError::conflict(info.constraint_name().unwrap_or("unique constraint"))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            CardPersistenceError::connection("database connection error")
        }
        DieselError::NotFound => CardPersistenceError::query("record not found"),
        DieselError::QueryBuilderError(_) => CardPersistenceError::query("database query error"),
        _ => CardPersistenceError::query("database error"),
    }
}
