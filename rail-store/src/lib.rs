pub mod app_config;
pub mod database;
pub mod train_repo;
pub mod seat_repo;
pub mod user_repo;

pub use database::DbClient;
pub use train_repo::SqliteTrainRepository;
pub use seat_repo::SqliteSeatRepository;
pub use user_repo::SqliteUserRepository;

use rail_core::CoreError;

/// Maps driver errors onto the storage variant of the domain error.
pub(crate) fn storage_error(err: sqlx::Error) -> CoreError {
    CoreError::StorageError(err.to_string())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
