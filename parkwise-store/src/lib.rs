pub mod app_config;
pub mod database;
mod rows;
pub mod user_repo;
pub mod lot_repo;
pub mod booking_repo;
pub mod analytics_repo;

pub use database::DbClient;
pub use user_repo::StoreUserRepository;
pub use lot_repo::StoreLotRepository;
pub use booking_repo::StoreBookingRepository;
pub use analytics_repo::StoreAnalyticsRepository;

use parkwise_core::CoreError;

/// Maps a driver error into the domain error. Unique-key violations become
/// conflicts; anything else is logged and surfaced as a storage failure.
pub(crate) fn db_err(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return CoreError::ConflictError(db.message().to_string());
        }
    }
    tracing::error!("Database error: {}", err);
    CoreError::StorageError(err.to_string())
}
