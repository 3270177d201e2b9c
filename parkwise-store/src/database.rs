use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct DbClient {
    pub pool: SqlitePool,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(connection_string)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database. Backed by a single connection that is
    /// never recycled, since closing it would drop the data.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn test_db() -> DbClient {
    let db = DbClient::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    db
}
