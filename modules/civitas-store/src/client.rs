use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use civitas_common::{CivitasError, Result};

/// Thin wrapper around a Postgres pool providing connection setup and
/// embedded migrations.
#[derive(Clone)]
pub struct StoreClient {
    pub(crate) pool: PgPool,
}

impl StoreClient {
    /// Connect to Postgres with a bounded pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| CivitasError::Database(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CivitasError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a reference to the underlying pool.
    pub fn inner(&self) -> &PgPool {
        &self.pool
    }
}
