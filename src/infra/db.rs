use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::AppConfig;

/// Handle to the service's single Postgres store. Every service clones this;
/// the pool inside is shared.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Open the pool with the tuning knobs from [`AppConfig`]. An idle
    /// timeout of zero makes the pool discard idle connections on acquire,
    /// which the integration tests rely on when sharing one pool across
    /// per-test runtimes.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.db_idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime_seconds))
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip liveness probe backing the /health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
