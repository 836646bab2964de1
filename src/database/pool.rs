use crate::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Directory holding the SQL migrations, relative to the working directory
pub const MIGRATIONS_DIR: &str = "./migrations";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Could not connect to PostgreSQL: {0}")]
    PoolCreation(sqlx::Error),

    #[error("Query failed: {0}")]
    QueryError(sqlx::Error),

    #[error("Timed out waiting for a pooled connection")]
    ConnectionTimeout,

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DatabaseError::ConnectionTimeout,
            other => DatabaseError::QueryError(other),
        }
    }
}

/// Pool handle kept in the application state for health checks
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Round-trip `SELECT 1` and report how long it took
    pub async fn ping(&self) -> Result<Duration, DatabaseError> {
        let started = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(started.elapsed())
    }
}

/// Open the pool and make sure at least one connection works
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    debug!(
        "Pool limits: max={} acquire={:?} idle={:?} lifetime={:?}",
        config.max_connections,
        config.acquire_timeout(),
        config.idle_timeout(),
        config.max_lifetime()
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .test_before_acquire(config.test_before_acquire)
        .connect(&config.url)
        .await
        .map_err(DatabaseError::PoolCreation)?;

    Database::new(pool.clone()).ping().await.map_err(|e| match e {
        DatabaseError::QueryError(inner) => DatabaseError::PoolCreation(inner),
        other => other,
    })?;

    Ok(pool)
}

/// Apply pending migrations from `dir`, or [`MIGRATIONS_DIR`] when `None`
pub async fn run_migrations(pool: &PgPool, dir: Option<&Path>) -> Result<(), DatabaseError> {
    let dir = dir.unwrap_or(Path::new(MIGRATIONS_DIR));
    let migrator = sqlx::migrate::Migrator::new(dir).await?;
    info!("Applying {} migrations from {:?}", migrator.iter().count(), dir);
    migrator.run(pool).await?;
    Ok(())
}
