use crate::error::BackendResult;
use anyhow::anyhow;
use diesel::{
    PgConnection,
    r2d2::{ConnectionManager, Pool, PooledConnection},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::info;

mod article;
mod comment;
mod interaction;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// PostgreSQL storage through a diesel connection pool.
#[derive(Clone)]
pub struct PgStore {
    pub db_pool: DbPool,
}

impl PgStore {
    pub fn connect(database_url: &str, pool_size: u32) -> BackendResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let db_pool = Pool::builder().max_size(pool_size).build(manager)?;

        let applied = db_pool
            .get()?
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("Failed to run migrations: {e}"))?;
        if !applied.is_empty() {
            info!("Applied {} database migrations", applied.len());
        }
        Ok(PgStore { db_pool })
    }

    fn conn(&self) -> BackendResult<PooledConnection<ConnectionManager<PgConnection>>> {
        Ok(self.db_pool.get()?)
    }
}
