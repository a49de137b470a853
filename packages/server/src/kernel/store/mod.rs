//! Record store adapters behind [`BaseScrapeStore`].
//!
//! - [`PostgresStore`]: direct connection, queries live on the models
//! - [`RestStore`]: hosted PostgREST / Supabase endpoint
//! - [`MemoryStore`]: tests and local development

mod memory;
mod postgres;
mod rest;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use rest::RestStore;

use std::sync::Arc;

use anyhow::{Context, Result};
use postgrest_client::{PostgrestClient, PostgrestError};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::config::StoreConfig;
use crate::kernel::BaseScrapeStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record store error: {0}")]
    Rest(#[from] PostgrestError),

    /// A write reported success but returned no row
    #[error("store returned no row for {0}")]
    MissingRow(String),

    /// Unique constraint violated (e.g. duplicate website URL)
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Open the configured store. For Postgres this also runs pending migrations.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn BaseScrapeStore>> {
    match config {
        StoreConfig::Postgres { database_url } => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connected");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Migrations complete");

            Ok(Arc::new(PostgresStore::new(pool)))
        }
        StoreConfig::Rest { url, service_key } => {
            tracing::info!(url = %url, "Using hosted record store");
            Ok(Arc::new(RestStore::new(PostgrestClient::new(
                url.clone(),
                service_key.clone(),
            ))))
        }
    }
}
