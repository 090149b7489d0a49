pub mod clock;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;

use std::sync::Arc;

// Shared state for the whole application
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
    pub clock: Arc<dyn clock::Clock>,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;

        db.run_migrations().await?;

        Ok(Arc::new(Self {
            db,
            config,
            clock: Arc::new(clock::SystemClock),
        }))
    }
}
