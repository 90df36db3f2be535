use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{config::LookupConfig, lookup::GatewayRegistry};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<LookupConfig>,
    pub gateways: GatewayRegistry,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: LookupConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            pool,
            config: Arc::new(config),
            gateways: GatewayRegistry::with_defaults()?,
        })
    }
}
