use std::sync::Arc;

use anyhow::Result;

use super::{
    config::Config,
    database::{ViewStore, init_redis},
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ViewStore>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let store = init_redis(&config.redis_url).await?;

        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: Config, store: Arc<dyn ViewStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}
