use std::sync::Arc;

use anyhow::Context;
use mongodb::Client;

use crate::config::AppConfig;
use crate::store::{MemoryStore, MongoStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let client = Client::with_uri_str(&config.mongo_url)
            .await
            .context("connect to mongodb")?;
        let db = client.database(&config.mongo_db);
        let store = MongoStore::new(&db);
        store.ensure_indexes().await?;

        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// In-memory state for tests; no database required.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            mongo_url: "mongodb://localhost:27017".into(),
            mongo_db: "shiptrack-test".into(),
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: 30,
            },
        });
        Self {
            store: Arc::new(MemoryStore::new()),
            config,
        }
    }
}
