use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::auth::password::PasswordScheme;
use crate::auth::repo::StorageKeys;
use crate::auth::services::{AccountStore, StoreSettings};
use crate::catalog::Catalog;
use crate::config::{AppConfig, StorageConfig};
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<AccountStore>,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let storage: Arc<dyn KeyValueStorage> = match &config.storage {
            StorageConfig::Memory => {
                warn!("using in-memory storage; accounts will not survive a restart");
                Arc::new(MemoryStorage::new())
            }
            StorageConfig::File { dir } => Arc::new(FileStorage::new(dir)?),
        };

        if config.password_scheme == PasswordScheme::Plaintext {
            warn!("PASSWORD_SCHEME=plaintext stores passwords verbatim");
        }

        let accounts = AccountStore::new(
            storage,
            StoreSettings {
                keys: StorageKeys::with_prefix(&config.storage_prefix),
                password_scheme: config.password_scheme,
            },
        )
        .context("open account store")?;
        let catalog = Catalog::load(&config.products_path)?;

        info!(
            storage = ?config.storage,
            scheme = %accounts.password_scheme(),
            products = catalog.len(),
            "state initialised"
        );
        Ok(Self::from_parts(config, Arc::new(accounts), Arc::new(catalog)))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        accounts: Arc<AccountStore>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            config,
            accounts,
            catalog,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:0".parse().expect("addr ok"),
            storage: StorageConfig::Memory,
            storage_prefix: "test".into(),
            password_scheme: PasswordScheme::Plaintext,
            products_path: "fake/products.json".into(),
        });

        let accounts = AccountStore::new(
            Arc::new(MemoryStorage::new()),
            StoreSettings {
                keys: StorageKeys::with_prefix(&config.storage_prefix),
                password_scheme: config.password_scheme,
            },
        )
        .expect("memory store ok");

        let catalog = Catalog::from_json(
            r#"[
                {"id": 1, "name": "Anillo Solitario", "price": 250000, "category": "anillos", "metal": "oro-blanco", "stock": 3, "image": "img/1.jpg", "description": "Oro blanco con diamante"},
                {"id": 2, "name": "Aros Luna", "price": 45990, "category": "aros", "metal": "plata", "stock": 0, "image": "img/2.jpg", "description": "Aros de plata"},
                {"id": 3, "name": "Collar Sol", "price": 89900, "category": "collares", "metal": "oro", "stock": 7, "image": "img/3.jpg", "description": "Collar de oro"}
            ]"#,
        )
        .expect("fake catalog ok");

        Self::from_parts(config, Arc::new(accounts), Arc::new(catalog))
    }
}
