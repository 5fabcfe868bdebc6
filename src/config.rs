use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

use crate::auth::password::PasswordScheme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    File { dir: PathBuf },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    /// Prefix of the three persisted keys (`<prefix>_users`, ...).
    pub storage_prefix: String,
    pub password_scheme: PasswordScheme,
    pub products_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr: SocketAddr = format!(
            "{}:{}",
            var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            var("APP_PORT").unwrap_or_else(|| "8080".into())
        )
        .parse()
        .context("APP_HOST/APP_PORT")?;
        let storage = match var("STORAGE_BACKEND").as_deref().unwrap_or("file") {
            "memory" => StorageConfig::Memory,
            "file" => StorageConfig::File {
                dir: var("STORAGE_DIR")
                    .unwrap_or_else(|| "data/store".into())
                    .into(),
            },
            other => anyhow::bail!("unknown STORAGE_BACKEND {:?} (expected file|memory)", other),
        };
        let password_scheme = var("PASSWORD_SCHEME")
            .as_deref()
            .unwrap_or("argon2")
            .parse::<PasswordScheme>()
            .context("PASSWORD_SCHEME")?;

        Ok(Self {
            bind_addr,
            storage,
            storage_prefix: var("STORAGE_PREFIX").unwrap_or_else(|| "tienda".into()),
            password_scheme,
            products_path: var("PRODUCTS_PATH")
                .unwrap_or_else(|| "data/products.json".into())
                .into(),
        })
    }
}
