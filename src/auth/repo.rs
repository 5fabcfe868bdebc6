use std::sync::Arc;

use tracing::warn;

use crate::auth::error::StoreError;
use crate::auth::repo_types::{Account, Session};
use crate::storage::KeyValueStorage;

pub const REMEMBER_MARKER: &str = "true";

/// Names of the three persisted entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub accounts: String,
    pub session: String,
    pub remember: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            accounts: format!("{}_users", prefix),
            session: format!("{}_current_user", prefix),
            remember: format!("{}_remember", prefix),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix("tienda")
    }
}

/// Typed view over the raw key-value storage.
#[derive(Clone)]
pub struct AccountRepo {
    storage: Arc<dyn KeyValueStorage>,
    keys: StorageKeys,
}

impl AccountRepo {
    pub fn new(storage: Arc<dyn KeyValueStorage>, keys: StorageKeys) -> Self {
        Self { storage, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// `None` when the collection has never been written.
    pub fn load_accounts(&self) -> Result<Option<Vec<Account>>, StoreError> {
        let Some(raw) = self.storage.get(&self.keys.accounts)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: self.keys.accounts.clone(),
                source,
            })
    }

    pub fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.load_accounts()?.unwrap_or_default())
    }

    pub fn save_accounts(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(accounts).map_err(anyhow::Error::from)?;
        self.storage.set(&self.keys.accounts, &raw)?;
        Ok(())
    }

    /// A session that cannot be decoded counts as no session.
    pub fn load_session(&self) -> Result<Option<Session>, StoreError> {
        let Some(raw) = self.storage.get(&self.keys.session)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(key = %self.keys.session, error = %e, "ignoring malformed session record");
                Ok(None)
            }
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        let raw = serde_json::to_string(session).map_err(anyhow::Error::from)?;
        self.storage.set(&self.keys.session, &raw)?;
        Ok(())
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        self.storage.remove(&self.keys.session)?;
        Ok(())
    }

    pub fn set_remember(&self) -> Result<(), StoreError> {
        self.storage.set(&self.keys.remember, REMEMBER_MARKER)?;
        Ok(())
    }

    pub fn clear_remember(&self) -> Result<(), StoreError> {
        self.storage.remove(&self.keys.remember)?;
        Ok(())
    }

    pub fn remember(&self) -> Result<bool, StoreError> {
        Ok(self.storage.get(&self.keys.remember)?.as_deref() == Some(REMEMBER_MARKER))
    }
}
