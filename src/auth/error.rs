use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Field name -> user-facing message. Later inserts for a field replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed input; nothing was written.
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Well-formed login whose email or password does not check out.
    #[error("invalid credentials: {0:?}")]
    InvalidCredentials(FieldErrors),

    #[error("user not found: {id}")]
    UserNotFound { id: u64 },

    #[error("stored value under '{key}' is malformed")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
