use std::{fmt, str::FromStr};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// How account passwords are written to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScheme {
    /// Stored verbatim. Only for compatibility with prototype data.
    Plaintext,
    /// Salted Argon2 PHC string.
    Argon2,
}

impl PasswordScheme {
    pub fn seal(self, plain: &str) -> anyhow::Result<String> {
        match self {
            PasswordScheme::Plaintext => Ok(plain.to_string()),
            PasswordScheme::Argon2 => hash_password(plain),
        }
    }
}

impl FromStr for PasswordScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plaintext" | "plain" => Ok(PasswordScheme::Plaintext),
            "argon2" => Ok(PasswordScheme::Argon2),
            other => anyhow::bail!("unknown password scheme {:?}", other),
        }
    }
}

impl fmt::Display for PasswordScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordScheme::Plaintext => f.write_str("plaintext"),
            PasswordScheme::Argon2 => f.write_str("argon2"),
        }
    }
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Checks `plain` against whatever form `stored` was written in, so records
/// sealed under either scheme keep working after the scheme changes.
pub fn matches_stored(plain: &str, stored: &str) -> anyhow::Result<bool> {
    if stored.starts_with("$argon2") {
        verify_password(plain, stored)
    } else {
        Ok(plain == stored)
    }
}
