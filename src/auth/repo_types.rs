use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Account record as persisted under the accounts key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: u64,
    pub name: String,                 // trimmed, >= 3 chars
    pub email: String,                // trimmed + lower-cased, unique
    pub password: String,             // verbatim or argon2 PHC, see PasswordScheme
    #[serde(rename = "newsletter", default)]
    pub newsletter_opt_in: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The single current session, persisted under the session key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub login_time: OffsetDateTime,
}

impl Session {
    pub fn for_account(account: &Account, login_time: OffsetDateTime) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            login_time,
        }
    }
}

/// Fields of an account that a profile update may overwrite.
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "newsletter")]
    pub newsletter_opt_in: Option<bool>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.newsletter_opt_in.is_none()
    }
}
