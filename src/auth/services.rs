use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::auth::error::{FieldErrors, StoreError};
use crate::auth::password::{matches_stored, PasswordScheme};
use crate::auth::repo::{AccountRepo, StorageKeys};
use crate::auth::repo_types::{Account, ProfileUpdate, Session};
use crate::storage::KeyValueStorage;

pub const MIN_NAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

pub const DEMO_ACCOUNT_ID: u64 = 1;
pub const DEMO_NAME: &str = "Usuario Demo";
pub const DEMO_EMAIL: &str = "demo@tienda.com";
pub const DEMO_PASSWORD: &str = "demo123";

pub const MSG_NAME_TOO_SHORT: &str = "Name must be at least 3 characters";
pub const MSG_INVALID_EMAIL: &str = "Please enter a valid email";
pub const MSG_EMAIL_TAKEN: &str = "This email is already registered";
pub const MSG_PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
pub const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const MSG_EMAIL_REQUIRED: &str = "Please enter your email";
pub const MSG_PASSWORD_REQUIRED: &str = "Please enter your password";
pub const MSG_EMAIL_NOT_REGISTERED: &str = "Email not registered";
pub const MSG_WRONG_PASSWORD: &str = "Incorrect password";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration form as submitted. Missing fields arrive as empty strings.
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub newsletter_opt_in: bool,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub keys: StorageKeys,
    pub password_scheme: PasswordScheme,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            password_scheme: PasswordScheme::Argon2,
        }
    }
}

/// Accounts plus the single current session.
///
/// Every read-modify-write of the accounts collection runs under `write_lock`,
/// so concurrent callers sharing one store cannot lose each other's writes.
/// Separate processes pointed at the same storage are not coordinated.
pub struct AccountStore {
    repo: AccountRepo,
    scheme: PasswordScheme,
    write_lock: Mutex<()>,
}

impl AccountStore {
    /// Builds the store and seeds the demo account if the collection is absent.
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        settings: StoreSettings,
    ) -> Result<Self, StoreError> {
        let store = Self {
            repo: AccountRepo::new(storage, settings.keys),
            scheme: settings.password_scheme,
            write_lock: Mutex::new(()),
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn password_scheme(&self) -> PasswordScheme {
        self.scheme
    }

    /// Returns whether the demo account was written by this call.
    pub fn initialize(&self) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        if self.repo.load_accounts()?.is_some() {
            debug!(key = %self.repo.keys().accounts, "account collection present; skipping seed");
            return Ok(false);
        }

        let demo = Account {
            id: DEMO_ACCOUNT_ID,
            name: DEMO_NAME.to_string(),
            email: DEMO_EMAIL.to_string(),
            password: self.scheme.seal(DEMO_PASSWORD)?,
            newsletter_opt_in: false,
            created_at: OffsetDateTime::now_utc(),
        };
        self.repo.save_accounts(std::slice::from_ref(&demo))?;
        info!(user_id = demo.id, email = %demo.email, "seeded demo account");
        Ok(true)
    }

    pub fn register(&self, input: RegisterInput) -> Result<Account, StoreError> {
        let _guard = self.write_lock.lock();
        let mut accounts = self.repo.accounts()?;

        let errors = validate_registration(&input, &accounts);
        if !errors.is_empty() {
            warn!(fields = ?errors, "registration rejected");
            return Err(StoreError::Validation(errors));
        }

        let account = Account {
            id: next_id(&accounts)?,
            name: input.name.trim().to_string(),
            email: normalize_email(&input.email),
            password: self.scheme.seal(&input.password)?,
            newsletter_opt_in: input.newsletter_opt_in,
            created_at: OffsetDateTime::now_utc(),
        };
        accounts.push(account.clone());
        self.repo.save_accounts(&accounts)?;

        info!(user_id = account.id, email = %account.email, "user registered");
        Ok(account)
    }

    /// Format problems are reported first, all at once. Only a well-formed
    /// request is checked against the stored accounts.
    pub fn login(&self, email: &str, password: &str, remember: bool) -> Result<Session, StoreError> {
        let email = normalize_email(email);

        let mut errors = FieldErrors::new();
        if email.is_empty() {
            errors.insert("email", MSG_EMAIL_REQUIRED);
        } else if !is_valid_email(&email) {
            errors.insert("email", MSG_INVALID_EMAIL);
        }
        if password.is_empty() {
            errors.insert("password", MSG_PASSWORD_REQUIRED);
        }
        if !errors.is_empty() {
            warn!(fields = ?errors, "login rejected");
            return Err(StoreError::Validation(errors));
        }

        let _guard = self.write_lock.lock();
        let accounts = self.repo.accounts()?;
        let Some(account) = accounts.iter().find(|a| normalize_email(&a.email) == email) else {
            warn!(email = %email, "login unknown email");
            return Err(StoreError::InvalidCredentials(FieldErrors::single(
                "email",
                MSG_EMAIL_NOT_REGISTERED,
            )));
        };

        if !matches_stored(password, &account.password)? {
            warn!(email = %email, user_id = account.id, "login invalid password");
            return Err(StoreError::InvalidCredentials(FieldErrors::single(
                "password",
                MSG_WRONG_PASSWORD,
            )));
        }

        let session = Session::for_account(account, OffsetDateTime::now_utc());
        // flag before session: a failed login must not leave anyone logged in
        let newly_remembered = remember && !self.repo.remember()?;
        if newly_remembered {
            self.repo.set_remember()?;
        }
        if let Err(e) = self.repo.save_session(&session) {
            if newly_remembered {
                if let Err(undo) = self.repo.clear_remember() {
                    error!(error = %undo, "failed to clear remember flag after login failure");
                }
            }
            return Err(e);
        }

        info!(user_id = session.id, email = %session.email, remember, "user logged in");
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        self.repo.clear_session()?;
        self.repo.clear_remember()?;
        info!("user logged out");
        Ok(())
    }

    /// Storage failures are logged and read as "no session".
    pub fn current_user(&self) -> Option<Session> {
        match self.repo.load_session() {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "failed to read session");
                None
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user().is_some()
    }

    pub fn is_remembered(&self) -> Result<bool, StoreError> {
        self.repo.remember()
    }

    pub fn all_accounts(&self) -> Result<Vec<Account>, StoreError> {
        self.repo.accounts()
    }

    pub fn user_by_id(&self, id: u64) -> Result<Option<Account>, StoreError> {
        Ok(self.repo.accounts()?.into_iter().find(|a| a.id == id))
    }

    /// Overwrites the provided fields only. When `id` is the session's account,
    /// name and email are mirrored into the session as well.
    pub fn update_profile(&self, id: u64, update: ProfileUpdate) -> Result<Account, StoreError> {
        let _guard = self.write_lock.lock();
        let mut accounts = self.repo.accounts()?;

        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            warn!(user_id = id, "profile update for unknown user");
            return Err(StoreError::UserNotFound { id });
        };

        // seal first so a hashing failure leaves everything untouched
        let sealed = update
            .password
            .as_deref()
            .map(|p| self.scheme.seal(p))
            .transpose()?;
        let name = update.name.as_deref().map(|n| n.trim().to_string());
        let email = update.email.as_deref().map(normalize_email);

        if let Some(name) = &name {
            account.name = name.clone();
        }
        if let Some(email) = &email {
            account.email = email.clone();
        }
        if let Some(sealed) = sealed {
            account.password = sealed;
        }
        if let Some(opt_in) = update.newsletter_opt_in {
            account.newsletter_opt_in = opt_in;
        }
        let updated = account.clone();

        // session first; if the collection write then fails, the old session goes back
        let previous_session = match self.repo.load_session()? {
            Some(previous) if previous.id == id => {
                let mut session = previous.clone();
                if let Some(name) = name {
                    session.name = name;
                }
                if let Some(email) = email {
                    session.email = email;
                }
                self.repo.save_session(&session)?;
                debug!(user_id = id, "session mirrored profile update");
                Some(previous)
            }
            _ => None,
        };

        if let Err(e) = self.repo.save_accounts(&accounts) {
            if let Some(previous) = previous_session {
                if let Err(undo) = self.repo.save_session(&previous) {
                    error!(error = %undo, user_id = id, "failed to restore session after profile update failure");
                }
            }
            return Err(e);
        }

        info!(user_id = id, "profile updated");
        Ok(updated)
    }
}

fn validate_registration(input: &RegisterInput, accounts: &[Account]) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if input.name.trim().chars().count() < MIN_NAME_LEN {
        errors.insert("name", MSG_NAME_TOO_SHORT);
    }

    let email = normalize_email(&input.email);
    if !is_valid_email(&email) {
        errors.insert("email", MSG_INVALID_EMAIL);
    }
    if !email.is_empty() && accounts.iter().any(|a| normalize_email(&a.email) == email) {
        errors.insert("email", MSG_EMAIL_TAKEN);
    }

    if input.password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert("password", MSG_PASSWORD_TOO_SHORT);
    }
    if input.password != input.confirm_password {
        errors.insert("confirmPassword", MSG_PASSWORD_MISMATCH);
    }

    errors
}

fn next_id(accounts: &[Account]) -> Result<u64, StoreError> {
    match accounts.iter().map(|a| a.id).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| StoreError::Storage(anyhow::anyhow!("account id space exhausted"))),
    }
}

#[cfg(test)]
mod store_tests {
    use super::*;
    use crate::storage::{FailingStorage, MemoryStorage};

    fn plaintext() -> StoreSettings {
        StoreSettings {
            keys: StorageKeys::default(),
            password_scheme: PasswordScheme::Plaintext,
        }
    }

    fn fresh_store() -> (Arc<MemoryStorage>, AccountStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = AccountStore::new(storage.clone(), plaintext()).unwrap();
        (storage, store)
    }

    fn input(name: &str, email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: password.into(),
            newsletter_opt_in: false,
        }
    }

    fn validation_errors(err: StoreError) -> FieldErrors {
        match err {
            StoreError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@shop.example.cl"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn seeds_demo_account_once() {
        let (storage, store) = fresh_store();
        assert!(!store.initialize().unwrap());
        assert!(!store.initialize().unwrap());

        let again = AccountStore::new(storage, plaintext()).unwrap();
        let accounts = again.all_accounts().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, DEMO_ACCOUNT_ID);
        assert_eq!(accounts[0].email, DEMO_EMAIL);
        assert_eq!(accounts[0].name, DEMO_NAME);
    }

    #[test]
    fn does_not_seed_over_existing_collection() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("tienda_users", "[]").unwrap();
        let store = AccountStore::new(storage, plaintext()).unwrap();
        assert!(store.all_accounts().unwrap().is_empty());
    }

    #[test]
    fn corrupt_collection_fails_construction() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("tienda_users", "oops").unwrap();
        let err = AccountStore::new(storage.clone(), plaintext()).err().unwrap();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        // nothing overwritten
        assert_eq!(storage.get("tienda_users").unwrap().as_deref(), Some("oops"));
    }

    #[test]
    fn three_char_name_is_enough() {
        let (_, store) = fresh_store();
        let account = store.register(input("  Ana ", "ana@shop.cl", "secret1")).unwrap();
        assert_eq!(account.name, "Ana");
    }

    #[test]
    fn two_char_name_is_rejected() {
        let (_, store) = fresh_store();
        let errors = validation_errors(store.register(input("Al", "al@shop.cl", "secret1")).unwrap_err());
        assert_eq!(errors.get("name"), Some(MSG_NAME_TOO_SHORT));
        assert_eq!(errors.len(), 1);
        assert_eq!(store.all_accounts().unwrap().len(), 1);
    }

    #[test]
    fn collects_every_field_error() {
        let (_, store) = fresh_store();
        let errors = validation_errors(
            store
                .register(RegisterInput {
                    name: " ".into(),
                    email: "nope".into(),
                    password: "123".into(),
                    confirm_password: "1234".into(),
                    newsletter_opt_in: true,
                })
                .unwrap_err(),
        );
        assert_eq!(errors.get("name"), Some(MSG_NAME_TOO_SHORT));
        assert_eq!(errors.get("email"), Some(MSG_INVALID_EMAIL));
        assert_eq!(errors.get("password"), Some(MSG_PASSWORD_TOO_SHORT));
        assert_eq!(errors.get("confirmPassword"), Some(MSG_PASSWORD_MISMATCH));
    }

    #[test]
    fn duplicate_email_is_case_insensitive() {
        let (_, store) = fresh_store();
        store.register(input("Alice", "A@b.com", "secret1")).unwrap();
        let errors = validation_errors(store.register(input("Alicia", "a@b.com", "secret1")).unwrap_err());
        assert_eq!(errors.get("email"), Some(MSG_EMAIL_TAKEN));
        assert_eq!(store.all_accounts().unwrap().len(), 2);
    }

    #[test]
    fn registered_account_round_trips_by_id() {
        let (_, store) = fresh_store();
        let created = store
            .register(RegisterInput {
                name: "  Beatriz Soto ".into(),
                email: "  Bea@Shop.CL ".into(),
                password: "hunter22".into(),
                confirm_password: "hunter22".into(),
                newsletter_opt_in: true,
            })
            .unwrap();

        let found = store.user_by_id(created.id).unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.name, "Beatriz Soto");
        assert_eq!(found.email, "bea@shop.cl");
        assert_eq!(found.password, "hunter22");
        assert!(found.newsletter_opt_in);
        assert_ne!(found.id, DEMO_ACCOUNT_ID);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let (_, store) = fresh_store();
        let a = store.register(input("Uno", "uno@shop.cl", "secret1")).unwrap();
        let b = store.register(input("Dos", "dos@shop.cl", "secret1")).unwrap();
        assert_eq!(a.id, DEMO_ACCOUNT_ID + 1);
        assert_eq!(b.id, a.id + 1);
    }

    #[test]
    fn demo_login_succeeds() {
        let (_, store) = fresh_store();
        let session = store.login(DEMO_EMAIL, DEMO_PASSWORD, false).unwrap();
        assert_eq!(session.email, "demo@tienda.com");
        assert_eq!(session.id, DEMO_ACCOUNT_ID);
        assert_eq!(store.current_user(), Some(session));
        assert!(!store.is_remembered().unwrap());
    }

    #[test]
    fn login_normalizes_email() {
        let (_, store) = fresh_store();
        assert!(store.login("  DEMO@Tienda.com ", DEMO_PASSWORD, false).is_ok());
    }

    #[test]
    fn wrong_password_creates_no_session() {
        let (_, store) = fresh_store();
        let err = store.login(DEMO_EMAIL, "nope123", false).unwrap_err();
        match err {
            StoreError::InvalidCredentials(errors) => {
                assert_eq!(errors.get("password"), Some(MSG_WRONG_PASSWORD));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!store.is_logged_in());
    }

    #[test]
    fn unknown_email_is_not_registered() {
        let (_, store) = fresh_store();
        match store.login("ghost@tienda.com", "whatever", false).unwrap_err() {
            StoreError::InvalidCredentials(errors) => {
                assert_eq!(errors.get("email"), Some(MSG_EMAIL_NOT_REGISTERED));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn format_errors_take_precedence_over_lookup() {
        let (_, store) = fresh_store();
        let errors = validation_errors(store.login("not-an-email", "", false).unwrap_err());
        assert_eq!(errors.get("email"), Some(MSG_INVALID_EMAIL));
        assert_eq!(errors.get("password"), Some(MSG_PASSWORD_REQUIRED));

        let errors = validation_errors(store.login("", DEMO_PASSWORD, false).unwrap_err());
        assert_eq!(errors.get("email"), Some(MSG_EMAIL_REQUIRED));
        assert!(!errors.contains("password"));
    }

    #[test]
    fn remember_sets_flag_and_logout_clears_everything() {
        let (storage, store) = fresh_store();
        store.login(DEMO_EMAIL, DEMO_PASSWORD, true).unwrap();
        assert!(store.is_remembered().unwrap());
        assert!(store.is_logged_in());

        store.logout().unwrap();
        assert_eq!(store.current_user(), None);
        assert!(!store.is_logged_in());
        assert!(!store.is_remembered().unwrap());
        assert_eq!(storage.get("tienda_current_user").unwrap(), None);
        assert_eq!(storage.get("tienda_remember").unwrap(), None);

        // logging out while anonymous is fine
        store.logout().unwrap();
    }

    #[test]
    fn session_survives_store_restart() {
        let (storage, store) = fresh_store();
        let session = store.login(DEMO_EMAIL, DEMO_PASSWORD, false).unwrap();
        drop(store);

        let reopened = AccountStore::new(storage, plaintext()).unwrap();
        assert_eq!(reopened.current_user(), Some(session));
    }

    #[test]
    fn file_backed_store_keeps_accounts_and_session() {
        let dir = tempfile::tempdir().unwrap();
        let open = || {
            let storage = Arc::new(crate::storage::FileStorage::new(dir.path()).unwrap());
            AccountStore::new(storage, plaintext()).unwrap()
        };

        let store = open();
        let created = store.register(input("Elena", "elena@shop.cl", "secret1")).unwrap();
        store.login("elena@shop.cl", "secret1", true).unwrap();
        drop(store);

        let store = open();
        assert_eq!(store.all_accounts().unwrap().len(), 2);
        assert_eq!(store.user_by_id(created.id).unwrap(), Some(created));
        assert_eq!(store.current_user().unwrap().email, "elena@shop.cl");
        assert!(store.is_remembered().unwrap());
    }

    #[test]
    fn update_profile_mirrors_into_session() {
        let (_, store) = fresh_store();
        let session = store.login(DEMO_EMAIL, DEMO_PASSWORD, false).unwrap();

        let updated = store
            .update_profile(
                session.id,
                ProfileUpdate {
                    name: Some("New Name".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.email, DEMO_EMAIL);
        assert_eq!(updated.password, DEMO_PASSWORD);

        let stored = store.user_by_id(session.id).unwrap().unwrap();
        assert_eq!(stored, updated);

        let current = store.current_user().unwrap();
        assert_eq!(current.name, "New Name");
        assert_eq!(current.email, DEMO_EMAIL);
        assert_eq!(current.login_time, session.login_time);
    }

    #[test]
    fn update_profile_mirrors_email_into_session() {
        let (_, store) = fresh_store();
        let session = store.login(DEMO_EMAIL, DEMO_PASSWORD, false).unwrap();

        let updated = store
            .update_profile(
                session.id,
                ProfileUpdate {
                    email: Some(" NEW@Mail.cl".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.email, "new@mail.cl");
        assert_eq!(store.current_user().unwrap().email, "new@mail.cl");

        store.logout().unwrap();
        assert!(store.login(DEMO_EMAIL, DEMO_PASSWORD, false).is_err());
        let again = store.login("new@mail.cl", DEMO_PASSWORD, false).unwrap();
        assert_eq!(again.id, session.id);
    }

    fn failing_store() -> (Arc<FailingStorage>, AccountStore) {
        let storage = Arc::new(FailingStorage::new());
        let store = AccountStore::new(storage.clone(), plaintext()).unwrap();
        (storage, store)
    }

    #[test]
    fn failed_session_mirror_leaves_account_untouched() {
        let (storage, store) = failing_store();
        store.login(DEMO_EMAIL, DEMO_PASSWORD, false).unwrap();
        storage.refuse_writes_to("tienda_current_user");

        let result = store.update_profile(
            DEMO_ACCOUNT_ID,
            ProfileUpdate {
                name: Some("Otro Nombre".into()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StoreError::Storage(_))));
        assert_eq!(store.user_by_id(DEMO_ACCOUNT_ID).unwrap().unwrap().name, DEMO_NAME);
        assert_eq!(store.current_user().unwrap().name, DEMO_NAME);
    }

    #[test]
    fn failed_collection_write_restores_session() {
        let (storage, store) = failing_store();
        store.login(DEMO_EMAIL, DEMO_PASSWORD, false).unwrap();
        storage.refuse_writes_to("tienda_users");

        let result = store.update_profile(
            DEMO_ACCOUNT_ID,
            ProfileUpdate {
                name: Some("Otro Nombre".into()),
                ..Default::default()
            },
        );
        assert!(result.is_err());
        assert_eq!(store.user_by_id(DEMO_ACCOUNT_ID).unwrap().unwrap().name, DEMO_NAME);
        assert_eq!(store.current_user().unwrap().name, DEMO_NAME);
    }

    #[test]
    fn failed_remember_write_does_not_log_in() {
        let (storage, store) = failing_store();
        storage.refuse_writes_to("tienda_remember");

        assert!(store.login(DEMO_EMAIL, DEMO_PASSWORD, true).is_err());
        assert!(!store.is_logged_in());
        assert!(!store.is_remembered().unwrap());

        // without the flag the same storage still allows a login
        assert!(store.login(DEMO_EMAIL, DEMO_PASSWORD, false).is_ok());
    }

    #[test]
    fn failed_session_write_drops_new_remember_flag() {
        let (storage, store) = failing_store();
        storage.refuse_writes_to("tienda_current_user");

        assert!(store.login(DEMO_EMAIL, DEMO_PASSWORD, true).is_err());
        assert!(!store.is_logged_in());
        assert!(!store.is_remembered().unwrap());
    }

    #[test]
    fn exhausted_id_space_is_an_error() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                "tienda_users",
                &format!(
                    r#"[{{"id":{},"name":"Max","email":"max@shop.cl","password":"secret1","createdAt":"2024-05-01T12:00:00Z"}}]"#,
                    u64::MAX
                ),
            )
            .unwrap();
        let store = AccountStore::new(storage, plaintext()).unwrap();

        let err = store.register(input("Nuevo", "nuevo@shop.cl", "secret1")).unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert_eq!(store.all_accounts().unwrap().len(), 1);
    }

    #[test]
    fn update_profile_of_other_account_leaves_session_alone() {
        let (_, store) = fresh_store();
        let other = store.register(input("Carla", "carla@shop.cl", "secret1")).unwrap();
        let session = store.login(DEMO_EMAIL, DEMO_PASSWORD, false).unwrap();

        store
            .update_profile(
                other.id,
                ProfileUpdate {
                    newsletter_opt_in: Some(true),
                    email: Some(" CARLA@Nuevo.cl".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let other = store.user_by_id(other.id).unwrap().unwrap();
        assert!(other.newsletter_opt_in);
        assert_eq!(other.email, "carla@nuevo.cl");
        assert_eq!(store.current_user(), Some(session));
    }

    #[test]
    fn update_profile_unknown_id() {
        let (_, store) = fresh_store();
        let err = store.update_profile(999, ProfileUpdate::default()).unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound { id: 999 }));
    }

    #[test]
    fn password_change_is_usable_for_login() {
        let (_, store) = fresh_store();
        store
            .update_profile(
                DEMO_ACCOUNT_ID,
                ProfileUpdate {
                    password: Some("brandnew".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(store.login(DEMO_EMAIL, DEMO_PASSWORD, false).is_err());
        assert!(store.login(DEMO_EMAIL, "brandnew", false).is_ok());
    }

    #[test]
    fn argon2_scheme_never_stores_plaintext() {
        let storage = Arc::new(MemoryStorage::new());
        let store = AccountStore::new(
            storage.clone(),
            StoreSettings {
                keys: StorageKeys::default(),
                password_scheme: PasswordScheme::Argon2,
            },
        )
        .unwrap();

        let account = store.register(input("Diego", "diego@shop.cl", "s3cret!")).unwrap();
        assert!(account.password.starts_with("$argon2"));
        let raw = storage.get("tienda_users").unwrap().unwrap();
        assert!(!raw.contains("s3cret!"));
        assert!(!raw.contains(DEMO_PASSWORD));

        assert!(store.login("diego@shop.cl", "s3cret!", false).is_ok());
        assert!(store.login(DEMO_EMAIL, DEMO_PASSWORD, false).is_ok());
    }

    #[test]
    fn prototype_plaintext_records_still_log_in_under_argon2() {
        let storage = Arc::new(MemoryStorage::new());
        AccountStore::new(storage.clone(), plaintext()).unwrap();

        let store = AccountStore::new(storage, StoreSettings::default()).unwrap();
        assert!(store.login(DEMO_EMAIL, DEMO_PASSWORD, false).is_ok());
    }

    #[test]
    fn concurrent_registrations_are_not_lost() {
        let (_, store) = fresh_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .register(input("Cliente", &format!("c{i}@shop.cl"), "secret1"))
                        .unwrap()
                        .id
                })
            })
            .collect();
        let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();

        assert_eq!(ids.len(), 8);
        assert_eq!(store.all_accounts().unwrap().len(), 9);
    }
}
