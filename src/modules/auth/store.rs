use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use super::error::{AuthError, AuthResult, StoreError};
use super::otp::OtpChallenge;
use super::password::{PasswordHasher, PasswordPolicy};
use super::tokens::ConsumedTokens;
use crate::modules::encryption::{decrypt_data, encrypt_data, generate_random_iv};
use crate::modules::social::graph::FollowGraph;
use crate::modules::utils::io::is_valid_email;
use crate::modules::utils::logging::log_data_operation;
use crate::DEFAULT_ICON;

pub type AccountId = u64;

pub const USERNAME_MIN_LEN: usize = 2;
pub const USERNAME_MAX_LEN: usize = 20;

/// Per-account switches shown on the settings page
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSettings {
    pub is_public: bool,
    pub follow_notify: bool,
    pub comment_notify: bool,
    pub dark_mode: bool,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            is_public: true,
            follow_notify: true,
            comment_notify: true,
            dark_mode: false,
        }
    }
}

/// A registered user: identity, credential and profile
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub(crate) password_hash: String,
    pub bio: String,
    pub icon: String,
    pub settings: AccountSettings,
    pub(crate) otp: Option<OtpChallenge>,
    pub created_at: u64,
    pub last_login: Option<u64>,
}

impl Account {
    /// Constant-time check of a raw password against the stored hash
    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHasher::verify(&self.password_hash, password)
    }

    /// Replace the password hash. A password rejected by the policy leaves the old hash in place.
    pub fn set_password(
        &mut self,
        password: &str,
        policy: &PasswordPolicy,
        hasher: &PasswordHasher,
    ) -> AuthResult<()> {
        policy.validate(password)?;
        self.password_hash = hasher.hash(password);
        Ok(())
    }
}

/// Lookup key shared by the email and username indexes
fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

pub(crate) fn validate_username(username: &str) -> AuthResult<String> {
    let username = username.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(AuthError::InvalidUsername);
    }
    Ok(username.to_string())
}

/// All accounts plus the state that hangs off them: the follow graph and the
/// set of redeemed reset tokens.
#[derive(Serialize, Deserialize, Default)]
pub struct AccountStore {
    accounts: BTreeMap<AccountId, Account>,
    next_id: AccountId,
    pub(crate) graph: FollowGraph,
    pub(crate) consumed_tokens: ConsumedTokens,

    // Rebuilt from `accounts` after loading
    #[serde(skip)]
    emails: HashMap<String, AccountId>,
    #[serde(skip)]
    usernames: HashMap<String, AccountId>,

    #[serde(skip)]
    policy: PasswordPolicy,
    #[serde(skip)]
    hasher: PasswordHasher,
}

impl AccountStore {
    pub fn new(policy: PasswordPolicy, hasher: PasswordHasher) -> Self {
        Self {
            policy,
            hasher,
            ..Self::default()
        }
    }

    /// Apply the password settings after the store was loaded from disk
    pub fn configure(&mut self, policy: PasswordPolicy, hasher: PasswordHasher) {
        self.policy = policy;
        self.hasher = hasher;
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    fn rebuild_indexes(&mut self) {
        self.emails = self
            .accounts
            .values()
            .map(|a| (normalize(&a.email), a.id))
            .collect();
        self.usernames = self
            .accounts
            .values()
            .map(|a| (normalize(&a.username), a.id))
            .collect();
    }

    /// Create an account. Checks run in order: email shape, email uniqueness,
    /// username, password policy. Nothing is stored unless all pass.
    pub fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        now: u64,
    ) -> AuthResult<&Account> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmailShape);
        }
        if self.emails.contains_key(&normalize(email)) {
            log_data_operation("register", email, "account_store", false, Some("duplicate email"));
            return Err(AuthError::DuplicateEmail);
        }
        let username = validate_username(username)?;
        if self.usernames.contains_key(&normalize(&username)) {
            return Err(AuthError::DuplicateUsername);
        }
        self.policy.validate(password)?;

        self.next_id += 1;
        let id = self.next_id;
        let account = Account {
            id,
            username: username.clone(),
            email: email.to_string(),
            password_hash: self.hasher.hash(password),
            bio: String::new(),
            icon: DEFAULT_ICON.to_string(),
            settings: AccountSettings::default(),
            otp: None,
            created_at: now,
            last_login: None,
        };

        self.emails.insert(normalize(email), id);
        self.usernames.insert(normalize(&username), id);
        self.accounts.insert(id, account);

        log_data_operation("register", &username, "account_store", true, None);
        Ok(&self.accounts[&id])
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn account(&self, id: AccountId) -> AuthResult<&Account> {
        self.accounts.get(&id).ok_or(AuthError::AccountNotFound)
    }

    pub(crate) fn account_mut(&mut self, id: AccountId) -> AuthResult<&mut Account> {
        self.accounts.get_mut(&id).ok_or(AuthError::AccountNotFound)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Account> {
        self.emails
            .get(&normalize(email))
            .and_then(|id| self.accounts.get(id))
    }

    pub fn find_by_username(&self, username: &str) -> Option<&Account> {
        self.usernames
            .get(&normalize(username))
            .and_then(|id| self.accounts.get(id))
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    /// Every account ordered by id
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// False for unknown accounts
    pub fn verify_password(&self, id: AccountId, password: &str) -> bool {
        self.accounts
            .get(&id)
            .map(|a| a.verify_password(password))
            .unwrap_or(false)
    }

    pub fn set_password(&mut self, id: AccountId, password: &str) -> AuthResult<()> {
        let (policy, hasher) = (self.policy, self.hasher);
        self.account_mut(id)?.set_password(password, &policy, &hasher)
    }

    /// Login by email. Unknown email and wrong password give the same error.
    pub fn authenticate(&mut self, email: &str, password: &str, now: u64) -> AuthResult<AccountId> {
        let id = match self.find_by_email(email) {
            Some(account) if account.verify_password(password) => account.id,
            _ => return Err(AuthError::BadCredentials),
        };
        self.account_mut(id)?.last_login = Some(now);
        Ok(id)
    }

    /// Change password while logged in
    pub fn change_password(
        &mut self,
        id: AccountId,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> AuthResult<()> {
        if !self.account(id)?.verify_password(current) {
            return Err(AuthError::BadCredentials);
        }
        if new_password != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        self.set_password(id, new_password)
    }

    /// Rename an account, keeping the username index unique
    pub(crate) fn set_username(&mut self, id: AccountId, username: &str) -> AuthResult<()> {
        let username = validate_username(username)?;
        let key = normalize(&username);
        if matches!(self.usernames.get(&key), Some(owner) if *owner != id) {
            return Err(AuthError::DuplicateUsername);
        }

        let account = self.account_mut(id)?;
        let old_key = normalize(&account.username);
        account.username = username;
        self.usernames.remove(&old_key);
        self.usernames.insert(key, id);
        Ok(())
    }
}

/// Encrypt and write the store. The file is replaced atomically: a temporary
/// file is written next to it and renamed over the target.
pub fn save_account_store(store: &AccountStore, path: &Path, master_key: &[u8]) -> Result<(), StoreError> {
    let data = serde_json::to_string(store)?;

    // Fresh IV for every save
    let iv = generate_random_iv();
    let encrypted_data = encrypt_data(&data, master_key, &iv).map_err(StoreError::Crypto)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(&iv)?;
    file.write_all(&encrypted_data)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Read and decrypt the store. A missing file yields an empty store; a file
/// that cannot be decrypted is an error rather than silently replaced.
pub fn load_account_store(path: &Path, master_key: &[u8]) -> Result<AccountStore, StoreError> {
    let file_data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(AccountStore::default()),
        Err(e) => return Err(StoreError::Io(e)),
    };

    if file_data.len() < 16 {
        return Err(StoreError::Crypto("store file is truncated".to_string()));
    }
    let (iv, encrypted_data) = file_data.split_at(16);
    let decrypted_data = decrypt_data(encrypted_data, master_key, iv).map_err(StoreError::Crypto)?;

    let mut store: AccountStore = serde_json::from_str(&decrypted_data)?;
    store.rebuild_indexes();
    Ok(store)
}

/// Store with a cheap hash cost for unit tests
#[cfg(test)]
pub(crate) fn test_store() -> AccountStore {
    AccountStore::new(PasswordPolicy::default(), PasswordHasher::new(10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_verify() {
        let mut store = test_store();
        let account = store
            .register("alice", "alice@example.com", "secret123", 1_000)
            .unwrap();
        let id = account.id;

        assert_eq!(account.username, "alice");
        assert_eq!(account.icon, "default.png");
        assert_eq!(account.bio, "");
        assert_eq!(account.settings, AccountSettings::default());
        assert!(!account.password_hash.contains("secret123"));

        assert!(store.verify_password(id, "secret123"));
        assert!(!store.verify_password(id, "secret124"));
        assert!(!store.verify_password(id + 1, "secret123"));
    }

    #[test]
    fn test_duplicate_email() {
        let mut store = test_store();
        store.register("alice", "alice@example.com", "secret123", 0).unwrap();

        assert_eq!(
            store.register("alice2", "alice@example.com", "secret123", 0).unwrap_err(),
            AuthError::DuplicateEmail
        );
        assert_eq!(
            store.register("alice3", "ALICE@example.com", "secret123", 0).unwrap_err(),
            AuthError::DuplicateEmail
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_registration_validation() {
        let mut store = test_store();

        assert_eq!(
            store.register("bob", "bob-at-example.com", "secret123", 0).unwrap_err(),
            AuthError::InvalidEmailShape
        );
        assert_eq!(
            store.register("bob", "bob@example", "secret123", 0).unwrap_err(),
            AuthError::InvalidEmailShape
        );
        assert_eq!(
            store.register("bob", "bob@example.com", "short", 0).unwrap_err(),
            AuthError::WeakPassword { min_length: 8 }
        );
        assert_eq!(
            store.register("b", "bob@example.com", "secret123", 0).unwrap_err(),
            AuthError::InvalidUsername
        );

        store.register("bob", "bob@example.com", "secret123", 0).unwrap();
        assert_eq!(
            store.register("Bob", "other@example.com", "secret123", 0).unwrap_err(),
            AuthError::DuplicateUsername
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_password_is_all_or_nothing() {
        let mut store = test_store();
        let id = store.register("carol", "carol@example.com", "secret123", 0).unwrap().id;

        assert_eq!(
            store.set_password(id, "tiny").unwrap_err(),
            AuthError::WeakPassword { min_length: 8 }
        );
        assert!(store.verify_password(id, "secret123"));

        store.set_password(id, "brand-new-pw").unwrap();
        assert!(store.verify_password(id, "brand-new-pw"));
        assert!(!store.verify_password(id, "secret123"));
    }

    #[test]
    fn test_authenticate() {
        let mut store = test_store();
        let id = store.register("dave", "dave@example.com", "secret123", 0).unwrap().id;

        assert_eq!(store.authenticate("dave@example.com", "secret123", 50).unwrap(), id);
        assert_eq!(store.get(id).unwrap().last_login, Some(50));

        assert_eq!(
            store.authenticate("dave@example.com", "wrong-pass", 60).unwrap_err(),
            AuthError::BadCredentials
        );
        assert_eq!(
            store.authenticate("nobody@example.com", "secret123", 60).unwrap_err(),
            AuthError::BadCredentials
        );
        assert_eq!(store.get(id).unwrap().last_login, Some(50));
    }

    #[test]
    fn test_change_password() {
        let mut store = test_store();
        let id = store.register("erin", "erin@example.com", "secret123", 0).unwrap().id;

        assert_eq!(
            store.change_password(id, "wrong-pass", "newpass123", "newpass123").unwrap_err(),
            AuthError::BadCredentials
        );
        assert_eq!(
            store.change_password(id, "secret123", "newpass123", "newpass124").unwrap_err(),
            AuthError::PasswordMismatch
        );
        assert_eq!(
            store.change_password(id, "secret123", "new", "new").unwrap_err(),
            AuthError::WeakPassword { min_length: 8 }
        );
        assert!(store.verify_password(id, "secret123"));

        store.change_password(id, "secret123", "newpass123", "newpass123").unwrap();
        assert!(store.verify_password(id, "newpass123"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.dat");
        let key = vec![7u8; 32];

        let mut store = test_store();
        let alice = store.register("alice", "alice@example.com", "secret123", 0).unwrap().id;
        let bob = store.register("bob", "bob@example.com", "secret123", 0).unwrap().id;
        store.follow(alice, bob).unwrap();
        save_account_store(&store, &path, &key).unwrap();

        let mut loaded = load_account_store(&path, &key).unwrap();
        loaded.configure(PasswordPolicy::default(), PasswordHasher::new(10));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.find_by_email("bob@example.com").unwrap().id, bob);
        assert_eq!(loaded.find_by_username("ALICE").unwrap().id, alice);
        assert!(loaded.verify_password(alice, "secret123"));
        assert!(loaded.is_following(alice, bob));

        // Ids keep increasing after a reload
        let carol = loaded.register("carol", "carol@example.com", "secret123", 0).unwrap().id;
        assert_eq!(carol, 3);
        assert_eq!(
            loaded.register("alice", "x@example.com", "secret123", 0).unwrap_err(),
            AuthError::DuplicateUsername
        );
    }

    #[test]
    fn test_load_missing_and_wrong_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.dat");

        assert!(load_account_store(&path, &[1u8; 32]).unwrap().is_empty());

        save_account_store(&test_store(), &path, &[1u8; 32]).unwrap();
        assert!(load_account_store(&path, &[2u8; 32]).is_err());
    }
}
