use keyring::Entry;
use std::cell::RefCell;

use crate::modules::auth::error::StoreError;
use crate::modules::encryption::generate_secret;
use crate::APP_NAME;

/// Length of the secrets this module generates
pub const SECRET_LEN: usize = 32;

/// A single string slot in some secure storage
pub trait SecretSlot {
    fn get(&self) -> Result<Option<String>, StoreError>;
    fn set(&self, value: &str) -> Result<(), StoreError>;
    fn delete(&self) -> Result<(), StoreError>;
}

/// Slot backed by the operating system keyring
pub struct KeyringSlot {
    entry: Entry,
}

impl KeyringSlot {
    pub fn new(name: &str) -> Result<Self, StoreError> {
        let entry = Entry::new(APP_NAME, name).map_err(|e| StoreError::Keyring(e.to_string()))?;
        Ok(Self { entry })
    }
}

impl SecretSlot for KeyringSlot {
    fn get(&self) -> Result<Option<String>, StoreError> {
        match self.entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::Keyring(e.to_string())),
        }
    }

    fn set(&self, value: &str) -> Result<(), StoreError> {
        self.entry
            .set_password(value)
            .map_err(|e| StoreError::Keyring(e.to_string()))
    }

    fn delete(&self) -> Result<(), StoreError> {
        match self.entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::Keyring(e.to_string())),
        }
    }
}

/// In-process slot, used when no keyring is available and in tests
#[derive(Default)]
pub struct MemorySlot {
    value: RefCell<Option<String>>,
}

impl SecretSlot for MemorySlot {
    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.value.borrow().clone())
    }

    fn set(&self, value: &str) -> Result<(), StoreError> {
        *self.value.borrow_mut() = Some(value.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<(), StoreError> {
        *self.value.borrow_mut() = None;
        Ok(())
    }
}

/// Random binary secret kept hex-encoded in a slot: the account store's
/// master key and the reset-link signing key both live here.
pub struct SecureSecret<S: SecretSlot = KeyringSlot> {
    slot: S,
}

impl SecureSecret<KeyringSlot> {
    /// Master key used to encrypt the account store file
    pub fn master_key() -> Result<Self, StoreError> {
        Ok(Self::with_slot(KeyringSlot::new("master-key")?))
    }

    /// Server secret used to sign password reset links
    pub fn signing_key() -> Result<Self, StoreError> {
        Ok(Self::with_slot(KeyringSlot::new("reset-signing-key")?))
    }
}

impl<S: SecretSlot> SecureSecret<S> {
    pub fn with_slot(slot: S) -> Self {
        Self { slot }
    }

    /// Store a secret, replacing any previous one
    pub fn store_key(&self, key: &[u8]) -> Result<(), StoreError> {
        self.slot.set(&hex::encode(key))
    }

    /// Retrieve the stored secret
    pub fn get_key(&self) -> Result<Vec<u8>, StoreError> {
        let encoded = self
            .slot
            .get()?
            .ok_or_else(|| StoreError::Keyring("secret has not been initialized".to_string()))?;
        hex::decode(encoded).map_err(|e| StoreError::Keyring(format!("corrupt secret: {}", e)))
    }

    /// Return the stored secret, generating and storing one on first use
    pub fn get_or_create(&self) -> Result<Vec<u8>, StoreError> {
        if self.slot.get()?.is_none() {
            self.store_key(&generate_secret(SECRET_LEN))?;
            log::info!("Generated new secret");
        }
        self.get_key()
    }

    pub fn delete(&self) -> Result<(), StoreError> {
        self.slot.delete()
    }
}
