mod keyring;

pub use self::keyring::{KeyringSlot, MemorySlot, SecretSlot, SecureSecret, SECRET_LEN};
