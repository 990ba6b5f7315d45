use std::io;
use subtle::ConstantTimeEq;

use super::error::{AuthError, AuthResult};
use crate::modules::encryption::keys::{derive_key, generate_random_salt, DERIVED_KEY_LEN};

/// Identifier written at the front of every stored hash
const HASH_SCHEME: &str = "pbkdf2_sha256";

/// Minimum-length password policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordPolicy {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Length is counted in characters, not bytes
    pub fn validate(&self, password: &str) -> AuthResult<()> {
        if password.chars().count() < self.min_length {
            return Err(AuthError::WeakPassword {
                min_length: self.min_length,
            });
        }
        Ok(())
    }
}

/// Salted PBKDF2-HMAC-SHA256 password hashing.
///
/// Hashes are stored as `pbkdf2_sha256$<rounds>$<salt hex>$<hash hex>` so that
/// the round count can be raised later without invalidating existing hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            iterations: 100_000,
        }
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> String {
        let salt = generate_random_salt();
        let key = derive_key(password, &salt, self.iterations);
        format!(
            "{}${}${}${}",
            HASH_SCHEME,
            self.iterations,
            hex::encode(&salt),
            hex::encode(key)
        )
    }

    /// Check a password against a stored hash. Any malformed hash verifies as false.
    pub fn verify(stored_hash: &str, password: &str) -> bool {
        let parts: Vec<&str> = stored_hash.split('$').collect();
        if parts.len() != 4 || parts[0] != HASH_SCHEME {
            return false;
        }

        let iterations = match parts[1].parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => return false,
        };
        let (salt, expected) = match (hex::decode(parts[2]), hex::decode(parts[3])) {
            (Ok(salt), Ok(expected)) => (salt, expected),
            _ => return false,
        };
        if expected.len() != DERIVED_KEY_LEN {
            return false;
        }

        let candidate = derive_key(password, &salt, iterations);
        candidate.as_slice().ct_eq(expected.as_slice()).into()
    }
}

/// Helper function to read a password securely
pub fn read_password() -> io::Result<String> {
    rpassword::read_password()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_policy() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("secret123").is_ok());
        assert!(policy.validate("12345678").is_ok());

        assert!(matches!(
            policy.validate("short"),
            Err(AuthError::WeakPassword { min_length: 8 })
        ));
        // Seven multi-byte characters are still seven characters
        assert!(policy.validate("ぱすわーどです").is_err());
        assert!(policy.validate("ぱすわーどですよ").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(10);
        let hash = hasher.hash("secret123");

        assert!(hash.starts_with("pbkdf2_sha256$10$"));
        assert!(!hash.contains("secret123"));
        assert!(PasswordHasher::verify(&hash, "secret123"));
        assert!(!PasswordHasher::verify(&hash, "secret124"));
        assert!(!PasswordHasher::verify(&hash, ""));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new(10);
        let first = hasher.hash("secret123");
        let second = hasher.hash("secret123");
        assert_ne!(first, second);
        assert!(PasswordHasher::verify(&second, "secret123"));
    }

    #[test]
    fn test_malformed_hashes_never_verify() {
        assert!(!PasswordHasher::verify("", "secret123"));
        assert!(!PasswordHasher::verify("plain$text", "secret123"));
        assert!(!PasswordHasher::verify("pbkdf2_sha256$0$00$00", "secret123"));
        assert!(!PasswordHasher::verify("pbkdf2_sha256$10$zz$00", "secret123"));
        assert!(!PasswordHasher::verify("bcrypt$10$00$00", "secret123"));
    }
}
