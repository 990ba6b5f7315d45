use crate::HmacSha256;
use pbkdf2::pbkdf2;
use rand::Rng;

/// Length of every key produced by `derive_key`
pub const DERIVED_KEY_LEN: usize = 32;

/// Function to generate a random salt for PBKDF2
pub fn generate_random_salt() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..16).map(|_| rng.gen()).collect()
}

/// Function to generate a random IV for AES encryption
pub fn generate_random_iv() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..16).map(|_| rng.gen()).collect()
}

/// Random secret material for keys held in the keyring
pub fn generate_secret(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen()).collect()
}

/// Function to derive a 32-byte key from a passphrase using PBKDF2
pub fn derive_key(passphrase: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut key = vec![0u8; DERIVED_KEY_LEN];
    pbkdf2::<HmacSha256>(passphrase.as_bytes(), salt, iterations.max(1), &mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation() {
        let passphrase = "MySecurePassword123!";
        let salt = generate_random_salt();

        let key = derive_key(passphrase, &salt, 10);
        assert_eq!(key.len(), 32);

        let key2 = derive_key(passphrase, &salt, 10);
        assert_eq!(key, key2);

        let key3 = derive_key("DifferentPassword456!", &salt, 10);
        assert_ne!(key, key3);

        let key4 = derive_key(passphrase, &generate_random_salt(), 10);
        assert_ne!(key, key4);

        let key5 = derive_key(passphrase, &salt, 11);
        assert_ne!(key, key5);
    }

    #[test]
    fn test_random_generation() {
        let salt1 = generate_random_salt();
        let salt2 = generate_random_salt();
        assert_eq!(salt1.len(), 16);
        assert_ne!(salt1, salt2);

        let iv1 = generate_random_iv();
        let iv2 = generate_random_iv();
        assert_eq!(iv1.len(), 16);
        assert_ne!(iv1, iv2);

        assert_eq!(generate_secret(32).len(), 32);
    }
}
