use block_modes::BlockMode;

use crate::Aes256Cbc;

/// Function to encrypt data using AES-256-CBC
pub fn encrypt_data(data: &str, encryption_key: &[u8], iv: &[u8]) -> Result<Vec<u8>, String> {
    let cipher = Aes256Cbc::new_from_slices(encryption_key, iv)
        .map_err(|e| format!("Invalid key or IV length: {}", e))?;
    Ok(cipher.encrypt_vec(data.as_bytes()))
}

/// Function to decrypt data using AES-256-CBC
pub fn decrypt_data(encrypted_data: &[u8], encryption_key: &[u8], iv: &[u8]) -> Result<String, String> {
    let cipher = Aes256Cbc::new_from_slices(encryption_key, iv)
        .map_err(|e| format!("Invalid key or IV length: {}", e))?;
    match cipher.decrypt_vec(encrypted_data) {
        Ok(decrypted_data) => match String::from_utf8(decrypted_data) {
            Ok(decoded_str) => Ok(decoded_str),
            Err(_) => Err("Decrypted data is not valid UTF-8".to_string()),
        },
        Err(_) => Err("Decryption failed".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decryption_with_wrong_key() {
        let original_data = r#"{"accounts":{}}"#;
        let encryption_key: Vec<u8> = vec![1; 32];
        let iv: Vec<u8> = vec![1; 16];
        let wrong_key: Vec<u8> = vec![2; 32];

        let encrypted_data = encrypt_data(original_data, &encryption_key, &iv).unwrap();
        assert_ne!(encrypted_data, original_data.as_bytes());
        assert_eq!(
            decrypt_data(&encrypted_data, &encryption_key, &iv).unwrap(),
            original_data
        );
        assert!(decrypt_data(&encrypted_data, &wrong_key, &iv).is_err());
    }

    #[test]
    fn test_rejects_bad_key_length() {
        assert!(encrypt_data("data", &[0u8; 5], &[0u8; 16]).is_err());
        assert!(decrypt_data(&[0u8; 16], &[0u8; 32], &[0u8; 3]).is_err());
    }
}
