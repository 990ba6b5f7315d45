use super::smtp::SmtpCredentials;
use crate::modules::security::{KeyringSlot, SecretSlot};
use crate::modules::utils::time::get_current_timestamp;

/// Structure to manage SMTP credentials kept in a secret slot
pub struct SecureEmailManager<S: SecretSlot = KeyringSlot> {
    slot: S,
}

impl SecureEmailManager<KeyringSlot> {
    /// Credentials stored in the system keyring
    pub fn new() -> Result<Self, String> {
        let slot = KeyringSlot::new("smtp-credentials").map_err(|e| e.to_string())?;
        Ok(Self { slot })
    }
}

impl<S: SecretSlot> SecureEmailManager<S> {
    pub fn with_slot(slot: S) -> Self {
        Self { slot }
    }

    // Store new SMTP credentials
    pub fn store_credentials(
        &self,
        username: &str,
        password: &str,
        host: &str,
        port: u16,
    ) -> Result<(), String> {
        let credentials = SmtpCredentials {
            username: username.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port,
            last_updated: get_current_timestamp(),
        };

        let creds_json = serde_json::to_string(&credentials)
            .map_err(|e| format!("Failed to serialize credentials: {}", e))?;

        self.slot
            .set(&creds_json)
            .map_err(|e| format!("Failed to store credentials: {}", e))
    }

    // Retrieve stored SMTP credentials
    pub fn get_credentials(&self) -> Result<SmtpCredentials, String> {
        let creds_json = self
            .slot
            .get()
            .map_err(|e| format!("Failed to retrieve credentials: {}", e))?
            .ok_or_else(|| "Email is not configured. Run 'email setup' first.".to_string())?;

        serde_json::from_str(&creds_json).map_err(|e| format!("Failed to parse credentials: {}", e))
    }

    pub fn is_configured(&self) -> bool {
        self.get_credentials().is_ok()
    }

    pub fn delete_credentials(&self) -> Result<(), String> {
        self.slot
            .delete()
            .map_err(|e| format!("Failed to delete credentials: {}", e))
    }
}
