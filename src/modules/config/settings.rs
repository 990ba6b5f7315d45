use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::modules::auth::password::{PasswordHasher, PasswordPolicy};
use crate::{CONFIG_ENV, CONFIG_FILE};

/// Runtime configuration for the account core and the CLI front end
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data_file: PathBuf,           // Encrypted account store
    pub icon_dir: PathBuf,            // Where icon files are expected to live
    pub password_min_length: usize,   // Minimum password length in characters
    pub hash_iterations: u32,         // PBKDF2 rounds for new hashes
    pub otp_ttl_secs: u64,            // Lifetime of a mailed reset code
    pub token_max_age_secs: u64,      // Lifetime of a signed reset link
    pub reset_link_base: String,      // Prefix the reset token is appended to
    pub sender_name: String,          // Display name on outgoing mail
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("accounts.dat"),
            icon_dir: PathBuf::from("static/icons"),
            password_min_length: 8,
            hash_iterations: 100_000,
            otp_ttl_secs: 600,
            token_max_age_secs: 1800,
            reset_link_base: "http://localhost:5000/reset".to_string(),
            sender_name: "Nakama".to_string(),
            log_file: PathBuf::from("application.log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `$NAKAMA_CONFIG`, falling back to `nakama.json`
    pub fn load() -> Result<Self, String> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Self::load_from(&path)
    }

    /// Load configuration from a JSON file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let config = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str::<AppConfig>(&raw)
                .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => AppConfig::default(),
            Err(e) => return Err(format!("Failed to read {}: {}", path.display(), e)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(path, data).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
    }

    /// Reject values that would disable a security check
    pub fn validate(&self) -> Result<(), String> {
        if self.password_min_length == 0 {
            return Err("password_min_length must be at least 1".to_string());
        }
        if self.hash_iterations == 0 {
            return Err("hash_iterations must be at least 1".to_string());
        }
        if self.otp_ttl_secs == 0 || self.token_max_age_secs == 0 {
            return Err("otp_ttl_secs and token_max_age_secs must be positive".to_string());
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(format!("Unknown log_level: {}", self.log_level));
        }
        Ok(())
    }

    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy::new(self.password_min_length)
    }

    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.hash_iterations)
    }
}
