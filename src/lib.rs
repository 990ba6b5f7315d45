// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{auth, config, email, encryption, security, social, utils};

// Re-export commonly used types
pub use modules::auth::error::{AuthError, StoreError, TokenError};
pub use modules::auth::store::{Account, AccountId, AccountStore};
pub use modules::auth::recovery::{OtpRecovery, Proof, RecoveryFlow, TokenRecovery};
pub use modules::config::AppConfig;
pub use modules::email::{Mailer, SmtpMailer};
pub use modules::social::graph::FollowGraph;

// Constants
pub const APP_NAME: &str = "nakama";
pub const CONFIG_FILE: &str = "nakama.json";
pub const CONFIG_ENV: &str = "NAKAMA_CONFIG";
pub const DEFAULT_ICON: &str = "default.png";
pub const OTP_LENGTH: usize = 6;
pub const RESET_TOKEN_SALT: &str = "password-reset";

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;
pub type Aes256Cbc = block_modes::Cbc<aes::Aes256, block_modes::block_padding::Pkcs7>;
