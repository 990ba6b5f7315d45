pub mod error;
pub mod otp;
pub mod password;
pub mod recovery;
pub mod store;
pub mod tokens;
pub mod user_interface;

// Re-export the main types and functions
pub use error::{AuthError, AuthResult, StoreError, TokenError};
pub use otp::{generate_code, OtpChallenge};
pub use password::{read_password, PasswordHasher, PasswordPolicy};
pub use recovery::{request_reset, OtpRecovery, Proof, RecoveryFlow, TokenRecovery};
pub use store::{load_account_store, save_account_store, Account, AccountId, AccountSettings, AccountStore};
pub use tokens::{ConsumedTokens, ResetClaims, SignedTokenManager};
