// src/modules/auth/user_interface.rs
use super::error::AuthError;
use super::password::read_password;
use super::recovery::{request_reset, Proof, RecoveryFlow};
use super::store::{AccountId, AccountStore};
use crate::modules::email::Mailer;
use crate::modules::utils::logging::{log_auth_event, log_data_operation};
use crate::modules::utils::time::utc_to_local;

/// Prompt for a password without echo
pub fn prompt_password(label: &str) -> Result<String, String> {
    println!("{}:", label);
    read_password().map_err(|e| format!("Error reading password: {}", e))
}

/// Prompt for a new password and its confirmation
pub fn prompt_new_password(min_length: usize) -> Result<(String, String), String> {
    let password = prompt_password(&format!("Enter new password (minimum {} characters)", min_length))?;
    let confirm = prompt_password("Confirm password")?;
    Ok((password, confirm))
}

/// Log in by email, prompting for the password
pub fn login(store: &mut AccountStore, email: &str, now: u64) -> Result<AccountId, String> {
    let password = prompt_password("Password")?;
    authenticate_user(store, email, &password, now)
}

/// Check credentials and record the login
pub fn authenticate_user(
    store: &mut AccountStore,
    email: &str,
    password: &str,
    now: u64,
) -> Result<AccountId, String> {
    match store.authenticate(email, password, now) {
        Ok(id) => {
            log_auth_event("login", email, true, None);
            Ok(id)
        }
        Err(e) => {
            log_auth_event("login", email, false, Some("invalid credentials"));
            Err(e.to_string())
        }
    }
}

/// Report shown after `login`
pub fn login_summary(store: &AccountStore, id: AccountId, previous_login: Option<u64>) -> Result<String, String> {
    let account = store.account(id).map_err(|e| e.to_string())?;
    let mut message = format!("Welcome back, {}!", account.username);
    if let Some(at) = previous_login {
        message.push_str(&format!("\nLast login: {}", utc_to_local(at)));
    }
    Ok(message)
}

/// Interactive registration: password prompted twice
pub fn handle_registration(
    store: &mut AccountStore,
    username: &str,
    email: &str,
    now: u64,
) -> Result<String, String> {
    println!("\n=== User Registration ===");
    let (password, confirm) = prompt_new_password(store.policy().min_length())?;
    create_account(store, username, email, &password, &confirm, now)
}

/// Handler function for account creation
pub fn create_account(
    store: &mut AccountStore,
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
    now: u64,
) -> Result<String, String> {
    if password != confirm {
        return Err(AuthError::PasswordMismatch.to_string());
    }

    match store.register(username, email, password, now) {
        Ok(account) => Ok(format!(
            "Account '{}' created. You can now log in with {}.",
            account.username, account.email
        )),
        Err(e) => {
            log_data_operation(
                "create_user",
                username,
                "account_store",
                false,
                Some(&format!("registration rejected: {}", e)),
            );
            Err(format!("Registration failed: {}", e))
        }
    }
}

/// Interactive password change for a logged-in account
pub fn handle_change_password(store: &mut AccountStore, id: AccountId) -> Result<String, String> {
    let current = prompt_password("Current password")?;
    let (new_password, confirm) = prompt_new_password(store.policy().min_length())?;
    change_password(store, id, &current, &new_password, &confirm)
}

pub fn change_password(
    store: &mut AccountStore,
    id: AccountId,
    current: &str,
    new_password: &str,
    confirm: &str,
) -> Result<String, String> {
    let email = store.account(id).map_err(|e| e.to_string())?.email.clone();
    match store.change_password(id, current, new_password, confirm) {
        Ok(()) => {
            log_auth_event("password_change", &email, true, None);
            Ok("Password updated.".to_string())
        }
        Err(e) => {
            log_auth_event("password_change", &email, false, Some(&e.to_string()));
            Err(format!("Password change failed: {}", e))
        }
    }
}

/// Start a password reset. A delivery failure is reported, but the issued
/// challenge remains in the store.
pub fn handle_reset_request(
    flow: &dyn RecoveryFlow,
    store: &mut AccountStore,
    mailer: &dyn Mailer,
    email: &str,
    now: u64,
) -> Result<String, String> {
    match request_reset(flow, store, mailer, email, now) {
        Ok(()) => Ok(match flow.name() {
            "otp" => "A verification code has been sent to your email.".to_string(),
            _ => "A password reset link has been sent to your email.".to_string(),
        }),
        Err(AuthError::AccountNotFound) => Err("No account found with this email address.".to_string()),
        Err(e) => Err(format!("Password reset failed: {}", e)),
    }
}

/// Check a reset proof without using it up
pub fn handle_reset_verify(
    flow: &dyn RecoveryFlow,
    store: &AccountStore,
    proof: &Proof,
    now: u64,
) -> Result<String, String> {
    flow.verify(store, proof, now)
        .map(|_| "Verified. You can now choose a new password.".to_string())
        .map_err(|e| e.to_string())
}

/// Interactive reset completion
pub fn handle_reset_password(
    flow: &dyn RecoveryFlow,
    store: &mut AccountStore,
    proof: &Proof,
    now: u64,
) -> Result<String, String> {
    // Fail fast before prompting for the new password
    flow.verify(store, proof, now).map_err(|e| e.to_string())?;
    let (new_password, confirm) = prompt_new_password(store.policy().min_length())?;
    finish_reset(flow, store, proof, &new_password, &confirm, now)
}

pub fn finish_reset(
    flow: &dyn RecoveryFlow,
    store: &mut AccountStore,
    proof: &Proof,
    new_password: &str,
    confirm: &str,
    now: u64,
) -> Result<String, String> {
    flow.complete(store, proof, new_password, confirm, now)
        .map(|_| "Password reset successful! You can now log in.".to_string())
        .map_err(|e| format!("Password reset failed: {}", e))
}

pub fn show_help_information() {
    println!("\n=== Nakama Help ===");
    println!("Account:");
    println!("  register <username> <email>        Create an account");
    println!("  login --user <email>               Check your credentials");
    println!("  change-password --user <email>     Change your password");
    println!("Password reset:");
    println!("  reset request <email> [--link]     Mail a code (or a link with --link)");
    println!("  reset verify <email> <code>        Check a mailed code");
    println!("  reset password <email> <code>      Set a new password with a code");
    println!("  reset token <token>                Set a new password with a link token");
    println!("Profile and social (require --user <email>):");
    println!("  profile [username]                 Show a profile");
    println!("  edit-profile [--username] [--bio] [--icon]");
    println!("  follow <username> / unfollow <username>");
    println!("  followers [username] / following [username]");
    println!("  settings <visibility|follow-notify|comment-notify|dark-mode>");
    println!("  users                              List every account");
    println!("Email:");
    println!("  email setup / email test <address>");
}
