use log::warn;

use super::error::{AuthError, AuthResult, TokenError};
use super::store::{AccountId, AccountStore};
use super::tokens::SignedTokenManager;
use crate::modules::email::{reset_code_message, reset_link_message, Mailer, ResetMessage};
use crate::modules::utils::logging::log_auth_event;

/// What the user presents to prove control of the mailbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proof {
    Code { email: String, code: String },
    Token(String),
}

impl Proof {
    pub fn code(email: &str, code: &str) -> Self {
        Proof::Code {
            email: email.trim().to_string(),
            code: code.trim().to_string(),
        }
    }

    pub fn token(token: &str) -> Self {
        Proof::Token(token.trim().to_string())
    }
}

/// A password recovery strategy.
///
/// `issue` creates the challenge and renders the message; `verify` checks a
/// proof without consuming it; `finish` retires the proof once the password
/// has been replaced.
pub trait RecoveryFlow {
    fn name(&self) -> &'static str;

    fn issue(&self, store: &mut AccountStore, email: &str, now: u64) -> AuthResult<ResetMessage>;

    fn verify(&self, store: &AccountStore, proof: &Proof, now: u64) -> AuthResult<AccountId>;

    fn finish(&self, store: &mut AccountStore, id: AccountId, proof: &Proof, now: u64) -> AuthResult<()>;

    /// Verify the proof, then set the new password and retire the proof.
    /// Any failure before the password is set leaves the account untouched.
    fn complete(
        &self,
        store: &mut AccountStore,
        proof: &Proof,
        new_password: &str,
        confirm: &str,
        now: u64,
    ) -> AuthResult<AccountId> {
        let id = self.verify(store, proof, now)?;
        if new_password != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        store.set_password(id, new_password)?;
        self.finish(store, id, proof, now)?;

        let email = store.account(id)?.email.clone();
        log_auth_event("password_reset", &email, true, Some(self.name()));
        Ok(id)
    }
}

/// Issue a challenge for `email` and mail it.
///
/// The challenge is stored before sending, so when delivery fails the caller
/// still has to persist the store; the user can ask for a new message.
pub fn request_reset(
    flow: &dyn RecoveryFlow,
    store: &mut AccountStore,
    mailer: &dyn Mailer,
    email: &str,
    now: u64,
) -> AuthResult<()> {
    let message = flow.issue(store, email, now)?;
    match message.send(mailer) {
        Ok(()) => {
            log_auth_event("reset_requested", email, true, Some(flow.name()));
            Ok(())
        }
        Err(e) => {
            warn!("Reset message could not be delivered: {}", e);
            log_auth_event("reset_requested", email, false, Some("delivery failed"));
            Err(AuthError::DeliveryError(e))
        }
    }
}

/// Six-digit code stored on the account
pub struct OtpRecovery {
    pub ttl_secs: u64,
    pub app_name: String,
}

impl OtpRecovery {
    pub fn new(ttl_secs: u64, app_name: &str) -> Self {
        Self {
            ttl_secs,
            app_name: app_name.to_string(),
        }
    }
}

impl RecoveryFlow for OtpRecovery {
    fn name(&self) -> &'static str {
        "otp"
    }

    fn issue(&self, store: &mut AccountStore, email: &str, now: u64) -> AuthResult<ResetMessage> {
        let (id, to) = match store.find_by_email(email) {
            Some(account) => (account.id, account.email.clone()),
            None => return Err(AuthError::AccountNotFound),
        };
        let code = store.issue_challenge(id, now, self.ttl_secs)?;
        Ok(reset_code_message(&to, &code, self.ttl_secs, &self.app_name))
    }

    fn verify(&self, store: &AccountStore, proof: &Proof, now: u64) -> AuthResult<AccountId> {
        let Proof::Code { email, code } = proof else {
            return Err(AuthError::ChallengeExpiredOrInvalid);
        };
        match store.find_by_email(email) {
            Some(account) if account.verify_challenge(code, now) => Ok(account.id),
            _ => {
                log_auth_event("otp_verify", email, false, None);
                Err(AuthError::ChallengeExpiredOrInvalid)
            }
        }
    }

    fn finish(&self, store: &mut AccountStore, id: AccountId, _proof: &Proof, _now: u64) -> AuthResult<()> {
        store.clear_challenge(id)
    }
}

/// Stateless signed link, redeemed once on completion
pub struct TokenRecovery {
    pub tokens: SignedTokenManager,
    pub link_base: String,
    pub app_name: String,
}

impl TokenRecovery {
    pub fn new(tokens: SignedTokenManager, link_base: &str, app_name: &str) -> Self {
        Self {
            tokens,
            link_base: link_base.trim_end_matches('/').to_string(),
            app_name: app_name.to_string(),
        }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/{}", self.link_base, token)
    }
}

impl RecoveryFlow for TokenRecovery {
    fn name(&self) -> &'static str {
        "token"
    }

    fn issue(&self, store: &mut AccountStore, email: &str, now: u64) -> AuthResult<ResetMessage> {
        let to = match store.find_by_email(email) {
            Some(account) => account.email.clone(),
            None => return Err(AuthError::AccountNotFound),
        };
        let token = self.tokens.issue_token(&to, now);
        Ok(reset_link_message(
            &to,
            &self.reset_link(&token),
            self.tokens.max_age_secs(),
            &self.app_name,
        ))
    }

    fn verify(&self, store: &AccountStore, proof: &Proof, now: u64) -> AuthResult<AccountId> {
        let Proof::Token(token) = proof else {
            return Err(TokenError::Malformed.into());
        };
        let claims = self.tokens.decode(token, now)?;
        if store.consumed_tokens.contains(&claims.jti) {
            return Err(TokenError::AlreadyUsed.into());
        }
        store
            .find_by_email(&claims.email)
            .map(|account| account.id)
            .ok_or(AuthError::AccountNotFound)
    }

    fn finish(&self, store: &mut AccountStore, _id: AccountId, proof: &Proof, now: u64) -> AuthResult<()> {
        let Proof::Token(token) = proof else {
            return Err(TokenError::Malformed.into());
        };
        self.tokens.redeem(token, &mut store.consumed_tokens, now)?;
        Ok(())
    }
}
