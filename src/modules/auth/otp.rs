use rand::distributions::Uniform;
use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::error::AuthResult;
use super::store::{Account, AccountId, AccountStore};
use crate::OTP_LENGTH;

/// Mailed reset code stored inline on the account.
/// Code and expiration are always set and cleared together.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub code: String,
    pub expires_at: u64,
}

/// Uniformly random decimal code, leading zeros kept
pub fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Uniform::new(0, 10))
        .take(OTP_LENGTH)
        .map(|d: u8| char::from(b'0' + d))
        .collect()
}

impl Account {
    /// Issue a new code valid until `now + ttl_secs`, replacing any earlier one
    pub fn issue_challenge(&mut self, now: u64, ttl_secs: u64) -> String {
        let code = generate_code();
        self.otp = Some(OtpChallenge {
            code: code.clone(),
            expires_at: now.saturating_add(ttl_secs),
        });
        code
    }

    /// True iff `code` matches and `now` is strictly before the expiration.
    /// The challenge stays in place so the caller can verify again before setting a password.
    pub fn verify_challenge(&self, code: &str, now: u64) -> bool {
        match &self.otp {
            Some(challenge) => {
                let matches: bool = challenge.code.as_bytes().ct_eq(code.as_bytes()).into();
                matches && now < challenge.expires_at
            }
            None => false,
        }
    }

    /// Idempotent
    pub fn clear_challenge(&mut self) {
        self.otp = None;
    }

    pub fn challenge(&self) -> Option<&OtpChallenge> {
        self.otp.as_ref()
    }
}

impl AccountStore {
    pub fn issue_challenge(&mut self, id: AccountId, now: u64, ttl_secs: u64) -> AuthResult<String> {
        Ok(self.account_mut(id)?.issue_challenge(now, ttl_secs))
    }

    pub fn verify_challenge(&self, id: AccountId, code: &str, now: u64) -> bool {
        self.get(id)
            .map(|a| a.verify_challenge(code, now))
            .unwrap_or(false)
    }

    pub fn clear_challenge(&mut self, id: AccountId) -> AuthResult<()> {
        self.account_mut(id)?.clear_challenge();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::store::test_store;

    const TTL: u64 = 600;

    fn other_code(code: &str) -> String {
        let first = if code.starts_with('0') { '1' } else { '0' };
        format!("{}{}", first, &code[1..])
    }

    #[test]
    fn test_code_shape() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let mut store = test_store();
        let id = store.register("alice", "alice@example.com", "secret123", 0).unwrap().id;

        let code = store.issue_challenge(id, 1_000, TTL).unwrap();
        assert!(store.verify_challenge(id, &code, 1_000));
        assert!(!store.verify_challenge(id, &other_code(&code), 1_000));
        assert!(!store.verify_challenge(id, "", 1_000));

        // Verification does not consume the code
        assert!(store.verify_challenge(id, &code, 1_100));
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let mut store = test_store();
        let id = store.register("bob", "bob@example.com", "secret123", 0).unwrap().id;
        let code = store.issue_challenge(id, 1_000, TTL).unwrap();

        assert!(store.verify_challenge(id, &code, 1_000 + TTL - 1));
        assert!(!store.verify_challenge(id, &code, 1_000 + TTL));
        // Ten minutes and one second late
        assert!(!store.verify_challenge(id, &code, 1_000 + 601));
        assert!(!store.verify_challenge(id, &code, 1_000 + 660));
    }

    #[test]
    fn test_reissue_overwrites() {
        let mut store = test_store();
        let id = store.register("carol", "carol@example.com", "secret123", 0).unwrap().id;

        let first = store.issue_challenge(id, 1_000, TTL).unwrap();
        let mut second = store.issue_challenge(id, 1_200, TTL).unwrap();
        while second == first {
            second = store.issue_challenge(id, 1_200, TTL).unwrap();
        }

        assert!(!store.verify_challenge(id, &first, 1_300));
        assert!(store.verify_challenge(id, &second, 1_300));
        assert_eq!(store.get(id).unwrap().challenge().unwrap().expires_at, 1_800);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = test_store();
        let id = store.register("dave", "dave@example.com", "secret123", 0).unwrap().id;
        let code = store.issue_challenge(id, 1_000, TTL).unwrap();

        store.clear_challenge(id).unwrap();
        assert!(!store.verify_challenge(id, &code, 1_000));
        assert!(store.get(id).unwrap().challenge().is_none());
        store.clear_challenge(id).unwrap();

        assert!(store.clear_challenge(id + 10).is_err());
        assert!(!store.verify_challenge(id + 10, &code, 1_000));
    }
}
