use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::Mac;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::TokenError;
use crate::modules::encryption::generate_secret;
use crate::{HmacSha256, RESET_TOKEN_SALT};

/// Tokens dated further than this into the future are rejected
const CLOCK_SKEW_SECS: u64 = 60;

/// Claims carried by a password reset link
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResetClaims {
    pub email: String,
    pub iat: u64,
    pub jti: String,
}

fn keyed_mac(key: &[u8]) -> HmacSha256 {
    match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    }
}

/// Issues and checks stateless, signed password reset tokens.
///
/// A token is `<payload>.<signature>` where the payload is the URL-safe base64
/// of the JSON claims and the signature is HMAC-SHA256 over the payload. The
/// signing key is derived from the server secret and a fixed purpose salt so
/// tokens signed for another purpose never verify here.
pub struct SignedTokenManager {
    key: Vec<u8>,
    max_age_secs: u64,
}

impl SignedTokenManager {
    pub fn new(secret: &[u8], max_age_secs: u64) -> Self {
        let mut mac = keyed_mac(secret);
        mac.update(RESET_TOKEN_SALT.as_bytes());
        Self {
            key: mac.finalize().into_bytes().to_vec(),
            max_age_secs,
        }
    }

    pub fn max_age_secs(&self) -> u64 {
        self.max_age_secs
    }

    fn sign(&self, payload: &str) -> HmacSha256 {
        let mut mac = keyed_mac(&self.key);
        mac.update(payload.as_bytes());
        mac
    }

    /// Produce a token for `email` issued at `now`
    pub fn issue_token(&self, email: &str, now: u64) -> String {
        let claims = ResetClaims {
            email: email.to_string(),
            iat: now,
            jti: hex::encode(generate_secret(16)),
        };
        // Serializing a struct of strings and integers cannot fail
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&payload).finalize().into_bytes());
        format!("{}.{}", payload, signature)
    }

    /// Check signature and age, returning the claims
    pub fn decode(&self, token: &str, now: u64) -> Result<ResetClaims, TokenError> {
        let (payload, signature) = token.trim().split_once('.').ok_or(TokenError::Malformed)?;
        if payload.is_empty() || signature.contains('.') {
            return Err(TokenError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        self.sign(payload)
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: ResetClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if claims.iat > now.saturating_add(CLOCK_SKEW_SECS) {
            return Err(TokenError::Malformed);
        }
        if now.saturating_sub(claims.iat) > self.max_age_secs {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Stateless check: the embedded email if the token is authentic and fresh.
    /// A token stays valid for every call until it ages out.
    pub fn verify_token(&self, token: &str, now: u64) -> Result<String, TokenError> {
        self.decode(token, now).map(|claims| claims.email)
    }

    /// Single-use check: like `verify_token`, but also records the token so a
    /// second redemption fails with `AlreadyUsed`.
    pub fn redeem(
        &self,
        token: &str,
        consumed: &mut ConsumedTokens,
        now: u64,
    ) -> Result<String, TokenError> {
        let claims = self.decode(token, now)?;
        consumed.prune(now, self.max_age_secs);
        if consumed.contains(&claims.jti) {
            return Err(TokenError::AlreadyUsed);
        }
        consumed.insert(claims.jti, claims.iat);
        Ok(claims.email)
    }
}

/// Redeemed token ids with their issue time. Entries older than the token
/// max age can never verify again and are pruned.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ConsumedTokens {
    entries: HashMap<String, u64>,
}

impl ConsumedTokens {
    pub fn contains(&self, jti: &str) -> bool {
        self.entries.contains_key(jti)
    }

    pub fn insert(&mut self, jti: String, issued_at: u64) {
        self.entries.insert(jti, issued_at);
    }

    pub fn prune(&mut self, now: u64, max_age_secs: u64) {
        self.entries
            .retain(|_, issued_at| now.saturating_sub(*issued_at) <= max_age_secs);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
