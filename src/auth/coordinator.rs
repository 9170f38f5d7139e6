//! Challenge/verify protocol.
//!
//! Per address: `NoChallenge -> Challenged(nonce, expiry) -> Verified`.
//! A new challenge replaces the outstanding one; expiry or consumption
//! returns the address to `NoChallenge`. There is no resumable verify: the
//! nonce is burned before the token is issued, so any failure after that
//! point requires a fresh challenge.

use crate::auth::nonce::generate_nonce;
use crate::auth::token::TokenService;
use crate::auth::verify::SignatureVerifier;
use crate::error::AuthError;
use crate::models::{Address, challenge_message};
use crate::storage::NonceStore;
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of an outstanding challenge.
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(5 * 60);

/// A freshly issued challenge.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub address: Address,
    pub nonce: String,
    pub message: String,
}

#[derive(Clone)]
pub struct AuthCoordinator {
    store: Arc<dyn NonceStore>,
    verifier: Arc<dyn SignatureVerifier>,
    tokens: Arc<TokenService>,
    challenge_ttl: Duration,
}

impl AuthCoordinator {
    pub fn new(
        store: Arc<dyn NonceStore>,
        verifier: Arc<dyn SignatureVerifier>,
        tokens: Arc<TokenService>,
        challenge_ttl: Duration,
    ) -> Self {
        Self {
            store,
            verifier,
            tokens,
            challenge_ttl,
        }
    }

    /// Issue a challenge for `address`, replacing any outstanding one.
    ///
    /// The address format is checked before the store is touched.
    pub async fn challenge(&self, address: &str) -> Result<Challenge, AuthError> {
        let address: Address = address.parse().map_err(|_| AuthError::InvalidAddress)?;

        let nonce = generate_nonce();
        self.store
            .put(&address, &nonce, self.challenge_ttl)
            .await?;

        tracing::info!(action = "challenge_issued", address = %address, "Challenge issued");

        let message = challenge_message(&nonce);
        Ok(Challenge {
            address,
            nonce,
            message,
        })
    }

    /// Check a signed challenge and, on success, burn the nonce and issue a token.
    pub async fn verify(
        &self,
        address: &str,
        signature: &str,
        nonce: &str,
    ) -> Result<String, AuthError> {
        if address.is_empty() || signature.is_empty() || nonce.is_empty() {
            return Err(AuthError::InvalidRequestBody);
        }
        let address: Address = address.parse().map_err(|_| AuthError::InvalidAddress)?;

        if self.store.get_valid(&address, nonce).await?.is_none() {
            tracing::warn!(action = "auth_failed", address = %address, reason = "nonce", "Invalid or expired nonce");
            return Err(AuthError::InvalidOrExpiredNonce);
        }

        // Rebuilt from the stored nonce; the client never supplies the message
        let message = challenge_message(nonce);
        match self.verifier.verify(&address, &message, signature) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(action = "auth_failed", address = %address, reason = "signature", "Invalid signature");
                return Err(AuthError::InvalidSignature);
            }
            Err(e) => {
                tracing::warn!(action = "auth_failed", address = %address, error = %e, "Signature verification failed");
                return Err(AuthError::InvalidSignature);
            }
        }

        // A concurrent verify or a newer challenge may have taken the record since the read
        if !self.store.consume(&address, nonce).await? {
            tracing::warn!(action = "auth_failed", address = %address, reason = "consumed", "Nonce no longer outstanding");
            return Err(AuthError::InvalidOrExpiredNonce);
        }

        let token = self.tokens.issue(&address)?;
        tracing::info!(action = "auth_success", address = %address, "Wallet authenticated");

        Ok(token)
    }
}
