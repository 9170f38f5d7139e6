//! Request, response, and storage models.
//!
//! All models use serde for serialization/deserialization.
//! Storage models represent the JSON stored in the nonce store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Address
// ============================================================================

/// Number of hex characters in an account address (20 bytes).
const ADDRESS_HEX_LEN: usize = 40;

/// An Ethereum account address, canonically lower-cased.
///
/// Input must be `0x` followed by exactly 40 hex characters in any casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid address format")]
pub struct InvalidAddressFormat;

impl FromStr for Address {
    type Err = InvalidAddressFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").ok_or(InvalidAddressFormat)?;
        if hex.len() != ADDRESS_HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidAddressFormat);
        }
        Ok(Address(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Challenge
// ============================================================================

const CHALLENGE_PREFIX: &str = "Sign this message to authenticate with our app.\n\nNonce: ";

/// Build the message a wallet signs for the given nonce.
///
/// The server always rebuilds this from the stored nonce; a message sent by
/// the client is never trusted.
pub fn challenge_message(nonce: &str) -> String {
    format!("{}{}", CHALLENGE_PREFIX, nonce)
}

/// Query parameters for `GET /auth/challenge`.
#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    pub address: Option<String>,
}

/// Response containing the nonce and the message to sign.
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub nonce: String,
    pub message: String,
}

// ============================================================================
// Verify
// ============================================================================

/// Body of `POST /auth/verify`.
///
/// Fields are optional here so a missing field becomes a 400 with our own
/// message instead of a serde rejection.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub address: Option<String>,
    pub signature: Option<String>,
    pub nonce: Option<String>,
}

/// Response after successful verification.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub token: String,
}

// ============================================================================
// Session
// ============================================================================

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub address: String,
    pub iat: i64,
    pub exp: i64,
}

/// A validated session, attached to protected requests by the session gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub address: Address,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Storage Models
// ============================================================================

/// Outstanding challenge nonce for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
    pub address: String,
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NonceRecord {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_address_is_lowercased() {
        let addr: Address = "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266".parse().unwrap();
        assert_eq!(addr.as_str(), "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");

        let mixed: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(addr, mixed);
    }

    #[test]
    fn test_address_rejects_malformed() {
        for bad in [
            "",
            "0x",
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "0Xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb9226",
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb922666",
            "0xg39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            " 0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        ] {
            assert!(bad.parse::<Address>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_challenge_message_format() {
        assert_eq!(
            challenge_message("abc123"),
            "Sign this message to authenticate with our app.\n\nNonce: abc123"
        );
    }

    #[test]
    fn test_nonce_record_liveness() {
        let now = Utc::now();
        let record = NonceRecord {
            address: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
            nonce: "n".to_string(),
            expires_at: now + TimeDelta::seconds(1),
            created_at: now,
        };
        assert!(record.is_live(now));
        assert!(!record.is_live(now + TimeDelta::seconds(1)));
    }

    #[test]
    fn test_address_serializes_as_string() {
        let addr: Address = "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266".parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266\"");
    }
}
