//! Stateless session tokens (HS256 JWT).

use crate::config::ConfigError;
use crate::error::AuthError;
use crate::models::{Address, Session, TokenClaims};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Issues and validates session tokens with a server-held secret.
///
/// Validity depends only on the signature and `exp`; nothing is stored.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: TimeDelta) -> Result<Self, ConfigError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                format!("must be at least {} bytes", MIN_SECRET_LEN),
            ));
        }
        if ttl <= TimeDelta::zero() || Utc::now().checked_add_signed(ttl).is_none() {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be positive and representable as a timestamp".to_string(),
            ));
        }

        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Issue a token for `address`, valid from now for the configured TTL.
    pub fn issue(&self, address: &Address) -> Result<String, AuthError> {
        self.issue_at(address, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub(crate) fn issue_at(
        &self,
        address: &Address,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("Token expiry out of range".to_string()))?;
        let claims = TokenClaims {
            address: address.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Check signature and expiry and return the session the token carries.
    ///
    /// Every failure is reported as [`AuthError::InvalidToken`].
    pub fn validate(&self, token: &str) -> Result<Session, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::InvalidToken
            })?;
        let claims = data.claims;

        let address = claims
            .address
            .parse::<Address>()
            .map_err(|_| AuthError::InvalidToken)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::InvalidToken)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?;

        Ok(Session {
            address,
            issued_at,
            expires_at,
        })
    }
}
