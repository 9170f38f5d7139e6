use crate::auth::token::MIN_SECRET_LEN;
use std::env;
use std::net::SocketAddr;
use zeroize::Zeroizing;

/// Upper bound on `SESSION_TTL_SECS`.
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Clone)]
pub struct Config {
    // Storage
    pub storage_url: String,
    pub sweep_interval_secs: u64,

    // Token signing
    pub jwt_secret: Zeroizing<String>,

    // Server
    pub bind_addr: SocketAddr,
    pub production: bool,

    // TTLs (in seconds)
    pub challenge_ttl_secs: u64,
    pub session_ttl_secs: u64,

    // Routing
    pub protected_prefix: String,
    pub login_path: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("storage_url", &"[REDACTED]")
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .field("jwt_secret", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("production", &self.production)
            .field("challenge_ttl_secs", &self.challenge_ttl_secs)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("protected_prefix", &self.protected_prefix)
            .field("login_path", &self.login_path)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Storage — STORAGE_URL, falling back to REDIS_URL
        let storage_url = env::var("STORAGE_URL")
            .or_else(|_| env::var("REDIS_URL"))
            .map_err(|_| ConfigError::MissingVar("STORAGE_URL".to_string()))?;
        if storage_url.is_empty() {
            return Err(ConfigError::InvalidValue(
                "STORAGE_URL".to_string(),
                "cannot be empty".to_string(),
            ));
        }
        let sweep_interval_secs = parse_env_or_default("SWEEP_INTERVAL_SECS", 60)?;
        require_positive("SWEEP_INTERVAL_SECS", sweep_interval_secs)?;

        // Token signing secret — required, tokens cannot be issued without it
        let jwt_secret = Zeroizing::new(
            env::var("JWT_SECRET")
                .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?,
        );
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                format!("must be at least {} bytes", MIN_SECRET_LEN),
            ));
        }

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;
        let production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        // TTLs
        let challenge_ttl_secs = parse_env_or_default("CHALLENGE_TTL_SECS", 300)?;
        require_positive("CHALLENGE_TTL_SECS", challenge_ttl_secs)?;
        let session_ttl_secs = parse_env_or_default("SESSION_TTL_SECS", 86_400)?;
        require_positive("SESSION_TTL_SECS", session_ttl_secs)?;
        if session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                format!("must be at most {} (10 years)", MAX_SESSION_TTL_SECS),
            ));
        }

        // Routing
        let protected_prefix =
            env::var("PROTECTED_PREFIX").unwrap_or_else(|_| "/dashboard".to_string());
        validate_prefix(&protected_prefix)?;
        let login_path = env::var("LOGIN_PATH").unwrap_or_else(|_| "/".to_string());
        if !login_path.starts_with('/') {
            return Err(ConfigError::InvalidValue(
                "LOGIN_PATH".to_string(),
                "must start with '/'".to_string(),
            ));
        }

        Ok(Config {
            storage_url,
            sweep_interval_secs,
            jwt_secret,
            bind_addr,
            production,
            challenge_ttl_secs,
            session_ttl_secs,
            protected_prefix,
            login_path,
        })
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}

fn require_positive(key: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// A nestable path prefix: leading '/', not the root, no trailing '/'.
fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    let valid = prefix.len() > 1
        && prefix.starts_with('/')
        && !prefix.ends_with('/')
        && !prefix.contains(['{', '}', '*']);
    if !valid {
        return Err(ConfigError::InvalidValue(
            "PROTECTED_PREFIX".to_string(),
            "must look like /path (not '/', no trailing slash)".to_string(),
        ));
    }
    Ok(())
}
