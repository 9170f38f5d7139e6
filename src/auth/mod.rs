//! Wallet authentication: challenge nonces, signature verification,
//! session tokens, and the session gate.

pub mod cookie;
pub mod coordinator;
pub mod middleware;
pub mod nonce;
pub mod token;
pub mod verify;

pub use coordinator::{AuthCoordinator, Challenge};
pub use middleware::{AppState, AuthSession, session_gate};
pub use nonce::generate_nonce;
pub use token::TokenService;
pub use verify::{EvmSignatureVerifier, SignatureVerifier, verify_personal_signature};
