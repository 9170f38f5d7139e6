//! Challenge nonce generation.

use base64::{Engine as _, engine::general_purpose};
use rand::Rng;

/// Random bytes per nonce (256 bits).
const NONCE_BYTES: usize = 32;

/// Generate a cryptographically random challenge nonce.
///
/// Returns a URL-safe base64 string without padding (43 characters), so it
/// can travel in query strings and JSON unescaped.
pub fn generate_nonce() -> String {
    let mut rng = rand::rng();
    let mut bytes = [0u8; NONCE_BYTES];
    rng.fill(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_nonce() {
        let nonce = generate_nonce();

        assert_eq!(nonce.len(), 43);

        let decoded = general_purpose::URL_SAFE_NO_PAD.decode(&nonce).unwrap();
        assert_eq!(decoded.len(), NONCE_BYTES);

        assert!(
            nonce
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_nonces_are_unique() {
        let nonce1 = generate_nonce();
        let nonce2 = generate_nonce();
        assert_ne!(nonce1, nonce2);
    }
}
