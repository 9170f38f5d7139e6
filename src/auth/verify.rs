//! Ethereum personal-message signature verification (EIP-191).

use crate::error::AuthError;
use crate::models::Address;
use alloy_primitives::Signature;

/// Length of a `0x`-prefixed 65-byte `r || s || v` signature in hex.
const SIGNATURE_HEX_LEN: usize = 130;

/// Checks that a signature over a message was produced by an address's key.
///
/// Malformed or mismatched input yields `Ok(false)`; `Err` is reserved for
/// failures of the verifier itself.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, address: &Address, message: &str, signature: &str)
    -> Result<bool, AuthError>;
}

/// Verifies `personal_sign` signatures by recovering the signer's address.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvmSignatureVerifier;

impl SignatureVerifier for EvmSignatureVerifier {
    fn verify(
        &self,
        address: &Address,
        message: &str,
        signature: &str,
    ) -> Result<bool, AuthError> {
        Ok(verify_personal_signature(address, message, signature))
    }
}

/// Verify an EIP-191 signature against a message.
///
/// # Arguments
/// * `address` - The address that supposedly signed
/// * `message` - The exact message text that was signed
/// * `signature_hex` - `0x`-prefixed hex of `r || s || v` (v in {0, 1, 27, 28})
///
/// # Returns
/// * `true` if the key recovered from the signature belongs to `address`
/// * `false` on mismatch or any malformed input
pub fn verify_personal_signature(address: &Address, message: &str, signature_hex: &str) -> bool {
    let Some(bytes) = decode_signature(signature_hex) else {
        return false;
    };

    let Ok(signature) = Signature::try_from(bytes.as_slice()) else {
        return false;
    };

    let Ok(expected) = address.as_str().parse::<alloy_primitives::Address>() else {
        return false;
    };

    // Hashes "\x19Ethereum Signed Message:\n{len}{message}" before recovery
    match signature.recover_address_from_msg(message.as_bytes()) {
        Ok(recovered) => recovered == expected,
        Err(_) => false,
    }
}

fn decode_signature(signature_hex: &str) -> Option<Vec<u8>> {
    let hex_part = signature_hex.strip_prefix("0x")?;
    if hex_part.len() != SIGNATURE_HEX_LEN {
        return None;
    }
    hex::decode(hex_part).ok()
}
