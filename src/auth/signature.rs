//! Ethereum personal-message signature recovery.
//!
//! Wallets sign `"\x19Ethereum Signed Message:\n" || len(message) || message`
//! hashed with keccak-256, producing a 65-byte `r || s || v` signature over
//! secp256k1. The signer's address is the last 20 bytes of the keccak-256
//! hash of its uncompressed public key (without the `0x04` tag).

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

use crate::domain::WalletAddress;
use crate::domain::wallet_address::ADDRESS_BYTES;
use crate::error::AuthError;

/// Prefix prepended to every personal message before hashing.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Length of an `r || s || v` signature.
pub const SIGNATURE_BYTES: usize = 65;

/// Hashes `message` the way wallets do for `personal_sign`.
#[must_use]
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Decodes a hex `r || s || v` signature.
///
/// `v` may be either `27`/`28` or `0`/`1`. High-`s` signatures are
/// normalized, with the recovery id flipped to match.
///
/// # Errors
///
/// Returns [`AuthError::MalformedSignature`] if the input is not hex, is
/// not 65 bytes, or carries an out-of-range scalar or recovery byte.
pub fn decode_signature(signature_hex: &str) -> Result<(Signature, RecoveryId), AuthError> {
    let trimmed = signature_hex.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| AuthError::MalformedSignature(e.to_string()))?;

    if bytes.len() != SIGNATURE_BYTES {
        return Err(AuthError::MalformedSignature(format!(
            "expected {SIGNATURE_BYTES} bytes, got {}",
            bytes.len()
        )));
    }
    let Some((&v, rs)) = bytes.split_last() else {
        return Err(AuthError::MalformedSignature("empty signature".to_string()));
    };

    let recovery_byte = match v {
        27 | 28 => v - 27,
        0 | 1 => v,
        other => {
            return Err(AuthError::MalformedSignature(format!(
                "invalid recovery byte {other}"
            )));
        }
    };
    let recovery_id = RecoveryId::from_byte(recovery_byte)
        .ok_or_else(|| AuthError::MalformedSignature("invalid recovery id".to_string()))?;
    let signature =
        Signature::from_slice(rs).map_err(|e| AuthError::MalformedSignature(e.to_string()))?;

    // Negating s mirrors R across the x-axis, so the y parity flips.
    if let Some(normalized) = signature.normalize_s() {
        let flipped = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        return Ok((normalized, flipped));
    }
    Ok((signature, recovery_id))
}

/// Derives the account address of a public key.
#[must_use]
pub fn address_of(key: &VerifyingKey) -> WalletAddress {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(point.as_bytes().get(1..).unwrap_or_default());
    let mut bytes = [0u8; ADDRESS_BYTES];
    if let Some(tail) = hash.get(32 - ADDRESS_BYTES..) {
        bytes.copy_from_slice(tail);
    }
    WalletAddress::from_bytes(bytes)
}

/// Recovers the address that signed `message`.
///
/// # Errors
///
/// Returns [`AuthError::MalformedSignature`] if the signature cannot be
/// decoded, or [`AuthError::SignatureMismatch`] if no public key can be
/// recovered from it.
pub fn recover_signer(message: &str, signature_hex: &str) -> Result<WalletAddress, AuthError> {
    let (signature, recovery_id) = decode_signature(signature_hex)?;
    let prehash = personal_message_hash(message);
    let key = VerifyingKey::recover_from_prehash(&prehash, &signature, recovery_id)
        .map_err(|_| AuthError::SignatureMismatch)?;
    Ok(address_of(&key))
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    /// Private key `1`; its address is a well-known constant.
    pub(crate) fn key(last_byte: u8) -> SigningKey {
        let mut bytes = [0u8; 32];
        if let Some(last) = bytes.last_mut() {
            *last = last_byte;
        }
        let Ok(key) = SigningKey::from_slice(&bytes) else {
            panic!("valid private key");
        };
        key
    }

    pub(crate) fn sign(key: &SigningKey, message: &str) -> String {
        let Ok((signature, recovery_id)) =
            key.sign_prehash_recoverable(&personal_message_hash(message))
        else {
            panic!("signing failed");
        };
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(27 + recovery_id.to_byte());
        format!("0x{}", hex::encode(bytes))
    }

    pub(crate) fn address(key: &SigningKey) -> WalletAddress {
        address_of(key.verifying_key())
    }

    #[test]
    fn private_key_one_has_known_address() {
        assert_eq!(
            address(&key(1)).as_str(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn recovers_signer() {
        let signer = key(7);
        let signature = sign(&signer, "hello");
        assert_eq!(recover_signer("hello", &signature), Ok(address(&signer)));
    }

    #[test]
    fn different_message_recovers_different_address() {
        let signer = key(7);
        let signature = sign(&signer, "hello");
        let recovered = recover_signer("hello!", &signature);
        assert_ne!(recovered, Ok(address(&signer)));
    }

    #[test]
    fn accepts_zero_based_recovery_byte() {
        let signer = key(9);
        let signature = sign(&signer, "msg");
        let Ok(mut bytes) = hex::decode(signature.trim_start_matches("0x")) else {
            panic!("hex");
        };
        if let Some(v) = bytes.last_mut() {
            *v -= 27;
        }
        let recovered = recover_signer("msg", &hex::encode(bytes));
        assert_eq!(recovered, Ok(address(&signer)));
    }

    #[test]
    fn high_s_signature_recovers_after_normalization() {
        let signer = key(11);
        let Ok((signature, recovery_id)) =
            signer.sign_prehash_recoverable(&personal_message_hash("msg"))
        else {
            panic!("signing failed");
        };
        let (r, s) = signature.split_scalars();
        let Ok(high) = Signature::from_scalars(r, -s) else {
            panic!("negated s is a valid scalar");
        };
        assert!(high.normalize_s().is_some());

        let mut bytes = high.to_bytes().to_vec();
        bytes.push(27 + (recovery_id.to_byte() ^ 1));
        let encoded = format!("0x{}", hex::encode(bytes));

        assert_eq!(recover_signer("msg", &encoded), Ok(address(&signer)));
        let Ok((decoded, flipped)) = decode_signature(&encoded) else {
            panic!("high-s signature should decode");
        };
        assert_eq!(decoded, signature);
        assert_eq!(flipped, recovery_id);
    }

    #[test]
    fn rejects_malformed_signatures() {
        for bad in ["", "0xzz", "0x1234", &format!("0x{}", "00".repeat(64))] {
            assert!(
                matches!(recover_signer("m", bad), Err(AuthError::MalformedSignature(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn rejects_bad_recovery_byte() {
        let mut sig = sign(&key(3), "m");
        sig.truncate(sig.len() - 2);
        sig.push_str("05");
        assert!(matches!(
            recover_signer("m", &sig),
            Err(AuthError::MalformedSignature(_))
        ));
    }

    #[test]
    fn hash_uses_byte_length() {
        // "é" is two bytes; the prefix must say 2, not 1.
        let mut hasher = Keccak256::new();
        hasher.update(b"\x19Ethereum Signed Message:\n2");
        hasher.update("é".as_bytes());
        let expected: [u8; 32] = hasher.finalize().into();
        assert_eq!(personal_message_hash("é"), expected);
    }
}
