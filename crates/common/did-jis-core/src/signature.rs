//! Message signing and verification.
//!
//! A signature that does not verify is `false`. Undecodable hex supplied by
//! the caller is `JisError::InvalidEncoding`, so the two cases stay apart.

use ed25519_dalek::{Verifier, VerifyingKey};
use tracing::{debug, trace};

use crate::codec::{self, ED25519_PUB_MULTICODEC};
use crate::error::{JisError, Result};
use crate::keypair::{KeyPair, Signature, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Sign `message` with the keypair. Ed25519 is deterministic: the same key
/// and message always give the same signature.
pub fn sign(kp: &KeyPair, message: &[u8]) -> Signature {
    trace!(len = message.len(), "signing message");
    kp.sign(message)
}

/// Sign and render the signature as 128 lowercase hex characters.
pub fn sign_hex(kp: &KeyPair, message: &[u8]) -> String {
    codec::hex_encode(sign(kp, message).to_bytes())
}

pub fn verify(pk: &VerifyingKey, message: &[u8], sig: &Signature) -> bool {
    pk.verify(message, sig).is_ok()
}

/// Verify against raw signature bytes; a wrong length is simply invalid.
pub fn verify_bytes(pk: &VerifyingKey, message: &[u8], sig: &[u8]) -> bool {
    if sig.len() != SIGNATURE_LENGTH {
        debug!(len = sig.len(), "signature has wrong length");
        return false;
    }
    match Signature::from_slice(sig) {
        Ok(sig) => verify(pk, message, &sig),
        Err(_) => false,
    }
}

/// Hex-decode `sig_hex` and verify it against `pk`.
pub fn verify_hex(pk: &VerifyingKey, message: &[u8], sig_hex: &str) -> Result<bool> {
    let sig = codec::hex_decode(sig_hex).map_err(|e| JisError::InvalidEncoding {
        what: "signature",
        reason: e.to_string(),
    })?;
    Ok(verify_bytes(pk, message, &sig))
}

/// Parse a 64 character hex public key.
///
/// Returns `Ok(None)` for well-formed hex that is not a usable Ed25519 point.
pub fn public_key_from_hex(pk_hex: &str) -> Result<Option<VerifyingKey>> {
    let bytes = codec::hex_decode(pk_hex).map_err(|e| JisError::InvalidEncoding {
        what: "public key",
        reason: e.to_string(),
    })?;
    let Ok(bytes) = <[u8; PUBLIC_KEY_LENGTH]>::try_from(bytes.as_slice()) else {
        debug!(len = bytes.len(), "public key has wrong length");
        return Ok(None);
    };
    Ok(VerifyingKey::from_bytes(&bytes).ok())
}

/// Decode a `z6Mk…` multibase Ed25519 public key.
pub fn public_key_from_multibase(encoded: &str) -> Result<VerifyingKey> {
    let (codec_tag, bytes) = codec::multibase_decode(encoded)?;
    if codec_tag != ED25519_PUB_MULTICODEC {
        return Err(JisError::UnsupportedKeyCodec {
            expected: ED25519_PUB_MULTICODEC,
            found: codec_tag,
        });
    }
    let bytes: [u8; PUBLIC_KEY_LENGTH] =
        bytes.as_slice().try_into().map_err(|_| JisError::InvalidKeyMaterial {
            expected: PUBLIC_KEY_LENGTH,
            found: bytes.len(),
        })?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| JisError::InvalidKeyMaterial {
        expected: PUBLIC_KEY_LENGTH,
        found: PUBLIC_KEY_LENGTH,
    })
}

/// Verify with the engine's own key after hex-decoding the signature.
pub fn verify_with_engine_key(kp: &KeyPair, message: &[u8], sig_hex: &str) -> Result<bool> {
    verify_hex(kp.verifying_key(), message, sig_hex)
}

/// Verify with a caller supplied hex public key, reporting decode failures.
pub fn try_verify_with_external_key(message: &[u8], sig_hex: &str, pk_hex: &str) -> Result<bool> {
    match public_key_from_hex(pk_hex)? {
        Some(pk) => verify_hex(&pk, message, sig_hex),
        None => Ok(false),
    }
}

/// Verify with a caller supplied hex public key. Fails closed: any decode
/// error yields `false`.
pub fn verify_with_external_key(message: &[u8], sig_hex: &str, pk_hex: &str) -> bool {
    try_verify_with_external_key(message, sig_hex, pk_hex).unwrap_or_else(|e| {
        debug!(error = %e, "external verification input rejected");
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn kp() -> KeyPair {
        KeyPair::from_secret_hex(
            "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60",
        )
        .unwrap()
    }

    #[test]
    fn rfc8032_empty_message_signature() {
        let expected = "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e06522490155\
                        5fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b";
        assert_eq!(sign_hex(&kp(), b""), expected);
    }

    #[test]
    fn signing_is_deterministic() {
        let kp = kp();
        assert_eq!(sign_hex(&kp, b"hello"), sign_hex(&kp, b"hello"));
        assert_ne!(sign_hex(&kp, b"hello"), sign_hex(&kp, b"hello!"));
    }

    #[test]
    fn sign_and_verify() {
        let kp = kp();
        let sig = sign(&kp, b"msg");
        assert!(verify(kp.verifying_key(), b"msg", &sig));
        assert!(!verify(kp.verifying_key(), b"other", &sig));
    }

    #[test]
    fn every_flipped_byte_fails() {
        let kp = kp();
        let sig = sign(&kp, b"msg").to_bytes();
        for i in 0..SIGNATURE_LENGTH {
            let mut bad = sig;
            bad[i] ^= 0x01;
            assert!(!verify_bytes(kp.verifying_key(), b"msg", &bad), "byte {}", i);
        }
    }

    #[test]
    fn malformed_lengths_are_not_errors() {
        let kp = kp();
        assert!(!verify_bytes(kp.verifying_key(), b"msg", &[0u8; 10]));
        assert_eq!(verify_hex(kp.verifying_key(), b"msg", "abcd").unwrap(), false);
        assert_eq!(verify_hex(kp.verifying_key(), b"msg", "").unwrap(), false);
    }

    #[test]
    fn non_hex_signature_is_invalid_encoding() {
        let kp = kp();
        assert_matches!(
            verify_with_engine_key(&kp, b"msg", "not hex"),
            Err(JisError::InvalidEncoding { what: "signature", .. })
        );
    }

    #[test]
    fn external_key_fails_closed() {
        let kp = kp();
        let sig = sign_hex(&kp, b"msg");
        let pk = kp.public_key_hex();

        assert!(verify_with_external_key(b"msg", &sig, &pk));
        assert!(!verify_with_external_key(b"msg", &sig, "zz"));
        assert!(!verify_with_external_key(b"msg", "zz", &pk));
        assert!(!verify_with_external_key(b"msg", &sig, &pk[..62]));

        assert_matches!(
            try_verify_with_external_key(b"msg", &sig, "zz"),
            Err(JisError::InvalidEncoding { what: "public key", .. })
        );
        assert_matches!(try_verify_with_external_key(b"msg", &sig, "abcd"), Ok(false));
    }

    #[test]
    fn multibase_key_round_trip() {
        let kp = kp();
        let pk = public_key_from_multibase(&kp.public_key_multibase()).unwrap();
        assert_eq!(pk, *kp.verifying_key());
    }

    #[test]
    fn multibase_key_rejections() {
        let other_codec = codec::multibase_encode(&[1u8; 32], 0xec);
        assert_matches!(
            public_key_from_multibase(&other_codec),
            Err(JisError::UnsupportedKeyCodec { expected: 0xed, found: 0xec })
        );
        let short = codec::multibase_encode(&[1u8; 31], ED25519_PUB_MULTICODEC);
        assert_matches!(
            public_key_from_multibase(&short),
            Err(JisError::InvalidKeyMaterial { expected: 32, found: 31 })
        );
        assert_matches!(public_key_from_multibase("!"), Err(JisError::InvalidMultibase(_)));
    }

    #[test]
    fn wrong_key_fails() {
        let other = KeyPair::generate().unwrap();
        let sig = sign_hex(&kp(), b"msg");
        assert!(!verify_with_external_key(b"msg", &sig, &other.public_key_hex()));
    }
}
