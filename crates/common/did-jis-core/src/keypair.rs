use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use crate::codec::{self, ED25519_PUB_MULTICODEC};
use crate::error::{JisError, Result};

pub type Signature = ed25519_dalek::Signature;

/// Length of an Ed25519 secret seed in bytes.
pub const SECRET_KEY_LENGTH: usize = ed25519_dalek::SECRET_KEY_LENGTH;
/// Length of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Ed25519 keypair owned by a single engine.
///
/// The secret half is zeroized on drop and never appears in `Debug` output.
#[derive(Clone)]
pub struct KeyPair {
    sk: SigningKey,
    pk: VerifyingKey,
}

impl KeyPair {
    /// Generate a new keypair from the operating system RNG.
    pub fn generate() -> Result<Self> {
        let mut seed = [0u8; SECRET_KEY_LENGTH];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| JisError::KeyGeneration(e.to_string()))?;
        let kp = Self::from_seed(&seed);
        seed.fill(0);
        debug!(public_key = %kp.public_key_hex(), "generated keypair");
        Ok(kp)
    }

    /// Restore a keypair from a 64 character hex secret.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let expected = SECRET_KEY_LENGTH * 2;
        if secret_hex.len() != expected {
            return Err(JisError::InvalidKeyEncoding {
                expected,
                reason: format!("found {} characters", secret_hex.len()),
            });
        }
        let mut seed: [u8; SECRET_KEY_LENGTH] =
            codec::hex_decode_array(secret_hex).map_err(|e| JisError::InvalidKeyEncoding {
                expected,
                reason: e.to_string(),
            })?;
        let kp = Self::from_seed(&seed);
        seed.fill(0);
        debug!(public_key = %kp.public_key_hex(), "restored keypair from secret");
        Ok(kp)
    }

    /// Restore a keypair from raw secret bytes.
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self> {
        let seed: &[u8; SECRET_KEY_LENGTH] =
            secret.try_into().map_err(|_| JisError::InvalidKeyMaterial {
                expected: SECRET_KEY_LENGTH,
                found: secret.len(),
            })?;
        Ok(Self::from_seed(seed))
    }

    fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        let sk = SigningKey::from_bytes(seed);
        let pk = sk.verifying_key();
        Self { sk, pk }
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.pk
    }

    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.pk.to_bytes()
    }

    /// Lowercase hex of the 32 public key bytes.
    pub fn public_key_hex(&self) -> String {
        codec::hex_encode(self.pk.as_bytes())
    }

    /// `z`-prefixed base58btc of the multicodec-tagged public key.
    pub fn public_key_multibase(&self) -> String {
        codec::multibase_encode(self.pk.as_bytes(), ED25519_PUB_MULTICODEC)
    }

    /// Export the secret seed as hex.
    ///
    /// Only the CLI `keygen` command uses this; keep the result out of logs.
    pub fn secret_key_hex(&self) -> String {
        codec::hex_encode(self.sk.to_bytes())
    }

    /// Sign arbitrary bytes, returning an Ed25519 signature.
    pub fn sign(&self, msg: &[u8]) -> Signature {
        self.sk.sign(msg)
    }

    /// Verify a signature against `msg` with this keypair's public key.
    pub fn verify(&self, msg: &[u8], sig: &Signature) -> bool {
        crate::signature::verify(&self.pk, msg, sig)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}
