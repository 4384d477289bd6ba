use tracing::debug;

use crate::did::{self, Did, ParsedDid};
use crate::document::{BindingPolicy, DocumentBuilder, IdentityDocument};
use crate::error::Result;
use crate::keypair::KeyPair;
use crate::signature;

/// Owns one keypair and exposes every did:jis operation on it.
///
/// The key never changes after construction, so a shared `&DidEngine` (or an
/// `Arc<DidEngine>`) can be used from many threads at once.
#[derive(Debug, Clone)]
pub struct DidEngine {
    keypair: KeyPair,
    policy: BindingPolicy,
}

impl DidEngine {
    /// Engine with a fresh random key.
    pub fn generate() -> Result<Self> {
        Ok(Self::from_keypair(KeyPair::generate()?))
    }

    /// Engine restored from a 64 character hex secret.
    pub fn from_secret(secret_hex: &str) -> Result<Self> {
        Ok(Self::from_keypair(KeyPair::from_secret_hex(secret_hex)?))
    }

    pub fn from_keypair(keypair: KeyPair) -> Self {
        Self {
            keypair,
            policy: BindingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BindingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> BindingPolicy {
        self.policy
    }

    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn public_key_hex(&self) -> String {
        self.keypair.public_key_hex()
    }

    pub fn public_key_multibase(&self) -> String {
        self.keypair.public_key_multibase()
    }

    /// `did:jis:<id>` for a caller chosen id.
    pub fn create_did(&self, id: &str) -> Result<Did> {
        Did::new(id)
    }

    /// `did:jis:<hex>` derived from this engine's public key.
    pub fn create_did_from_key(&self) -> Did {
        let did = Did::from_public_key(self.keypair.verifying_key());
        debug!(did = %did, "derived DID from public key");
        did
    }

    pub fn parse_did(did: &str) -> Result<ParsedDid> {
        did::parse(did)
    }

    pub fn is_valid_did(did: &str) -> bool {
        did::is_valid(did)
    }

    pub fn document_builder(&self) -> DocumentBuilder<'_> {
        DocumentBuilder::new(&self.keypair).with_policy(self.policy)
    }

    /// Parse `did` as a did:jis identifier and build its signed document.
    pub fn create_document(&self, did: &str) -> Result<IdentityDocument> {
        let did: Did = did.parse()?;
        self.document_builder().build(&did)
    }

    /// Sign `message`, returning 128 hex characters.
    pub fn sign(&self, message: &[u8]) -> String {
        signature::sign_hex(&self.keypair, message)
    }

    /// Verify a hex signature with this engine's key.
    pub fn verify(&self, message: &[u8], signature_hex: &str) -> Result<bool> {
        signature::verify_with_engine_key(&self.keypair, message, signature_hex)
    }

    /// Verify with an external hex public key; any decode failure is `false`.
    pub fn verify_with_key(message: &[u8], signature_hex: &str, public_key_hex: &str) -> bool {
        signature::verify_with_external_key(message, signature_hex, public_key_hex)
    }
}
