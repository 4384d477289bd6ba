//! Signed DID documents.
//!
//! The proof signs the RFC 8785 (JCS) serialization of the document with the
//! `proof` member removed. JCS sorts keys and strips whitespace, so anyone
//! holding the JSON can rebuild the exact signed bytes.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{JisError, Result};
use crate::keypair::KeyPair;
use crate::{signature, Did};

pub const DID_CONTEXT_V1: &str = "https://www.w3.org/ns/did/v1";
pub const ED25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub const VERIFICATION_KEY_TYPE: &str = "Ed25519VerificationKey2020";
pub const PROOF_TYPE: &str = "Ed25519Signature2020";
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// Whether a document may be issued for an arbitrary DID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingPolicy {
    /// The DID is a caller chosen label; no relation to the key is checked.
    #[default]
    Opaque,
    /// Only the DID derived from the engine key (`Did::from_public_key`).
    DerivedOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: String,
    pub controller: Did,
    pub public_key_multibase: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DocumentProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub verification_method: String,
    pub proof_purpose: String,
    /// Lowercase hex of the 64 signature bytes.
    pub proof_value: String,
}

/// A DID document carrying one Ed25519 key and, once built, its proof.
///
/// Parsing rejects members outside this set: the proof only covers what the
/// struct can re-serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdentityDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: Did,
    pub verification_method: Vec<VerificationMethod>,
    pub authentication: Vec<String>,
    pub assertion_method: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<DocumentProof>,
}

impl IdentityDocument {
    /// Canonical bytes covered by the proof.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let mut tmp = self.clone();
        tmp.proof = None;
        Ok(serde_jcs::to_vec(&tmp)?)
    }

    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == id)
    }

    /// The key referenced by the proof, falling back to the first method.
    pub fn signing_method(&self) -> Result<&VerificationMethod> {
        match &self.proof {
            Some(proof) => self
                .verification_method(&proof.verification_method)
                .ok_or_else(|| {
                    JisError::UnknownVerificationMethod(proof.verification_method.clone())
                }),
            None => self
                .verification_method
                .first()
                .ok_or_else(|| JisError::UnknownVerificationMethod(self.id.key_reference())),
        }
    }

    /// Decoded Ed25519 key of [`Self::signing_method`].
    pub fn public_key(&self) -> Result<VerifyingKey> {
        signature::public_key_from_multibase(&self.signing_method()?.public_key_multibase)
    }

    /// Check the proof against the embedded key.
    ///
    /// `Ok(false)` for a missing, foreign-typed or non-matching proof.
    pub fn verify(&self) -> Result<bool> {
        let Some(proof) = &self.proof else {
            return Ok(false);
        };
        if proof.proof_type != PROOF_TYPE {
            debug!(proof_type = %proof.proof_type, "unsupported proof type");
            return Ok(false);
        }
        let pk = self.public_key()?;
        let bytes = self.canonical_bytes()?;
        signature::verify_hex(&pk, &bytes, &proof.proof_value)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Assembles and signs [`IdentityDocument`]s with one keypair.
#[derive(Debug, Clone, Copy)]
pub struct DocumentBuilder<'a> {
    keypair: &'a KeyPair,
    policy: BindingPolicy,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(keypair: &'a KeyPair) -> Self {
        Self {
            keypair,
            policy: BindingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BindingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The document without a proof.
    pub fn unsigned(&self, did: &Did) -> IdentityDocument {
        let key_ref = did.key_reference();
        IdentityDocument {
            context: vec![DID_CONTEXT_V1.into(), ED25519_2020_CONTEXT.into()],
            id: did.clone(),
            verification_method: vec![VerificationMethod {
                id: key_ref.clone(),
                key_type: VERIFICATION_KEY_TYPE.into(),
                controller: did.clone(),
                public_key_multibase: self.keypair.public_key_multibase(),
            }],
            authentication: vec![key_ref.clone()],
            assertion_method: vec![key_ref],
            proof: None,
        }
    }

    /// Build the document and attach a proof over its canonical bytes.
    pub fn build(&self, did: &Did) -> Result<IdentityDocument> {
        if self.policy == BindingPolicy::DerivedOnly {
            let expected = Did::from_public_key(self.keypair.verifying_key());
            if &expected != did {
                return Err(JisError::KeyBindingMismatch {
                    did: did.to_string(),
                    expected: expected.to_string(),
                });
            }
        }

        let mut doc = self.unsigned(did);
        let bytes = doc.canonical_bytes()?;
        let proof_value = signature::sign_hex(self.keypair, &bytes);

        doc.proof = Some(DocumentProof {
            proof_type: PROOF_TYPE.into(),
            verification_method: did.key_reference(),
            proof_purpose: PROOF_PURPOSE.into(),
            proof_value,
        });
        debug!(did = %did, canonical_len = bytes.len(), "built identity document");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::Value;

    fn kp() -> KeyPair {
        KeyPair::from_secret_hex(
            "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb",
        )
        .unwrap()
    }

    #[test]
    fn json_shape_is_stable() {
        let kp = kp();
        let did = Did::new("alice").unwrap();
        let doc = DocumentBuilder::new(&kp).build(&did).unwrap();
        let v: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        assert_eq!(v["@context"][0], DID_CONTEXT_V1);
        assert_eq!(v["id"], "did:jis:alice");
        let vm = &v["verificationMethod"][0];
        assert_eq!(vm["id"], "did:jis:alice#key-1");
        assert_eq!(vm["type"], VERIFICATION_KEY_TYPE);
        assert_eq!(vm["controller"], "did:jis:alice");
        assert_eq!(vm["publicKeyMultibase"], kp.public_key_multibase());
        assert_eq!(v["authentication"][0], "did:jis:alice#key-1");
        assert_eq!(v["assertionMethod"][0], "did:jis:alice#key-1");
        assert_eq!(v["proof"]["type"], PROOF_TYPE);
        assert_eq!(v["proof"]["verificationMethod"], "did:jis:alice#key-1");
        assert_eq!(v["proof"]["proofPurpose"], PROOF_PURPOSE);
        assert_eq!(v["proof"]["proofValue"].as_str().unwrap().len(), 128);
    }

    #[test]
    fn canonical_bytes_are_sorted_and_compact() {
        let kp = kp();
        let did = Did::new("alice").unwrap();
        let doc = DocumentBuilder::new(&kp).unsigned(&did);
        let text = String::from_utf8(doc.canonical_bytes().unwrap()).unwrap();

        assert!(text.starts_with("{\"@context\":[\"https://www.w3.org/ns/did/v1\""));
        assert!(!text.contains(' ') && !text.contains('\n'));
        let assertion = text.find("\"assertionMethod\"").unwrap();
        let auth = text.find("\"authentication\"").unwrap();
        let id = text.find("\"id\":\"did:jis:alice\"").unwrap();
        assert!(assertion < auth && auth < id);
    }

    #[test]
    fn proof_is_excluded_from_canonical_form() {
        let kp = kp();
        let did = Did::new("alice").unwrap();
        let signed = DocumentBuilder::new(&kp).build(&did).unwrap();
        let unsigned = DocumentBuilder::new(&kp).unsigned(&did);
        assert_eq!(signed.canonical_bytes().unwrap(), unsigned.canonical_bytes().unwrap());
    }

    #[test]
    fn build_is_deterministic() {
        let kp = kp();
        let did = Did::new("device:001").unwrap();
        let a = DocumentBuilder::new(&kp).build(&did).unwrap();
        let b = DocumentBuilder::new(&kp).build(&did).unwrap();
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn built_document_verifies_after_json_round_trip() {
        let kp = kp();
        let did = Did::new("device:001").unwrap();
        let doc = DocumentBuilder::new(&kp).build(&did).unwrap();
        assert!(doc.verify().unwrap());

        let pretty = doc.to_json_pretty().unwrap();
        let parsed = IdentityDocument::from_json(&pretty).unwrap();
        assert_eq!(parsed, doc);
        assert!(parsed.verify().unwrap());
        assert_eq!(parsed.public_key().unwrap(), *kp.verifying_key());
    }

    #[test]
    fn tampering_breaks_the_proof() {
        let kp = kp();
        let doc = DocumentBuilder::new(&kp)
            .build(&Did::new("alice").unwrap())
            .unwrap();

        let mut renamed = doc.clone();
        renamed.authentication.push("did:jis:mallory#key-1".into());
        assert!(!renamed.verify().unwrap());

        let mut swapped_key = doc.clone();
        swapped_key.verification_method[0].public_key_multibase =
            KeyPair::generate().unwrap().public_key_multibase();
        assert!(!swapped_key.verify().unwrap());
    }

    #[test]
    fn unsigned_document_does_not_verify() {
        let kp = kp();
        let doc = DocumentBuilder::new(&kp).unsigned(&Did::new("alice").unwrap());
        assert!(!doc.verify().unwrap());
        assert!(doc.to_json().unwrap().find("proof").is_none());
    }

    #[test]
    fn unknown_members_are_rejected_on_parse() {
        let kp = kp();
        let doc = DocumentBuilder::new(&kp)
            .build(&Did::new("alice").unwrap())
            .unwrap();
        let mut v: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        let mut top = v.clone();
        top["service"] = serde_json::json!([{ "id": "#relay", "serviceEndpoint": "https://relay" }]);
        assert_matches!(
            IdentityDocument::from_json(&top.to_string()),
            Err(JisError::Serialization(_))
        );

        let mut nested = v.clone();
        nested["verificationMethod"][0]["publicKeyJwk"] = serde_json::json!({ "kty": "OKP" });
        assert_matches!(
            IdentityDocument::from_json(&nested.to_string()),
            Err(JisError::Serialization(_))
        );

        v["proof"]["created"] = "2026-01-01T00:00:00Z".into();
        assert_matches!(
            IdentityDocument::from_json(&v.to_string()),
            Err(JisError::Serialization(_))
        );
    }

    #[test]
    fn structural_problems_are_errors() {
        let kp = kp();
        let doc = DocumentBuilder::new(&kp)
            .build(&Did::new("alice").unwrap())
            .unwrap();

        let mut dangling = doc.clone();
        dangling.proof.as_mut().unwrap().verification_method = "did:jis:alice#key-9".into();
        assert_matches!(dangling.verify(), Err(JisError::UnknownVerificationMethod(_)));

        let mut bad_value = doc.clone();
        bad_value.proof.as_mut().unwrap().proof_value = "xyz".into();
        assert_matches!(bad_value.verify(), Err(JisError::InvalidEncoding { .. }));

        let mut bad_key = doc;
        bad_key.verification_method[0].public_key_multibase = "!not-multibase".into();
        assert_matches!(bad_key.verify(), Err(JisError::InvalidMultibase(_)));
    }

    #[test]
    fn binding_policy_enforced_when_requested() {
        let kp = kp();
        let derived = Did::from_public_key(kp.verifying_key());
        let builder = DocumentBuilder::new(&kp).with_policy(BindingPolicy::DerivedOnly);

        assert!(builder.build(&derived).unwrap().verify().unwrap());
        assert_matches!(
            builder.build(&Did::new("alice").unwrap()),
            Err(JisError::KeyBindingMismatch { .. })
        );
        assert!(DocumentBuilder::new(&kp).build(&Did::new("alice").unwrap()).is_ok());
    }

    #[test]
    fn binding_policy_deserializes_kebab_case() {
        let p: BindingPolicy = serde_json::from_str("\"derived-only\"").unwrap();
        assert_eq!(p, BindingPolicy::DerivedOnly);
        assert_eq!(BindingPolicy::default(), BindingPolicy::Opaque);
    }

    #[test]
    fn invalid_document_id_is_rejected_on_parse() {
        let kp = kp();
        let doc = DocumentBuilder::new(&kp)
            .build(&Did::new("alice").unwrap())
            .unwrap();
        let json = doc.to_json().unwrap().replace("did:jis:alice\"", "did:web:alice\"");
        assert_matches!(IdentityDocument::from_json(&json), Err(JisError::Serialization(_)));
    }
}
