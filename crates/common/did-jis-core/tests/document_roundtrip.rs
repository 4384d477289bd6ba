use assert_matches::assert_matches;
use did_jis_core::{BindingPolicy, DidEngine, IdentityDocument, JisError};

const SECRET: &str = "c5aa8df43f9f837bedb7442f31dcb7b166d38535076f094b85ce3a2e0b4458f7";

#[test]
fn restored_engine_reproduces_document_byte_for_byte() {
    let a = DidEngine::from_secret(SECRET).unwrap();
    let b = DidEngine::from_secret(SECRET).unwrap();

    let doc_a = a.create_document("did:jis:sensor.north-7").unwrap();
    let doc_b = b.create_document("did:jis:sensor.north-7").unwrap();
    assert_eq!(doc_a.to_json().unwrap(), doc_b.to_json().unwrap());
}

#[test]
fn document_from_another_engine_verifies_standalone() {
    let issuer = DidEngine::generate().unwrap();
    let json = issuer
        .create_document("did:jis:agent_42")
        .unwrap()
        .to_json_pretty()
        .unwrap();

    // A verifier holds only the JSON text.
    let doc = IdentityDocument::from_json(&json).unwrap();
    assert!(doc.verify().unwrap());
    assert_eq!(doc.id.as_str(), "did:jis:agent_42");
    assert_eq!(hex::encode(doc.public_key().unwrap().as_bytes()), issuer.public_key_hex());
}

#[test]
fn proof_value_is_rejected_by_a_different_key() {
    let issuer = DidEngine::generate().unwrap();
    let other = DidEngine::generate().unwrap();
    let doc = issuer.create_document("did:jis:alice").unwrap();

    let proof = doc.proof.as_ref().unwrap();
    let canonical = doc.canonical_bytes().unwrap();
    assert!(DidEngine::verify_with_key(&canonical, &proof.proof_value, &issuer.public_key_hex()));
    assert!(!DidEngine::verify_with_key(&canonical, &proof.proof_value, &other.public_key_hex()));
}

#[test]
fn derived_only_policy_end_to_end() {
    let engine = DidEngine::from_secret(SECRET)
        .unwrap()
        .with_policy(BindingPolicy::DerivedOnly);
    let derived = engine.create_did_from_key();

    let doc = engine.create_document(derived.as_str()).unwrap();
    assert!(doc.verify().unwrap());
    assert_matches!(
        engine.create_document("did:jis:someone-else"),
        Err(JisError::KeyBindingMismatch { .. })
    );
}

#[test]
fn truncated_json_is_a_serialization_error() {
    let engine = DidEngine::generate().unwrap();
    let json = engine.create_document("did:jis:alice").unwrap().to_json().unwrap();
    let cut = &json[..json.len() / 2];
    assert_matches!(IdentityDocument::from_json(cut), Err(JisError::Serialization(_)));
}

#[test]
fn injected_member_cannot_ride_on_a_valid_proof() {
    let engine = DidEngine::from_secret(SECRET).unwrap();
    let json = engine.create_document("did:jis:alice").unwrap().to_json().unwrap();
    assert!(IdentityDocument::from_json(&json).unwrap().verify().unwrap());

    let injected = json.replacen(
        '{',
        r##"{"service":[{"id":"#relay","type":"LinkedDomains","serviceEndpoint":"https://relay.invalid"}],"##,
        1,
    );
    assert_matches!(IdentityDocument::from_json(&injected), Err(JisError::Serialization(_)));
}
