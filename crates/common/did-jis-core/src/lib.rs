//! did:jis – DID engine for device and agent identity.
//!
//! - One Ed25519 keypair per [`DidEngine`]; secrets are zeroized on drop.
//! - `did:jis:<id>` grammar: id is `[A-Za-z0-9:._-]{1,255}`, method `[a-z0-9]{1,31}`.
//! - Key-derived ids are the first 16 bytes of SHA-256(public key), hex encoded.
//! - Public keys are published as multibase `z` + base58btc(0xed 0x01 || key).
//! - Documents are signed over their RFC 8785 canonical JSON.
//! - Zero `unsafe`; `#![forbid(unsafe_code)]`.

#![forbid(unsafe_code)]

pub mod codec;
pub mod did;
pub mod document;
mod engine;
mod error;
mod keypair;
pub mod signature;

pub use did::{Did, ParsedDid};
pub use document::{BindingPolicy, DocumentBuilder, DocumentProof, IdentityDocument, VerificationMethod};
pub use engine::DidEngine;
pub use error::{JisError, Result, StatusCode};
pub use keypair::{KeyPair, Signature, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SIGNATURE_LENGTH};

/// Library version, e.g. `"0.1.0"`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
