use std::fmt;
use std::str::FromStr;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec;
use crate::error::{JisError, Result};

/// The only method this engine issues and accepts as valid.
pub const METHOD: &str = "jis";
/// Longest accepted method name, in bytes.
pub const MAX_METHOD_LEN: usize = 31;
/// Longest accepted method-specific id, in bytes.
pub const MAX_ID_LEN: usize = 255;
/// C buffer sizes for `did_parse` (value plus NUL terminator).
pub const METHOD_BUFFER_CAPACITY: usize = MAX_METHOD_LEN + 1;
pub const ID_BUFFER_CAPACITY: usize = MAX_ID_LEN + 1;
/// Number of SHA-256 digest bytes kept when deriving an id from a key.
pub const KEY_ID_DIGEST_BYTES: usize = 16;

const SCHEME: &str = "did";

/// A validated `did:jis:<id>` identifier.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

/// Components of any syntactically valid `did:<method>:<id>` string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedDid {
    pub method: String,
    pub id: String,
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '.' | '_')
}

fn is_method_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn check_id(id: &str) -> std::result::Result<(), String> {
    if id.is_empty() {
        return Err("identifier is empty".into());
    }
    if id.len() > MAX_ID_LEN {
        return Err(format!(
            "identifier is {} bytes, limit is {}",
            id.len(),
            MAX_ID_LEN
        ));
    }
    if let Some(bad) = id.chars().find(|c| !is_id_char(*c)) {
        return Err(format!("character {:?} is not allowed", bad));
    }
    Ok(())
}

fn check_method(method: &str) -> std::result::Result<(), String> {
    if method.is_empty() {
        return Err("method is empty".into());
    }
    if method.len() > MAX_METHOD_LEN {
        return Err(format!(
            "method is {} bytes, limit is {}",
            method.len(),
            MAX_METHOD_LEN
        ));
    }
    if let Some(bad) = method.chars().find(|c| !is_method_char(*c)) {
        return Err(format!("method character {:?} is not allowed", bad));
    }
    Ok(())
}

/// Split `did:<method>:<id>` and validate both parts. Any method is accepted.
pub fn parse(did: &str) -> Result<ParsedDid> {
    let syntax = |reason: String| JisError::InvalidDidSyntax {
        input: did.to_owned(),
        reason,
    };

    let mut parts = did.splitn(3, ':');
    let (Some(scheme), Some(method), Some(id)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(syntax("expected did:<method>:<id>".into()));
    };
    if scheme != SCHEME {
        return Err(syntax(format!("scheme must be {:?}, found {:?}", SCHEME, scheme)));
    }
    check_method(method).map_err(syntax)?;
    check_id(id).map_err(syntax)?;

    Ok(ParsedDid {
        method: method.to_owned(),
        id: id.to_owned(),
    })
}

/// True when `did` parses and its method is exactly `jis`.
pub fn is_valid(did: &str) -> bool {
    matches!(parse(did), Ok(p) if p.method == METHOD)
}

impl ParsedDid {
    /// Copy method and id into NUL-terminated C buffers.
    ///
    /// Rejects instead of truncating; neither buffer is touched on failure.
    pub fn write_into(&self, method_out: &mut [u8], id_out: &mut [u8]) -> Result<()> {
        check_fits("method", &self.method, method_out.len())?;
        check_fits("id", &self.id, id_out.len())?;
        write_c_str(&self.method, method_out);
        write_c_str(&self.id, id_out);
        Ok(())
    }
}

fn check_fits(field: &'static str, value: &str, capacity: usize) -> Result<()> {
    let needed = value.len() + 1;
    if needed > capacity {
        return Err(JisError::BufferTooSmall {
            field,
            needed,
            capacity,
        });
    }
    Ok(())
}

fn write_c_str(value: &str, buf: &mut [u8]) {
    buf[..value.len()].copy_from_slice(value.as_bytes());
    buf[value.len()] = 0;
}

/// Parse straight into caller buffers; see [`ParsedDid::write_into`].
pub fn parse_into(did: &str, method_out: &mut [u8], id_out: &mut [u8]) -> Result<ParsedDid> {
    let parsed = parse(did)?;
    parsed.write_into(method_out, id_out)?;
    Ok(parsed)
}

impl Did {
    /// Build `did:jis:<id>` from caller supplied id text.
    pub fn new(id: &str) -> Result<Self> {
        check_id(id).map_err(|reason| JisError::InvalidIdentifier {
            input: id.to_owned(),
            reason,
        })?;
        Ok(Self(format!("{}:{}:{}", SCHEME, METHOD, id)))
    }

    /// Derive the id from SHA-256 of the public key, keeping the first
    /// [`KEY_ID_DIGEST_BYTES`] bytes as lowercase hex.
    pub fn from_public_key(pk: &VerifyingKey) -> Self {
        Self::from_public_key_bytes(pk.as_bytes())
    }

    pub fn from_public_key_bytes(pk: &[u8]) -> Self {
        let digest = Sha256::digest(pk);
        let id = codec::hex_encode(&digest[..KEY_ID_DIGEST_BYTES]);
        // hex is always inside the id grammar
        Self(format!("{}:{}:{}", SCHEME, METHOD, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn method(&self) -> &str {
        METHOD
    }

    /// The method-specific id (everything after `did:jis:`).
    pub fn id(&self) -> &str {
        &self.0[SCHEME.len() + METHOD.len() + 2..]
    }

    /// Verification method reference used in documents: `<did>#key-1`.
    pub fn key_reference(&self) -> String {
        format!("{}#key-1", self.0)
    }
}

impl FromStr for Did {
    type Err = JisError;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = parse(s)?;
        if parsed.method != METHOD {
            return Err(JisError::InvalidDidSyntax {
                input: s.to_owned(),
                reason: format!("unsupported method {:?}", parsed.method),
            });
        }
        Ok(Did(s.to_owned()))
    }
}

impl TryFrom<String> for Did {
    type Error = JisError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
