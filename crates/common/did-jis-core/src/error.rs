use thiserror::Error;

/// Error type for every fallible did:jis operation.
///
/// Signature mismatches are not errors: verification returns `false`.
/// `InvalidEncoding` is reserved for caller-supplied hex that cannot be
/// decoded at all.
#[derive(Debug, Error)]
pub enum JisError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("invalid secret key encoding: expected {expected} hex characters ({reason})")]
    InvalidKeyEncoding { expected: usize, reason: String },

    #[error("invalid key material: expected {expected} bytes, found {found}")]
    InvalidKeyMaterial { expected: usize, found: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid multibase: {0}")]
    InvalidMultibase(String),

    #[error("invalid identifier {input:?}: {reason}")]
    InvalidIdentifier { input: String, reason: String },

    #[error("invalid DID syntax {input:?}: {reason}")]
    InvalidDidSyntax { input: String, reason: String },

    #[error("{field} needs {needed} bytes but the buffer holds {capacity}")]
    BufferTooSmall {
        field: &'static str,
        needed: usize,
        capacity: usize,
    },

    #[error("invalid {what} encoding: {reason}")]
    InvalidEncoding { what: &'static str, reason: String },

    #[error("DID {did} is not derived from the engine key (expected {expected})")]
    KeyBindingMismatch { did: String, expected: String },

    #[error("verification method {0} not present in document")]
    UnknownVerificationMethod(String),

    #[error("unsupported key multicodec: expected {expected:#x}, found {found:#x}")]
    UnsupportedKeyCodec { expected: u64, found: u64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, JisError>;

/// Stable numeric status codes for boundary layers.
///
/// Values are part of the external contract and must not be renumbered.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok = 0,
    KeyGeneration = -1,
    InvalidKeyEncoding = -2,
    InvalidKeyMaterial = -3,
    InvalidHex = -4,
    InvalidMultibase = -5,
    InvalidIdentifier = -6,
    InvalidDidSyntax = -7,
    BufferTooSmall = -8,
    InvalidEncoding = -9,
    KeyBindingMismatch = -10,
    UnknownVerificationMethod = -11,
    UnsupportedKeyCodec = -12,
    Serialization = -13,
    /// Null pointer or non UTF-8 text handed across a boundary.
    InvalidArgument = -14,
}

impl StatusCode {
    pub const ALL: [StatusCode; 15] = [
        StatusCode::Ok,
        StatusCode::KeyGeneration,
        StatusCode::InvalidKeyEncoding,
        StatusCode::InvalidKeyMaterial,
        StatusCode::InvalidHex,
        StatusCode::InvalidMultibase,
        StatusCode::InvalidIdentifier,
        StatusCode::InvalidDidSyntax,
        StatusCode::BufferTooSmall,
        StatusCode::InvalidEncoding,
        StatusCode::KeyBindingMismatch,
        StatusCode::UnknownVerificationMethod,
        StatusCode::UnsupportedKeyCodec,
        StatusCode::Serialization,
        StatusCode::InvalidArgument,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.code() == code)
    }

    /// Short, static description.
    pub fn message(self) -> &'static str {
        let text = self.message_with_nul();
        &text[..text.len() - 1]
    }

    /// [`Self::message`] with a trailing NUL, for handing to C unchanged.
    pub fn message_with_nul(self) -> &'static str {
        match self {
            StatusCode::Ok => "ok\0",
            StatusCode::KeyGeneration => "key generation failed\0",
            StatusCode::InvalidKeyEncoding => "invalid secret key encoding\0",
            StatusCode::InvalidKeyMaterial => "invalid key material\0",
            StatusCode::InvalidHex => "invalid hex\0",
            StatusCode::InvalidMultibase => "invalid multibase\0",
            StatusCode::InvalidIdentifier => "invalid identifier\0",
            StatusCode::InvalidDidSyntax => "invalid DID syntax\0",
            StatusCode::BufferTooSmall => "buffer too small\0",
            StatusCode::InvalidEncoding => "invalid encoding\0",
            StatusCode::KeyBindingMismatch => "DID not bound to engine key\0",
            StatusCode::UnknownVerificationMethod => "unknown verification method\0",
            StatusCode::UnsupportedKeyCodec => "unsupported key codec\0",
            StatusCode::Serialization => "serialization error\0",
            StatusCode::InvalidArgument => "invalid argument\0",
        }
    }
}

impl JisError {
    pub fn status(&self) -> StatusCode {
        match self {
            JisError::KeyGeneration(_) => StatusCode::KeyGeneration,
            JisError::InvalidKeyEncoding { .. } => StatusCode::InvalidKeyEncoding,
            JisError::InvalidKeyMaterial { .. } => StatusCode::InvalidKeyMaterial,
            JisError::InvalidHex(_) => StatusCode::InvalidHex,
            JisError::InvalidMultibase(_) => StatusCode::InvalidMultibase,
            JisError::InvalidIdentifier { .. } => StatusCode::InvalidIdentifier,
            JisError::InvalidDidSyntax { .. } => StatusCode::InvalidDidSyntax,
            JisError::BufferTooSmall { .. } => StatusCode::BufferTooSmall,
            JisError::InvalidEncoding { .. } => StatusCode::InvalidEncoding,
            JisError::KeyBindingMismatch { .. } => StatusCode::KeyBindingMismatch,
            JisError::UnknownVerificationMethod(_) => StatusCode::UnknownVerificationMethod,
            JisError::UnsupportedKeyCodec { .. } => StatusCode::UnsupportedKeyCodec,
            JisError::Serialization(_) => StatusCode::Serialization,
        }
    }

    /// Only RNG failure is unrecoverable; everything else is bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, JisError::KeyGeneration(_))
    }
}

impl From<&JisError> for StatusCode {
    fn from(err: &JisError) -> Self {
        err.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn status_codes_are_unique_and_round_trip() {
        let codes: HashSet<i32> = StatusCode::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes.len(), StatusCode::ALL.len());
        for status in StatusCode::ALL {
            assert_eq!(StatusCode::from_code(status.code()), Some(status));
        }
        assert_eq!(StatusCode::from_code(42), None);
    }

    #[test]
    fn only_failures_are_negative() {
        for status in StatusCode::ALL {
            if status == StatusCode::Ok {
                assert_eq!(status.code(), 0);
            } else {
                assert!(status.code() < 0, "{:?}", status);
            }
        }
    }

    #[test]
    fn error_maps_to_its_status() {
        let err = JisError::BufferTooSmall {
            field: "id",
            needed: 300,
            capacity: 256,
        };
        assert_eq!(err.status(), StatusCode::BufferTooSmall);
        assert!(!err.is_fatal());
        assert!(JisError::KeyGeneration("rng".into()).is_fatal());
    }

    #[test]
    fn messages_carry_exactly_one_terminator() {
        for status in StatusCode::ALL {
            let raw = status.message_with_nul();
            assert!(raw.ends_with('\0'), "{:?}", status);
            assert!(!status.message().contains('\0'), "{:?}", status);
            assert!(!status.message().is_empty());
        }
        assert_eq!(StatusCode::BufferTooSmall.message(), "buffer too small");
    }
}
