//! Text encodings for key material.
//!
//! - hex: lowercase on output, either case accepted on input.
//! - multibase: `z` (base58btc) over `varint(codec) || bytes`.

use multibase::Base;

use crate::error::{JisError, Result};

/// Multicodec tag for an Ed25519 public key.
pub const ED25519_PUB_MULTICODEC: u64 = 0xed;

/// Base used for every multibase string this crate produces.
pub const MULTIBASE_BASE: Base = Base::Base58Btc;

pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// Decode hex text; fails on odd length or a non-hex character.
pub fn hex_decode(s: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(s)?)
}

/// Decode hex text into a fixed-size array.
pub fn hex_decode_array<const N: usize>(s: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(s, &mut out)?;
    Ok(out)
}

/// Tag `bytes` with `codec` and encode as base58btc multibase.
pub fn multibase_encode(bytes: &[u8], codec: u64) -> String {
    let mut codec_buf = unsigned_varint::encode::u64_buffer();
    let tag = unsigned_varint::encode::u64(codec, &mut codec_buf);

    let mut tagged = Vec::with_capacity(tag.len() + bytes.len());
    tagged.extend_from_slice(tag);
    tagged.extend_from_slice(bytes);

    multibase::encode(MULTIBASE_BASE, tagged)
}

/// Inverse of [`multibase_encode`]: returns the codec tag and the payload.
pub fn multibase_decode(s: &str) -> Result<(u64, Vec<u8>)> {
    let (_, data) =
        multibase::decode(s).map_err(|e| JisError::InvalidMultibase(e.to_string()))?;
    let (codec, payload) = unsigned_varint::decode::u64(&data)
        .map_err(|e| JisError::InvalidMultibase(format!("bad multicodec prefix: {}", e)))?;
    Ok((codec, payload.to_vec()))
}
