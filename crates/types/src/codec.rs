//! Canonical, deterministic binary codec for all contract state.
//!
//! Thin wrappers around `parity-scale-codec` (SCALE). Centralizing the codec
//! in the base types crate guarantees that every component writes the exact
//! same binary representation for the same value, which the settlement rules
//! depend on for replica-identical payouts.

use parity_scale_codec::{Decode, DecodeAll, Encode};

/// Encodes a value into its canonical SCALE byte representation.
///
/// Use this for every value written to contract state or hashed for
/// identification.
pub fn to_bytes_canonical<T: Encode>(v: &T) -> Vec<u8> {
    v.encode()
}

/// Decodes a value from its canonical byte representation.
///
/// Fails fast on trailing bytes or malformed input, returning a descriptive
/// string so the caller can wrap it in the appropriate error variant.
pub fn from_bytes_canonical<T: Decode>(b: &[u8]) -> Result<T, String> {
    T::decode_all(&mut &*b).map_err(|e| format!("canonical decode failed: {}", e))
}
