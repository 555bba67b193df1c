//! Encoding utilities for base64 and hex.
//!
//! Provides shared encoding/decoding functions used across workspace crates.
//! These eliminate repetitive error handling patterns.

use anyhow::{anyhow, Result};

// =============================================================================
// Base64
// =============================================================================

/// Encode bytes as standard base64.
pub fn encode_b64(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode standard base64 with a context-aware error message.
///
/// # Arguments
/// * `b64_str` - Base64-encoded input
/// * `context` - Description for error messages (e.g., "packet payload", "record bytes")
pub fn decode_b64(b64_str: &str, context: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(b64_str)
        .map_err(|e| anyhow!("Invalid base64 {} '{}': {}", context, b64_str, e))
}

/// Serde adapter for `Vec<u8>` fields carried as base64 strings in JSON.
///
/// Usage: `#[serde(with = "crate::encoding::b64")]`
pub mod b64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_b64(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::decode_b64(&s, "field").map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Hex
// =============================================================================

/// Hex-encode a prefix of `bytes` for log output.
///
/// Long payloads are truncated to `max_bytes` with a trailing ellipsis so
/// structured log fields stay readable.
pub fn short_hex(bytes: &[u8], max_bytes: usize) -> String {
    if bytes.len() <= max_bytes {
        hex::encode(bytes)
    } else {
        format!("{}..", hex::encode(&bytes[..max_bytes]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_b64_round_trip() -> Result<()> {
        let data = vec![0u8, 1, 2, 255];
        let encoded = encode_b64(&data);
        assert_eq!(decode_b64(&encoded, "test")?, data);
        Ok(())
    }

    #[test]
    fn test_b64_invalid_input() {
        let err = decode_b64("not-base64!!", "packet payload").unwrap_err();
        assert!(err.to_string().contains("packet payload"));
    }

    #[test]
    fn test_short_hex_truncates() {
        assert_eq!(short_hex(&[0xab, 0xcd], 4), "abcd");
        assert_eq!(short_hex(&[0xab; 8], 2), "abab..");
    }
}
