//! Encoding helpers - base64url, base32, PEM, hex.

use crate::error::{AcmeError, Result};
use base64::Engine;

/// Base64 encoder, always the unpadded URL-safe alphabet RFC 8555 requires.
pub struct Base64Encoding;

impl Base64Encoding {
    /// Encode with URL-safe base64, no padding.
    pub fn encode(data: &[u8]) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
    }

    /// Decode URL-safe base64 with no padding. The engine already accepts
    /// unpadded input directly; do not add padding back before calling it.
    pub fn decode(data: &str) -> Result<Vec<u8>> {
        base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(data)
            .map_err(|e| AcmeError::crypto(format!("Base64 decode error: {}", e)))
    }

    /// Standard (padded) base64, for contexts outside the ACME wire format
    /// that expect the RFC 4648 alphabet (e.g. embedding a DER blob in a
    /// config file).
    pub fn encode_standard(data: &[u8]) -> String {
        use base64::engine::general_purpose::STANDARD;
        STANDARD.encode(data)
    }

    /// Decode standard (padded) base64.
    pub fn decode_standard(data: &str) -> Result<Vec<u8>> {
        use base64::engine::general_purpose::STANDARD;
        STANDARD
            .decode(data)
            .map_err(|e| AcmeError::crypto(format!("Base64 decode error: {}", e)))
    }
}

/// PEM encoder/decoder.
pub struct PemEncoding;

impl PemEncoding {
    /// Encode binary data as PEM with the given label.
    pub fn encode(data: &[u8], label: &str) -> String {
        let pem = pem::Pem::new(label.to_string(), data.to_vec());
        pem::encode(&pem)
    }

    /// Decode PEM text into its label and binary contents.
    pub fn decode(pem_data: &str) -> Result<(String, Vec<u8>)> {
        let pem = pem::parse(pem_data)
            .map_err(|e| AcmeError::crypto(format!("PEM parse error: {}", e)))?;

        Ok((pem.tag().to_string(), pem.contents().to_vec()))
    }

    pub fn is_valid(data: &str) -> bool {
        pem::parse(data).is_ok()
    }

    pub fn extract_data(pem_data: &str, expected_label: Option<&str>) -> Result<Vec<u8>> {
        let (label, data) = Self::decode(pem_data)?;

        if let Some(expected) = expected_label {
            if label != expected {
                return Err(AcmeError::crypto(format!(
                    "Expected PEM label '{}', got '{}'",
                    expected, label
                )));
            }
        }

        Ok(data)
    }
}

/// Hex encoder/decoder (lowercase).
pub struct HexEncoding;

impl HexEncoding {
    pub fn encode(data: &[u8]) -> String {
        hex::encode(data)
    }

    pub fn decode(hex_str: &str) -> Result<Vec<u8>> {
        hex::decode(hex_str).map_err(|e| AcmeError::crypto(format!("Hex decode error: {}", e)))
    }
}

/// Lowercase, unpadded base32 (RFC 4648), used for the dns-account-01
/// RR-name prefix.
pub struct Base32Encoding;

impl Base32Encoding {
    pub fn encode_lower(data: &[u8]) -> String {
        base32::encode(base32::Alphabet::Rfc4648Lower { padding: false }, data)
    }

    pub fn decode_lower(data: &str) -> Result<Vec<u8>> {
        base32::decode(base32::Alphabet::Rfc4648Lower { padding: false }, data)
            .ok_or_else(|| AcmeError::crypto("invalid base32 input"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"hello world";
        let encoded = Base64Encoding::encode(data);
        let decoded = Base64Encoding::decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64_url_safe() {
        let data = b"\xfb\xff\xfe";
        let encoded = Base64Encoding::encode(data);
        // URL-safe should use - and _ instead of + and /
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn test_pem_encode_decode() {
        let data = b"test data";
        let pem = PemEncoding::encode(data, "TEST");

        assert!(pem.contains("-----BEGIN TEST-----"));
        assert!(pem.contains("-----END TEST-----"));

        let (label, decoded) = PemEncoding::decode(&pem).unwrap();
        assert_eq!(label, "TEST");
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_hex_encode_decode() {
        let data = b"test";
        let hex = HexEncoding::encode(data);
        let decoded = HexEncoding::decode(&hex).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base32_lowercase_no_padding() {
        let data = b"\x00\x01\x02\x03\x04\x05\x06\x07\x08\x09";
        let encoded = Base32Encoding::encode_lower(data);
        assert!(encoded.chars().all(|c| !c.is_ascii_uppercase()));
        assert!(!encoded.contains('='));
        let decoded = Base32Encoding::decode_lower(&encoded).unwrap();
        assert_eq!(decoded, data);
    }
}
