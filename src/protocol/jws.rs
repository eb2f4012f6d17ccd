//! Flattened-JSON JWS construction, RFC 8555 §6.2.

use crate::crypto::encoding::Base64Encoding;
use crate::crypto::signer::Signer;
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

/// A JWS in the flattened JSON serialization ACME request bodies use:
/// `{"protected": ..., "payload": ..., "signature": ...}` — never the
/// dot-joined compact form, which RFC 8555 servers reject.
#[derive(Debug, Clone, Serialize)]
pub struct FlattenedJws {
    pub protected: String,
    pub payload: String,
    pub signature: String,
}

/// Sign a protected header over a JSON payload.
pub fn sign_flattened(
    protected: &Value,
    payload: &Value,
    signer: &dyn Signer,
) -> Result<FlattenedJws> {
    sign_flattened_raw(protected, payload.to_string().as_bytes(), signer)
}

/// Sign a protected header over an empty payload, as required for
/// POST-as-GET requests (RFC 8555 §6.3).
pub fn sign_flattened_empty(protected: &Value, signer: &dyn Signer) -> Result<FlattenedJws> {
    sign_flattened_raw(protected, b"", signer)
}

fn sign_flattened_raw(
    protected: &Value,
    payload_bytes: &[u8],
    signer: &dyn Signer,
) -> Result<FlattenedJws> {
    let protected_encoded = Base64Encoding::encode(protected.to_string().as_bytes());
    let payload_encoded = Base64Encoding::encode(payload_bytes);

    let signing_input = format!("{protected_encoded}.{payload_encoded}");
    let signature = signer.sign(signing_input.as_bytes())?;

    Ok(FlattenedJws {
        protected: protected_encoded,
        payload: payload_encoded,
        signature: signature.to_base64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keypair::{KeyPair, KeyType};

    #[test]
    fn produces_three_valid_base64url_fields() {
        let key = KeyPair::generate(KeyType::EcdsaP256).unwrap();
        let protected = serde_json::json!({
            "alg": "ES256",
            "nonce": "test-nonce",
            "url": "https://example.com/acme/new-account"
        });
        let payload = serde_json::json!({"termsOfServiceAgreed": true});

        let jws = sign_flattened(&protected, &payload, &key).unwrap();
        assert!(Base64Encoding::decode(&jws.protected).is_ok());
        assert!(Base64Encoding::decode(&jws.payload).is_ok());
        assert!(Base64Encoding::decode(&jws.signature).is_ok());
        assert!(!jws.signature.is_empty());
    }

    #[test]
    fn empty_payload_encodes_to_empty_string() {
        let key = KeyPair::generate(KeyType::EcdsaP256).unwrap();
        let protected = serde_json::json!({
            "alg": "ES256",
            "nonce": "test-nonce",
            "url": "https://example.com/acme/new-nonce"
        });
        let jws = sign_flattened_empty(&protected, &key).unwrap();
        assert_eq!(jws.payload, "");
    }
}
