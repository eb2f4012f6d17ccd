//! Common signing interface shared by account/order key pairs and the
//! HMAC signer used for external account binding.

use crate::error::{AcmeError, Result};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

/// A digital signature together with the JWA algorithm that produced it.
#[derive(Debug, Clone)]
pub struct Signature {
    pub data: Vec<u8>,
    pub algorithm: String,
}

impl Signature {
    pub fn new(data: Vec<u8>, algorithm: String) -> Self {
        Self { data, algorithm }
    }

    pub fn to_base64(&self) -> String {
        crate::crypto::encoding::Base64Encoding::encode(&self.data)
    }
}

/// Anything that can produce a JWS signature over a byte string.
pub trait Signer: Send + Sync {
    fn sign(&self, data: &[u8]) -> Result<Signature>;
    fn algorithm(&self) -> &str;
}

/// A [`Signer`] that can also describe its own public key, for the `jwk`
/// protected-header field a `newAccount` (or any pre-`kid`) request needs.
/// `HmacSigner` deliberately does not implement this: MAC keys are never
/// embedded as a JWK, only referenced by `kid`.
pub trait JwkSigner: Signer {
    fn jwk(&self) -> Result<crate::crypto::jwk::Jwk>;
}

/// HMAC signer for external account binding (RFC 8555 §7.3.4). The MAC
/// algorithm is selected from the key length in bytes, matching the CA's
/// typical EAB key provisioning (32/48/64-byte keys -> SHA-256/384/512).
pub struct HmacSigner {
    key: Vec<u8>,
    algorithm: &'static str,
}

impl HmacSigner {
    pub fn new(key: Vec<u8>) -> Self {
        let algorithm = match key.len() {
            0..=32 => "HS256",
            33..=48 => "HS384",
            _ => "HS512",
        };
        Self { key, algorithm }
    }

    pub fn sha256(key: Vec<u8>) -> Self {
        Self {
            key,
            algorithm: "HS256",
        }
    }
}

impl Signer for HmacSigner {
    fn sign(&self, data: &[u8]) -> Result<Signature> {
        let bytes = match self.algorithm {
            "HS256" => {
                let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
                    .map_err(|e| AcmeError::crypto(format!("invalid HMAC key: {e}")))?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            "HS384" => {
                let mut mac = Hmac::<Sha384>::new_from_slice(&self.key)
                    .map_err(|e| AcmeError::crypto(format!("invalid HMAC key: {e}")))?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            _ => {
                let mut mac = Hmac::<Sha512>::new_from_slice(&self.key)
                    .map_err(|e| AcmeError::crypto(format!("invalid HMAC key: {e}")))?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(Signature::new(bytes, self.algorithm.to_string()))
    }

    fn algorithm(&self) -> &str {
        self.algorithm
    }
}
