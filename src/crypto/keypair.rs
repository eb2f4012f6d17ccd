//! Key pairs used to sign ACME requests: ECDSA P-256/P-384 (generated
//! in-process via `ring`) and RSA 2048/4096 (loaded from an existing
//! PKCS#8 document — `ring` has no RSA key generator).

use crate::crypto::signer::{Signature, Signer};
use crate::error::{AcmeError, Result};
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, KeyPair as _, RsaKeyPair};
use std::sync::Arc;

/// Signing algorithm family and strength, per RFC 8555 §6.2 / JWA (RFC 7518).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    EcdsaP256,
    EcdsaP384,
    Rsa2048,
    Rsa4096,
}

impl KeyType {
    /// JWS `alg` header value this key type signs with.
    pub fn jwa_algorithm(&self) -> &'static str {
        match self {
            KeyType::EcdsaP256 => "ES256",
            KeyType::EcdsaP384 => "ES384",
            KeyType::Rsa2048 | KeyType::Rsa4096 => "RS256",
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyType::EcdsaP256 => write!(f, "ECDSA-P256"),
            KeyType::EcdsaP384 => write!(f, "ECDSA-P384"),
            KeyType::Rsa2048 => write!(f, "RSA-2048"),
            KeyType::Rsa4096 => write!(f, "RSA-4096"),
        }
    }
}

enum Inner {
    Ecdsa {
        pair: EcdsaKeyPair,
        curve: KeyType,
        pkcs8: Vec<u8>,
    },
    Rsa {
        pair: RsaKeyPair,
        pkcs8: Vec<u8>,
    },
}

/// An account/order key pair capable of signing JWS bodies and
/// describing itself as a JWK.
pub struct KeyPair(Arc<Inner>);

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        KeyPair(self.0.clone())
    }
}

impl KeyPair {
    /// Generate a fresh ECDSA key pair. RSA keys cannot be generated by
    /// `ring`; load one with [`KeyPair::from_pkcs8`] instead.
    pub fn generate(key_type: KeyType) -> Result<Self> {
        let rng = SystemRandom::new();
        let alg = match key_type {
            KeyType::EcdsaP256 => &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            KeyType::EcdsaP384 => &signature::ECDSA_P384_SHA384_FIXED_SIGNING,
            KeyType::Rsa2048 | KeyType::Rsa4096 => {
                return Err(AcmeError::crypto(
                    "RSA key generation is not supported in-process; load an existing \
                     PKCS#8 key with KeyPair::from_pkcs8",
                ));
            }
        };
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(alg, &rng)
            .map_err(|e| AcmeError::crypto(format!("key generation failed: {e}")))?;
        let pair = EcdsaKeyPair::from_pkcs8(alg, pkcs8.as_ref(), &rng)
            .map_err(|e| AcmeError::crypto(format!("key parse failed: {e}")))?;
        Ok(KeyPair(Arc::new(Inner::Ecdsa {
            pair,
            curve: key_type,
            pkcs8: pkcs8.as_ref().to_vec(),
        })))
    }

    /// Load a key pair from a PKCS#8 document, trying ECDSA P-256, then
    /// P-384, then RSA.
    pub fn from_pkcs8(key_type: KeyType, pkcs8: &[u8]) -> Result<Self> {
        let rng = SystemRandom::new();
        match key_type {
            KeyType::EcdsaP256 => {
                let pair =
                    EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
                        .map_err(|e| AcmeError::crypto(format!("invalid P-256 key: {e}")))?;
                Ok(KeyPair(Arc::new(Inner::Ecdsa {
                    pair,
                    curve: key_type,
                    pkcs8: pkcs8.to_vec(),
                })))
            }
            KeyType::EcdsaP384 => {
                let pair =
                    EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P384_SHA384_FIXED_SIGNING, pkcs8, &rng)
                        .map_err(|e| AcmeError::crypto(format!("invalid P-384 key: {e}")))?;
                Ok(KeyPair(Arc::new(Inner::Ecdsa {
                    pair,
                    curve: key_type,
                    pkcs8: pkcs8.to_vec(),
                })))
            }
            KeyType::Rsa2048 | KeyType::Rsa4096 => {
                let pair = RsaKeyPair::from_pkcs8(pkcs8)
                    .map_err(|e| AcmeError::crypto(format!("invalid RSA key: {e}")))?;
                Ok(KeyPair(Arc::new(Inner::Rsa {
                    pair,
                    pkcs8: pkcs8.to_vec(),
                })))
            }
        }
    }

    pub fn key_type(&self) -> KeyType {
        match &*self.0 {
            Inner::Ecdsa { curve, .. } => *curve,
            Inner::Rsa { pair, .. } => {
                if pair.public().as_ref().len() > 270 {
                    KeyType::Rsa4096
                } else {
                    KeyType::Rsa2048
                }
            }
        }
    }

    pub fn jwa_algorithm(&self) -> &'static str {
        self.key_type().jwa_algorithm()
    }

    pub fn pkcs8_der(&self) -> &[u8] {
        match &*self.0 {
            Inner::Ecdsa { pkcs8, .. } => pkcs8,
            Inner::Rsa { pkcs8, .. } => pkcs8,
        }
    }

    /// Raw public key bytes: uncompressed EC point, or DER-encoded
    /// `RSAPublicKey` (PKCS#1) for RSA.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        match &*self.0 {
            Inner::Ecdsa { pair, .. } => pair.public_key().as_ref().to_vec(),
            Inner::Rsa { pair, .. } => pair.public().as_ref().to_vec(),
        }
    }
}

impl crate::crypto::signer::JwkSigner for KeyPair {
    fn jwk(&self) -> Result<crate::crypto::jwk::Jwk> {
        crate::crypto::jwk::Jwk::from_keypair(self)
    }
}

impl Signer for KeyPair {
    fn sign(&self, data: &[u8]) -> Result<Signature> {
        let rng = SystemRandom::new();
        let bytes = match &*self.0 {
            Inner::Ecdsa { pair, .. } => pair
                .sign(&rng, data)
                .map_err(|e| AcmeError::crypto(format!("signing failed: {e}")))?
                .as_ref()
                .to_vec(),
            Inner::Rsa { pair, .. } => {
                let mut sig = vec![0u8; pair.public().modulus_len()];
                pair.sign(&signature::RSA_PKCS1_SHA256, &rng, data, &mut sig)
                    .map_err(|e| AcmeError::crypto(format!("signing failed: {e}")))?;
                sig
            }
        };
        Ok(Signature::new(bytes, self.jwa_algorithm().to_string()))
    }

    fn algorithm(&self) -> &str {
        self.jwa_algorithm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_p256_and_signs() {
        let key = KeyPair::generate(KeyType::EcdsaP256).unwrap();
        assert_eq!(key.jwa_algorithm(), "ES256");
        let sig = key.sign(b"hello").unwrap();
        assert_eq!(sig.algorithm, "ES256");
        assert!(!sig.data.is_empty());
    }

    #[test]
    fn generates_p384_and_signs() {
        let key = KeyPair::generate(KeyType::EcdsaP384).unwrap();
        assert_eq!(key.jwa_algorithm(), "ES384");
        assert!(!key.sign(b"hello").unwrap().data.is_empty());
    }

    #[test]
    fn rsa_keygen_is_explicitly_unsupported() {
        let result = KeyPair::generate(KeyType::Rsa2048);
        assert!(result.is_err());
    }

    #[test]
    fn roundtrips_through_pkcs8() {
        let key = KeyPair::generate(KeyType::EcdsaP256).unwrap();
        let der = key.pkcs8_der().to_vec();
        let reloaded = KeyPair::from_pkcs8(KeyType::EcdsaP256, &der).unwrap();
        assert_eq!(reloaded.public_key_bytes(), key.public_key_bytes());
    }
}
