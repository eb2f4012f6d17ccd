//! JSON Web Key (JWK) representation and RFC 7638 thumbprints.

use crate::crypto::encoding::Base64Encoding;
use crate::crypto::keypair::{KeyPair, KeyType};
use crate::error::{AcmeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// JSON Web Key, RFC 7517.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwk {
    pub kty: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,

    #[serde(flatten)]
    pub params: HashMap<String, Value>,
}

impl Jwk {
    pub fn new_rsa(n: impl Into<String>, e: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert("n".to_string(), Value::String(n.into()));
        params.insert("e".to_string(), Value::String(e.into()));

        Self {
            kty: "RSA".to_string(),
            use_: Some("sig".to_string()),
            key_ops: None,
            params,
        }
    }

    pub fn new_ec(crv: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert("crv".to_string(), Value::String(crv.into()));
        params.insert("x".to_string(), Value::String(x.into()));
        params.insert("y".to_string(), Value::String(y.into()));

        Self {
            kty: "EC".to_string(),
            use_: Some("sig".to_string()),
            key_ops: None,
            params,
        }
    }

    /// Derive the public JWK from a signing key pair.
    pub fn from_keypair(key: &KeyPair) -> Result<Self> {
        match key.key_type() {
            KeyType::EcdsaP256 | KeyType::EcdsaP384 => {
                let point = key.public_key_bytes();
                let coord_len = match key.key_type() {
                    KeyType::EcdsaP256 => 32,
                    _ => 48,
                };
                if point.len() != 1 + 2 * coord_len || point[0] != 0x04 {
                    return Err(AcmeError::crypto("unexpected EC public key encoding"));
                }
                let x = &point[1..1 + coord_len];
                let y = &point[1 + coord_len..];
                let crv = match key.key_type() {
                    KeyType::EcdsaP256 => "P-256",
                    _ => "P-384",
                };
                Ok(Jwk::new_ec(
                    crv,
                    Base64Encoding::encode(x),
                    Base64Encoding::encode(y),
                ))
            }
            KeyType::Rsa2048 | KeyType::Rsa4096 => {
                let der = key.public_key_bytes();
                let (n, e) = parse_rsa_public_key_der(&der)?;
                Ok(Jwk::new_rsa(Base64Encoding::encode(&n), Base64Encoding::encode(&e)))
            }
        }
    }

    /// RFC 7638 thumbprint: base64url(SHA-256(canonical JWK JSON)).
    pub fn thumbprint_sha256(&self) -> Result<String> {
        match self.kty.as_str() {
            "RSA" => {
                let e = self.require_str("e")?;
                let n = self.require_str("n")?;
                let required = json!({"e": e, "kty": "RSA", "n": n});
                self.compute_thumbprint(&required)
            }
            "EC" => {
                let crv = self.require_str("crv")?;
                let x = self.require_str("x")?;
                let y = self.require_str("y")?;
                let required = json!({"crv": crv, "kty": "EC", "x": x, "y": y});
                self.compute_thumbprint(&required)
            }
            other => Err(AcmeError::invalid_input(format!(
                "unsupported key type: {other}"
            ))),
        }
    }

    fn require_str(&self, key: &str) -> Result<&str> {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| AcmeError::invalid_input(format!("missing JWK member '{key}'")))
    }

    fn compute_thumbprint(&self, required: &Value) -> Result<String> {
        let json_str = required.to_string();
        let mut hasher = Sha256::new();
        hasher.update(json_str.as_bytes());
        Ok(Base64Encoding::encode(&hasher.finalize()))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Parse the minimal DER `RSAPublicKey` (PKCS#1) structure ring's
/// `RsaKeyPair::public()` exposes: `SEQUENCE { n INTEGER, e INTEGER }`.
fn parse_rsa_public_key_der(der: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut cursor = der;
    expect_tag(&mut cursor, 0x30)?;
    let _ = read_der_length(&mut cursor)?;
    let n = read_der_integer(&mut cursor)?;
    let e = read_der_integer(&mut cursor)?;
    Ok((n, e))
}

fn expect_tag(cursor: &mut &[u8], tag: u8) -> Result<()> {
    match cursor.first() {
        Some(&t) if t == tag => {
            *cursor = &cursor[1..];
            Ok(())
        }
        _ => Err(AcmeError::crypto("malformed RSA public key DER")),
    }
}

fn read_der_length(cursor: &mut &[u8]) -> Result<usize> {
    let first = *cursor
        .first()
        .ok_or_else(|| AcmeError::crypto("truncated DER length"))?;
    *cursor = &cursor[1..];
    if first & 0x80 == 0 {
        return Ok(first as usize);
    }
    let n_bytes = (first & 0x7f) as usize;
    if cursor.len() < n_bytes {
        return Err(AcmeError::crypto("truncated DER length"));
    }
    let mut len = 0usize;
    for &b in &cursor[..n_bytes] {
        len = (len << 8) | b as usize;
    }
    *cursor = &cursor[n_bytes..];
    Ok(len)
}

fn read_der_integer(cursor: &mut &[u8]) -> Result<Vec<u8>> {
    expect_tag(cursor, 0x02)?;
    let len = read_der_length(cursor)?;
    if cursor.len() < len {
        return Err(AcmeError::crypto("truncated DER integer"));
    }
    let (value, rest) = cursor.split_at(len);
    *cursor = rest;
    // Strip a single leading zero byte added to keep the integer non-negative.
    let trimmed = if value.len() > 1 && value[0] == 0x00 {
        &value[1..]
    } else {
        value
    };
    Ok(trimmed.to_vec())
}
