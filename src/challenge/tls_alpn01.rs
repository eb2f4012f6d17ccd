//! `tls-alpn-01` derivation, RFC 8737. The validating client opens a TLS
//! connection offering the `acme-tls/1` ALPN protocol and checks for a
//! self-signed certificate carrying the SHA-256 digest of the key
//! authorization in the `id-pe-acmeIdentifier` extension. This crate
//! builds that certificate; serving it over an actual TLS listener is
//! the caller's job.

use crate::error::{AcmeError, Result};
use crate::session::Login;
use rcgen::{CertificateParams, CustomExtension, KeyPair as RcgenKeyPair};

use super::Challenge;

/// ALPN protocol identifier a TLS-ALPN-01 listener must negotiate.
pub const ALPN_PROTOCOL: &[u8] = b"acme-tls/1";

impl Challenge {
    /// Build a self-signed certificate for `domain` carrying the
    /// `acmeIdentifier` extension, for a caller's own TLS-ALPN-01
    /// listener. Returns `(certificate_der, private_key_der)`.
    pub fn tls_alpn01_self_signed_certificate(&self, login: &Login, domain: &str) -> Result<(Vec<u8>, Vec<u8>)> {
        let key_authorization = self.key_authorization(login)?;
        let digest = crate::crypto::hash::Sha256Hash::hash(key_authorization.as_bytes())?;
        build_self_signed_certificate(domain, &digest)
    }
}

/// Build the self-signed certificate directly from a precomputed
/// SHA-256 digest, without needing a full [`Login`].
pub fn build_self_signed_certificate(domain: &str, digest: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut params = CertificateParams::new(vec![domain.to_string()])
        .map_err(|e| AcmeError::crypto(format!("invalid domain for certificate: {e}")))?;
    params
        .custom_extensions
        .push(CustomExtension::new_acme_identifier(digest));

    let key_pair =
        RcgenKeyPair::generate().map_err(|e| AcmeError::crypto(format!("key generation failed: {e}")))?;
    let certificate = params
        .self_signed(&key_pair)
        .map_err(|e| AcmeError::crypto(format!("self-signed certificate failed: {e}")))?;

    Ok((certificate.der().to_vec(), key_pair.serialize_der()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_self_signed_certificate_with_acme_identifier() {
        let digest = crate::crypto::hash::Sha256Hash::hash(b"test.token.thumbprint").unwrap();
        let (der, key_der) = build_self_signed_certificate("example.com", &digest).unwrap();
        assert!(!der.is_empty());
        assert!(!key_der.is_empty());
    }

    #[test]
    fn extension_value_matches_the_rfc8555_worked_example() {
        let key_authorization =
            "rSoI9JpyvFi-ltdnBW0W1DjKstzG7cHixjzcOjwzAEQ.HnWjTDnyqlCrm6tZ-6wX-TrEXgRdeNu9G71gqxSO6o0";
        let digest = crate::crypto::hash::Sha256Hash::hash(key_authorization.as_bytes()).unwrap();
        assert_eq!(digest.len(), 32);
        let base64_digest = crate::crypto::hash::Sha256Hash::hash_base64(key_authorization.as_bytes()).unwrap();
        assert_eq!(base64_digest, crate::challenge::digest_key_authorization(key_authorization).unwrap());
    }
}
