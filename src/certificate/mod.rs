//! Certificate resources: download, alternate chains, revocation
//! (RFC 8555 §7.4.2/§7.6), and ARI renewal-info lookups (draft-ietf-acme-ari).

pub mod chain;

pub use chain::CertificateChain;

use crate::crypto::encoding::Base64Encoding;
use crate::crypto::keypair::KeyPair;
use crate::crypto::signer::JwkSigner;
use crate::error::{AcmeError, Result};
use crate::session::{Login, Session};
use crate::types::RevocationReason;

/// An issued certificate: the default chain the server returned, plus
/// any alternates it advertised via `Link: rel="alternate"`.
#[derive(Debug, Clone)]
pub struct Certificate {
    url: String,
    chain: CertificateChain,
    alternate_urls: Vec<String>,
}

impl Certificate {
    pub fn chain(&self) -> &CertificateChain {
        &self.chain
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn alternate_urls(&self) -> &[String] {
        &self.alternate_urls
    }

    /// Download the default certificate chain, RFC 8555 §7.4.2. The
    /// response body is PEM text, not JSON, so this goes through
    /// [`crate::connection::Connection::post_as_get_raw`] rather than the
    /// JSON-parsing call every other resource uses.
    pub async fn download(login: &Login, url: &str) -> Result<Certificate> {
        let raw = login
            .session()
            .connection()
            .post_as_get_raw(url, login.signer())
            .await?;
        let chain = CertificateChain::from_pem(&raw.body)?;
        let alternate_urls = raw
            .links
            .get("alternate")
            .cloned()
            .unwrap_or_default();
        Ok(Certificate {
            url: url.to_string(),
            chain,
            alternate_urls,
        })
    }

    /// Find the certificate in `{self} ∪ alternates` whose chain was
    /// issued by `issuer_common_name` (RFC 8555 §7.4.2), downloading each
    /// alternate chain in turn until one matches.
    pub async fn find_certificate(&self, login: &Login, issuer_common_name: &str) -> Result<Option<Certificate>> {
        if self.chain.contains_issuer_common_name(issuer_common_name)? {
            return Ok(Some(self.clone()));
        }
        for url in &self.alternate_urls {
            let candidate = Certificate::download(login, url).await?;
            if candidate.chain.contains_issuer_common_name(issuer_common_name)? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// ARI (RFC 9773) `CertID` for this certificate: base64url(SHA-256(issuer
    /// public key info)) `.` base64url(serial number), used both as a
    /// renewal-info lookup key and as `NewOrderRequest::replaces`. Requires
    /// the issuing intermediate to be present in the downloaded chain.
    pub fn ari_cert_id(&self) -> Result<String> {
        let issuer_der = self
            .chain
            .intermediates
            .first()
            .ok_or_else(|| AcmeError::crypto("chain has no issuer certificate to derive a CertID from"))?;
        cert_id(&self.chain.leaf, issuer_der)
    }

    /// Full URL to query this certificate's ARI renewal window, if the
    /// server advertises the `renewalInfo` endpoint.
    pub async fn renewal_info_url(&self, session: &Session) -> Result<Option<String>> {
        let Some(base) = session.resource_url("renewalInfo").await? else {
            return Ok(None);
        };
        Ok(Some(format!("{}/{}", base.trim_end_matches('/'), self.ari_cert_id()?)))
    }

    /// Revoke using the account key that owns this certificate, RFC 8555
    /// §7.6 mode 1.
    pub async fn revoke(&self, login: &Login, reason: Option<RevocationReason>) -> Result<()> {
        revoke_der(login.session(), login.signer(), &self.chain.leaf, reason).await
    }
}

/// Revoke an arbitrary certificate (not necessarily one issued to this
/// account) using the account key, RFC 8555 §7.6 mode 2.
pub async fn revoke_external(
    login: &Login,
    certificate_der: &[u8],
    reason: Option<RevocationReason>,
) -> Result<()> {
    revoke_der(login.session(), login.signer(), certificate_der, reason).await
}

/// Revoke using the certificate's own key pair rather than an account
/// key, RFC 8555 §7.6 mode 3 — the server accepts this as proof of
/// control over the private key even with no registered account.
pub async fn revoke_with_certificate_key(
    session: &Session,
    certificate_der: &[u8],
    certificate_key: &KeyPair,
    reason: Option<RevocationReason>,
) -> Result<()> {
    let signer: &dyn JwkSigner = certificate_key;
    revoke_der(
        session,
        crate::connection::RequestSigner::Jwk(signer),
        certificate_der,
        reason,
    )
    .await
}

async fn revoke_der(
    session: &Session,
    signer: crate::connection::RequestSigner<'_>,
    certificate_der: &[u8],
    reason: Option<RevocationReason>,
) -> Result<()> {
    let revoke_url = session
        .resource_url("revokeCert")
        .await?
        .ok_or_else(|| AcmeError::not_supported("server directory has no revokeCert endpoint"))?;
    let mut payload = serde_json::json!({
        "certificate": Base64Encoding::encode(certificate_der),
    });
    if let Some(reason) = reason {
        payload["reason"] = serde_json::json!(reason.as_u8());
    }
    session.connection().post_signed(&revoke_url, signer, &payload).await?;
    Ok(())
}

/// ARI `CertID`, RFC 9773 §4.1: base64url(SHA-256(issuer `SubjectPublicKeyInfo`
/// DER)) `.` base64url(serial number).
fn cert_id(leaf_der: &[u8], issuer_der: &[u8]) -> Result<String> {
    use x509_parser::asn1_rs::FromDer;
    use x509_parser::certificate::X509Certificate;

    let (_, leaf) = X509Certificate::from_der(leaf_der)
        .map_err(|e| AcmeError::crypto(format!("invalid leaf certificate: {e}")))?;
    let (_, issuer) = X509Certificate::from_der(issuer_der)
        .map_err(|e| AcmeError::crypto(format!("invalid issuer certificate: {e}")))?;

    let spki_hash = crate::crypto::hash::Sha256Hash::hash(issuer.tbs_certificate.subject_pki.raw)?;
    let serial = leaf.raw_serial();

    Ok(format!(
        "{}.{}",
        Base64Encoding::encode(&spki_hash),
        Base64Encoding::encode(serial)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cert_id_combines_issuer_spki_hash_with_leaf_serial() {
        let issuer_key = rcgen::KeyPair::generate().unwrap();
        let issuer_params = rcgen::CertificateParams::new(Vec::new()).unwrap();
        let issuer_cert = issuer_params.self_signed(&issuer_key).unwrap();

        let leaf_key = rcgen::KeyPair::generate().unwrap();
        let leaf_params = rcgen::CertificateParams::new(vec!["example.com".to_string()]).unwrap();
        let leaf_cert = leaf_params.self_signed(&leaf_key).unwrap();

        let id = cert_id(leaf_cert.der(), issuer_cert.der()).unwrap();
        assert!(id.contains('.'));
        let id_again = cert_id(leaf_cert.der(), issuer_cert.der()).unwrap();
        assert_eq!(id, id_again);
    }

    #[test]
    fn revoke_der_payload_encodes_reason() {
        let der = b"not-a-real-cert";
        let mut payload = serde_json::json!({ "certificate": Base64Encoding::encode(der) });
        payload["reason"] = serde_json::json!(RevocationReason::KeyCompromise.as_u8());
        assert_eq!(payload["reason"], serde_json::json!(1));
    }
}
