//! Account registration, RFC 8555 §7.3.

use super::Account;
use crate::connection::RequestSigner;
use crate::crypto::keypair::KeyPair;
use crate::crypto::signer::{HmacSigner, JwkSigner, Signer};
use crate::error::{AcmeError, Result};
use crate::protocol::jws::sign_flattened;
use crate::session::{Login, Session};
use crate::types::Contact;

/// Builds a `newAccount` request, RFC 8555 §7.3.
#[derive(Default)]
pub struct AccountBuilder {
    contacts: Vec<Contact>,
    terms_of_service_agreed: bool,
    only_return_existing: bool,
    external_account_binding: Option<(String, Vec<u8>)>,
}

impl AccountBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contact(mut self, contact: Contact) -> Self {
        self.contacts.push(contact);
        self
    }

    pub fn agree_to_terms_of_service(mut self) -> Self {
        self.terms_of_service_agreed = true;
        self
    }

    /// Ask the server to return the existing account for this key rather
    /// than creating a new one, failing if none exists (RFC 8555 §7.3.1).
    pub fn only_existing(mut self) -> Self {
        self.only_return_existing = true;
        self
    }

    /// Bind this account to an external account at the CA, RFC 8555
    /// §7.3.4. `eab_kid` and `hmac_key` come from the CA out of band.
    pub fn external_account_binding(mut self, eab_kid: impl Into<String>, hmac_key: Vec<u8>) -> Self {
        self.external_account_binding = Some((eab_kid.into(), hmac_key));
        self
    }

    /// Submit the registration and log in as the resulting account.
    pub async fn create(self, session: &Session, key_pair: KeyPair) -> Result<(Account, Login)> {
        for contact in &self.contacts {
            contact.validate()?;
        }

        let new_account_url = session
            .resource_url("newAccount")
            .await?
            .ok_or_else(|| AcmeError::not_supported("server directory has no newAccount endpoint"))?;

        let mut payload = serde_json::json!({
            "termsOfServiceAgreed": self.terms_of_service_agreed,
        });
        if !self.contacts.is_empty() {
            payload["contact"] = serde_json::json!(
                self.contacts.iter().map(Contact::to_uri).collect::<Vec<_>>()
            );
        }
        if self.only_return_existing {
            payload["onlyReturnExisting"] = serde_json::json!(true);
        }
        if let Some((eab_kid, hmac_key)) = &self.external_account_binding {
            payload["externalAccountBinding"] =
                build_external_account_binding(&key_pair, &new_account_url, eab_kid, hmac_key)?;
        }

        let signer: &dyn JwkSigner = &key_pair;
        let response = session
            .connection()
            .post_signed(&new_account_url, RequestSigner::Jwk(signer), &payload)
            .await?;
        let kid = response
            .location
            .clone()
            .ok_or_else(|| AcmeError::protocol("$".to_string(), "newAccount response missing Location header".to_string()))?;

        let account = Account::from_json(kid.clone(), &response.body)?;
        let login = session.login(key_pair, kid);
        Ok((account, login))
    }
}

/// Sign the embedded EAB JWS, RFC 8555 §7.3.4: protected header carries
/// `alg`/`kid`/`url`, no `nonce`; payload is the account key's public JWK;
/// signature is over the MAC key the CA provisioned out of band.
fn build_external_account_binding(
    key_pair: &KeyPair,
    new_account_url: &str,
    eab_kid: &str,
    hmac_key: &[u8],
) -> Result<serde_json::Value> {
    let signer = HmacSigner::new(hmac_key.to_vec());
    let protected = serde_json::json!({
        "alg": signer.algorithm(),
        "kid": eab_kid,
        "url": new_account_url,
    });
    let payload = key_pair.jwk()?.to_value();
    let jws = sign_flattened(&protected, &payload, &signer)?;
    Ok(serde_json::json!({
        "protected": jws.protected,
        "payload": jws.payload,
        "signature": jws.signature,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keypair::KeyType;

    #[test]
    fn external_account_binding_jws_carries_eab_kid_and_url() {
        let key_pair = KeyPair::generate(KeyType::EcdsaP256).unwrap();
        let eab = build_external_account_binding(
            &key_pair,
            "https://example.com/acme/new-account",
            "eab-kid-1",
            &[0u8; 32],
        )
        .unwrap();
        assert!(eab["protected"].as_str().is_some());
        assert!(eab["payload"].as_str().is_some());
        assert!(eab["signature"].as_str().is_some());
    }

    #[test]
    fn builder_defaults_to_no_terms_agreed() {
        let builder = AccountBuilder::new();
        assert!(!builder.terms_of_service_agreed);
        assert!(builder.contacts.is_empty());
    }
}
