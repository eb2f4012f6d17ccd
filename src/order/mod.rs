//! Order resources, RFC 8555 §7.1.3/§7.4: the identifiers being requested,
//! the authorizations that must be satisfied, and finalization into a
//! certificate once they are.

pub mod authorization;

pub use authorization::Authorization;

use crate::crypto::encoding::Base64Encoding;
use crate::error::{AcmeError, Result};
use crate::json::Json;
use crate::problem::Problem;
use crate::session::Login;
use crate::types::{Identifier, OrderStatus};
use jiff::Timestamp;
use serde::Serialize;

/// Body of a `newOrder` request, RFC 8555 §7.4.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderRequest {
    pub identifiers: Vec<Identifier>,
    #[serde(rename = "notBefore", skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    #[serde(rename = "notAfter", skip_serializing_if = "Option::is_none")]
    pub not_after: Option<String>,
    /// Named issuance profile to request (draft-ietf-acme-profiles),
    /// only meaningful when the directory advertises one by this name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// ARI `CertID` of the certificate this order replaces
    /// (draft-ietf-acme-ari), signaling a renewal rather than a fresh issuance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
}

impl NewOrderRequest {
    pub fn new(domains: Vec<String>) -> Self {
        Self::for_identifiers(domains.into_iter().map(Identifier::dns).collect())
    }

    pub fn for_identifiers(identifiers: Vec<Identifier>) -> Self {
        Self {
            identifiers,
            not_before: None,
            not_after: None,
            profile: None,
            replaces: None,
        }
    }

    pub fn with_not_before(mut self, not_before: impl Into<String>) -> Self {
        self.not_before = Some(not_before.into());
        self
    }

    pub fn with_not_after(mut self, not_after: impl Into<String>) -> Self {
        self.not_after = Some(not_after.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_replaces(mut self, cert_id: impl Into<String>) -> Self {
        self.replaces = Some(cert_id.into());
        self
    }
}

/// Body of a `finalize` request, RFC 8555 §7.4: a base64url DER CSR.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizationRequest {
    pub csr: String,
}

impl FinalizationRequest {
    pub fn new(csr_der: &[u8]) -> Self {
        Self {
            csr: Base64Encoding::encode(csr_der),
        }
    }
}

/// An order resource. Fetch with [`Order::create`] or [`Order::fetch`];
/// refresh in place with [`Order::update`].
#[derive(Debug, Clone)]
pub struct Order {
    url: String,
    status: OrderStatus,
    expires: Option<Timestamp>,
    identifiers: Vec<Identifier>,
    not_before: Option<Timestamp>,
    not_after: Option<Timestamp>,
    error: Option<Problem>,
    authorizations: Vec<String>,
    finalize: String,
    certificate: Option<String>,
}

impl Order {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn expires(&self) -> Option<Timestamp> {
        self.expires
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn error(&self) -> Option<&Problem> {
        self.error.as_ref()
    }

    pub fn authorization_urls(&self) -> &[String] {
        &self.authorizations
    }

    pub fn certificate_url(&self) -> Option<&str> {
        self.certificate.as_deref()
    }

    /// Submit a `newOrder` request and return the resulting order,
    /// identified by the `Location` header RFC 8555 §7.4 requires.
    pub async fn create(login: &Login, request: &NewOrderRequest) -> Result<Order> {
        let new_order_url = login
            .session()
            .resource_url("newOrder")
            .await?
            .ok_or_else(|| AcmeError::not_supported("server directory has no newOrder endpoint"))?;
        let payload = serde_json::to_value(request)?;
        let response = login
            .session()
            .connection()
            .post_signed(&new_order_url, login.signer(), &payload)
            .await?;
        let url = response
            .location
            .clone()
            .ok_or_else(|| AcmeError::protocol("$", "newOrder response missing Location header"))?;
        Self::from_json(url, &response.body)
    }

    /// Fetch an existing order by URL (e.g. one recovered from storage).
    pub async fn fetch(login: &Login, url: impl Into<String>) -> Result<Order> {
        let url = url.into();
        let response = login.session().connection().post_as_get(&url, login.signer()).await?;
        Self::from_json(url, &response.body)
    }

    /// Re-fetch this order's current state in place. Returns the server's
    /// `Retry-After` hint as an absolute instant, if any; callers must not
    /// poll again before it.
    pub async fn update(&mut self, login: &Login) -> Result<Option<Timestamp>> {
        let response = login
            .session()
            .connection()
            .post_as_get(&self.url, login.signer())
            .await?;
        let retry_after = response.retry_after_instant()?;
        let fresh = Self::from_json(self.url.clone(), &response.body)?;
        *self = fresh;
        Ok(retry_after)
    }

    /// Fetch every authorization this order lists.
    pub async fn authorizations(&self, login: &Login) -> Result<Vec<Authorization>> {
        let mut out = Vec::with_capacity(self.authorizations.len());
        for url in &self.authorizations {
            out.push(Authorization::fetch(login, url.clone()).await?);
        }
        Ok(out)
    }

    /// Finalize with a DER-encoded CSR, RFC 8555 §7.4. Fails locally
    /// without a network call if the order isn't `ready` yet — finalizing
    /// a non-ready order is always rejected server-side, so there's no
    /// reason to round-trip to find that out.
    pub async fn finalize(&mut self, login: &Login, csr_der: &[u8]) -> Result<Option<Timestamp>> {
        if self.status != OrderStatus::Ready {
            return Err(AcmeError::state(format!(
                "cannot finalize order in status '{}', must be 'ready'",
                self.status
            )));
        }
        let payload = serde_json::to_value(FinalizationRequest::new(csr_der))?;
        let response = login
            .session()
            .connection()
            .post_signed(&self.finalize, login.signer(), &payload)
            .await?;
        let retry_after = response.retry_after_instant()?;
        let fresh = Self::from_json(self.url.clone(), &response.body)?;
        *self = fresh;
        Ok(retry_after)
    }

    /// Download the issued certificate once `status` is `valid`.
    pub async fn download_certificate(&self, login: &Login) -> Result<crate::certificate::Certificate> {
        let url = self
            .certificate
            .as_deref()
            .ok_or_else(|| AcmeError::state("order has no certificate yet; finalize and poll to 'valid' first"))?;
        crate::certificate::Certificate::download(login, url).await
    }

    fn from_json(url: String, value: &serde_json::Value) -> Result<Order> {
        let root = Json::root(value);
        let status = root.field("status")?.as_status::<OrderStatus>()?;
        let expires = root.optional_field("expires")?.map(|e| e.as_instant()).transpose()?;
        let identifiers = root
            .field("identifiers")?
            .as_array()?
            .iter()
            .map(|i| i.as_identifier())
            .collect::<Result<Vec<_>>>()?;
        let not_before = root
            .optional_field("notBefore")?
            .map(|v| v.as_instant())
            .transpose()?;
        let not_after = root.optional_field("notAfter")?.map(|v| v.as_instant()).transpose()?;
        let error = root
            .optional_field("error")?
            .map(|e| serde_json::from_value::<Problem>(e.raw().clone()))
            .transpose()
            .map_err(|e| AcmeError::protocol(root.path(), format!("malformed order error: {e}")))?;
        let authorizations = root
            .field("authorizations")?
            .as_array()?
            .iter()
            .map(|a| a.as_url())
            .collect::<Result<Vec<_>>>()?;
        let finalize = root.field("finalize")?.as_url()?;
        let certificate = root.optional_field("certificate")?.map(|c| c.as_url()).transpose()?;

        Ok(Order {
            url,
            status,
            expires,
            identifiers,
            not_before,
            not_after,
            error,
            authorizations,
            finalize,
            certificate,
        })
    }
}
