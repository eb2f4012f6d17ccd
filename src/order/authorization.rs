//! Authorization resources, RFC 8555 §7.1.4: the set of challenges an
//! identifier must satisfy before an order can be finalized.

use crate::challenge::Challenge;
use crate::error::Result;
use crate::json::Json;
use crate::session::Login;
use crate::types::{AuthorizationStatus, ChallengeType, Identifier};
use jiff::Timestamp;

/// An authorization resource. Fetch with [`Authorization::fetch`]
/// (or via [`crate::order::Order::authorizations`]); refresh in place
/// with [`Authorization::update`].
#[derive(Debug, Clone)]
pub struct Authorization {
    url: String,
    identifier: Identifier,
    status: AuthorizationStatus,
    expires: Option<Timestamp>,
    challenges: Vec<Challenge>,
    wildcard: bool,
    subdomain_auth_allowed: bool,
}

impl Authorization {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn status(&self) -> AuthorizationStatus {
        self.status
    }

    pub fn expires(&self) -> Option<Timestamp> {
        self.expires
    }

    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// True when this authorization may be satisfied by proving control
    /// of an ancestor domain rather than the exact identifier (draft
    /// subdomain-auth extension; only meaningful when the directory's
    /// `meta.subdomainAuthAllowed` advertises the feature).
    pub fn is_subdomain_auth_allowed(&self) -> bool {
        self.subdomain_auth_allowed
    }

    pub fn find_challenge(&self, challenge_type: ChallengeType) -> Option<&Challenge> {
        self.challenges
            .iter()
            .find(|c| c.challenge_type() == challenge_type.as_str())
    }

    pub fn find_challenge_mut(&mut self, challenge_type: ChallengeType) -> Option<&mut Challenge> {
        self.challenges
            .iter_mut()
            .find(|c| c.challenge_type() == challenge_type.as_str())
    }

    pub async fn fetch(login: &Login, url: impl Into<String>) -> Result<Authorization> {
        let url = url.into();
        let response = login.session().connection().post_as_get(&url, login.signer()).await?;
        Self::from_json(url, &response.body)
    }

    /// Re-fetch this authorization's current state in place. Returns the
    /// server's `Retry-After` hint as an absolute instant, if any; callers
    /// must not poll again before it.
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

    /// Voluntarily deactivate this authorization, RFC 8555 §7.5.2.
    pub async fn deactivate(&mut self, login: &Login) -> Result<()> {
        let payload = serde_json::json!({"status": "deactivated"});
        let response = login
            .session()
            .connection()
            .post_signed(&self.url, login.signer(), &payload)
            .await?;
        let fresh = Self::from_json(self.url.clone(), &response.body)?;
        *self = fresh;
        Ok(())
    }

    fn from_json(url: String, value: &serde_json::Value) -> Result<Authorization> {
        let root = Json::root(value);
        let identifier = root.field("identifier")?.as_identifier()?;
        let status = root.field("status")?.as_status::<AuthorizationStatus>()?;
        let expires = root.optional_field("expires")?.map(|e| e.as_instant()).transpose()?;
        let challenges = root
            .field("challenges")?
            .as_array()?
            .iter()
            .map(|c| Challenge::from_json(c.raw()))
            .collect::<Result<Vec<_>>>()?;
        let wildcard = root
            .optional_field("wildcard")?
            .map(|w| w.as_bool())
            .transpose()?
            .unwrap_or(false);
        let subdomain_auth_allowed = root
            .on_feature("subdomainAuthAllowed")?
            .map(|w| w.as_bool())
            .transpose()?
            .unwrap_or(false);

        Ok(Authorization {
            url,
            identifier,
            status,
            expires,
            challenges,
            wildcard,
            subdomain_auth_allowed,
        })
    }
}
