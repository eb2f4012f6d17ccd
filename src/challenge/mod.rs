//! Challenge objects, RFC 8555 §8. Every challenge type here is pure data
//! plus the digest/record-name/extension-value derivation the RFC defines —
//! this crate never stands up an HTTP, DNS, or TLS responder itself.
//! Wiring a derived value (a key authorization, a TXT digest, a self-signed
//! certificate) into an actual listener is the caller's job.

pub mod dns01;
pub mod dns_account01;
pub mod http01;
pub mod tls_alpn01;

use crate::crypto::hash::Sha256Hash;
use crate::error::{AcmeError, Result};
use crate::json::Json;
use crate::problem::Problem;
use crate::session::Login;
use crate::types::ChallengeType;
use jiff::Timestamp;

/// Challenge lifecycle state, RFC 8555 §8 (a subset of the authorization
/// states: a challenge is never `deactivated` or `expired` on its own).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Pending,
    Processing,
    Valid,
    Invalid,
}

impl std::str::FromStr for ChallengeStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ChallengeStatus::Pending),
            "processing" => Ok(ChallengeStatus::Processing),
            "valid" => Ok(ChallengeStatus::Valid),
            "invalid" => Ok(ChallengeStatus::Invalid),
            _ => Err(format!("unknown challenge status: {s}")),
        }
    }
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChallengeStatus::Pending => "pending",
            ChallengeStatus::Processing => "processing",
            ChallengeStatus::Valid => "valid",
            ChallengeStatus::Invalid => "invalid",
        };
        write!(f, "{s}")
    }
}

/// Fields every challenge carries regardless of type.
#[derive(Debug, Clone)]
pub struct ChallengeState {
    pub url: String,
    pub status: ChallengeStatus,
    pub token: String,
    pub validated: Option<Timestamp>,
    pub error: Option<Problem>,
}

/// A single challenge on an authorization. Types the server can propose
/// that aren't one of the four known ones are kept as `Generic` rather
/// than dropped, so callers can still read the type string and status.
#[derive(Debug, Clone)]
pub enum Challenge {
    Http01(ChallengeState),
    Dns01(ChallengeState),
    DnsAccount01(ChallengeState),
    TlsAlpn01(ChallengeState),
    Generic { challenge_type: String, state: ChallengeState },
}

impl Challenge {
    pub fn challenge_type(&self) -> &str {
        match self {
            Challenge::Http01(_) => ChallengeType::Http01.as_str(),
            Challenge::Dns01(_) => ChallengeType::Dns01.as_str(),
            Challenge::DnsAccount01(_) => ChallengeType::DnsAccount01.as_str(),
            Challenge::TlsAlpn01(_) => ChallengeType::TlsAlpn01.as_str(),
            Challenge::Generic { challenge_type, .. } => challenge_type,
        }
    }

    pub fn state(&self) -> &ChallengeState {
        match self {
            Challenge::Http01(s)
            | Challenge::Dns01(s)
            | Challenge::DnsAccount01(s)
            | Challenge::TlsAlpn01(s) => s,
            Challenge::Generic { state, .. } => state,
        }
    }

    fn state_mut(&mut self) -> &mut ChallengeState {
        match self {
            Challenge::Http01(s)
            | Challenge::Dns01(s)
            | Challenge::DnsAccount01(s)
            | Challenge::TlsAlpn01(s) => s,
            Challenge::Generic { state, .. } => state,
        }
    }

    pub fn url(&self) -> &str {
        &self.state().url
    }

    pub fn status(&self) -> ChallengeStatus {
        self.state().status
    }

    pub fn token(&self) -> &str {
        &self.state().token
    }

    /// Key authorization, RFC 8555 §8.1: `token || '.' || base64url(JWK thumbprint)`.
    /// Every challenge type's validation material is derived from this.
    pub fn key_authorization(&self, login: &Login) -> Result<String> {
        let thumbprint = login.key_pair().jwk()?.thumbprint_sha256()?;
        Ok(format!("{}.{}", self.token(), thumbprint))
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let root = Json::root(value);
        let challenge_type = root.field("type")?.as_string()?.to_string();
        let url = root.field("url")?.as_url()?;
        let token_field = root.field("token")?;
        let token = token_field.as_string()?.to_string();
        if !token.is_empty() && !token.bytes().all(is_base64url_byte) {
            return Err(AcmeError::protocol(token_field.path(), format!("token '{token}' is not base64url")));
        }
        let status = root
            .optional_field("status")?
            .map(|s| s.as_status::<ChallengeStatus>())
            .transpose()?
            .unwrap_or(ChallengeStatus::Pending);
        let validated = root
            .optional_field("validated")?
            .map(|v| v.as_instant())
            .transpose()?;
        let error = root.optional_field("error")?.map(|e| e.as_problem()).transpose()?;

        let state = ChallengeState {
            url,
            status,
            token,
            validated,
            error,
        };

        Ok(match challenge_type.parse::<ChallengeType>() {
            Ok(ChallengeType::Http01) => Challenge::Http01(state),
            Ok(ChallengeType::Dns01) => Challenge::Dns01(state),
            Ok(ChallengeType::DnsAccount01) => Challenge::DnsAccount01(state),
            Ok(ChallengeType::TlsAlpn01) => Challenge::TlsAlpn01(state),
            Err(_) => Challenge::Generic { challenge_type, state },
        })
    }

    fn apply(&mut self, value: &serde_json::Value) -> Result<()> {
        let fresh = Self::from_json(value)?;
        *self.state_mut() = fresh.state().clone();
        Ok(())
    }

    /// Tell the server we're ready to be validated (RFC 8555 §7.5.1): a
    /// signed POST with an empty `{}` payload to the challenge URL.
    pub async fn trigger(&mut self, login: &Login) -> Result<()> {
        let response = login
            .session()
            .connection()
            .post_signed(self.url(), login.signer(), &serde_json::json!({}))
            .await?;
        self.apply(&response.body)?;
        Ok(())
    }

    /// Re-fetch this challenge's current state. Returns the server's
    /// `Retry-After` hint as an absolute instant, if any, for the caller's
    /// poll loop.
    pub async fn update(&mut self, login: &Login) -> Result<Option<Timestamp>> {
        let response = login
            .session()
            .connection()
            .post_as_get(self.url(), login.signer())
            .await?;
        let retry_after = response.retry_after_instant()?;
        self.apply(&response.body)?;
        Ok(retry_after)
    }
}

/// SHA-256 digest of a key authorization, base64url-encoded — the
/// foundational derivation every challenge type above builds on
/// (`dns-01`'s TXT value, `tls-alpn-01`'s extension value before DER
/// wrapping).
pub fn digest_key_authorization(key_authorization: &str) -> Result<String> {
    Sha256Hash::hash_base64(key_authorization.as_bytes())
}

fn is_base64url_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
