//! Common value types shared across the ACME resource model.

use crate::error::{AcmeError, Result};
use serde::{Deserialize, Serialize};

/// Protected JWS header, RFC 8555 §6.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwk: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    pub nonce: String,
    pub url: String,
}

/// Identifier subject to domain validation: a DNS name or IP address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub id_type: String,
    pub value: String,
    /// True when this order's authorization is allowed to be satisfied by
    /// proving control of an ancestor domain (RFC 8555 draft extension;
    /// only meaningful when `meta.subdomainAuthAllowed` is advertised).
    #[serde(default, rename = "subdomainAuthAllowed", skip_serializing_if = "Option::is_none")]
    pub subdomain_auth_allowed: Option<bool>,
}

impl Identifier {
    pub fn dns(domain: impl Into<String>) -> Self {
        Self {
            id_type: "dns".to_string(),
            value: domain.into(),
            subdomain_auth_allowed: None,
        }
    }

    pub fn ip(ip: impl Into<String>) -> Self {
        Self {
            id_type: "ip".to_string(),
            value: ip.into(),
            subdomain_auth_allowed: None,
        }
    }

    pub fn with_subdomain_auth_allowed(mut self, allowed: bool) -> Self {
        self.subdomain_auth_allowed = Some(allowed);
        self
    }
}

/// Revocation reason codes, RFC 5280 §5.3.1 CRL reasons (7 is reserved
/// and intentionally absent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RevocationReason {
    Unspecified = 0,
    KeyCompromise = 1,
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    CertificateHold = 6,
    RemoveFromCRL = 8,
    PrivilegeWithdrawn = 9,
    AACompromise = 10,
}

impl RevocationReason {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Account contact URI, RFC 8555 §7.3 / RFC 3986.
#[derive(Debug, Clone)]
pub struct Contact {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
}

impl Contact {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            phone: None,
            url: None,
        }
    }

    pub fn phone(phone: impl Into<String>) -> Self {
        Self {
            email: None,
            phone: Some(phone.into()),
            url: None,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            email: None,
            phone: None,
            url: Some(url.into()),
        }
    }

    pub fn to_uri(&self) -> String {
        if let Some(email) = &self.email {
            format!("mailto:{email}")
        } else if let Some(phone) = &self.phone {
            format!("tel:{phone}")
        } else if let Some(url) = &self.url {
            url.clone()
        } else {
            String::new()
        }
    }

    /// Reject `mailto:` contacts with multiple recipients or header
    /// fields, which RFC 8555 §7.3 and RFC 6068 both forbid.
    pub fn validate(&self) -> Result<()> {
        if let Some(email) = &self.email {
            if email.contains(',') {
                return Err(AcmeError::invalid_input(
                    "mailto contact must name exactly one recipient",
                ));
            }
            if email.contains('?') {
                return Err(AcmeError::invalid_input(
                    "mailto contact must not carry header fields",
                ));
            }
            if !email.contains('@') {
                return Err(AcmeError::invalid_input("invalid email address"));
            }
        }
        Ok(())
    }
}

/// Challenge validation mechanism, RFC 8555 §8 plus the dns-account-01
/// draft extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeType {
    Http01,
    Dns01,
    DnsAccount01,
    TlsAlpn01,
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::Http01 => "http-01",
            ChallengeType::Dns01 => "dns-01",
            ChallengeType::DnsAccount01 => "dns-account-01",
            ChallengeType::TlsAlpn01 => "tls-alpn-01",
        }
    }
}

impl std::str::FromStr for ChallengeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "http-01" => Ok(ChallengeType::Http01),
            "dns-01" => Ok(ChallengeType::Dns01),
            "dns-account-01" => Ok(ChallengeType::DnsAccount01),
            "tls-alpn-01" => Ok(ChallengeType::TlsAlpn01),
            _ => Err(format!("unknown challenge type: {s}")),
        }
    }
}

impl std::fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order lifecycle state, RFC 8555 §7.1.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Ready,
    Processing,
    Valid,
    Invalid,
    Expired,
    Deactivated,
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "ready" => Ok(OrderStatus::Ready),
            "processing" => Ok(OrderStatus::Processing),
            "valid" => Ok(OrderStatus::Valid),
            "invalid" => Ok(OrderStatus::Invalid),
            "expired" => Ok(OrderStatus::Expired),
            "deactivated" => Ok(OrderStatus::Deactivated),
            _ => Err(format!("unknown order status: {s}")),
        }
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Ready => "ready",
            OrderStatus::Processing => "processing",
            OrderStatus::Valid => "valid",
            OrderStatus::Invalid => "invalid",
            OrderStatus::Expired => "expired",
            OrderStatus::Deactivated => "deactivated",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authorization lifecycle state, RFC 8555 §7.1.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Pending,
    Valid,
    Invalid,
    Deactivated,
    Expired,
}

impl std::str::FromStr for AuthorizationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AuthorizationStatus::Pending),
            "valid" => Ok(AuthorizationStatus::Valid),
            "invalid" => Ok(AuthorizationStatus::Invalid),
            "deactivated" => Ok(AuthorizationStatus::Deactivated),
            "expired" => Ok(AuthorizationStatus::Expired),
            _ => Err(format!("unknown authorization status: {s}")),
        }
    }
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::Pending => "pending",
            AuthorizationStatus::Valid => "valid",
            AuthorizationStatus::Invalid => "invalid",
            AuthorizationStatus::Deactivated => "deactivated",
            AuthorizationStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_dns() {
        let id = Identifier::dns("example.com");
        assert_eq!(id.id_type, "dns");
        assert_eq!(id.value, "example.com");
    }

    #[test]
    fn test_contact_email() {
        let contact = Contact::email("test@example.com");
        assert_eq!(contact.to_uri(), "mailto:test@example.com");
        assert!(contact.validate().is_ok());
    }

    #[test]
    fn test_contact_rejects_multiple_recipients() {
        let contact = Contact::email("a@example.com,b@example.com");
        assert!(contact.validate().is_err());
    }

    #[test]
    fn test_challenge_type() {
        assert_eq!(ChallengeType::Http01.as_str(), "http-01");
        assert_eq!("dns-01".parse::<ChallengeType>(), Ok(ChallengeType::Dns01));
        assert_eq!(
            "dns-account-01".parse::<ChallengeType>(),
            Ok(ChallengeType::DnsAccount01)
        );
    }

    #[test]
    fn test_order_status() {
        assert_eq!("pending".parse::<OrderStatus>(), Ok(OrderStatus::Pending));
        assert_eq!(OrderStatus::Valid.as_str(), "valid");
    }
}
