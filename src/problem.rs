//! RFC 7807 problem documents and the RFC 8555 error-type taxonomy.

use serde::Deserialize;

/// A problem document as returned in an `application/problem+json` body.
#[derive(Debug, Clone, Deserialize)]
pub struct Problem {
    #[serde(rename = "type", default = "default_type")]
    pub problem_type: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub subproblems: Vec<Subproblem>,
    /// Present on subproblems and on some top-level validation problems.
    #[serde(default)]
    pub identifier: Option<crate::types::Identifier>,
}

fn default_type() -> String {
    "about:blank".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subproblem {
    #[serde(rename = "type", default = "default_type")]
    pub problem_type: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub identifier: Option<crate::types::Identifier>,
}

/// The closed set of ACME error kinds, derived from the
/// `urn:ietf:params:acme:error:*` suffix of a problem's `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    AccountDoesNotExist,
    AlreadyRevoked,
    BadCsr,
    BadNonce,
    BadPublicKey,
    BadRevocationReason,
    BadSignatureAlgorithm,
    Caa,
    Compound,
    Connection,
    Dns,
    ExternalAccountRequired,
    IncorrectResponse,
    InvalidContact,
    Malformed,
    OrderNotReady,
    RateLimited,
    RejectedIdentifier,
    ServerInternal,
    Tls,
    Unauthorized,
    UnsupportedContact,
    UnsupportedIdentifier,
    UserActionRequired,
    /// Anything outside the known suffix table, kept verbatim.
    Other,
}

const PREFIX: &str = "urn:ietf:params:acme:error:";

impl ProblemKind {
    pub fn from_type(problem_type: &str) -> Self {
        let Some(suffix) = problem_type.strip_prefix(PREFIX) else {
            return ProblemKind::Other;
        };
        match suffix {
            "accountDoesNotExist" => ProblemKind::AccountDoesNotExist,
            "alreadyRevoked" => ProblemKind::AlreadyRevoked,
            "badCSR" => ProblemKind::BadCsr,
            "badNonce" => ProblemKind::BadNonce,
            "badPublicKey" => ProblemKind::BadPublicKey,
            "badRevocationReason" => ProblemKind::BadRevocationReason,
            "badSignatureAlgorithm" => ProblemKind::BadSignatureAlgorithm,
            "caa" => ProblemKind::Caa,
            "compound" => ProblemKind::Compound,
            "connection" => ProblemKind::Connection,
            "dns" => ProblemKind::Dns,
            "externalAccountRequired" => ProblemKind::ExternalAccountRequired,
            "incorrectResponse" => ProblemKind::IncorrectResponse,
            "invalidContact" => ProblemKind::InvalidContact,
            "malformed" => ProblemKind::Malformed,
            "orderNotReady" => ProblemKind::OrderNotReady,
            "rateLimited" => ProblemKind::RateLimited,
            "rejectedIdentifier" => ProblemKind::RejectedIdentifier,
            "serverInternal" => ProblemKind::ServerInternal,
            "tls" => ProblemKind::Tls,
            "unauthorized" => ProblemKind::Unauthorized,
            "unsupportedContact" => ProblemKind::UnsupportedContact,
            "unsupportedIdentifier" => ProblemKind::UnsupportedIdentifier,
            "userActionRequired" => ProblemKind::UserActionRequired,
            _ => ProblemKind::Other,
        }
    }
}

impl Problem {
    pub fn kind(&self) -> ProblemKind {
        ProblemKind::from_type(&self.problem_type)
    }
}

impl Subproblem {
    pub fn kind(&self) -> ProblemKind {
        ProblemKind::from_type(&self.problem_type)
    }
}
