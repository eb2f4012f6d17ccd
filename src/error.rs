//! Error handling for the ACME client.

use crate::problem::{Problem, ProblemKind};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Result type for ACME operations.
pub type Result<T> = std::result::Result<T, AcmeError>;

/// Closed set of error kinds an ACME operation can fail with.
#[derive(Error, Debug)]
pub enum AcmeError {
    /// Transport-level failure: DNS, TCP, TLS, timeouts.
    #[error("network error: {0}")]
    Network(String),

    /// The server's response did not match the expected shape
    /// (bad JSON, missing field, wrong content type, malformed header).
    #[error("protocol error at {path}: {message}")]
    Protocol { path: String, message: String },

    /// The server returned an `application/problem+json` body.
    #[error("server problem ({kind:?}): {}", .problem.detail.as_deref().unwrap_or(&.problem.problem_type))]
    ServerProblem { problem: Problem, kind: ProblemKind },

    /// `urn:ietf:params:acme:error:rateLimited`, with the parsed
    /// `Retry-After` value when the server supplied one.
    #[error("rate limited, retry after: {0:?}")]
    RateLimited(Option<Duration>),

    /// The account key or authorization does not authorize this action.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// `urn:ietf:params:acme:error:userActionRequired`. `instance` is the
    /// problem's `instance` URL (where to act); `tos_url` is a possible new
    /// terms-of-service URL from the response's `Link: rel="terms-of-service"`.
    #[error("user action required: {detail}")]
    UserActionRequired {
        detail: String,
        instance: Option<String>,
        tos_url: Option<String>,
    },

    /// The server's directory does not advertise a capability this
    /// call needs (e.g. no `externalAccountRequired` support, no
    /// `renewalInfo` endpoint).
    #[error("not supported by this server: {0}")]
    NotSupported(String),

    /// A resource was used from a state that forbids the requested
    /// operation (e.g. finalizing an order that is not `ready`).
    #[error("invalid state: {0}")]
    State(String),

    /// A bounded retry loop exceeded its budget.
    #[error("retry budget exceeded: {0}")]
    RetryAfter(String),

    /// Cryptographic operation failure (key generation, signing).
    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PEM error: {0}")]
    Pem(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AcmeError {
    pub fn network<S: Into<String>>(msg: S) -> Self {
        AcmeError::Network(msg.into())
    }

    pub fn protocol<S: Into<String>>(path: S, message: S) -> Self {
        AcmeError::Protocol {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build the right `AcmeError` variant from a parsed problem document,
    /// applying the RFC 8555 §6.7 mapping from error type to client action.
    /// `retry_after` is the response's already-parsed `Retry-After` header,
    /// if any, surfaced on the `RateLimited` arm. `links` is the response's
    /// parsed `Link` headers, consulted for `rel="terms-of-service"` on
    /// `userActionRequired`.
    pub fn from_problem(
        problem: Problem,
        retry_after: Option<Duration>,
        links: &HashMap<String, Vec<String>>,
    ) -> Self {
        let kind = problem.kind();
        match kind {
            ProblemKind::RateLimited => AcmeError::RateLimited(retry_after),
            ProblemKind::Unauthorized | ProblemKind::ExternalAccountRequired => {
                AcmeError::Unauthorized(
                    problem
                        .detail
                        .clone()
                        .unwrap_or_else(|| problem.problem_type.clone()),
                )
            }
            ProblemKind::UserActionRequired => AcmeError::UserActionRequired {
                detail: problem
                    .detail
                    .clone()
                    .unwrap_or_else(|| problem.problem_type.clone()),
                instance: problem.instance.clone(),
                tos_url: links
                    .get("terms-of-service")
                    .and_then(|v| v.first())
                    .cloned(),
            },
            _ => AcmeError::ServerProblem { problem, kind },
        }
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        AcmeError::InvalidInput(msg.into())
    }

    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        AcmeError::Configuration(msg.into())
    }

    pub fn pem<S: Into<String>>(msg: S) -> Self {
        AcmeError::Pem(msg.into())
    }

    pub fn crypto<S: Into<String>>(msg: S) -> Self {
        AcmeError::Crypto(msg.into())
    }

    pub fn state<S: Into<String>>(msg: S) -> Self {
        AcmeError::State(msg.into())
    }

    pub fn not_supported<S: Into<String>>(msg: S) -> Self {
        AcmeError::NotSupported(msg.into())
    }
}
