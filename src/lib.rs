//! # acme-core - ACME v2 client library
//!
//! A Rust client library for the Automatic Certificate Management
//! Environment protocol, RFC 8555. Talks to any compliant CA (Let's
//! Encrypt, Google Trust Services, ZeroSSL, buypass, a private internal
//! CA) through the same [`Session`]/[`Login`] API.
//!
//! This crate derives challenge responses (key authorizations, DNS record
//! values, self-signed TLS-ALPN-01 certificates) but does not run servers
//! to host them — wiring a solved challenge into your own HTTP server or
//! DNS provider is the caller's job.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use acme_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> acme_core::Result<()> {
//!     let session = Session::connect(
//!         "https://acme-staging-v02.api.letsencrypt.org/directory",
//!         ClientSettings::default(),
//!     )
//!     .await?;
//!
//!     let key_pair = KeyPair::generate(KeyType::EcdsaP256)?;
//!     let (_account, login) = AccountBuilder::new()
//!         .contact(Contact::email("admin@example.com"))
//!         .agree_to_terms_of_service()
//!         .create(&session, key_pair)
//!         .await?;
//!
//!     let mut order = Order::create(&login, &NewOrderRequest::new(vec!["example.com".to_string()])).await?;
//!     println!("order status: {}", order.status());
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod certificate;
pub mod challenge;
pub mod config;
pub mod connection;
pub mod crypto;
pub mod error;
pub mod json;
pub mod order;
pub mod problem;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;

pub use account::{Account, AccountBuilder, AccountStatus, OrderList};
pub use certificate::{Certificate, CertificateChain};
pub use challenge::{Challenge, ChallengeStatus};
pub use config::ClientSettings;
pub use connection::{AcmeRawResponse, AcmeResponse, Connection, RequestSigner};
pub use crypto::{Jwk, KeyPair, KeyType};
pub use error::{AcmeError, Result};
pub use order::{Authorization, FinalizationRequest, NewOrderRequest, Order};
pub use problem::{Problem, ProblemKind, Subproblem};
pub use protocol::Directory;
pub use session::{Login, Session};
pub use types::{
    AuthorizationStatus, ChallengeType, Contact, Identifier, OrderStatus, RevocationReason,
};

/// Commonly used types, for a single glob import.
pub mod prelude {
    pub use crate::{
        Account, AccountBuilder, AccountStatus, AuthorizationStatus, Authorization, Certificate,
        CertificateChain, Challenge, ChallengeStatus, ChallengeType, ClientSettings, Contact,
        FinalizationRequest, Identifier, Jwk, KeyPair, KeyType, Login, NewOrderRequest, Order,
        OrderList, OrderStatus, RevocationReason, Session,
        error::{AcmeError, Result},
    };
}
