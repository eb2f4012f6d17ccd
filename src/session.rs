//! The entry point into an ACME server: directory discovery plus the
//! shared [`Connection`] every resource call signs its requests through.

use crate::config::ClientSettings;
use crate::connection::{Connection, RequestSigner};
use crate::crypto::keypair::KeyPair;
use crate::error::Result;
use crate::protocol::{Directory, DirectoryManager, DirectoryMeta};
use std::sync::Arc;

/// A connection to one ACME server's directory. Cheap to clone (the
/// directory cache and nonce pool are shared via `Arc`); build one per
/// CA endpoint and reuse it across accounts.
#[derive(Clone)]
pub struct Session {
    directory_manager: Arc<DirectoryManager>,
    connection: Arc<Connection>,
    settings: ClientSettings,
}

impl Session {
    /// Discover the directory at `directory_url` and prepare a session
    /// against it. Fails only if the directory can't be fetched at all.
    pub async fn connect(directory_url: impl Into<String>, settings: ClientSettings) -> Result<Self> {
        let http = settings.build_http_client()?;
        let directory_manager = Arc::new(DirectoryManager::new(directory_url.into(), http.clone()));
        let directory = directory_manager.get().await?;
        let connection = Arc::new(Connection::new(http, directory.new_nonce.clone(), settings.clone()));
        Ok(Self {
            directory_manager,
            connection,
            settings,
        })
    }

    pub async fn directory(&self) -> Result<Directory> {
        self.directory_manager.get().await
    }

    /// The directory's `meta` sub-object: terms-of-service URL, CAA
    /// identities, external-account-required flag, advertised profiles,
    /// and the other CA-capability hints RFC 8555 §7.1.1 defines.
    /// `None` when the server omits `meta` entirely.
    pub async fn metadata(&self) -> Result<Option<DirectoryMeta>> {
        Ok(self.directory().await?.meta)
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Force the next [`Session::directory`] call to re-fetch, discarding
    /// any cached copy (e.g. after the server rotates its endpoints).
    pub async fn purge_directory_cache(&self) {
        self.directory_manager.clear_cache().await;
    }

    /// Resolve the URL for a named directory resource (`"newAccount"`,
    /// `"newOrder"`, `"keyChange"`, `"renewalInfo"`, ...), honoring
    /// servers that omit optional endpoints.
    pub async fn resource_url(&self, name: &str) -> Result<Option<String>> {
        let directory = self.directory().await?;
        Ok(match name {
            "newNonce" => Some(directory.new_nonce),
            "newAccount" => Some(directory.new_account),
            "newOrder" => Some(directory.new_order),
            "revokeCert" => Some(directory.revoke_cert),
            "keyChange" => Some(directory.key_change),
            "renewalInfo" => directory.renewal_info,
            _ => None,
        })
    }

    /// Log in as the account owning `key_pair`, identified by `kid` once
    /// registration has already happened (use [`crate::account::AccountBuilder`]
    /// to register a brand new account instead).
    pub fn login(&self, key_pair: KeyPair, kid: impl Into<String>) -> Login {
        Login {
            session: self.clone(),
            key_pair,
            kid: kid.into(),
        }
    }
}

/// An authenticated account: its key pair plus the `kid` URL the server
/// assigned it at registration. Every `account`/`order`/`certificate`
/// call against this account signs through this.
#[derive(Clone)]
pub struct Login {
    session: Session,
    key_pair: KeyPair,
    kid: String,
}

impl Login {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub(crate) fn signer(&self) -> RequestSigner<'_> {
        RequestSigner::Kid {
            signer: &self.key_pair,
            kid: &self.kid,
        }
    }
}
