//! `dns-account-01` derivation (draft-ietf-acme-dns-account-01): like
//! `dns-01`, but the TXT record lives under a label scoped to the
//! requesting account rather than the bare `_acme-challenge` name, so
//! multiple accounts can validate the same domain concurrently.

use crate::crypto::encoding::Base32Encoding;
use crate::crypto::hash::Sha256Hash;
use crate::error::Result;
use crate::session::Login;

use super::{digest_key_authorization, Challenge};

impl Challenge {
    /// Compute the TXT record value to publish for a `dns-account-01` challenge.
    pub fn dns_account01_digest(&self, login: &Login) -> Result<String> {
        digest_key_authorization(&self.key_authorization(login)?)
    }
}

/// The account-scoped DNS label: the first 10 bytes of SHA-256(account
/// URL), lowercase base32-encoded, prepended to `_acme-challenge.<domain>.`
/// (trailing root dot, per the draft's RR-name grammar).
pub fn record_name(account_url: &str, domain: &str) -> Result<String> {
    let digest = Sha256Hash::hash(account_url.as_bytes())?;
    let prefix = Base32Encoding::encode_lower(&digest[..10]);
    Ok(format!("{prefix}._acme-challenge.{domain}."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_name_is_deterministic_per_account() {
        let a = record_name("https://example.com/acme/acct/1", "example.org").unwrap();
        let b = record_name("https://example.com/acme/acct/1", "example.org").unwrap();
        let c = record_name("https://example.com/acme/acct/2", "example.org").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.ends_with("._acme-challenge.example.org."));
    }

    #[test]
    fn prefix_is_sixteen_base32_chars_with_no_padding() {
        let rr = record_name("https://example.com/acme/acct/evOfKhNU60wg", "www.example.org").unwrap();
        let prefix = rr.split("._acme-challenge.").next().unwrap();
        assert_eq!(prefix.len(), 16);
        assert!(!prefix.contains('='));
        assert!(rr.ends_with('.'));
    }
}
