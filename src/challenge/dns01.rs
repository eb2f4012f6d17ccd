//! `dns-01` derivation, RFC 8555 §8.4: the TXT record a validating
//! resolver looks up is the base64url SHA-256 digest of the key
//! authorization, published at `_acme-challenge.<domain>`.

use crate::error::Result;
use crate::session::Login;

use super::{digest_key_authorization, Challenge};

impl Challenge {
    /// Compute the TXT record value to publish for a `dns-01` challenge.
    pub fn dns01_digest(&self, login: &Login) -> Result<String> {
        digest_key_authorization(&self.key_authorization(login)?)
    }
}

/// The DNS label validators query, independent of the zone apex. Carries
/// the trailing root dot per RFC 8555 §8.4's `_acme-challenge.<domain>.`.
pub fn record_name(domain: &str) -> String {
    format!("_acme-challenge.{domain}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_name_is_prefixed_under_the_domain() {
        assert_eq!(record_name("example.com"), "_acme-challenge.example.com.");
    }

    #[test]
    fn digest_matches_the_rfc8555_worked_example() {
        let key_authorization =
            "pNvmJivs0WCko2suV7fhe-59oFqyYx_yB7tx6kIMAyE.HnWjTDnyqlCrm6tZ-6wX-TrEXgRdeNu9G71gqxSO6o0";
        let digest = digest_key_authorization(key_authorization).unwrap();
        assert_eq!(digest, "rzMmotrIgsithyBYc0vgiLUEEKYx0WetQRgEF2JIozA");
    }
}
