//! `http-01` derivation, RFC 8555 §8.3: the key authorization is served
//! verbatim at a well-known path on the identifier's HTTP server.

use crate::error::Result;
use crate::session::Login;

use super::Challenge;

impl Challenge {
    /// The exact response body a `GET` on [`response_path`] must return.
    pub fn http01_response_body(&self, login: &Login) -> Result<String> {
        self.key_authorization(login)
    }
}

/// The well-known path validators fetch, relative to the identifier's origin.
pub fn response_path(token: &str) -> String {
    format!("/.well-known/acme-challenge/{token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_well_known_path() {
        assert_eq!(
            response_path("DGyRejmCefe7v4NfDGDKfA"),
            "/.well-known/acme-challenge/DGyRejmCefe7v4NfDGDKfA"
        );
    }
}
