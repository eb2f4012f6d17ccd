//! Account key rollover, RFC 8555 §7.3.5.

use crate::crypto::jwk::Jwk;
use crate::crypto::keypair::KeyPair;
use crate::error::{AcmeError, Result};
use crate::protocol::jws::sign_flattened;
use crate::session::Login;

/// Roll the account over to `new_key`. The outer request is signed by the
/// current key (via `login`'s usual `kid` signer); it wraps an inner JWS,
/// signed by `new_key` with its own `jwk` header and no `kid`/`nonce`, over
/// `{"account": kid, "oldKey": <old public JWK>}` — exactly the structure
/// RFC 8555 §7.3.5 requires so the server can verify proof of possession
/// of both keys in one call.
pub async fn change_key(login: &Login, new_key: KeyPair) -> Result<Login> {
    if new_key.public_key_bytes() == login.key_pair().public_key_bytes() {
        return Err(AcmeError::protocol(
            "$".to_string(),
            "key change requires a different key pair from the account's current one".to_string(),
        ));
    }

    let key_change_url = login
        .session()
        .resource_url("keyChange")
        .await?
        .ok_or_else(|| AcmeError::not_supported("server directory has no keyChange endpoint"))?;

    let old_jwk = Jwk::from_keypair(login.key_pair())?.to_value();
    let inner_payload = serde_json::json!({
        "account": login.kid(),
        "oldKey": old_jwk,
    });
    let inner_protected = serde_json::json!({
        "alg": new_key.jwa_algorithm(),
        "jwk": Jwk::from_keypair(&new_key)?.to_value(),
        "url": key_change_url,
    });
    let inner_jws = sign_flattened(&inner_protected, &inner_payload, &new_key)?;
    let inner_value = serde_json::json!({
        "protected": inner_jws.protected,
        "payload": inner_jws.payload,
        "signature": inner_jws.signature,
    });

    login
        .session()
        .connection()
        .post_signed(&key_change_url, login.signer(), &inner_value)
        .await?;

    Ok(login.session().login(new_key, login.kid().to_string()))
}
