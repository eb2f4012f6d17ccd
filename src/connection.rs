//! The signed-request plumbing shared by every resource type: nonce
//! handling, JWS framing, problem-document dispatch, and the headers
//! RFC 8555 §6.4-§6.7 define (`Location`, `Link`, `Retry-After`).

use crate::config::ClientSettings;
use crate::crypto::signer::{JwkSigner, Signer};
use crate::error::{AcmeError, Result};
use crate::problem::Problem;
use crate::protocol::jws::{sign_flattened, sign_flattened_empty};
use jiff::Timestamp;
use reqwest::header::{HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// How a signed request identifies the caller: either the full public
/// key (only legal for `newAccount` and `revokeCert`-without-an-account)
/// or the account's `kid` URL once one is known.
pub enum RequestSigner<'a> {
    Jwk(&'a dyn JwkSigner),
    Kid { signer: &'a dyn Signer, kid: &'a str },
}

/// A parsed response to a signed or unsigned ACME request.
pub struct AcmeResponse {
    pub status: u16,
    pub body: serde_json::Value,
    pub location: Option<String>,
    pub links: HashMap<String, Vec<String>>,
    pub retry_after: Option<Duration>,
    pub replay_nonce: Option<String>,
}

impl AcmeResponse {
    pub fn link(&self, rel: &str) -> Option<&str> {
        self.links.get(rel).and_then(|v| v.first()).map(|s| s.as_str())
    }

    /// The `Retry-After` hint as an absolute instant (`now + retry_after`):
    /// a relative `Duration` decays the instant it's held onto, so callers
    /// polling in a loop need the absolute moment, not an elapsed offset.
    pub fn retry_after_instant(&self) -> Result<Option<Timestamp>> {
        retry_after_to_instant(self.retry_after)
    }
}

/// Convert a relative `Retry-After` duration, captured at response time,
/// into the absolute instant it names.
fn retry_after_to_instant(retry_after: Option<Duration>) -> Result<Option<Timestamp>> {
    let Some(duration) = retry_after else {
        return Ok(None);
    };
    let target_secs = Timestamp::now().as_second() + duration.as_secs() as i64;
    Timestamp::from_second(target_secs)
        .map(Some)
        .map_err(|e| AcmeError::protocol("$".into(), format!("retry-after instant out of range: {e}")))
}

/// One logical ACME call: fetch a nonce if needed, sign, POST, parse the
/// response, and retry exactly once on `badNonce` up to the configured
/// budget.
pub struct Connection {
    http: reqwest::Client,
    new_nonce_url: String,
    cached_nonce: Arc<Mutex<Option<String>>>,
    settings: ClientSettings,
}

impl Connection {
    pub fn new(http: reqwest::Client, new_nonce_url: impl Into<String>, settings: ClientSettings) -> Self {
        Self {
            http,
            new_nonce_url: new_nonce_url.into(),
            cached_nonce: Arc::new(Mutex::new(None)),
            settings,
        }
    }

    async fn next_nonce(&self) -> Result<String> {
        if let Some(nonce) = self.cached_nonce.lock().await.take() {
            return Ok(nonce);
        }
        let response = self
            .http
            .head(&self.new_nonce_url)
            .send()
            .await
            .map_err(|e| AcmeError::network(format!("failed to fetch nonce: {e}")))?;
        extract_nonce(response.headers())
            .ok_or_else(|| AcmeError::protocol(self.new_nonce_url.clone(), "missing replay-nonce header".into()))
    }

    async fn store_nonce(&self, headers: &HeaderMap) {
        if let Some(nonce) = extract_nonce(headers) {
            *self.cached_nonce.lock().await = Some(nonce);
        }
    }

    /// Plain, unsigned GET — only used for directory discovery.
    pub async fn get_unsigned(&self, url: &str) -> Result<AcmeResponse> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AcmeError::network(format!("GET {url} failed: {e}")))?;
        self.parse_response(response).await
    }

    /// Signed POST with a JSON payload.
    pub async fn post_signed(
        &self,
        url: &str,
        signer: RequestSigner<'_>,
        payload: &serde_json::Value,
    ) -> Result<AcmeResponse> {
        self.post_signed_retrying(url, signer, Some(payload)).await
    }

    /// Signed POST-as-GET: an empty-payload signed POST used to fetch a
    /// resource that requires authentication (RFC 8555 §6.3).
    pub async fn post_as_get(&self, url: &str, signer: RequestSigner<'_>) -> Result<AcmeResponse> {
        self.post_signed_retrying(url, signer, None).await
    }

    /// Signed POST-as-GET whose body isn't JSON (certificate download,
    /// which returns `application/pem-certificate-chain`).
    pub async fn post_as_get_raw(&self, url: &str, signer: RequestSigner<'_>) -> Result<AcmeRawResponse> {
        let raw = self.execute_signed(url, signer, None).await?;
        Ok(AcmeRawResponse {
            status: raw.status,
            body: raw.body,
            content_type: raw.content_type,
            location: raw.location,
            links: raw.links,
            retry_after: raw.retry_after,
        })
    }

    async fn post_signed_retrying(
        &self,
        url: &str,
        signer: RequestSigner<'_>,
        payload: Option<&serde_json::Value>,
    ) -> Result<AcmeResponse> {
        let raw = self.execute_signed(url, signer, payload).await?;
        let body = if raw.body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&raw.body)
                .map_err(|e| AcmeError::protocol("$".into(), format!("invalid JSON body: {e}")))?
        };
        Ok(AcmeResponse {
            status: raw.status,
            body,
            location: raw.location,
            links: raw.links,
            retry_after: raw.retry_after,
            replay_nonce: raw.replay_nonce,
        })
    }

    /// Sign, POST, and parse the response down to raw bytes plus headers,
    /// retrying exactly once per attempt on `badNonce` up to the configured
    /// budget. Shared by the JSON-parsing and raw-body callers above.
    async fn execute_signed(
        &self,
        url: &str,
        signer: RequestSigner<'_>,
        payload: Option<&serde_json::Value>,
    ) -> Result<RawSuccess> {
        let mut attempts_left = self.settings.nonce_retry_budget;
        loop {
            let nonce = self.next_nonce().await?;
            let protected = build_protected_header(url, &nonce, &signer)?;

            let jws = match payload {
                Some(p) => sign_flattened(&protected, p, signer_ref(&signer))?,
                None => sign_flattened_empty(&protected, signer_ref(&signer))?,
            };

            let response = self
                .http
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/jose+json")
                .json(&jws)
                .send()
                .await
                .map_err(|e| AcmeError::network(format!("POST {url} failed: {e}")))?;

            self.store_nonce(response.headers()).await;

            match self.parse_raw(response).await {
                Err(AcmeError::ServerProblem { problem, .. })
                    if problem.kind() == crate::problem::ProblemKind::BadNonce && attempts_left > 0 =>
                {
                    attempts_left -= 1;
                    debug!(url, attempts_left, "retrying after badNonce");
                    continue;
                }
                other => return other,
            }
        }
    }

    async fn parse_response(&self, response: reqwest::Response) -> Result<AcmeResponse> {
        let raw = self.parse_raw(response).await?;
        let body = if raw.body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&raw.body)
                .map_err(|e| AcmeError::protocol("$".into(), format!("invalid JSON body: {e}")))?
        };
        Ok(AcmeResponse {
            status: raw.status,
            body,
            location: raw.location,
            links: raw.links,
            retry_after: raw.retry_after,
            replay_nonce: raw.replay_nonce,
        })
    }

    /// Read status/headers/body, raising `ServerProblem` for a
    /// `application/problem+json` body (regardless of status) or a generic
    /// protocol error for any other `>=400` response. Leaves body
    /// interpretation (JSON vs. raw bytes) to the caller.
    async fn parse_raw(&self, response: reqwest::Response) -> Result<RawSuccess> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("")
            .to_string();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());
        let links = parse_link_header(response.headers());
        let retry_after = parse_retry_after(response.headers());
        let replay_nonce = extract_nonce(response.headers());

        if content_type.starts_with("application/json") {
            if let Some(charset) = content_type_charset(&content_type) {
                if !charset.eq_ignore_ascii_case("utf-8") {
                    return Err(AcmeError::protocol(
                        "$".into(),
                        format!("unsupported charset '{charset}' on application/json body"),
                    ));
                }
            }
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| AcmeError::network(format!("failed to read body: {e}")))?;

        if content_type.starts_with("application/problem+json") {
            let problem: Problem = serde_json::from_slice(&body_bytes)
                .map_err(|e| AcmeError::protocol("$".into(), format!("malformed problem document: {e}")))?;
            warn!(status, problem_type = %problem.problem_type, "server returned a problem document");
            return Err(AcmeError::from_problem(problem, retry_after, &links));
        }

        if status >= 400 {
            let snippet = String::from_utf8_lossy(&body_bytes);
            return Err(AcmeError::protocol(
                "$".into(),
                format!("HTTP {status} with non-problem body: {snippet}"),
            ));
        }

        Ok(RawSuccess {
            status,
            content_type,
            body: body_bytes.to_vec(),
            location,
            links,
            retry_after,
            replay_nonce,
        })
    }
}

struct RawSuccess {
    status: u16,
    content_type: String,
    body: Vec<u8>,
    location: Option<String>,
    links: HashMap<String, Vec<String>>,
    retry_after: Option<Duration>,
    replay_nonce: Option<String>,
}

/// A parsed response whose body is read as raw bytes rather than JSON
/// (certificate downloads, which come back as `application/pem-certificate-chain`).
pub struct AcmeRawResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: String,
    pub location: Option<String>,
    pub links: HashMap<String, Vec<String>>,
    pub retry_after: Option<Duration>,
}

impl AcmeRawResponse {
    pub fn link(&self, rel: &str) -> Option<&str> {
        self.links.get(rel).and_then(|v| v.first()).map(|s| s.as_str())
    }
}

fn signer_ref<'a>(signer: &'a RequestSigner<'a>) -> &'a dyn Signer {
    match signer {
        RequestSigner::Jwk(s) => *s,
        RequestSigner::Kid { signer, .. } => *signer,
    }
}

fn build_protected_header(url: &str, nonce: &str, signer: &RequestSigner<'_>) -> Result<serde_json::Value> {
    match signer {
        RequestSigner::Jwk(s) => {
            let jwk = s.jwk()?;
            Ok(serde_json::json!({
                "alg": s.algorithm(),
                "jwk": jwk,
                "nonce": nonce,
                "url": url,
            }))
        }
        RequestSigner::Kid { signer, kid } => Ok(serde_json::json!({
            "alg": signer.algorithm(),
            "kid": kid,
            "nonce": nonce,
            "url": url,
        })),
    }
}

/// Pull the `charset` parameter off a `Content-Type` value, if present.
fn content_type_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        (name.trim().eq_ignore_ascii_case("charset")).then(|| value.trim().trim_matches('"'))
    })
}

fn extract_nonce(headers: &HeaderMap) -> Option<String> {
    headers
        .get("replay-nonce")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// RFC 5988 `Link` header parsing, e.g.
/// `<https://example.com/acme/directory>;rel="index"`.
fn parse_link_header(headers: &HeaderMap) -> HashMap<String, Vec<String>> {
    let mut links: HashMap<String, Vec<String>> = HashMap::new();
    for value in headers.get_all(reqwest::header::LINK) {
        if let Ok(value) = value.to_str() {
            for entry in value.split(',') {
                if let Some((url, rel)) = parse_link_entry(entry) {
                    links.entry(rel).or_default().push(url);
                }
            }
        }
    }
    links
}

fn parse_link_entry(entry: &str) -> Option<(String, String)> {
    let entry = entry.trim();
    let url_end = entry.find('>')?;
    if !entry.starts_with('<') {
        return None;
    }
    let url = entry[1..url_end].to_string();
    let params = &entry[url_end + 1..];
    for param in params.split(';') {
        let param = param.trim();
        if let Some(rel) = param.strip_prefix("rel=") {
            let rel = rel.trim_matches('"').to_string();
            return Some((url, rel));
        }
    }
    None
}

/// Parse `Retry-After` as either an HTTP-date or delta-seconds
/// (RFC 9110 §10.2.3). A date in the past yields a zero duration rather
/// than an error — callers should treat that as "retry immediately".
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let target = httpdate_to_timestamp(value)?;
    let now = Timestamp::now();
    let delta_secs = target.as_second() - now.as_second();
    Some(Duration::from_secs(delta_secs.max(0) as u64))
}

fn httpdate_to_timestamp(value: &str) -> Option<Timestamp> {
    let parsed = httpdate::parse_http_date(value).ok()?;
    Timestamp::try_from(parsed).ok()
}
