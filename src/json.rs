//! A path-tracking JSON navigator for ACME response bodies.
//!
//! Plain `serde` structs are used where a resource's shape is fixed
//! (`Directory`, `Problem`), but several call sites need to reach into a
//! response whose exact shape can vary by server (a raw order object
//! pulled out of a `Location` redirect, a challenge object with
//! server-specific extra fields) while still producing error messages
//! that point at the failing field. [`Json`] wraps a `&serde_json::Value`
//! together with the dotted/bracketed path taken to reach it.

use crate::error::{AcmeError, Result};
use crate::types::Identifier;
use jiff::Timestamp;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, ".{name}"),
            PathSegment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

fn render_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "$".to_string();
    }
    let mut out = String::from("$");
    for seg in path {
        out.push_str(&seg.to_string());
    }
    out
}

/// An immutable view onto a JSON value with a remembered access path.
#[derive(Clone)]
pub struct Json<'a> {
    value: &'a serde_json::Value,
    path: Vec<PathSegment>,
}

impl<'a> Json<'a> {
    pub fn root(value: &'a serde_json::Value) -> Self {
        Json {
            value,
            path: Vec::new(),
        }
    }

    fn err(&self, message: impl Into<String>) -> AcmeError {
        AcmeError::protocol(render_path(&self.path), message.into())
    }

    pub fn path(&self) -> String {
        render_path(&self.path)
    }

    pub fn raw(&self) -> &'a serde_json::Value {
        self.value
    }

    /// Treat a missing/null field as absent rather than an error.
    pub fn optional(&self) -> Option<&Self> {
        if self.value.is_null() { None } else { Some(self) }
    }

    pub fn field(&self, name: &str) -> Result<Json<'a>> {
        let obj = self
            .value
            .as_object()
            .ok_or_else(|| self.err(format!("expected an object to read field '{name}'")))?;
        let child = obj
            .get(name)
            .ok_or_else(|| self.err(format!("missing required field '{name}'")))?;
        let mut path = self.path.clone();
        path.push(PathSegment::Field(name.to_string()));
        Ok(Json { value: child, path })
    }

    pub fn optional_field(&self, name: &str) -> Result<Option<Json<'a>>> {
        let obj = self
            .value
            .as_object()
            .ok_or_else(|| self.err(format!("expected an object to read field '{name}'")))?;
        match obj.get(name) {
            None => Ok(None),
            Some(v) if v.is_null() => Ok(None),
            Some(child) => {
                let mut path = self.path.clone();
                path.push(PathSegment::Field(name.to_string()));
                Ok(Some(Json { value: child, path }))
            }
        }
    }

    pub fn as_array(&self) -> Result<Vec<Json<'a>>> {
        let arr = self
            .value
            .as_array()
            .ok_or_else(|| self.err("expected an array"))?;
        Ok(arr
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut path = self.path.clone();
                path.push(PathSegment::Index(i));
                Json { value: v, path }
            })
            .collect())
    }

    pub fn as_string(&self) -> Result<&'a str> {
        self.value
            .as_str()
            .ok_or_else(|| self.err("expected a string"))
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.value
            .as_bool()
            .ok_or_else(|| self.err("expected a boolean"))
    }

    pub fn as_int(&self) -> Result<i64> {
        self.value
            .as_i64()
            .ok_or_else(|| self.err("expected an integer"))
    }

    pub fn as_url(&self) -> Result<String> {
        let s = self.as_string()?;
        if !(s.starts_with("https://") || s.starts_with("http://")) {
            return Err(self.err(format!("expected a URL, got '{s}'")));
        }
        Ok(s.to_string())
    }

    /// Parse an RFC 3339 timestamp (the wire format for `expires`,
    /// `validated`, `notBefore`, `notAfter`).
    pub fn as_instant(&self) -> Result<Timestamp> {
        let s = self.as_string()?;
        s.parse::<Timestamp>()
            .map_err(|e| self.err(format!("invalid RFC 3339 timestamp '{s}': {e}")))
    }

    /// Parse an integer number of seconds into a [`Duration`] (used for
    /// `Retry-After: <delta-seconds>` bodies surfaced as JSON fields by
    /// some proxies, and for numeric `notAfter` offsets).
    pub fn as_duration_seconds(&self) -> Result<Duration> {
        let secs = self.as_int()?;
        if secs < 0 {
            return Err(self.err("duration must not be negative"));
        }
        Ok(Duration::from_secs(secs as u64))
    }

    pub fn as_base64_bytes(&self) -> Result<Vec<u8>> {
        let s = self.as_string()?;
        crate::crypto::encoding::Base64Encoding::decode(s)
            .map_err(|_| self.err(format!("invalid base64url value '{s}'")))
    }

    pub fn as_identifier(&self) -> Result<Identifier> {
        let kind = self.field("type")?.as_string()?.to_string();
        let value = self.field("value")?.as_string()?.to_string();
        match kind.as_str() {
            "dns" => Ok(Identifier::dns(value)),
            "ip" => Ok(Identifier::ip(value)),
            other => Err(self.err(format!("unsupported identifier type '{other}'"))),
        }
    }

    /// Read a field that only appears when the server advertises a given
    /// directory-meta feature (e.g. `subdomainAuthAllowed`, `profile`).
    /// Returns `Ok(None)` rather than erroring when it's absent, since its
    /// absence reflects the server's feature set, not malformed JSON.
    pub fn on_feature(&self, name: &str) -> Result<Option<Json<'a>>> {
        self.optional_field(name)
    }

    /// Parse a status-like string field into one of the closed resource
    /// status enums (`OrderStatus`, `AuthorizationStatus`, `ChallengeStatus`,
    /// `AccountStatus`), naming this value's path on failure.
    pub fn as_status<T>(&self) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        let s = self.as_string()?;
        s.parse::<T>().map_err(|e| self.err(format!("invalid status '{s}': {e}")))
    }

    /// Deserialize this value as an RFC 7807 problem document.
    pub fn as_problem(&self) -> Result<crate::problem::Problem> {
        serde_json::from_value(self.value.clone()).map_err(|e| self.err(format!("invalid problem document: {e}")))
    }

    /// Iterate this value's fields as `(name, Json)` pairs, each carrying
    /// its own path (used for server-defined maps like `meta.profiles`).
    pub fn as_object(&self) -> Result<Vec<(String, Json<'a>)>> {
        let obj = self.value.as_object().ok_or_else(|| self.err("expected an object"))?;
        Ok(obj
            .iter()
            .map(|(name, v)| {
                let mut path = self.path.clone();
                path.push(PathSegment::Field(name.clone()));
                (name.clone(), Json { value: v, path })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_path_accumulates_through_nesting() {
        let value = json!({"order": {"identifiers": [{"type": "dns", "value": "example.com"}]}});
        let root = Json::root(&value);
        let ids = root.field("order").unwrap().field("identifiers").unwrap();
        let items = ids.as_array().unwrap();
        assert_eq!(items[0].path(), "$.order.identifiers[0]");
        let id = items[0].as_identifier().unwrap();
        assert_eq!(id.value, "example.com");
    }

    #[test]
    fn missing_field_reports_its_path() {
        let value = json!({"order": {}});
        let root = Json::root(&value);
        let err = root.field("order").unwrap().field("identifiers").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("$.order"));
        assert!(message.contains("identifiers"));
    }

    #[test]
    fn rejects_non_url_strings() {
        let value = json!({"url": "not-a-url"});
        let root = Json::root(&value);
        assert!(root.field("url").unwrap().as_url().is_err());
    }

    #[test]
    fn parses_rfc3339_instant() {
        let value = json!({"expires": "2026-03-01T00:00:00Z"});
        let root = Json::root(&value);
        assert!(root.field("expires").unwrap().as_instant().is_ok());
    }

    #[test]
    fn on_feature_is_none_when_absent() {
        let value = json!({});
        let root = Json::root(&value);
        assert!(root.on_feature("subdomainAuthAllowed").unwrap().is_none());
    }

    #[test]
    fn as_status_parses_into_the_requested_enum() {
        let value = json!({"status": "pending"});
        let root = Json::root(&value);
        let status = root.field("status").unwrap().as_status::<crate::types::OrderStatus>().unwrap();
        assert_eq!(status, crate::types::OrderStatus::Pending);
    }

    #[test]
    fn as_status_reports_path_on_unknown_value() {
        let value = json!({"status": "not-a-real-status"});
        let root = Json::root(&value);
        let err = root
            .field("status")
            .unwrap()
            .as_status::<crate::types::OrderStatus>()
            .unwrap_err();
        assert!(err.to_string().contains("$.status"));
    }

    #[test]
    fn as_problem_deserializes_a_problem_document() {
        let value = json!({"type": "urn:ietf:params:acme:error:badNonce", "detail": "stale nonce"});
        let root = Json::root(&value);
        let problem = root.as_problem().unwrap();
        assert_eq!(problem.kind(), crate::problem::ProblemKind::BadNonce);
    }

    #[test]
    fn as_object_yields_paths_for_each_field() {
        let value = json!({"profiles": {"classic": "RSA 2048", "shortlived": "ECDSA P-256"}});
        let root = Json::root(&value);
        let entries = root.field("profiles").unwrap().as_object().unwrap();
        assert_eq!(entries.len(), 2);
        let classic = entries.iter().find(|(name, _)| name == "classic").unwrap();
        assert_eq!(classic.1.path(), "$.profiles.classic");
    }
}
