//! Parsed request handed to handlers.
//!
//! # Responsibilities
//! - Carry method, path, captured params, query, headers and body
//! - Parse integer path params and clamp `limit` query values
//! - Decode the body as a JSON object and read loosely typed fields
//! - Authenticate the caller from the bearer credential
//!
//! # Design Decisions
//! - Built once per request by the dispatcher; handlers own it
//! - Query strings are decoded with axum's `Query` extractor
//! - Empty query values count as absent

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::Query,
    http::{HeaderMap, Method, Uri},
};
use serde_json::{Map, Value};

use crate::auth::{self, Claims, TokenCodec};
use crate::error::{ApiError, FieldErrors};
use crate::routing::Params;

#[derive(Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Params,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiRequest {
    pub fn new(method: Method, uri: &Uri, params: Params, headers: HeaderMap, body: Bytes) -> Self {
        let query = Query::<HashMap<String, String>>::try_from_uri(uri)
            .map(|Query(q)| q)
            .unwrap_or_default();
        Self {
            method,
            path: uri.path().to_string(),
            params,
            query,
            headers,
            body,
        }
    }

    /// Raw path parameter.
    pub fn param(&self, name: &str) -> Result<&str, ApiError> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::bad_request(format!("Missing parameter {name}")))
    }

    /// Path parameter that must be an integer.
    pub fn int_param(&self, name: &str) -> Result<i64, ApiError> {
        self.param(name)?
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid parameter {name}")))
    }

    /// Query value, `None` when absent or empty.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// `limit` query value clamped to `1..=max`. Absent or unparsable yields `default`.
    pub fn limit(&self, default: usize, max: usize) -> usize {
        self.query("limit")
            .and_then(|v| v.parse::<i64>().ok())
            .map(|v| v.clamp(1, max as i64) as usize)
            .unwrap_or(default)
    }

    /// Decode the body as a JSON object.
    pub fn payload(&self) -> Result<Payload, ApiError> {
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(map)) => Ok(Payload(map)),
            _ => Err(ApiError::bad_request("Invalid request body")),
        }
    }

    /// The caller's claims, or 401.
    pub fn authenticate(&self, codec: &TokenCodec) -> Result<Claims, ApiError> {
        self.optional_user(codec).ok_or(ApiError::Unauthenticated)
    }

    /// The caller's claims when a valid credential is present.
    pub fn optional_user(&self, codec: &TokenCodec) -> Option<Claims> {
        auth::authenticate(codec, &self.headers)
    }
}

/// A JSON object body with loosely typed field access.
#[derive(Debug, Clone)]
pub struct Payload(pub Map<String, Value>);

impl Payload {
    fn present(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Fail with 422 listing every field that is absent or blank.
    pub fn require(&self, fields: &[&str]) -> Result<(), ApiError> {
        let missing: FieldErrors = fields
            .iter()
            .filter(|field| self.text(field).map_or(true, |v| v.is_empty()))
            .map(|field| (field.to_string(), format!("The {field} field is required")))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::invalid_fields("Missing required fields", missing))
        }
    }

    /// Trimmed string form of a scalar field.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.present(key)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Like [`Payload::text`] but blank strings count as absent.
    pub fn non_blank(&self, key: &str) -> Option<String> {
        self.text(key).filter(|v| !v.is_empty())
    }

    /// Integer field given as a number or a numeric string.
    pub fn integer(&self, key: &str) -> Result<Option<i64>, ApiError> {
        let Some(value) = self.present(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| ApiError::invalid(format!("{key} must be an integer")))
    }

    /// Truthiness of a field: `false`, `0`, `""`, `"0"` and empty containers are false.
    pub fn flag(&self, key: &str) -> Option<bool> {
        let truthy = match self.present(key)? {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !(s.is_empty() || s == "0"),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            Value::Null => return None,
        };
        Some(truthy)
    }

    /// Arbitrary JSON field.
    pub fn json(&self, key: &str) -> Option<Value> {
        self.present(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(uri: &str, body: &str) -> ApiRequest {
        let uri: Uri = uri.parse().unwrap();
        ApiRequest::new(
            Method::GET,
            &uri,
            Params::new(),
            HeaderMap::new(),
            Bytes::from(body.to_string()),
        )
    }

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => Payload(map),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_query_decoding_and_limit() {
        let req = request("/api/builds/search?q=hu%20tao&limit=500&empty=", "");
        assert_eq!(req.query("q"), Some("hu tao"));
        assert_eq!(req.query("empty"), None);
        assert_eq!(req.limit(20, 100), 100);

        let req = request("/x?limit=0", "");
        assert_eq!(req.limit(10, 50), 1);
        let req = request("/x?limit=abc", "");
        assert_eq!(req.limit(10, 50), 10);
        let req = request("/x", "");
        assert_eq!(req.limit(10, 50), 10);
    }

    #[test]
    fn test_int_param() {
        let mut req = request("/api/builds/12", "");
        req.params.insert("id".into(), "12".into());
        assert_eq!(req.int_param("id").unwrap(), 12);

        req.params.insert("id".into(), "twelve".into());
        assert!(matches!(req.int_param("id"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_payload_requires_object() {
        assert!(request("/", "{\"a\":1}").payload().is_ok());
        assert!(request("/", "[1,2]").payload().is_err());
        assert!(request("/", "").payload().is_err());
        assert!(request("/", "not json").payload().is_err());
    }

    #[test]
    fn test_require_lists_blank_fields() {
        let body = payload(json!({"username": "  ", "email": "a@b.c"}));
        let err = body.require(&["username", "email", "password"]).unwrap_err();
        let ApiError::Validation { errors: Some(errors), .. } = err else {
            panic!("expected field errors");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("username"));
        assert!(errors.contains_key("password"));
    }

    #[test]
    fn test_loose_field_types() {
        let body = payload(json!({
            "character_id": "7",
            "refinement": 3,
            "bad": "x",
            "public_str": "0",
            "public_num": 1,
            "tags": ["a"],
            "nothing": null
        }));
        assert_eq!(body.integer("character_id").unwrap(), Some(7));
        assert_eq!(body.integer("refinement").unwrap(), Some(3));
        assert_eq!(body.integer("nothing").unwrap(), None);
        assert!(body.integer("bad").is_err());
        assert_eq!(body.flag("public_str"), Some(false));
        assert_eq!(body.flag("public_num"), Some(true));
        assert_eq!(body.flag("nothing"), None);
        assert_eq!(body.json("tags"), Some(json!(["a"])));
        assert_eq!(body.text("refinement").as_deref(), Some("3"));
    }
}
