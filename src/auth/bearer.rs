//! Bearer credential extraction.

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Extract the credential from the first `Authorization` header.
///
/// The scheme match is case-insensitive and any run of whitespace may follow it.
/// Returns `None` for a missing header, another scheme, or an empty credential.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credential) = value.trim_start().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credential = credential.trim();
    (!credential.is_empty()).then_some(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: &'static str, values: &[&'static str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for v in values {
            map.append(name, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_standard_header() {
        let map = headers("authorization", &["Bearer abc.def.ghi"]);
        assert_eq!(bearer_token(&map), Some("abc.def.ghi"));
    }

    #[test]
    fn test_case_insensitive() {
        let mut map = HeaderMap::new();
        map.insert(
            axum::http::HeaderName::from_bytes(b"Authorization").unwrap(),
            HeaderValue::from_static("bEaReR   abc.def.ghi"),
        );
        assert_eq!(bearer_token(&map), Some("abc.def.ghi"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let map = headers("authorization", &["Bearer first", "Bearer second"]);
        assert_eq!(bearer_token(&map), Some("first"));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert_eq!(bearer_token(&headers("authorization", &["Basic dXNlcjpwYXNz"])), None);
        assert_eq!(bearer_token(&headers("authorization", &["Bearer"])), None);
        assert_eq!(bearer_token(&headers("authorization", &["Bearer   "])), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
