//! Session credential codec.
//!
//! # Wire Format
//! ```text
//! base64url(header) . base64url(payload) . base64url(HMAC-SHA256(secret, header.payload))
//! ```
//! Segments are URL-safe base64 without padding, matching the JWT shape
//! (`{"alg":"HS256","typ":"JWT"}`).
//!
//! # Design Decisions
//! - Stateless: nothing is stored server side, so there is no revocation
//! - Signature comparison is constant time (`Mac::verify_slice`)
//! - Malformed, forged and expired credentials are reported identically;
//!   the reason only reaches debug logs

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: &str = ".";

/// Identity a credential is issued for.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub id: i64,
    pub username: &'a str,
    pub email: &'a str,
}

/// Decoded credential payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

#[derive(Serialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'static str,
}

/// Why a credential was rejected. Never leaves this module.
#[derive(Debug)]
enum Rejection {
    SegmentCount(usize),
    Signature,
    Payload,
    Expired { exp: i64, now: i64 },
}

/// Issues and verifies signed session credentials.
pub struct TokenCodec {
    secret: Vec<u8>,
    algorithm: String,
    validity: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>, algorithm: impl Into<String>, validity: Duration) -> Self {
        Self {
            secret: secret.into(),
            algorithm: algorithm.into(),
            validity,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.secret.as_bytes(),
            config.algorithm.clone(),
            Duration::from_secs(config.expiration_secs),
        )
    }

    /// Issue a credential for `subject`, valid from now.
    pub fn issue(&self, subject: Subject<'_>) -> String {
        self.issue_at(subject, unix_now())
    }

    /// Issue a credential as if the current time were `now`.
    pub fn issue_at(&self, subject: Subject<'_>, now: i64) -> String {
        let header = Header {
            alg: &self.algorithm,
            typ: "JWT",
        };
        let claims = Claims {
            user_id: subject.id,
            username: subject.username.to_string(),
            email: subject.email.to_string(),
            iat: now,
            exp: now.saturating_add(window_secs(self.validity)),
        };

        // Serializing these plain structs cannot fail.
        let header = serde_json::to_vec(&header).unwrap_or_default();
        let payload = serde_json::to_vec(&claims).unwrap_or_default();

        let signing_input = format!(
            "{}{SEPARATOR}{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));

        format!("{signing_input}{SEPARATOR}{signature}")
    }

    /// Verify a credential against the current time.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        self.verify_at(token, unix_now())
    }

    /// Verify a credential as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Option<Claims> {
        match self.decode(token, now) {
            Ok(claims) => Some(claims),
            Err(reason) => {
                debug!(?reason, "Credential rejected");
                None
            }
        }
    }

    fn decode(&self, token: &str, now: i64) -> Result<Claims, Rejection> {
        let segments: Vec<&str> = token.split(SEPARATOR).collect();
        let [header, payload, signature] = segments[..] else {
            return Err(Rejection::SegmentCount(segments.len()));
        };

        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| Rejection::Signature)?;
        let mut mac = self.mac();
        mac.update(header.as_bytes());
        mac.update(SEPARATOR.as_bytes());
        mac.update(payload.as_bytes());
        mac.verify_slice(&provided).map_err(|_| Rejection::Signature)?;

        let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|_| Rejection::Payload)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| Rejection::Payload)?;

        if claims.exp < now {
            return Err(Rejection::Expired { exp: claims.exp, now });
        }

        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }
}

/// Window length in seconds, saturating at the timestamp range.
fn window_secs(validity: Duration) -> i64 {
    i64::try_from(validity.as_secs()).unwrap_or(i64::MAX)
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", "HS256", DAY)
    }

    fn ada() -> Subject<'static> {
        Subject {
            id: 7,
            username: "ada",
            email: "ada@x.com",
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let codec = codec();
        let now = unix_now();
        let token = codec.issue(ada());

        let claims = codec.verify(&token).expect("fresh credential verifies");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.email, "ada@x.com");
        assert!(claims.iat <= unix_now());
        assert!(claims.iat >= now);
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn test_wire_shape() {
        let token = codec().issue_at(ada(), 1_700_000_000);
        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        assert!(!token.contains('='));
        assert!(!token.contains('+') && !token.contains('/'));

        let header = URL_SAFE_NO_PAD.decode(segments[0]).unwrap();
        let header: serde_json::Value = serde_json::from_slice(&header).unwrap();
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");
    }

    #[test]
    fn test_expiry_window() {
        let codec = codec();
        let issued = 1_700_000_000;
        let token = codec.issue_at(ada(), issued);

        assert!(codec.verify_at(&token, issued).is_some());
        assert!(codec.verify_at(&token, issued + 86_400).is_some());
        assert!(codec.verify_at(&token, issued + 86_401).is_none());
        // Signature is valid but the window is long gone.
        assert!(codec.verify(&token).is_none());
    }

    #[test]
    fn test_oversized_window_saturates() {
        let codec = TokenCodec::new("test-secret", "HS256", Duration::from_secs(u64::MAX));
        let issued = 1_700_000_000;
        let token = codec.issue_at(ada(), issued);

        let claims = codec.verify_at(&token, issued).expect("saturated window still verifies");
        assert_eq!(claims.exp, i64::MAX);
    }

    #[test]
    fn test_tampered_signature() {
        let codec = codec();
        let token = codec.issue(ada());
        let (signing_input, signature) = token.rsplit_once('.').unwrap();

        let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
        bytes[0] ^= 0x01;
        let forged = format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(bytes));

        assert!(codec.verify(&forged).is_none());
    }

    #[test]
    fn test_tampered_payload() {
        let codec = codec();
        let token = codec.issue(ada());
        let segments: Vec<&str> = token.split('.').collect();

        let forged_claims = Claims {
            user_id: 1,
            username: "root".into(),
            email: "root@x.com".into(),
            iat: 0,
            exp: i64::MAX,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", segments[0], payload, segments[2]);

        assert!(codec.verify(&forged).is_none());
    }

    #[test]
    fn test_wrong_secret() {
        let token = codec().issue(ada());
        let other = TokenCodec::new("another-secret", "HS256", DAY);
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_segment_count() {
        let codec = codec();
        for token in ["", "a", "a.b", "a.b.c.d", "...", "a..b.c"] {
            assert!(codec.verify(token).is_none(), "{token:?} must be invalid");
        }
    }

    #[test]
    fn test_signed_garbage_payload() {
        let codec = codec();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        let input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(codec.sign(input.as_bytes()));

        assert!(codec.verify(&format!("{input}.{signature}")).is_none());
    }
}
