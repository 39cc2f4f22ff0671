use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Fixed token header, serialized into the first segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims carried in the token payload. Field names match the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "Meeting")]
    pub meeting: String,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Admin")]
    pub admin: bool,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
}

/// Session token service.
///
/// Tokens are three dot-separated segments:
/// `base64(header JSON) . base64(payload JSON) . base64(JSON(hex(HMAC-SHA256)))`.
/// Standard (padded) base64 throughout. Tokens carry no expiry claim; liveness
/// is re-derived by checking that the referenced meeting still exists.
#[derive(Clone)]
pub struct AuthService {
    secret: Vec<u8>,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self {
            secret: config.token_secret.as_bytes().to_vec(),
        }
    }

    /// Issue a signed token for a user in a meeting.
    pub fn issue_token(&self, meeting_id: &str, username: &str, admin: bool) -> Result<String> {
        let header_json = serde_json::to_string(&TokenHeader::hs256())
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        let payload_json = serde_json::to_string(&TokenClaims {
            meeting: meeting_id.to_string(),
            username: username.to_string(),
            admin,
        })
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        let message = format!(
            "{}.{}",
            BASE64_STANDARD.encode(header_json),
            BASE64_STANDARD.encode(payload_json)
        );
        let signature = self.signature_segment(&message);

        Ok(format!("{}.{}", message, signature))
    }

    /// Verify a token and return its claims.
    ///
    /// The caller must separately confirm the referenced meeting still exists;
    /// absence from the store is the only expiry signal.
    pub fn verify_token(&self, token: &str) -> std::result::Result<TokenClaims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(TokenError::Malformed);
        }

        let header_bytes = BASE64_STANDARD
            .decode(segments[0])
            .map_err(|_| TokenError::Malformed)?;
        let _header: TokenHeader =
            serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;

        let payload_bytes = BASE64_STANDARD
            .decode(segments[1])
            .map_err(|_| TokenError::Malformed)?;
        let claims: TokenClaims =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;

        let message = format!("{}.{}", segments[0], segments[1]);
        let expected = self.signature_segment(&message);

        if !bool::from(expected.as_bytes().ct_eq(segments[2].as_bytes())) {
            return Err(TokenError::BadSignature);
        }

        Ok(claims)
    }

    /// Compute the third token segment over `header_b64.payload_b64`.
    fn signature_segment(&self, message: &str) -> String {
        // HMAC accepts keys of any length, so keying cannot fail.
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC key of any length is valid");
        mac.update(message.as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());

        // The digest travels as the base64 of its JSON-serialized hex form.
        // Hex needs no JSON escaping, so quoting is sufficient.
        BASE64_STANDARD.encode(format!("\"{}\"", digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_host: "localhost".to_string(),
            server_port: 8080,
            redis_url: "redis://localhost".to_string(),
            token_secret: "test-secret-key".to_string(),
            meeting_ttl_seconds: 86400,
            room_capacity: 2,
            static_dir: "build".to_string(),
        }
    }

    fn auth() -> AuthService {
        AuthService::new(&test_config())
    }

    #[test]
    fn test_issue_and_verify_token() {
        let auth = auth();

        let token = auth
            .issue_token("a1b2c3d4", "alice", true)
            .expect("Should issue token");

        let claims = auth.verify_token(&token).expect("Should verify token");

        assert_eq!(claims.meeting, "a1b2c3d4");
        assert_eq!(claims.username, "alice");
        assert!(claims.admin);
    }

    #[test]
    fn test_token_has_three_segments() {
        let token = auth()
            .issue_token("a1b2c3d4", "alice", false)
            .expect("Should issue token");

        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let auth = auth();
        let token = auth
            .issue_token("a1b2c3d4", "alice", false)
            .expect("Should issue token");

        // Swap the payload for a forged one without re-signing.
        let segments: Vec<&str> = token.split('.').collect();
        let forged = BASE64_STANDARD
            .encode(r#"{"Meeting":"a1b2c3d4","Username":"alice","Admin":true}"#);
        let tampered = format!("{}.{}.{}", segments[0], forged, segments[2]);

        assert_eq!(auth.verify_token(&tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_wrong_segment_count_is_malformed() {
        let auth = auth();
        let token = auth
            .issue_token("a1b2c3d4", "alice", false)
            .expect("Should issue token");
        let (message, _) = token.rsplit_once('.').expect("token has segments");

        assert_eq!(auth.verify_token(message), Err(TokenError::Malformed));
        assert_eq!(
            auth.verify_token(&format!("{}.extra", token)),
            Err(TokenError::Malformed)
        );
        assert_eq!(auth.verify_token(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_undecodable_segments_are_malformed() {
        let auth = auth();

        // Not base64 at all.
        assert_eq!(
            auth.verify_token("?.?.?"),
            Err(TokenError::Malformed)
        );

        // Valid base64 that is not JSON.
        let junk = BASE64_STANDARD.encode("not json");
        assert_eq!(
            auth.verify_token(&format!("{}.{}.{}", junk, junk, junk)),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_secrets_do_not_cross_verify() {
        let auth = auth();
        let mut other_config = test_config();
        other_config.token_secret = "a-different-secret".to_string();
        let other = AuthService::new(&other_config);

        let token = auth
            .issue_token("a1b2c3d4", "alice", false)
            .expect("Should issue token");

        assert_eq!(other.verify_token(&token), Err(TokenError::BadSignature));
    }
}
