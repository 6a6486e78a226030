use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Header carrying the signed webhook token
pub const SIGNATURE_HEADER: &str = "upstash-signature";

#[derive(Error, Debug, PartialEq)]
pub enum SignatureError {
    #[error("No webhook signing keys are configured")]
    NoSigningKeys,
    #[error("Signature is not valid for any signing key: {0}")]
    InvalidToken(String),
    #[error("Signed body hash does not match the request body")]
    BodyMismatch,
}

#[derive(Debug, Deserialize)]
struct WebhookClaims {
    /// base64url encoded SHA-256 of the request body
    body: String,
}

/// Verifies an HS256 signed webhook token against the raw request body.
/// Keys are tried in order so that keys can be rotated.
pub fn verify_signature(token: &str, body: &[u8], keys: &[String]) -> Result<(), SignatureError> {
    if keys.is_empty() {
        return Err(SignatureError::NoSigningKeys);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_nbf = true;

    let mut last_error = String::new();
    for key in keys {
        match decode::<WebhookClaims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
        {
            Ok(data) => {
                let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(body));
                return if data.claims.body.trim_end_matches('=') == expected {
                    Ok(())
                } else {
                    Err(SignatureError::BodyMismatch)
                };
            }
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(SignatureError::InvalidToken(last_error))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        body: String,
        exp: i64,
        nbf: i64,
        iss: String,
    }

    pub fn sign(body: &[u8], key: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            body: base64::engine::general_purpose::URL_SAFE.encode(Sha256::digest(body)),
            exp: now + 300,
            nbf: now - 10,
            iss: "Upstash".into(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn it_accepts_a_valid_signature() {
        let body = br#"{"trigger":"cron"}"#;
        let token = sign(body, "current");
        assert_eq!(verify_signature(&token, body, &["current".into()]), Ok(()));
    }

    #[test]
    fn it_tries_the_next_key() {
        let body = b"";
        let token = sign(body, "next");
        let keys = vec!["current".to_string(), "next".to_string()];
        assert_eq!(verify_signature(&token, body, &keys), Ok(()));
    }

    #[test]
    fn it_rejects_unknown_keys_and_tampered_bodies() {
        let token = sign(b"original", "current");
        assert!(matches!(
            verify_signature(&token, b"original", &["other".into()]),
            Err(SignatureError::InvalidToken(_))
        ));
        assert_eq!(
            verify_signature(&token, b"tampered", &["current".into()]),
            Err(SignatureError::BodyMismatch)
        );
        assert_eq!(
            verify_signature(&token, b"original", &[]),
            Err(SignatureError::NoSigningKeys)
        );
        assert!(verify_signature("garbage", b"original", &["current".into()]).is_err());
    }
}
