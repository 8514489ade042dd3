//! Bearer token signing and verification
//!
//! Tokens are HMAC-signed JWTs carrying a `userId` claim. `exp` is checked when
//! present but is not required, so long-lived tokens issued by older clients
//! keep working until the secret rotates.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::types::{AppError, AppResult};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Signing and verification keys derived from the shared secret.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify the signature and decode the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }

    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Issue a token for `user_id` that expires after `ttl`.
    pub fn issue(&self, user_id: impl Into<String>, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        self.sign(&Claims {
            user_id: user_id.into(),
            iat: Some(now.timestamp()),
            exp: Some((now + ttl).timestamp()),
        })
    }
}

/// Whether a verification failure means the client sent a bad token, as
/// opposed to a fault in the verifier itself.
pub fn is_rejected_token(err: &jsonwebtoken::errors::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::ExpiredSignature
            | ErrorKind::ImmatureSignature
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let keys = JwtKeys::new("test-secret");
        let token = keys.issue("u123", Duration::hours(1)).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id, "u123");
        assert!(claims.exp.unwrap() > claims.iat.unwrap());
    }

    #[test]
    fn test_token_without_expiry_is_accepted() {
        let keys = JwtKeys::new("test-secret");
        let token = keys
            .sign(&Claims {
                user_id: "u1".to_string(),
                iat: None,
                exp: None,
            })
            .unwrap();

        assert_eq!(keys.verify(&token).unwrap().user_id, "u1");
    }

    #[test]
    fn test_wrong_secret_is_a_rejected_token() {
        let token = JwtKeys::new("secret-a").issue("u1", Duration::hours(1)).unwrap();
        let err = JwtKeys::new("secret-b").verify(&token).unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
        assert!(is_rejected_token(&err));
    }

    #[test]
    fn test_garbage_is_a_rejected_token() {
        let keys = JwtKeys::new("test-secret");
        for token in ["not-a-jwt", "a.b.c", ""] {
            let err = keys.verify(token).unwrap_err();
            assert!(is_rejected_token(&err), "{token:?} -> {:?}", err.kind());
        }
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = JwtKeys::new("test-secret");
        let token = keys.issue("u1", Duration::hours(-2)).unwrap();

        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
        assert!(is_rejected_token(&err));
    }

    #[test]
    fn test_missing_user_id_is_rejected() {
        let keys = JwtKeys::new("test-secret");
        let token = encode(
            &Header::default(),
            &serde_json::json!({ "sub": "someone" }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = keys.verify(&token).unwrap_err();
        assert!(is_rejected_token(&err));
    }
}
