//! Login-token issuance and verification.
//!
//! A token is `base64url(payload_json) . base64url(hmac_sha256(payload))`,
//! both parts unpadded. The payload carries only non-secret user fields
//! plus an expiry timestamp; password handling is the caller's concern.

use crate::models::{Role, User};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Token error type
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Token is not two dot-separated base64url parts
    Malformed,
    /// Signature does not match the payload
    BadSignature,
    /// Payload is not the expected JSON shape
    BadPayload(String),
    /// Token expiry is in the past
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::BadSignature => write!(f, "Token signature mismatch"),
            TokenError::BadPayload(s) => write!(f, "Invalid token payload: {s}"),
            TokenError::Expired => write!(f, "Token has expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// The signed, non-secret identity a token carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: i64,
    pub name: String,
    pub role: Role,
    pub hospital_id: Option<String>,
    pub company_id: Option<String>,
    /// Unix timestamp (seconds) after which the token is rejected.
    pub exp: i64,
}

impl TokenClaims {
    /// Build claims for a user, expiring `ttl_seconds` from now.
    pub fn for_user(user: &User, ttl_seconds: i64) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            role: user.role,
            hospital_id: user.hospital_id.clone(),
            company_id: user.company_id.clone(),
            exp: Utc::now().timestamp() + ttl_seconds,
        }
    }
}

fn sign(payload_b64: &str, secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length, new_from_slice cannot fail here.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(payload_b64.as_bytes());
    mac
}

/// Mint a signed token for the given claims.
///
/// # Errors
///
/// Returns `TokenError::BadPayload` if the claims fail to serialize.
pub fn issue_token(claims: &TokenClaims, secret: &str) -> Result<String, TokenError> {
    let payload =
        serde_json::to_vec(claims).map_err(|e| TokenError::BadPayload(e.to_string()))?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
    let sig = sign(&payload_b64, secret).finalize().into_bytes();
    let sig_b64 = URL_SAFE_NO_PAD.encode(sig);
    Ok(format!("{payload_b64}.{sig_b64}"))
}

/// Verify a token and return its claims.
///
/// # Errors
///
/// Returns `TokenError::Malformed` for anything that is not two
/// dot-separated base64url parts, `BadSignature` when the HMAC does not
/// match, `BadPayload` for an undecodable payload, and `Expired` when
/// `exp` has passed. Signature is checked before the payload is decoded.
pub fn verify_token(token: &str, secret: &str) -> Result<TokenClaims, TokenError> {
    let (payload_b64, sig_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let sig = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|_| TokenError::Malformed)?;

    sign(payload_b64, secret)
        .verify_slice(&sig)
        .map_err(|_| TokenError::BadSignature)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::Malformed)?;
    let claims: TokenClaims = serde_json::from_slice(&payload)
        .map_err(|e| TokenError::BadPayload(e.to_string()))?;

    if claims.exp < Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(ttl: i64) -> TokenClaims {
        TokenClaims {
            user_id: 12,
            name: "Meera".into(),
            role: Role::HospitalAdmin,
            hospital_id: Some("hosp-1".into()),
            company_id: None,
            exp: Utc::now().timestamp() + ttl,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let c = claims(3600);
        let token = issue_token(&c, "secret").unwrap();
        let verified = verify_token(&token, "secret").unwrap();
        assert_eq!(verified, c);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = issue_token(&claims(3600), "secret").unwrap();
        assert_eq!(
            verify_token(&token, "other").unwrap_err(),
            TokenError::BadSignature
        );
    }

    #[test]
    fn test_token_rejects_tampered_payload() {
        let token = issue_token(&claims(3600), "secret").unwrap();
        let sig = token.split_once('.').unwrap().1;
        let forged_payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims(999_999)).unwrap());
        let forged = format!("{forged_payload}.{sig}");
        assert!(verify_token(&forged, "secret").is_err());
    }

    #[test]
    fn test_token_rejects_expired() {
        let token = issue_token(&claims(-10), "secret").unwrap();
        assert_eq!(
            verify_token(&token, "secret").unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn test_token_rejects_garbage() {
        assert_eq!(
            verify_token("not-a-token", "secret").unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn test_token_is_unpadded_base64url() {
        let token = issue_token(&claims(3600), "secret").unwrap();
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
    }
}
