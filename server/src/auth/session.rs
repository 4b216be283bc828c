//! Signed session tokens and the cookie that carries them.
//!
//! The token is an HS256 JWT whose subject is the user id. It is stateless:
//! signing out clears the cookie, and a token whose user has since been
//! deleted is rejected by the extractor.

use crate::error::{AppError, AppResult};
use crate::ids::ObjectId;
use axum::http::HeaderValue;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "access_token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    secure_cookie: bool,
}

impl SessionManager {
    pub fn new(secret: &[u8], ttl: Duration, secure_cookie: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            secure_cookie,
        }
    }

    pub fn issue(&self, user_id: &ObjectId) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign session token: {e}")))
    }

    /// Checks signature and expiry and returns the user id the token was issued for.
    pub fn verify(&self, token: &str) -> AppResult<ObjectId> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);

        let claims = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Session expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid session token".to_string()),
            })?
            .claims;

        ObjectId::parse(&claims.sub)
            .ok_or_else(|| AppError::Unauthorized("Invalid session token".to_string()))
    }

    /// `Set-Cookie` value carrying a fresh token.
    pub fn cookie(&self, token: &str) -> AppResult<HeaderValue> {
        self.cookie_header(token, self.ttl.num_seconds())
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn cleared_cookie(&self) -> AppResult<HeaderValue> {
        self.cookie_header("", 0)
    }

    fn cookie_header(&self, value: &str, max_age: i64) -> AppResult<HeaderValue> {
        let secure = if self.secure_cookie { "; Secure" } else { "" };
        let cookie =
            format!("{SESSION_COOKIE}={value}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}{secure}");
        HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))
    }
}

/// Finds the session cookie in a `Cookie` request header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}
