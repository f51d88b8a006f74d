//! Password hashing and JWT issuance/verification.
//!
//! Access tokens embed the caller's identity and role flags so that
//! downstream handlers can authorize without a follow-up lookup.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, StatusCode};
use axum::response::Json;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::schemas::{AppState, ErrorResponse};

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("password hashing failed")]
    Hash,
}

/// Hash a plaintext password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::Hash)
}

/// Verify a plaintext password against a stored Argon2 PHC string.
/// A malformed stored hash verifies as false rather than erroring, so a
/// login failure never reveals which part was wrong.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// JWT claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// "access" or "refresh"; a refresh token is never accepted where
    /// an access token is expected and vice versa.
    pub token_type: String,
    pub exp: i64,
}

pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signing/verification keys plus token lifetimes.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    pub fn new(secret: &[u8], access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    fn claims_for(&self, user: &user::Model, token_type: &str, ttl: Duration) -> Claims {
        Claims {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            token_type: token_type.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        }
    }

    /// Issue an access/refresh token pair for an authenticated user.
    pub fn issue_pair(&self, user: &user::Model) -> Result<TokenPair, AuthError> {
        let access = self.sign(&self.claims_for(user, TOKEN_TYPE_ACCESS, self.access_ttl))?;
        let refresh = self.sign(&self.claims_for(user, TOKEN_TYPE_REFRESH, self.refresh_ttl))?;
        Ok(TokenPair { access, refresh })
    }

    /// Issue a fresh access token from the identity carried by a
    /// validated refresh token.
    pub fn issue_access_from(&self, refresh_claims: &Claims) -> Result<String, AuthError> {
        let mut claims = refresh_claims.clone();
        claims.token_type = TOKEN_TYPE_ACCESS.to_string();
        claims.exp = (Utc::now() + self.access_ttl).timestamp();
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding).map_err(|_| AuthError::InvalidToken)
    }

    /// Decode and validate a token, rejecting the wrong token type and
    /// anything expired or malformed.
    pub fn decode(&self, token: &str, expected_type: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        if data.claims.token_type != expected_type {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

/// Extractor gating administrative endpoints: requires a valid Bearer
/// access token (401 otherwise) carrying `is_staff = true` (403
/// otherwise).
pub struct StaffUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| invalid_token_rejection())?;

        let claims = state
            .jwt
            .decode(token, TOKEN_TYPE_ACCESS)
            .map_err(|_| invalid_token_rejection())?;

        if !claims.is_staff {
            warn!(
                "User '{}' attempted a staff-only operation without staff role",
                claims.username
            );
            return Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::new(
                    "This operation requires a staff account",
                    "STAFF_REQUIRED",
                )),
            ));
        }

        Ok(StaffUser(claims))
    }
}

fn invalid_token_rejection() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(
            "A valid access token is required",
            "INVALID_TOKEN",
        )),
    )
}
