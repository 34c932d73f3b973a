use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::AppError,
    repository::RepositoryState,
};

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "tremonte_session";

/// Claims
///
/// Payload of the HS256 session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user's id.
    pub sub: Uuid,
    /// Expiration (Unix timestamp).
    pub exp: usize,
    /// Issued at (Unix timestamp).
    pub iat: usize,
}

/// issue_token
///
/// Signs a session token for `user_id` valid for the configured TTL.
pub fn issue_token(config: &AppConfig, user_id: Uuid) -> Result<(String, DateTime<Utc>), AppError> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.session_ttl_hours);
    let claims = Claims {
        sub: user_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign session token: {e}")))?;

    Ok((token, expires_at))
}

/// verify_token
///
/// Returns the claims of a well-signed, unexpired token. Every failure (bad
/// signature, malformed token, expiry) collapses to `None`.
pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| tracing::debug!(error = %e, "Rejected session token"))
    .ok()
}

/// token_from_headers
///
/// Finds the session token in `Authorization: Bearer …` or, failing that, in
/// the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value that stores the session token.
pub fn session_cookie(token: &str, config: &AppConfig) -> String {
    let max_age = config.session_ttl_hours * 3600;
    let secure = if config.secure_cookies() { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}")
}

/// `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie(config: &AppConfig) -> String {
    let secure = if config.secure_cookies() { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{secure}")
}

// --- Passwords ---

/// Hashes a password with Argon2id and a random salt (PHC string format).
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("stored password hash is invalid: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!("password verification failed: {e}"))),
    }
}

/// Hash of a throwaway password, checked when a login names an unknown
/// e-mail so both failure paths pay for one Argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("tremonte-dummy-password").ok());

/// verify_against_dummy
///
/// Runs a full verification against the throwaway hash. Always `Ok(false)` unless
/// the throwaway hash could not be built.
pub fn verify_against_dummy(password: &str) -> Result<bool, AppError> {
    let hash = DUMMY_HASH
        .as_deref()
        .ok_or_else(|| AppError::Internal("dummy password hash unavailable".to_string()))?;
    verify_password(password, hash)
}

/// AuthUser
///
/// The resolved caller identity of an authenticated API request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// AuthUser Extractor
///
/// 1. Local bypass: in `Env::Local` an `x-user-id` header naming an existing
///    user is accepted without a token.
/// 2. Token lookup (Bearer header, then session cookie) and verification.
/// 3. Store lookup, so a deleted user's token stops working immediately.
///
/// Rejects with `AppError::Unauthorized` (401, JSON envelope).
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());
            if let Some(user_id) = bypass_id {
                if let Some(user) = repo.get_user(user_id).await? {
                    return Ok(AuthUser {
                        id: user.id,
                        email: user.email,
                    });
                }
            }
        }

        let token = token_from_headers(&parts.headers).ok_or_else(AppError::unauthorized)?;
        let claims = verify_token(&config.jwt_secret, &token).ok_or_else(AppError::unauthorized)?;

        let user = repo
            .get_user(claims.sub)
            .await?
            .ok_or_else(AppError::unauthorized)?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }
}
