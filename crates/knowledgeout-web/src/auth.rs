//! Principal resolution and password hashing
//!
//! Identity is re-verified per request from an `Authorization: Basic`
//! header; the resolved principal is passed explicitly into handlers. No
//! session state, no ambient authentication context.

use crate::state::AppState;
use crate::WebError;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use knowledgeout_core::store::MemberStore;
use knowledgeout_core::{Error, ErrorCode, Role};
use tracing::debug;

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Hash a plaintext password into PHC string format.
pub fn hash_password(password: &str) -> Result<String, WebError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| WebError::Domain(Error::Storage(format!("password hashing failed: {e}"))))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash.
pub fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Extractor: required authentication.
pub struct Auth(pub Principal);

/// Extractor: optional authentication (e.g. `/members/current`).
pub struct MaybeAuth(pub Option<Principal>);

/// Extractor: required authentication plus the ADMIN role.
pub struct AdminAuth(pub Principal);

impl FromRequestParts<AppState> for Auth {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_principal(parts, state).await? {
            Some(principal) => Ok(Auth(principal)),
            None => Err(Error::Unauthorized(ErrorCode::LoginRequired).into()),
        }
    }
}

impl FromRequestParts<AppState> for MaybeAuth {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(resolve_principal(parts, state).await?))
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(principal) = Auth::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            return Err(Error::Forbidden(ErrorCode::AccessDenied).into());
        }
        Ok(AdminAuth(principal))
    }
}

/// Decode the Basic header and verify the credentials against the member
/// store. Absent header resolves to None; a present but invalid header is
/// an authentication failure.
async fn resolve_principal(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<Principal>, WebError> {
    let Some(header_value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let (email, password) = parse_basic(header_value.to_str().unwrap_or_default())
        .ok_or(Error::Unauthorized(ErrorCode::InvalidEmailOrPassword))?;

    let member = state
        .stores
        .members
        .find_active_by_email(&email)
        .await?
        .filter(|m| verify_password(&m.password_hash, &password))
        .ok_or(Error::Unauthorized(ErrorCode::InvalidEmailOrPassword))?;

    debug!(member_id = member.id, "principal resolved");

    Ok(Some(Principal {
        id: member.id,
        email,
        nickname: member.nickname,
        role: member.role,
    }))
}

fn parse_basic(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;
    if email.is_empty() {
        return None;
    }
    Some((email.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "password123"));
        assert!(!verify_password(&hash, "password124"));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("not-a-phc-string", "whatever"));
    }

    #[test]
    fn basic_header_parsing() {
        let encoded = BASE64.encode("a@b.com:secretpw");
        let parsed = parse_basic(&format!("Basic {encoded}"));
        assert_eq!(parsed, Some(("a@b.com".to_string(), "secretpw".to_string())));

        // Passwords may contain colons
        let encoded = BASE64.encode("a@b.com:pa:ss");
        let parsed = parse_basic(&format!("Basic {encoded}"));
        assert_eq!(parsed, Some(("a@b.com".to_string(), "pa:ss".to_string())));

        assert!(parse_basic("Bearer token").is_none());
        assert!(parse_basic("Basic not-base64!!").is_none());
    }
}
