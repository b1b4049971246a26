use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub const STAFF_ROLES: [&str; 2] = ["staff", "admin"];

/// Identity claims issued by the external identity provider.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        STAFF_ROLES.contains(&self.role.as_str())
    }
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Sign a bearer token. Used by the seed binary and tests to stand in for the identity provider.
pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
    role: &str,
    ttl: Duration,
) -> anyhow::Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("Failed to set expiration"))?;
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn verify(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        AppError::LoginRequired
    })?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::LoginRequired)?;

    Ok(AuthUser {
        user_id,
        email: decoded.claims.email,
        role: decoded.claims.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::LoginRequired)?;
        verify(token, &state.jwt_secret)
    }
}

/// The caller's identity when a valid token is present, anonymous otherwise.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = bearer_token(parts).and_then(|token| verify(token, &state.jwt_secret).ok());
        Ok(MaybeUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let id = Uuid::new_v4();
        let token = issue_token("secret", id, "ann@example.com", "staff", Duration::hours(1)).unwrap();
        let user = verify(&token, "secret").unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.email, "ann@example.com");
        assert!(user.is_staff());
    }

    #[test]
    fn wrong_secret_requires_login() {
        let token =
            issue_token("secret", Uuid::new_v4(), "a@b.c", "user", Duration::hours(1)).unwrap();
        assert!(matches!(verify(&token, "other"), Err(AppError::LoginRequired)));
    }

    #[test]
    fn expired_token_requires_login() {
        let token =
            issue_token("secret", Uuid::new_v4(), "a@b.c", "user", Duration::hours(-2)).unwrap();
        assert!(matches!(verify(&token, "secret"), Err(AppError::LoginRequired)));
    }

    #[test]
    fn shoppers_are_not_staff() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            email: String::new(),
            role: "user".into(),
        };
        assert!(matches!(ensure_staff(&user), Err(AppError::Forbidden)));
    }
}
