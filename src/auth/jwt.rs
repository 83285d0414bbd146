use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{auth::repo_types::Account, config::JwtConfig, error::AppError, state::AppState};

/// Token lifetime. Fixed, never taken from configuration or requests.
pub const TOKEN_TTL_SECS: i64 = 3600;

pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,       // account id
    pub name: String,
    pub avatar: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
        }
    }
}

impl JwtKeys {
    pub(crate) fn sign_at(&self, account: &Account, issued_at: OffsetDateTime) -> anyhow::Result<String> {
        let exp = issued_at + TimeDuration::seconds(TOKEN_TTL_SECS);
        let claims = Claims {
            id: account.id,
            name: account.name.clone(),
            avatar: account.avatar.clone(),
            iat: issued_at.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %account.id, "jwt signed");
        Ok(token)
    }

    pub fn sign(&self, account: &Account) -> anyhow::Result<String> {
        self.sign_at(account, OffsetDateTime::now_utc())
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}

/// Identity decoded from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
}

impl From<Claims> for AuthUser {
    fn from(c: Claims) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AppError::Unauthorized("Invalid Authorization header"))?;

        match keys.verify(token) {
            Ok(claims) => Ok(claims.into()),
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                Err(AppError::Unauthorized("Invalid or expired token"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, JwtConfig};
    use std::sync::Arc;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        let mut state = AppState::fake();
        state.config = Arc::new(AppConfig {
            jwt: JwtConfig {
                secret: secret.into(),
                issuer: issuer.into(),
                audience: audience.into(),
            },
            ..(*state.config).clone()
        });
        JwtKeys::from_ref(&state)
    }

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar: "https://www.gravatar.com/avatar/x?s=200&r=pg&d=mm".into(),
            password_hash: "$argon2id$stub".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn sign_and_verify_carries_identity() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let acct = account();
        let token = keys.sign(&acct).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.id, acct.id);
        assert_eq!(claims.name, "Ada");
        assert_eq!(claims.avatar, acct.avatar);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - TimeDuration::seconds(TOKEN_TTL_SECS + 5);
        let token = keys.sign_at(&account(), issued).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_accepts_token_inside_window() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - TimeDuration::seconds(TOKEN_TTL_SECS - 60);
        let token = keys.sign_at(&account(), issued).expect("sign");
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn verify_rejects_other_secret_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let token = good.sign(&account()).expect("sign");
        assert!(make_keys("same-secret", "bad-iss", "good-aud").verify(&token).is_err());
        assert!(make_keys("same-secret", "good-iss", "bad-aud").verify(&token).is_err());
        assert!(make_keys("other-secret", "good-iss", "good-aud").verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign(&account()).expect("sign");
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        // swap in another token's payload, keep the original signature
        let other = keys.sign(&account()).expect("sign");
        parts[1] = other.split('.').nth(1).unwrap().to_string();
        assert!(keys.verify(&parts.join(".")).is_err());
    }
}
