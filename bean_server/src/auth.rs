//! Bearer token authentication.
//!
//! Access tokens are HS256 JWTs issued by the identity provider, signed with a secret shared with this server. The
//! `sub` claim is the user's id. Every route that acts on behalf of a user takes an [`AuthenticatedUser`] argument,
//! which only exists if the request carried a valid, unexpired token. The user id is never read from a request body.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use bean_common::Secret;
use bean_engine::db_types::UserId;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    /// Expiry, in seconds since the unix epoch
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Signs and validates access tokens.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
    secret: Secret<String>,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { secret: config.jwt_secret.clone() }
    }

    fn key_bytes(&self) -> Result<&[u8], AuthError> {
        if self.secret.is_unset() {
            return Err(AuthError::MisconfiguredAuthority);
        }
        Ok(self.secret.reveal().as_bytes())
    }

    /// Issue a new access token for the given user.
    /// This method DOES NOT check that the user exists anywhere. The caller must have authenticated them already.
    pub fn issue_token(&self, user_id: &UserId, duration: Option<Duration>) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + duration.unwrap_or_else(|| Duration::hours(24));
        let claims = JwtClaims { sub: user_id.to_string(), exp: exp.timestamp(), iat: Some(now.timestamp()) };
        let key = EncodingKey::from_secret(self.key_bytes()?);
        encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))
    }

    /// Checks the token's algorithm, signature and expiry, and returns its claims.
    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let key = DecodingKey::from_secret(self.key_bytes()?);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let claims = decode::<JwtClaims>(token.trim(), &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::ValidationError("signature has failed verification".into()),
            ErrorKind::InvalidAlgorithm => AuthError::ValidationError("Unsupported algorithm".into()),
            _ => AuthError::PoorlyFormattedToken(e.to_string()),
        })?;
        let claims = claims.claims;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::ValidationError("The token has no subject".into()));
        }
        Ok(claims)
    }
}

/// The verified identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &UserId {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ServerError> {
    let issuer = req.app_data::<web::Data<TokenIssuer>>().ok_or_else(|| {
        error!("🔐️ No TokenIssuer has been registered with the app. Cannot authenticate requests.");
        AuthError::MisconfiguredAuthority
    })?;
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;
    let claims = issuer.validate(token).map_err(|e| {
        debug!("🔐️ Access token rejected. {e}");
        e
    })?;
    Ok(AuthenticatedUser(UserId::from(claims.sub)))
}
