//! Client-credentials token issuance and stateless validation.
//!
//! Tokens are JWTs signed with HMAC-SHA256 over the configured symmetric
//! key. The service keeps no record of issued tokens — validity is
//! re-derived entirely from the signed claims, so there is no revocation
//! path short of expiry.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::OAuthError;
use crate::secrets::constant_time_eq;

use super::registry::ClientRegistry;

const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";

/// Wire shape of the token endpoint request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: String,
    /// Space-delimited scope list; empty means "everything the client has".
    #[serde(default)]
    pub scope: String,
}

/// Wire shape of a successful token response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub scope: String,
    pub issued_at: DateTime<Utc>,
}

/// Signed claims embedded in every issued token. All timestamps are UTC
/// unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated client id.
    pub sub: String,
    /// Space-delimited granted scopes.
    pub scope: String,
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    /// Granted scopes as a set, for containment checks by the caller.
    pub fn scopes(&self) -> BTreeSet<String> {
        self.scope.split_whitespace().map(str::to_string).collect()
    }
}

/// Authenticates client-credentials grants against a [`ClientRegistry`]
/// and mints/validates signed access tokens.
pub struct TokenService {
    registry: Arc<ClientRegistry>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    token_lifetime: Duration,
}

impl TokenService {
    pub fn new(
        registry: Arc<ClientRegistry>,
        signing_key: &str,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        token_expiration_minutes: i64,
    ) -> Self {
        Self {
            registry,
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
            token_lifetime: Duration::minutes(token_expiration_minutes),
        }
    }

    pub fn from_config(registry: Arc<ClientRegistry>, config: &Config) -> Self {
        Self::new(
            registry,
            &config.oauth_signing_key,
            config.oauth_issuer.clone(),
            config.oauth_audience.clone(),
            config.token_expiration_minutes,
        )
    }

    /// Runs the client-credentials grant:
    /// grant-type check → client authentication → scope resolution →
    /// signed-token issuance. Any failure is terminal for the request.
    pub fn issue_token(&self, req: &TokenRequest) -> Result<TokenResponse, OAuthError> {
        if req.grant_type != GRANT_CLIENT_CREDENTIALS {
            return Err(OAuthError::UnsupportedGrantType);
        }

        // Unknown id and wrong secret take the same exit. The secret
        // comparison is constant-time and the secret itself is never
        // logged.
        let client = self
            .registry
            .find_active(&req.client_id)
            .ok_or(OAuthError::InvalidClient)?;
        if !constant_time_eq(
            client.client_secret.as_bytes(),
            req.client_secret.as_bytes(),
        ) {
            return Err(OAuthError::InvalidClient);
        }

        let requested: BTreeSet<String> =
            req.scope.split_whitespace().map(str::to_string).collect();
        let granted: BTreeSet<String> = if requested.is_empty() {
            client.scopes.clone()
        } else {
            let granted: BTreeSet<String> =
                requested.intersection(&client.scopes).cloned().collect();
            if granted.is_empty() {
                return Err(OAuthError::InvalidScope);
            }
            granted
        };
        let scope = granted.into_iter().collect::<Vec<_>>().join(" ");

        let now = Utc::now();
        let expires_at = now + self.token_lifetime;
        let claims = Claims {
            sub: client.client_id.clone(),
            scope: scope.clone(),
            aud: self.audience.clone(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
                .map_err(|e| {
                    tracing::error!(error = %e, "token signing failed");
                    OAuthError::ServerError
                })?;

        tracing::info!(client_id = %claims.sub, scope = %scope, "issued access token");

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_lifetime.num_seconds() as u64,
            scope,
            issued_at: now,
        })
    }

    /// Verifies signature, issuer, and audience, then the validity window.
    /// On success returns the embedded claims for authorization decisions.
    pub fn validate_token(&self, token: &str) -> Result<Claims, OAuthError> {
        self.validate_token_at(token, Utc::now())
    }

    // Time-injected variant; validity is [nbf, exp) with no leeway, so a
    // token with exp == now is already expired.
    fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, OAuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks are done explicitly below, with strict boundaries.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                OAuthError::InvalidToken
            })?;
        let claims = data.claims;

        let ts = now.timestamp();
        if ts < claims.nbf || ts >= claims.exp {
            return Err(OAuthError::TokenExpired);
        }

        Ok(claims)
    }
}
