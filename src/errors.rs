use serde_json::json;
use thiserror::Error;

/// Structured OAuth-style failures surfaced to the HTTP layer.
///
/// Descriptions are deliberately generic: they never reveal which part of
/// a credential was wrong, and client secrets are never echoed into them.
/// Fatal configuration problems are not represented here — those abort
/// start-up via `config::load()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OAuthError {
    /// Unknown client id, inactive/expired client, or wrong client secret.
    /// All three are indistinguishable to the caller.
    #[error("client authentication failed")]
    InvalidClient,

    /// None of the requested scopes are allowed for this client.
    #[error("the requested scope is not available to this client")]
    InvalidScope,

    /// Only the client_credentials grant is supported.
    #[error("the grant type is not supported by this server")]
    UnsupportedGrantType,

    /// Malformed token, bad signature, or wrong issuer/audience.
    #[error("the access token is invalid")]
    InvalidToken,

    /// The token is outside its [nbf, exp) validity window.
    #[error("the access token is expired or not yet valid")]
    TokenExpired,

    /// Token signing failed. Should not happen with a valid signing key.
    #[error("the authorization server encountered an internal error")]
    ServerError,
}

impl OAuthError {
    /// Stable wire code for the `error` field of the error body.
    pub fn error(&self) -> &'static str {
        match self {
            OAuthError::InvalidClient => "invalid_client",
            OAuthError::InvalidScope => "invalid_scope",
            OAuthError::UnsupportedGrantType => "unsupported_grant_type",
            OAuthError::InvalidToken => "invalid_token",
            OAuthError::TokenExpired => "token_expired",
            OAuthError::ServerError => "server_error",
        }
    }

    /// Wire-level error body: `{error, error_description}`.
    pub fn to_body(&self) -> serde_json::Value {
        json!({
            "error": self.error(),
            "error_description": self.to_string(),
        })
    }
}
