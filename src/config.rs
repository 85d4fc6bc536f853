use std::path::PathBuf;
use std::time::Duration;

/// Which dynamic source the API key is resolved from. `Fallback` is only
/// selected when no dynamic source is enabled but a static fallback key is
/// configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    File,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub key_source: KeySource,
    /// Name of the environment variable the environment backend reads.
    pub api_key_env: String,
    /// Path to the mounted key file. Required when `key_source` is `File`.
    pub api_key_file: Option<PathBuf>,
    /// Static key of last resort.
    pub api_key_fallback: Option<String>,
    /// How long a resolved key may be served from cache.
    pub cache_ttl_minutes: u64,
    /// Symmetric key used to sign access tokens. Never empty.
    pub oauth_signing_key: String,
    pub oauth_issuer: String,
    pub oauth_audience: String,
    pub token_expiration_minutes: i64,
    /// Carried for deployments that layer a refresh flow on top; this core
    /// issues no refresh tokens.
    pub refresh_expiration_days: i64,
    /// Optional JSON file the client registry is populated from.
    pub clients_file: Option<PathBuf>,
}

impl Config {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes * 60)
    }
}

/// Loads configuration from the environment (and `.env` in development).
///
/// Misconfiguration that would make authentication meaningless (no
/// signing key, no key source) is fatal here: the service refuses to
/// start rather than serve authenticated traffic with an empty secret.
pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let oauth_signing_key = std::env::var("KEYGATE_OAUTH_SIGNING_KEY").unwrap_or_default();
    if oauth_signing_key.trim().is_empty() {
        anyhow::bail!(
            "KEYGATE_OAUTH_SIGNING_KEY is not set. \
             Refusing to serve authenticated traffic without a signing secret."
        );
    }

    let api_key_fallback = std::env::var("KEYGATE_API_KEY_FALLBACK")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let key_source = match std::env::var("KEYGATE_KEY_SOURCE")
        .unwrap_or_default()
        .to_ascii_lowercase()
        .as_str()
    {
        "environment" => KeySource::Environment,
        "file" => KeySource::File,
        "" => {
            if api_key_fallback.is_some() {
                KeySource::Fallback
            } else {
                anyhow::bail!(
                    "KEYGATE_KEY_SOURCE is not set and no KEYGATE_API_KEY_FALLBACK is configured"
                );
            }
        }
        other => anyhow::bail!(
            "unknown KEYGATE_KEY_SOURCE '{other}' (expected 'environment' or 'file')"
        ),
    };

    let api_key_file = std::env::var("KEYGATE_API_KEY_FILE")
        .ok()
        .map(PathBuf::from);
    if key_source == KeySource::File && api_key_file.is_none() {
        anyhow::bail!("KEYGATE_KEY_SOURCE=file requires KEYGATE_API_KEY_FILE");
    }

    Ok(Config {
        key_source,
        api_key_env: std::env::var("KEYGATE_API_KEY_ENV")
            .unwrap_or_else(|_| "KEYGATE_API_KEY".into()),
        api_key_file,
        api_key_fallback,
        cache_ttl_minutes: std::env::var("KEYGATE_CACHE_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(crate::secrets::cache::DEFAULT_TTL_MINUTES),
        oauth_signing_key,
        oauth_issuer: std::env::var("KEYGATE_OAUTH_ISSUER").unwrap_or_else(|_| "keygate".into()),
        oauth_audience: std::env::var("KEYGATE_OAUTH_AUDIENCE")
            .unwrap_or_else(|_| "keygate-api".into()),
        token_expiration_minutes: std::env::var("KEYGATE_TOKEN_EXPIRATION_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60),
        refresh_expiration_days: std::env::var("KEYGATE_REFRESH_EXPIRATION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7),
        clients_file: std::env::var("KEYGATE_CLIENTS_FILE").ok().map(PathBuf::from),
    })
}
