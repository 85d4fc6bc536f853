use std::sync::Arc;

use crate::config::{Config, KeySource};

use super::cache::CachingResolver;
use super::env::EnvBackend;
use super::fallback::FallbackBackend;
use super::file::FileBackend;
use super::{constant_time_eq, Secret, SecretBackend};

/// Inbound API-key authentication: resolves the expected key through a
/// [`CachingResolver`] and checks presented candidates against it.
pub struct ApiKeyProvider {
    resolver: CachingResolver,
}

impl ApiKeyProvider {
    pub fn new(resolver: CachingResolver) -> Self {
        Self { resolver }
    }

    /// Builds the backend selected by the configuration and fronts it with
    /// a TTL cache. The static fallback is used only when no dynamic
    /// source is enabled.
    pub fn from_config(config: &Config) -> Self {
        let backend: Arc<dyn SecretBackend> = match config.key_source {
            KeySource::Environment => Arc::new(EnvBackend::new(config.api_key_env.clone())),
            KeySource::File => Arc::new(FileBackend::new(
                config.api_key_file.clone().unwrap_or_default(),
            )),
            KeySource::Fallback => Arc::new(FallbackBackend::new(
                config.api_key_fallback.clone().unwrap_or_default(),
            )),
        };
        Self::new(CachingResolver::new(backend, config.cache_ttl()))
    }

    /// Current API key, if one can be resolved.
    pub async fn get_api_key(&self) -> Option<Secret> {
        self.resolver.get_secret().await
    }

    /// True iff a key resolves and `candidate` matches it. The comparison
    /// is constant-time. May refresh the underlying cache as a side
    /// effect; mutates nothing else.
    pub async fn validate_api_key(&self, candidate: &str) -> bool {
        match self.resolver.get_secret().await {
            Some(secret) => constant_time_eq(secret.value().as_bytes(), candidate.as_bytes()),
            None => false,
        }
    }
}
