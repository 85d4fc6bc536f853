//! API-key resolution: pluggable secret backends plus a TTL cache.
//!
//! A [`SecretBackend`] knows how to produce a raw secret from exactly one
//! source (process environment, a mounted file, or a static fallback).
//! Backends never cache and never panic across their boundary; every
//! failure normalizes to `None`. The [`cache::CachingResolver`] wraps a
//! backend (or another resolver) and bounds how often the source is hit.

pub mod cache;
pub mod env;
pub mod fallback;
pub mod file;
pub mod provider;

pub use cache::CachingResolver;
pub use env::EnvBackend;
pub use fallback::FallbackBackend;
pub use file::FileBackend;
pub use provider::ApiKeyProvider;

use async_trait::async_trait;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Where a secret value was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Environment,
    File,
    Fallback,
}

/// An opaque secret value tagged with its source.
///
/// The value is zeroed on drop. There is deliberately no `PartialEq` impl:
/// secrets are compared through the crate's constant-time helper so
/// comparisons cannot leak timing information.
#[derive(Clone)]
pub struct Secret {
    value: String,
    source: SecretSource,
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

impl Secret {
    pub fn new(value: impl Into<String>, source: SecretSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> SecretSource {
        self.source
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Abstraction over secret sources.
/// Implementations: env var, file on disk, static fallback, and
/// [`cache::CachingResolver`] itself (so caches can be layered).
#[async_trait]
pub trait SecretBackend: Send + Sync {
    /// Produce the secret, or `None` if this source cannot currently
    /// provide one. Must not block beyond the underlying I/O call and
    /// must not propagate errors; all failures normalize to `None`.
    async fn resolve(&self) -> Option<Secret>;
}

/// Constant-time byte comparison. Unequal lengths return false without
/// inspecting content, which leaks only the length.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
