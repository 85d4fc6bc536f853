//! TTL cache with single-flight refresh in front of a [`SecretBackend`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Secret, SecretBackend};

/// Default cache TTL when none is configured.
pub const DEFAULT_TTL_MINUTES: u64 = 5;

/// The single cached value a resolver owns. Mutated only under the
/// resolver's lock; `expires_at = resolved_at + ttl` always holds.
struct CacheEntry {
    value: Secret,
    #[allow(dead_code)]
    resolved_at: Instant,
    expires_at: Instant,
}

/// Wraps one [`SecretBackend`] (or another resolver) and keeps the most
/// recently resolved secret for up to `ttl`.
///
/// The entry lock is held across the whole check-then-refresh-then-store
/// sequence, so N concurrent callers during a cache miss produce exactly
/// one backend read — the rest wait and then take the fresh-hit path.
/// It is never held across anything longer than that sequence.
///
/// Resolvers implement [`SecretBackend`] themselves, so caches compose:
/// an outer short-TTL resolver can front an inner longer-TTL one.
pub struct CachingResolver {
    backend: Arc<dyn SecretBackend>,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
}

impl CachingResolver {
    pub fn new(backend: Arc<dyn SecretBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn with_default_ttl(backend: Arc<dyn SecretBackend>) -> Self {
        Self::new(backend, Duration::from_secs(DEFAULT_TTL_MINUTES * 60))
    }

    /// Returns the cached secret if fresh, otherwise performs one backend
    /// read. Fails closed: if the backend cannot produce a value, callers
    /// get `None` even when a stale entry exists — an expired secret is
    /// never served.
    pub async fn get_secret(&self) -> Option<Secret> {
        let mut entry = self.entry.lock().await;
        let now = Instant::now();

        if let Some(cached) = entry.as_ref() {
            if now < cached.expires_at {
                tracing::debug!("cache hit, serving fresh secret");
                return Some(cached.value.clone());
            }
        }

        match self.backend.resolve().await {
            Some(secret) => {
                tracing::debug!(ttl_secs = self.ttl.as_secs(), "cache refreshed from backend");
                *entry = Some(CacheEntry {
                    value: secret.clone(),
                    resolved_at: now,
                    expires_at: now + self.ttl,
                });
                Some(secret)
            }
            None => {
                // The stale entry (if any) keeps its timestamps; the next
                // call retries the backend. Retry-by-expiry, no backoff.
                tracing::warn!("backend returned no secret on refresh, failing closed");
                None
            }
        }
    }

    /// Drops the cached value. The next `get_secret` hits the backend.
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }
}

#[async_trait]
impl SecretBackend for CachingResolver {
    async fn resolve(&self) -> Option<Secret> {
        self.get_secret().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretSource;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that serves a scripted sequence of responses and counts
    /// how many times it was hit. The last response repeats forever.
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Option<&'static str>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Option<&'static str>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn slow(responses: Vec<Option<&'static str>>, delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new(responses)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SecretBackend for ScriptedBackend {
        async fn resolve(&self) -> Option<Secret> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mut responses = self.responses.lock().await;
            let next = if responses.len() > 1 {
                responses.pop_front().unwrap()
            } else {
                *responses.front().unwrap()
            };
            next.map(|v| Secret::new(v, SecretSource::Fallback))
        }
    }

    #[tokio::test]
    async fn test_fresh_value_served_without_backend_call() {
        let backend = Arc::new(ScriptedBackend::new(vec![Some("v1")]));
        let resolver = CachingResolver::new(backend.clone(), Duration::from_secs(300));

        assert_eq!(resolver.get_secret().await.unwrap().value(), "v1");
        assert_eq!(resolver.get_secret().await.unwrap().value(), "v1");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_refresh() {
        let backend = Arc::new(ScriptedBackend::new(vec![Some("v1"), Some("v2")]));
        let resolver = CachingResolver::new(backend.clone(), Duration::ZERO);

        assert_eq!(resolver.get_secret().await.unwrap().value(), "v1");
        assert_eq!(resolver.get_secret().await.unwrap().value(), "v2");
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_single_flight_under_concurrent_miss() {
        let backend = Arc::new(ScriptedBackend::slow(
            vec![Some("v1")],
            Duration::from_millis(50),
        ));
        let resolver = Arc::new(CachingResolver::new(
            backend.clone(),
            Duration::from_secs(300),
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move { resolver.get_secret().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().value(), "v1");
        }
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_fail_closed_with_no_prior_value() {
        let backend = Arc::new(ScriptedBackend::new(vec![None]));
        let resolver = CachingResolver::new(backend.clone(), Duration::from_secs(300));

        assert!(resolver.get_secret().await.is_none());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_fail_closed_does_not_serve_stale_value() {
        let backend = Arc::new(ScriptedBackend::new(vec![Some("v1"), None, Some("v2")]));
        let resolver = CachingResolver::new(backend.clone(), Duration::ZERO);

        assert_eq!(resolver.get_secret().await.unwrap().value(), "v1");
        // Refresh fails: the stale v1 is not served.
        assert!(resolver.get_secret().await.is_none());
        // Next call retries the backend and recovers.
        assert_eq!(resolver.get_secret().await.unwrap().value(), "v2");
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_invalidate_forces_backend_read() {
        let backend = Arc::new(ScriptedBackend::new(vec![Some("v1"), Some("v2")]));
        let resolver = CachingResolver::new(backend.clone(), Duration::from_secs(300));

        assert_eq!(resolver.get_secret().await.unwrap().value(), "v1");
        resolver.invalidate().await;
        assert_eq!(resolver.get_secret().await.unwrap().value(), "v2");
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_resolvers_compose_as_layers() {
        let backend = Arc::new(ScriptedBackend::new(vec![Some("v1")]));
        let inner = Arc::new(CachingResolver::new(
            backend.clone(),
            Duration::from_secs(3600),
        ));
        let outer = CachingResolver::new(inner, Duration::from_secs(60));

        let secret = outer.get_secret().await.unwrap();
        assert_eq!(secret.value(), "v1");
        // Source tag survives the layering.
        assert_eq!(secret.source(), SecretSource::Fallback);
        assert_eq!(outer.get_secret().await.unwrap().value(), "v1");
        assert_eq!(backend.calls(), 1);
    }
}
