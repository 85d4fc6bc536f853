use async_trait::async_trait;

use super::{Secret, SecretBackend, SecretSource};

/// Serves a statically configured constant, a source of last resort used
/// only when no dynamic source is enabled. An empty constant still resolves
/// to `None`: the service must never hand out an empty-string secret.
pub struct FallbackBackend {
    value: String,
}

impl FallbackBackend {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[async_trait]
impl SecretBackend for FallbackBackend {
    async fn resolve(&self) -> Option<Secret> {
        if self.value.is_empty() {
            return None;
        }
        Some(Secret::new(self.value.clone(), SecretSource::Fallback))
    }
}
