use async_trait::async_trait;

use super::{Secret, SecretBackend, SecretSource};

/// Reads one named environment variable on every call. No caching, always
/// a live read. Unset or empty values resolve to `None`.
pub struct EnvBackend {
    var_name: String,
}

impl EnvBackend {
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
        }
    }
}

#[async_trait]
impl SecretBackend for EnvBackend {
    async fn resolve(&self) -> Option<Secret> {
        match std::env::var(&self.var_name) {
            Ok(value) if !value.is_empty() => {
                Some(Secret::new(value, SecretSource::Environment))
            }
            _ => {
                tracing::debug!(var = %self.var_name, "environment variable unset or empty");
                None
            }
        }
    }
}
