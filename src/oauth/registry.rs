use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// A registered service-to-service client.
///
/// Created at registration time (static config or admin action); the token
/// flow only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCredential {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: BTreeSet<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub description: String,
}

fn default_active() -> bool {
    true
}

impl ClientCredential {
    /// Valid iff active and not past its optional expiry.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

/// Lookup of registered clients by id. Populated once at process start and
/// immutable afterwards, so reads need no locking.
pub struct ClientRegistry {
    clients: HashMap<String, ClientCredential>,
}

impl ClientRegistry {
    pub fn new(clients: Vec<ClientCredential>) -> Self {
        Self {
            clients: clients
                .into_iter()
                .map(|c| (c.client_id.clone(), c))
                .collect(),
        }
    }

    /// Populates the registry at process start. Without a configured
    /// clients file the registry is empty and every grant is rejected.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match &config.clients_file {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::new(Vec::new())),
        }
    }

    /// Loads the registry from a JSON array of client credentials.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read clients file {}", path.display()))?;
        let clients: Vec<ClientCredential> = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse clients file {}", path.display()))?;
        tracing::info!(count = clients.len(), path = %path.display(), "loaded client registry");
        Ok(Self::new(clients))
    }

    /// Looks up a client that is currently allowed to authenticate.
    ///
    /// Unknown, inactive, and expired clients all come back `None`:
    /// callers cannot tell them apart, which blunts enumeration attempts.
    pub fn find_active(&self, client_id: &str) -> Option<&ClientCredential> {
        self.clients
            .get(client_id)
            .filter(|client| client.is_valid(Utc::now()))
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
