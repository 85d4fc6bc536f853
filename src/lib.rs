//! Keygate — credential resolution and token issuance for an HTTP API.
//!
//! Two subsystems behind one crate:
//!
//! * **secrets** — a layered API-key resolver. A [`secrets::SecretBackend`]
//!   sources a raw secret (environment variable, mounted file, or static
//!   fallback); a [`CachingResolver`] fronts it with a TTL cache and
//!   single-flight refresh; an [`ApiKeyProvider`] validates presented keys
//!   in constant time.
//! * **oauth** — an OAuth2 client-credentials token service. A
//!   [`ClientRegistry`] holds registered clients; the [`TokenService`]
//!   authenticates a grant, intersects requested with allowed scopes, and
//!   mints a signed, time-bounded access token it can later validate
//!   statelessly.
//!
//! HTTP routing, middleware, and request DTOs for business resources live
//! in the consuming service — this crate only exposes the contracts they
//! call.

pub mod config;
pub mod errors;
pub mod oauth;
pub mod secrets;

pub use config::{Config, KeySource};
pub use errors::OAuthError;
pub use oauth::registry::{ClientCredential, ClientRegistry};
pub use oauth::token::{Claims, TokenRequest, TokenResponse, TokenService};
pub use secrets::cache::CachingResolver;
pub use secrets::provider::ApiKeyProvider;
pub use secrets::{Secret, SecretBackend, SecretSource};
