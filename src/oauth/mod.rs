//! OAuth2 client-credentials grant: client registry and token service.

pub mod registry;
pub mod token;
