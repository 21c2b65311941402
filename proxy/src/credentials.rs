use crate::errors::ProxyError;
use crate::key_pool::KeyPool;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use std::collections::HashMap;

pub const AUTH_PASSWORD_VAR: &str = "AUTH_PASSWORD";
pub const API_KEYS_VAR: &str = "API_KEYS";

/// Where per-request secrets are read from.
///
/// Secrets are looked up on every request, so rotating `API_KEYS` or
/// `AUTH_PASSWORD` in the backing store takes effect without a restart.
pub trait SecretSource: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl SecretSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

fn configured_password(secrets: &dyn SecretSource) -> Option<String> {
    secrets.get(AUTH_PASSWORD_VAR).filter(|p| !p.is_empty())
}

/// Checks that the `Authorization` header contains the shared password.
///
/// This is a substring match, so `Bearer <password>` and a bare `<password>`
/// are both accepted. A missing password rejects every request.
pub fn authenticate(secrets: &dyn SecretSource, headers: &HeaderMap) -> Result<(), ProxyError> {
    let Some(password) = configured_password(secrets) else {
        tracing::warn!("{AUTH_PASSWORD_VAR} is not set, rejecting request");
        return Err(ProxyError::Unauthorized);
    };

    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if auth_header.contains(password.as_str()) {
        Ok(())
    } else {
        Err(ProxyError::Unauthorized)
    }
}

/// True when the current secrets would let a request through to the upstream.
pub fn credentials_ready(secrets: &dyn SecretSource) -> bool {
    configured_password(secrets).is_some() && KeyPool::load(secrets).is_ok()
}
