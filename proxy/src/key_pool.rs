use crate::credentials::{API_KEYS_VAR, SecretSource};
use crate::errors::ProxyError;
use http::HeaderValue;
use rand::Rng;

/// The upstream API keys available to a single request.
///
/// Always holds at least one key, and every key is usable in a
/// `Bearer` authorization header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPool {
    keys: Vec<String>,
}

impl KeyPool {
    /// Parses a comma separated key list, trimming entries and skipping
    /// empty ones.
    pub fn parse(raw: &str) -> Result<Self, ProxyError> {
        let keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();

        if keys.is_empty() {
            return Err(ProxyError::EmptyKeyPool);
        }

        if keys
            .iter()
            .any(|k| HeaderValue::from_str(&format!("Bearer {k}")).is_err())
        {
            return Err(ProxyError::InvalidKey);
        }

        Ok(KeyPool { keys })
    }

    /// Loads the pool from `API_KEYS`. An unset or empty value is reported
    /// separately from a value that yields no keys.
    pub fn load(secrets: &dyn SecretSource) -> Result<Self, ProxyError> {
        match secrets.get(API_KEYS_VAR) {
            Some(raw) if !raw.is_empty() => Self::parse(&raw),
            _ => Err(ProxyError::KeysNotSet),
        }
    }

    /// Picks a key uniformly at random. Consecutive calls are independent,
    /// so the same key may come back twice in a row.
    pub fn choose(&self) -> &str {
        self.choose_with(&mut rand::rng())
    }

    pub fn choose_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        &self.keys[rng.random_range(0..self.keys.len())]
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &[String] {
        &self.keys
    }
}

/// The last four characters of a key, for logs.
pub fn key_suffix(key: &str) -> &str {
    let start = key
        .char_indices()
        .rev()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &key[start..]
}
