use crate::config::Config;
use crate::errors::ProxyError;
use crate::key_pool::{KeyPool, key_suffix};
use crate::upstream::Upstream;
use bytes::Bytes;
use http::StatusCode;
use http::request::Parts;
use reqwest::redirect::Policy;
use std::time::Duration;

const MAX_REDIRECTS: usize = 10;

/// Statuses that indicate a problem with the key rather than the request:
/// the key is rate limited or has been revoked.
pub fn is_key_failure(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::UNAUTHORIZED
    )
}

/// Sends requests to the upstream, re-sending with another key when the
/// upstream rejects the one it was given.
pub struct Dispatcher {
    client: reqwest::Client,
    upstream: Upstream,
    max_retries: u32,
}

impl Dispatcher {
    pub fn try_new(config: &Config) -> Result<Self, ProxyError> {
        let mut builder = reqwest::Client::builder().redirect(Policy::limited(MAX_REDIRECTS));
        if let Some(timeout_secs) = config.upstream.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }

        Ok(Dispatcher {
            client: builder.build()?,
            upstream: Upstream::try_from(&config.upstream)?,
            max_retries: config.max_retries,
        })
    }

    /// Dispatches one inbound request.
    ///
    /// Attempts run one after another. Each attempt draws a key from `pool`
    /// and builds a new outbound request. A 429 or 401 is retried until
    /// `max_retries` retries have been spent, after which that response is
    /// returned as is. Any other response ends the loop, and a transport
    /// error is returned without retrying.
    pub async fn dispatch(
        &self,
        parts: &Parts,
        body: &Bytes,
        pool: &KeyPool,
    ) -> Result<reqwest::Response, ProxyError> {
        let mut attempt = 0;

        loop {
            let key = pool.choose();
            let request = self
                .upstream
                .build_request(&self.client, parts, body, key)?;

            let response = self.client.execute(request).await.inspect_err(|e| {
                tracing::debug!(
                    key_suffix = key_suffix(key),
                    attempt,
                    error = %e,
                    "Upstream request failed"
                );
            })?;

            let status = response.status();
            if is_key_failure(status) && attempt < self.max_retries {
                tracing::warn!(
                    key_suffix = key_suffix(key),
                    status = %status,
                    attempt,
                    "Upstream rejected key, retrying"
                );
                attempt += 1;
                continue;
            }

            tracing::debug!(status = %status, attempts = attempt + 1, "Upstream responded");
            return Ok(response);
        }
    }
}
