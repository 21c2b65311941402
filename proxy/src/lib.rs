pub mod config;
pub mod credentials;
mod dispatcher;
pub mod errors;
mod headers;
pub mod key_pool;
mod proxy_service;
mod upstream;

#[cfg(test)]
mod testutils;

pub use proxy_service::{ProxyBody, ProxyService};

use credentials::{EnvSecrets, SecretSource, credentials_ready};
use errors::ProxyError;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

/// Runs the proxy and admin listeners until either fails.
///
/// Secrets are read from the process environment on every request.
pub async fn run(config: config::Config) -> Result<(), ProxyError> {
    config.validate()?;

    let secrets: Arc<dyn SecretSource> = Arc::new(EnvSecrets);
    if !credentials_ready(secrets.as_ref()) {
        tracing::warn!(
            "AUTH_PASSWORD or API_KEYS is missing, requests will be rejected until both are set"
        );
    }

    tracing::info!(
        upstream = %config.upstream.host,
        scheme = config.upstream.scheme.as_str(),
        max_retries = config.max_retries,
        "Starting proxy"
    );

    let proxy_service = ProxyService::try_new(&config, secrets.clone())?;
    let admin_service: AdminService<_, ProxyError> =
        AdminService::new(move || credentials_ready(secrets.as_ref()));

    let proxy_task = run_http_service(&config.listener.host, config.listener.port, proxy_service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(proxy_task, admin_task)?;
    Ok(())
}
