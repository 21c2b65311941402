use crate::config::LoggingConfig;
use sentry::types::{Dsn, ParseDsnError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global tracing subscriber, plus a Sentry layer when a DSN is
/// configured. The returned guard must be held for the life of the process.
pub fn init(config: Option<&LoggingConfig>) -> Result<Option<sentry::ClientInitGuard>, ParseDsnError> {
    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let dsn = config
        .and_then(|c| c.sentry_dsn.as_deref())
        .map(str::parse::<Dsn>)
        .transpose()?;

    let guard = dsn.map(|dsn| {
        sentry::init(sentry::ClientOptions {
            dsn: Some(dsn),
            release: sentry::release_name!(),
            ..Default::default()
        })
    });
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    Ok(guard)
}
