use proxy::config::Config as ProxyConfig;
use serde::Deserialize;
use std::fs::File;

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
    /// Default filter directive, used when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CommonConfig {
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub proxy: ProxyConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data: Config = serde_yaml::from_reader(file)?;
        data.proxy.validate()?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    ValidationError(#[from] proxy::config::ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxy::config::UpstreamScheme;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn proxy_config() {
        let yaml = r#"
            logging:
                sentry_dsn: https://public@sentry.example.com/1
            proxy:
                listener:
                    host: 0.0.0.0
                    port: 8787
                admin_listener:
                    host: 127.0.0.1
                    port: 8788
                upstream:
                    host: api.cerebras.ai
                    scheme: https
                max_retries: 3
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let logging = config.common.logging.expect("logging config");
        assert_eq!(
            logging.sentry_dsn.as_deref(),
            Some("https://public@sentry.example.com/1")
        );
        assert_eq!(logging.level, "info");
        assert_eq!(config.proxy.upstream.host, "api.cerebras.ai");
        assert_eq!(config.proxy.upstream.scheme, UpstreamScheme::Https);
        assert_eq!(config.proxy.max_retries, 3);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let yaml = r#"
            proxy:
                listener:
                    host: 0.0.0.0
                    port: 0
                admin_listener:
                    host: 127.0.0.1
                    port: 8788
            "#;
        let tmp = write_tmp_file(yaml);
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        assert!(matches!(
            Config::from_file(&dir.path().join("missing.yaml")),
            Err(ConfigError::LoadError(_))
        ));
    }
}
