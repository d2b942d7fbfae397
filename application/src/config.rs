//! [`Config`]-related definitions.

use std::time;

use common::Percent;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize::<Self>()
            .and_then(Self::validate)
    }

    /// Checks the values which cannot be expressed by types alone.
    fn validate(self) -> Result<Self, ConfigError> {
        if self.service.tasks.mature_investments.interval.is_zero() {
            return Err(ConfigError::Message(
                "`service.tasks.mature_investments.interval` must be non-zero"
                    .to_owned(),
            ));
        }
        if self.service.sweep.timeout.is_zero() {
            return Err(ConfigError::Message(
                "`service.sweep.timeout` must be non-zero".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default("secret".to_owned())]
    pub jwt_secret: String,

    /// Settling of matured investments configuration.
    pub sweep: Sweep,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            sweep: Sweep {
                timeout,
                return_rate,
            },
            tasks: Tasks { mature_investments },
        } = value;
        Self {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                jwt_secret.as_bytes(),
            ),
            mature_investments: service::command::mature_investments::Config {
                return_rate,
                timeout,
            },
            tasks: service::task::Config {
                mature_investments: service::task::mature_investments::Config {
                    interval: mature_investments.interval,
                },
            },
        }
    }
}

/// Settling of matured investments configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Sweep {
    /// Maximum duration of a single settling run.
    #[default(time::Duration::from_secs(5 * 60))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,

    /// Rate of return credited on top of the invested amount.
    ///
    /// Accepts values like `20%` or `12.5%`.
    #[default(Percent::whole(20))]
    pub return_rate: Percent,
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `MatureInvestments` task configuration.
    pub mature_investments: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    ///
    /// Must be non-zero.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::Percent;

    use super::Config;

    #[test]
    fn defaults_are_valid() {
        let conf = Config::default().validate().unwrap();

        assert_eq!(conf.service.sweep.return_rate, Percent::whole(20));
        assert_eq!(
            conf.service.tasks.mature_investments.interval,
            Duration::from_secs(60 * 60),
        );
    }

    #[test]
    fn rejects_zero_interval() {
        let mut conf = Config::default();
        conf.service.tasks.mature_investments.interval = Duration::ZERO;

        assert!(conf.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut conf = Config::default();
        conf.service.sweep.timeout = Duration::ZERO;

        assert!(conf.validate().is_err());
    }

    #[test]
    fn converts_into_service_config() {
        let conf: service::Config = Config::default().service.into();

        assert_eq!(conf.mature_investments.return_rate, Percent::whole(20));
        assert_eq!(
            conf.mature_investments.timeout,
            Duration::from_secs(5 * 60),
        );
        assert_eq!(
            conf.tasks.mature_investments.interval,
            Duration::from_secs(60 * 60),
        );
    }
}
