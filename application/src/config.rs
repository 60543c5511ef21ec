//! [`Config`]-related definitions.

use std::time;

use common::{Clock, TimeZone};
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
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
            .try_deserialize()
    }
}

/// Service configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Time zone the current day is observed in.
    #[default(TimeZone::UTC)]
    pub time_zone: TimeZone,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            time_zone,
            tasks: Tasks { transition_trips },
        } = value;
        Self {
            clock: Clock::new(time_zone),
            transition_trips: service::task::transition_trips::Config {
                interval: transition_trips.interval,
            },
        }
    }
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `TransitionTrips` task configuration.
    pub transition_trips: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
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

    /// Maximum duration of a single database operation.
    #[default(time::Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
            timeout: _,
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
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
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

    use common::TimeZone;
    use config::{ConfigError, File, FileFormat};

    use super::{Config, LogLevel};

    fn parse(toml: &str) -> Result<Config, ConfigError> {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn defaults_missing_fields() {
        let conf = parse("").unwrap();

        assert_eq!(conf.service.time_zone, TimeZone::UTC);
        assert_eq!(
            conf.service.tasks.transition_trips.interval,
            Duration::from_secs(60 * 60),
        );
        assert_eq!(conf.postgres.port, 5432);
        assert_eq!(conf.postgres.timeout, Duration::from_secs(5));
        assert_eq!(conf.log.level, LogLevel::Info);
    }

    #[test]
    fn reads_provided_fields() {
        let conf = parse(
            r#"
            [service]
            time_zone = "+10:00"

            [service.tasks.transition_trips]
            interval = "15m"

            [postgres]
            host = "db"
            timeout = "2s"

            [log]
            level = "DEBUG"
            "#,
        )
        .unwrap();

        assert_eq!(
            conf.service.time_zone,
            TimeZone::from_hm(10, 0).unwrap(),
        );
        assert_eq!(
            conf.service.tasks.transition_trips.interval,
            Duration::from_secs(15 * 60),
        );
        assert_eq!(conf.postgres.host, "db");
        assert_eq!(conf.postgres.timeout, Duration::from_secs(2));
        assert_eq!(conf.log.level, LogLevel::Debug);
    }

    #[test]
    fn reads_named_time_zone() {
        let conf = parse("[service]\ntime_zone = \"Australia/Sydney\"").unwrap();

        assert_eq!(
            conf.service.time_zone,
            TimeZone::named("Australia/Sydney").unwrap(),
        );
    }

    #[test]
    fn rejects_invalid_time_zone() {
        assert!(parse("[service]\ntime_zone = \"Mars/Olympus\"").is_err());
    }
}
