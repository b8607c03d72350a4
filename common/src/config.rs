//! Run configuration.
//!
//! Typed records built from command line arguments and validated at the
//! boundary; invalid values surface as `AppError::Configuration`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use validator::{Validate, ValidationError};

use crate::errors::{AppError, AppResult};
use crate::models::unit::Unit;

/// Default data source port.
pub const DEFAULT_PORT: u16 = 27017;

/// Default authentication database.
pub const DEFAULT_AUTH_DATABASE: &str = "admin";

/// Default percentage above which a collection is flagged.
pub const DEFAULT_LIMIT_PERCENT: f64 = 5.0;

/// Credentials for the authentication database.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// How to reach and authenticate against the data source.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ConnectionSettings {
    /// Data source host name or address.
    #[validate(length(min = 1, message = "host must not be empty"))]
    pub host: String,
    /// Data source TCP port.
    #[validate(range(min = 1, message = "port must be non-zero"))]
    pub port: u16,
    /// Database the credentials are defined in.
    #[validate(length(min = 1, message = "auth database must not be empty"))]
    pub auth_database: String,
    /// `None` connects without authentication.
    pub credentials: Option<Credentials>,
}

impl ConnectionSettings {
    /// Builds validated connection settings.
    ///
    /// # Errors
    /// Returns `AppError::Configuration` if a field is empty or a username is
    /// given without a password (or the other way around).
    pub fn new(
        host: impl Into<String>,
        port: u16,
        auth_database: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> AppResult<Self> {
        let credentials = match (username, password) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(AppError::Configuration(
                    "a password is required when a user is given".into(),
                ))
            }
            (None, Some(_)) => {
                return Err(AppError::Configuration(
                    "a user is required when a password is given".into(),
                ))
            }
        };

        let settings = Self {
            host: host.into(),
            port,
            auth_database: auth_database.into(),
            credentials,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Options for a collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorOptions {
    /// Record per-index sizes for every collection.
    pub index_breakdown: bool,
}

/// Whether the analyzer reports index shares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexTracking {
    /// On iff every database in the snapshot records its index total.
    #[default]
    Auto,
    On,
    Off,
}

impl FromStr for IndexTracking {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(IndexTracking::Auto),
            "on" | "yes" | "true" => Ok(IndexTracking::On),
            "off" | "no" | "false" => Ok(IndexTracking::Off),
            other => Err(AppError::Configuration(format!(
                "unknown index tracking mode '{}', expected auto, on or off",
                other
            ))),
        }
    }
}

/// Options for an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
pub struct AnalyzeOptions {
    /// Unit for every size in the report.
    pub unit: Unit,
    /// Share (in percent) above which a collection is flagged.
    #[validate(
        custom(function = finite_limit),
        range(min = 0.0, max = 100.0, message = "limit must be between 0 and 100")
    )]
    pub limit_percent: f64,
    pub index_tracking: IndexTracking,
}

impl AnalyzeOptions {
    /// Builds validated analysis options.
    ///
    /// # Errors
    /// Returns `AppError::Configuration` if the limit is not a finite number
    /// in `[0, 100]`.
    pub fn new(unit: Unit, limit_percent: f64, index_tracking: IndexTracking) -> AppResult<Self> {
        let options = Self {
            unit,
            limit_percent,
            index_tracking,
        };
        options.validate()?;
        Ok(options)
    }
}

/// `range` lets NaN through, which would silently disable every share flag.
fn finite_limit(limit: f64) -> Result<(), ValidationError> {
    if limit.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite").with_message("limit must be a finite number".into()))
    }
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            unit: Unit::default(),
            limit_percent: DEFAULT_LIMIT_PERCENT,
            index_tracking: IndexTracking::default(),
        }
    }
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Collect from the data source and write the snapshot file.
    Collect { file: PathBuf },
    /// Read a snapshot file and print the report.
    Analyze { file: PathBuf },
    /// Collect and print the report without persisting.
    CollectAndAnalyze,
    /// Collect, write the snapshot file and print the report.
    CollectPersistAnalyze { file: PathBuf },
}

impl RunMode {
    /// Picks the mode from the presence of a host, a file and the report flag.
    ///
    /// # Errors
    /// Returns `AppError::Configuration` if neither a host nor a file is given.
    pub fn resolve(has_host: bool, file: Option<PathBuf>, report: bool) -> AppResult<Self> {
        match (has_host, file) {
            (true, Some(file)) if report => Ok(RunMode::CollectPersistAnalyze { file }),
            (true, Some(file)) => Ok(RunMode::Collect { file }),
            (true, None) => Ok(RunMode::CollectAndAnalyze),
            (false, Some(file)) => Ok(RunMode::Analyze { file }),
            (false, None) => Err(AppError::Configuration(
                "either a host or a snapshot file is required".into(),
            )),
        }
    }

    /// Whether this mode talks to the data source.
    pub fn collects(&self) -> bool {
        !matches!(self, RunMode::Analyze { .. })
    }
}

/// Full configuration of one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: RunMode,
    /// Present whenever the mode collects.
    pub connection: Option<ConnectionSettings>,
    /// Collect only this database instead of every visible one.
    pub target_database: Option<String>,
    pub collector: CollectorOptions,
    pub analyze: AnalyzeOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_settings_defaults() {
        let settings =
            ConnectionSettings::new("db1", DEFAULT_PORT, DEFAULT_AUTH_DATABASE, None, None).unwrap();
        assert_eq!(settings.port, 27017);
        assert_eq!(settings.auth_database, "admin");
        assert!(settings.credentials.is_none());
    }

    #[test]
    fn test_user_without_password_rejected() {
        let err = ConnectionSettings::new("db1", 27017, "admin", Some("ops".into()), None)
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_empty_host_rejected() {
        let err = ConnectionSettings::new("", 27017, "admin", None, None).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_password_is_redacted() {
        let settings = ConnectionSettings::new(
            "db1",
            27017,
            "admin",
            Some("ops".into()),
            Some("hunter2".into()),
        )
        .unwrap();
        let debug = format!("{:?}", settings);
        assert!(debug.contains("ops"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_limit_out_of_range() {
        assert!(AnalyzeOptions::new(Unit::GiB, 5.0, IndexTracking::Auto).is_ok());
        assert!(AnalyzeOptions::new(Unit::GiB, 0.0, IndexTracking::Auto).is_ok());
        let err = AnalyzeOptions::new(Unit::GiB, 150.0, IndexTracking::Auto).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(AnalyzeOptions::new(Unit::GiB, -1.0, IndexTracking::Auto).is_err());
    }

    #[test]
    fn test_non_finite_limit_rejected() {
        for limit in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = AnalyzeOptions::new(Unit::GiB, limit, IndexTracking::Auto).unwrap_err();
            assert!(matches!(err, AppError::Configuration(_)), "limit {limit}");
        }
    }

    #[test]
    fn test_index_tracking_parse() {
        assert_eq!("auto".parse::<IndexTracking>().unwrap(), IndexTracking::Auto);
        assert_eq!("ON".parse::<IndexTracking>().unwrap(), IndexTracking::On);
        assert!("maybe".parse::<IndexTracking>().is_err());
    }

    #[test]
    fn test_run_mode_resolution() {
        let file = PathBuf::from("stats.json");
        assert_eq!(
            RunMode::resolve(true, Some(file.clone()), false).unwrap(),
            RunMode::Collect { file: file.clone() }
        );
        assert_eq!(
            RunMode::resolve(true, Some(file.clone()), true).unwrap(),
            RunMode::CollectPersistAnalyze { file: file.clone() }
        );
        assert_eq!(
            RunMode::resolve(false, Some(file.clone()), false).unwrap(),
            RunMode::Analyze { file }
        );
        assert_eq!(
            RunMode::resolve(true, None, false).unwrap(),
            RunMode::CollectAndAnalyze
        );
        assert!(RunMode::resolve(false, None, true).is_err());
    }
}
