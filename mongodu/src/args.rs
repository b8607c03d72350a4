//! 命令行参数

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use common::config::{
    AnalyzeOptions, AppConfig, CollectorOptions, ConnectionSettings, IndexTracking, RunMode,
    DEFAULT_AUTH_DATABASE, DEFAULT_LIMIT_PERCENT, DEFAULT_PORT,
};
use common::errors::{AppError, AppResult};
use common::models::Unit;

/// MongoDB disk usage.
///
/// With --host and --file the collected snapshot is written to the file; with
/// only --file a saved snapshot is analyzed; with only --host the report is
/// printed straight away.
#[derive(Debug, Parser)]
#[command(name = "mongodu", version)]
pub struct Args {
    /// MongoDB host
    #[arg(short = 'm', long)]
    pub host: Option<String>,

    /// JSON file the snapshot is written to or read from
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// TCP port
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Database the user is defined in
    #[arg(short = 'd', long = "db", default_value = DEFAULT_AUTH_DATABASE)]
    pub auth_database: String,

    /// User for authentication (omit for an unauthenticated connection)
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Password for authentication
    #[arg(short = 'w', long)]
    pub password: Option<String>,

    /// Collect only this database
    #[arg(short = 't', long)]
    pub target: Option<String>,

    /// Percentage of the total above which a collection is reported
    #[arg(short = 'l', long, default_value_t = DEFAULT_LIMIT_PERCENT)]
    pub limit: f64,

    /// Unit of digital information: b, K, M or G
    #[arg(short = 'n', long, default_value = "G")]
    pub unit: Unit,

    /// Record per-index sizes in the snapshot
    #[arg(long)]
    pub index_breakdown: bool,

    /// Report index shares: auto, on or off
    #[arg(long, default_value = "auto")]
    pub index_tracking: IndexTracking,

    /// With --host and --file, also print the report
    #[arg(long)]
    pub report: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Validates the arguments and turns them into a run configuration.
    pub fn into_config(self) -> AppResult<AppConfig> {
        let mode = RunMode::resolve(self.host.is_some(), self.file, self.report)?;

        let connection = match self.host {
            Some(host) => Some(ConnectionSettings::new(
                host,
                self.port,
                self.auth_database,
                self.user,
                self.password,
            )?),
            None => None,
        };

        Ok(AppConfig {
            mode,
            connection,
            target_database: self.target,
            collector: CollectorOptions {
                index_breakdown: self.index_breakdown,
            },
            analyze: AnalyzeOptions::new(self.unit, self.limit, self.index_tracking)?,
        })
    }
}

/// Exit code for a command line clap refused to parse.
///
/// Help and version requests succeed; every other parse failure is a
/// configuration error.
pub fn parse_error_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => AppError::Configuration(err.to_string()).exit_code(),
    }
}
