//! Logging setup shared by the CLI.
//!
//! Filter priority: explicit `--log-filter` beats `-v`/`-vv`, which beat
//! `RUST_LOG`, which beats the default. The noise filter (quieting the
//! inference runtime) is merged in only when the filter was chosen
//! implicitly — an explicit choice means the user wants exactly what they
//! asked for.

use std::fs;
use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};

pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_NOISE_FILTER: &str = "ort=error";
pub const DEFAULT_LOG_RETENTION_FILES: usize = 7;
pub const DEFAULT_LOG_DIR_NAME: &str = "logs";
const LOG_FILE_PREFIX: &str = "stylova";
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingInitOptions {
    pub data_dir: Option<PathBuf>,
    pub verbose: u8,
    pub cli_log_filter: Option<String>,
    pub rust_log_env: Option<String>,
    pub default_log_filter: String,
    pub noise_filter: String,
    pub retention_files: usize,
}

impl Default for LoggingInitOptions {
    fn default() -> Self {
        Self {
            data_dir: None,
            verbose: 0,
            cli_log_filter: None,
            rust_log_env: None,
            default_log_filter: DEFAULT_LOG_FILTER.to_string(),
            noise_filter: DEFAULT_NOISE_FILTER.to_string(),
            retention_files: DEFAULT_LOG_RETENTION_FILES,
        }
    }
}

pub fn select_log_filter(options: &LoggingInitOptions) -> String {
    let user_filter = if let Some(filter) = options.cli_log_filter.as_deref() {
        filter.to_string()
    } else if options.verbose >= 2 {
        "trace".to_string()
    } else if options.verbose == 1 {
        "debug".to_string()
    } else if let Some(filter) = options.rust_log_env.as_deref() {
        filter.to_string()
    } else {
        options.default_log_filter.clone()
    };

    let implicit = options.cli_log_filter.is_none() && options.verbose == 0;
    if implicit && !options.noise_filter.trim().is_empty() {
        format!("{},{user_filter}", options.noise_filter)
    } else {
        user_filter
    }
}

#[derive(Debug)]
pub enum FileSinkPlan {
    Ready(ReadyFileSinkPlan),
    Fallback(FallbackFileSinkPlan),
}

#[derive(Debug)]
pub struct ReadyFileSinkPlan {
    pub log_dir: PathBuf,
    pub retention_files: usize,
    pub appender: RollingFileAppender,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackFileSinkPlan {
    pub attempted_log_dir: Option<PathBuf>,
    pub reason: String,
}

impl FileSinkPlan {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Plan the daily-rolling file sink under `<data_dir>/logs`. Any failure
/// degrades to a console-only fallback with the reason attached; logging
/// setup must never abort the process.
pub fn build_file_sink_plan(options: &LoggingInitOptions) -> FileSinkPlan {
    let retention_files = if options.retention_files == 0 {
        DEFAULT_LOG_RETENTION_FILES
    } else {
        options.retention_files
    };

    let Some(data_dir) = options.data_dir.as_deref() else {
        return FileSinkPlan::Fallback(FallbackFileSinkPlan {
            attempted_log_dir: None,
            reason: "file sink disabled: data_dir is not configured".to_string(),
        });
    };

    let log_dir = data_dir.join(DEFAULT_LOG_DIR_NAME);
    if let Err(error) = fs::create_dir_all(&log_dir) {
        return FileSinkPlan::Fallback(FallbackFileSinkPlan {
            attempted_log_dir: Some(log_dir),
            reason: format!("failed to create log directory: {error}"),
        });
    }

    let appender_builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(retention_files);

    match appender_builder.build(&log_dir) {
        Ok(appender) => FileSinkPlan::Ready(ReadyFileSinkPlan {
            log_dir,
            retention_files,
            appender,
        }),
        Err(error) => FileSinkPlan::Fallback(FallbackFileSinkPlan {
            attempted_log_dir: Some(log_dir),
            reason: format!("failed to initialize rolling file sink: {error}"),
        }),
    }
}
