use std::{env, io};

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{Builder, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    ClientError, Result,
    config::{ConfigPaths, GeneralConfig, LogFormat},
};

const DAYS_TO_KEEP: usize = 7;

/// Initialize tracing for the client
///
/// Console output goes to stderr so it never interleaves with prompts on
/// stdout. Uses `RUST_LOG` if set, otherwise the configured level. The
/// console layout comes from `UMMS_LOG_FORMAT` (pretty, compact or json),
/// falling back to the configured format. A daily rolling log file is
/// written under the application data directory when it can be created.
///
/// Keep the returned guard alive for the lifetime of the program; dropping
/// it flushes and closes the log file.
///
/// # Errors
/// Returns error if a global subscriber is already installed
pub fn init(general: &GeneralConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(general.log_level.to_string()));

    let format = env::var("UMMS_LOG_FORMAT")
        .ok()
        .and_then(|name| LogFormat::from_name(&name))
        .unwrap_or(general.log_format);

    let (file_writer, guard) = match file_appender() {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_level(true)
            .with_writer(writer)
            .with_ansi(false)
    });

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    let installed = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|e| ClientError::Logging(e.to_string()))?;
    Ok(guard)
}

fn file_appender() -> Option<tracing_appender::rolling::RollingFileAppender> {
    let log_dir = match ConfigPaths::log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("File logging disabled: {e}");
            return None;
        }
    };

    match Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(DAYS_TO_KEEP)
        .filename_prefix("umms-client")
        .filename_suffix("log")
        .build(&log_dir)
    {
        Ok(appender) => Some(appender),
        Err(e) => {
            eprintln!("File logging disabled: {e}");
            None
        }
    }
}
