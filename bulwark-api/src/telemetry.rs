/// Logging setup
///
/// Installs a `tracing-subscriber` registry with an `EnvFilter` taken from
/// `RUST_LOG` (default `bulwark_api=info,tower_http=info`) and either a JSON
/// or a human-readable console formatter.
///
/// With a log directory configured, two more JSON layers write to daily
/// rotated files through non-blocking writers:
///
/// - `access.<date>.log`: every event that passes the filter
/// - `error.<date>.log`: `ERROR` events only
///
/// The returned [`LogGuard`] flushes those writers when dropped, so keep it
/// alive for the whole process.

use crate::config::LoggingConfig;
use anyhow::Context;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "bulwark_api=info,bulwark_shared=info,tower_http=info";

pub const ACCESS_LOG_PREFIX: &str = "access";
pub const ERROR_LOG_PREFIX: &str = "error";

/// Keeps the file writers' background threads alive
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// Initializes the global subscriber
///
/// # Errors
///
/// Fails if the log directory cannot be used or a global subscriber was
/// already installed.
pub fn init(config: &LoggingConfig) -> anyhow::Result<LogGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let mut guards = Vec::new();
    let (access, errors) = match &config.dir {
        Some(dir) => {
            let (access, access_guard) =
                tracing_appender::non_blocking(daily_file(dir, ACCESS_LOG_PREFIX)?);
            let (errors, error_guard) =
                tracing_appender::non_blocking(daily_file(dir, ERROR_LOG_PREFIX)?);
            guards.push(access_guard);
            guards.push(error_guard);
            (Some(access), Some(errors))
        }
        None => (None, None),
    };

    let access_layer = access.map(|writer| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
    });
    let error_layer = errors.map(|writer| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(LevelFilter::ERROR)
    });

    let console_json = config.json.then(|| fmt::layer().json());
    let console_plain = (!config.json).then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_plain)
        .with(access_layer)
        .with(error_layer)
        .try_init()?;

    Ok(LogGuard { _guards: guards })
}

/// Daily rotated `<prefix>.<date>.log` in `dir`
pub fn daily_file(dir: &Path, prefix: &str) -> anyhow::Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("cannot open {prefix} log in {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_daily_file_creates_log_in_directory() {
        let dir = std::env::temp_dir().join(format!("bulwark-telemetry-{}", std::process::id()));

        let mut appender = daily_file(&dir, ACCESS_LOG_PREFIX).unwrap();
        appender.write_all(b"{\"msg\":\"hello\"}\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();

        assert!(names
            .iter()
            .any(|name| name.starts_with("access.") && name.ends_with(".log")));

        std::fs::remove_dir_all(&dir).ok();
    }
}
