use std::fs;
use std::io::{self, Write};
use anyhow::{Context, Result};
use clap::ValueEnum;
use daemon::config::{DaemonConfig, LogRotation};
use log::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Level names accepted by `--log`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Critical,
    Error,
    #[value(alias = "warn")]
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    /// `log` has no critical level; it shares the error filter
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Critical | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
        }
    }
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

/// Every formatted record goes to stderr and to the rolling log file
struct LogSink {
    file: RollingFileAppender,
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A closed stderr must not stop file logging
        let _ = io::stderr().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stderr().flush();
        self.file.flush()
    }
}

/// Open the rolling log file under `cfg.log_dir`, creating the directory if needed
pub fn open_log_file(cfg: &DaemonConfig) -> Result<RollingFileAppender> {
    fs::create_dir_all(&cfg.log_dir)
        .with_context(|| format!("Failed to create log directory: {}", cfg.log_dir.display()))?;

    RollingFileAppender::builder()
        .rotation(rotation(cfg.log_rotation))
        .filename_prefix(cfg.log_file_prefix.as_str())
        .filename_suffix("log")
        .max_log_files(cfg.log_max_files.max(1))
        .build(&cfg.log_dir)
        .with_context(|| format!("Failed to open log file in: {}", cfg.log_dir.display()))
}

/// Install the global logger; `RUST_LOG` may refine the chosen level per module
pub fn init_logging(level: LogLevel, cfg: &DaemonConfig) -> Result<()> {
    let file = open_log_file(cfg)?;

    env_logger::Builder::new()
        .filter_level(level.filter())
        .parse_default_env()
        .format_timestamp_secs()
        .target(env_logger::Target::Pipe(Box::new(LogSink { file })))
        .try_init()
        .context("Failed to initialise logger")
}
