use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};
use clap::Parser;
use daemon::{
    capture, DaemonConfig, FrameSize, IntervalTrigger, Pipeline, PipelineJob, PipelineSettings,
    RecordingJob, Scheduler, SystemRunner,
};
use log::{info, warn};

mod logging;

use logging::LogLevel;

/// Record camera clips on a schedule and upload them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Logging level
    #[arg(long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    log: LogLevel,

    /// Recording interval, e.g. 'every 10 minutes'
    #[arg(long, default_value = "every 10 minutes")]
    interval: IntervalTrigger,

    /// Duration (in ms) to record
    #[arg(short, long, default_value_t = 30_000, value_parser = clap::value_parser!(u64).range(1..))]
    duration: u64,

    /// Video resolution <width,height>
    #[arg(short, long, default_value = "1920,1080")]
    size: FrameSize,

    /// Manual focus setup time in seconds before recording starts (0 skips it)
    #[arg(long, default_value_t = 120)]
    setup_time: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = DaemonConfig::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    logging::init_logging(args.log, &cfg).context("Failed to set up logging")?;

    info!("LagunaCam daemon starting");
    info!("  Interval: {}", args.interval);
    info!("  Clip: {} ms at {}", args.duration, args.size);
    info!("  Tools: {} | {} | {}",
          cfg.capture_bin.display(), cfg.transcode_bin.display(), cfg.upload_bin.display());
    info!("  Destination: {}@{}:{}", cfg.remote.user, cfg.remote.host, cfg.remote.remote_dir);
    match cfg.tool_timeout() {
        Some(limit) => info!("  Tool timeout: {}s", limit.as_secs()),
        None => info!("  Tool timeout: none"),
    }

    let store = cfg.artifact_store();
    match store.sweep_orphans() {
        Ok(0) => {}
        Ok(n) => info!("✅ Startup recovery complete: {} orphaned artifact(s) removed", n),
        Err(e) => warn!("Could not check for orphaned artifacts: {:#}", e),
    }

    let runner = SystemRunner::with_timeout(cfg.tool_timeout());

    if args.setup_time > 0 {
        capture::run_setup(&runner, &cfg.capture_bin, args.size, Duration::from_secs(args.setup_time))
            .await
            .context("Unable to complete setup phase")?;
    } else {
        info!("Setup phase skipped");
    }

    let job = PipelineJob::new(args.size, args.duration);
    let pipeline = Pipeline::new(runner, store, PipelineSettings::from(&cfg));
    let mut scheduler = Scheduler::new(RecordingJob::new(pipeline, job), args.interval);

    tokio::select! {
        _ = scheduler.run() => {}
        signal = shutdown_signal() => {
            info!("Received {}, shutting down", signal?);
        }
    }

    let stats = scheduler.stats();
    info!("Stopped after {} cycle(s), {} failed", stats.runs, stats.failures);
    Ok(())
}

/// Resolve on SIGINT or SIGTERM with the signal's name
#[cfg(unix)]
async fn shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())
        .context("Failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for SIGINT")?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    Ok("Ctrl-C")
}
