pub mod artifact;
pub mod capture;
pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod runner;
pub mod scheduler;
pub mod transcode;
pub mod trigger;
pub mod upload;

#[cfg(test)]
mod testing;

pub use artifact::{Artifact, ArtifactFormat, ArtifactStore};
pub use config::DaemonConfig;
pub use error::{ConfigError, ProcessError, Stage, StageFailure};
pub use job::{FrameSize, PipelineJob};
pub use pipeline::{Pipeline, PipelineSettings, RecordingJob};
pub use runner::{CommandSpec, ProcessRunner, SystemRunner};
pub use scheduler::{ScheduledJob, Scheduler, SchedulerState};
pub use trigger::IntervalTrigger;
