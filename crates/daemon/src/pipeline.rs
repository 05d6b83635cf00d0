use std::path::PathBuf;
use log::info;
use uuid::Uuid;
use crate::artifact::ArtifactStore;
use crate::capture::capture;
use crate::config::{DaemonConfig, RemoteTarget, TranscodeOptions};
use crate::error::StageFailure;
use crate::job::PipelineJob;
use crate::runner::ProcessRunner;
use crate::scheduler::ScheduledJob;
use crate::transcode::transcode;
use crate::upload::upload;

/// External tools and destination used by every cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub capture_bin: PathBuf,
    pub transcode_bin: PathBuf,
    pub upload_bin: PathBuf,
    pub transcode: TranscodeOptions,
    pub remote: RemoteTarget,
}

impl From<&DaemonConfig> for PipelineSettings {
    fn from(cfg: &DaemonConfig) -> Self {
        Self {
            capture_bin: cfg.capture_bin.clone(),
            transcode_bin: cfg.transcode_bin.clone(),
            upload_bin: cfg.upload_bin.clone(),
            transcode: cfg.transcode.clone(),
            remote: cfg.remote.clone(),
        }
    }
}

/// Capture, transcode and upload, strictly in sequence
pub struct Pipeline<R> {
    runner: R,
    store: ArtifactStore,
    settings: PipelineSettings,
}

impl<R: ProcessRunner> Pipeline<R> {
    pub fn new(runner: R, store: ArtifactStore, settings: PipelineSettings) -> Self {
        Self { runner, store, settings }
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run one cycle and return the remote file name
    ///
    /// The first failing stage ends the cycle. Every artifact created along
    /// the way is gone by the time this returns.
    pub async fn run(&self, job: &PipelineJob) -> Result<String, StageFailure> {
        let s = &self.settings;

        let raw = capture(&self.runner, &self.store, &s.capture_bin, job).await?;
        let encoded = transcode(&self.runner, &self.store, &s.transcode_bin, &s.transcode, raw).await?;
        upload(&self.runner, &s.upload_bin, &s.remote, encoded).await
    }
}

/// The recurring "create a video" job
pub struct RecordingJob<R> {
    pipeline: Pipeline<R>,
    job: PipelineJob,
}

impl<R: ProcessRunner> RecordingJob<R> {
    pub fn new(pipeline: Pipeline<R>, job: PipelineJob) -> Self {
        Self { pipeline, job }
    }

    #[cfg(test)]
    pub(crate) fn pipeline(&self) -> &Pipeline<R> {
        &self.pipeline
    }
}

impl<R: ProcessRunner> ScheduledJob for RecordingJob<R> {
    type Output = String;
    type Error = StageFailure;

    fn name(&self) -> &str {
        "create a video"
    }

    async fn run(&self) -> Result<String, StageFailure> {
        let cycle = Uuid::new_v4();
        info!("Cycle {}: recording {} ms at {}", cycle, self.job.duration_ms, self.job.size);

        let filename = self.pipeline.run(&self.job).await?;
        info!("Cycle {}: successfully created {}", cycle, filename);
        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::job::FrameSize;
    use crate::scheduler::{Scheduler, SchedulerState};
    use crate::testing::FakeRunner;
    use crate::trigger::IntervalTrigger;
    use crate::upload::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use std::time::Duration;
    use tempfile::TempDir;

    fn pipeline(runner: FakeRunner) -> (TempDir, Pipeline<FakeRunner>) {
        let dir = tempfile::tempdir().unwrap();
        let settings = PipelineSettings::from(&DaemonConfig::default_config());
        let pipeline = Pipeline::new(runner, ArtifactStore::new(dir.path()), settings);
        (dir, pipeline)
    }

    fn job() -> PipelineJob {
        PipelineJob::new(FrameSize::new(1920, 1080), 30_000)
    }

    fn assert_no_artifacts(pipeline: &Pipeline<FakeRunner>) {
        let left = pipeline.store().list_artifacts().unwrap();
        assert!(left.is_empty(), "artifacts left behind: {:?}", left);
    }

    #[tokio::test]
    async fn test_successful_cycle_uploads_timestamped_mp4() {
        let (_dir, pipeline) = pipeline(FakeRunner::new());

        let filename = pipeline.run(&job()).await.unwrap();

        let stamp = filename
            .strip_prefix("laboratorio_laguna_cam_")
            .and_then(|s| s.strip_suffix(".mp4"))
            .unwrap();
        assert!(NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());

        assert_eq!(pipeline.runner().programs(), vec!["raspivid", "ffmpeg", "scp"]);

        // Each stage consumed exactly what the previous one produced
        let calls = pipeline.runner().calls();
        assert_eq!(calls[0].value_of("-o"), calls[1].value_of("-i"));
        assert_eq!(calls[1].args.last(), calls[2].args.get(calls[2].args.len() - 2));
        assert_no_artifacts(&pipeline);
    }

    #[tokio::test]
    async fn test_capture_failure_stops_cycle() {
        let (_dir, pipeline) = pipeline(FakeRunner::new().failing("raspivid", 70, "device busy"));

        let err = pipeline.run(&job()).await.unwrap_err();

        assert_eq!(err.stage, Stage::Capture);
        assert_eq!(err.exit_code(), Some(70));
        assert_eq!(err.stderr(), Some("device busy"));
        assert_eq!(pipeline.runner().programs(), vec!["raspivid"]);
        assert_no_artifacts(&pipeline);
    }

    #[tokio::test]
    async fn test_transcode_failure_consumes_capture_and_skips_upload() {
        let (_dir, pipeline) = pipeline(FakeRunner::new().failing("ffmpeg", 1, "moov atom not found"));

        let err = pipeline.run(&job()).await.unwrap_err();

        assert_eq!(err.stage, Stage::Transcode);
        assert_eq!(pipeline.runner().programs(), vec!["raspivid", "ffmpeg"]);
        let raw = PathBuf::from(pipeline.runner().calls()[0].value_of("-o").unwrap());
        assert!(!raw.exists());
        assert_no_artifacts(&pipeline);
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_nothing_behind() {
        let (_dir, pipeline) = pipeline(FakeRunner::new().failing("scp", 1, "lost connection"));

        let err = pipeline.run(&job()).await.unwrap_err();

        assert_eq!(err.stage, Stage::Upload);
        assert_eq!(err.stderr(), Some("lost connection"));
        assert_eq!(pipeline.runner().programs(), vec!["raspivid", "ffmpeg", "scp"]);
        assert_no_artifacts(&pipeline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_leaves_scheduler_idle_and_ready() {
        let (_dir, pipeline) = pipeline(FakeRunner::new().failing("raspivid", 70, "device busy"));
        let recording = RecordingJob::new(pipeline, job());
        let trigger: IntervalTrigger = "every 10 minutes".parse().unwrap();
        let mut scheduler = Scheduler::new(recording, trigger);

        let err = scheduler.step().await.unwrap_err();
        assert_eq!(err.stage, Stage::Capture);
        assert_eq!(err.stderr(), Some("device busy"));

        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.stats().failures, 1);
        let last = scheduler.last_run().unwrap();
        assert_eq!(scheduler.next_due(), last + Duration::from_secs(600));
        assert_no_artifacts(scheduler.job().pipeline());

        // The next trigger runs the pipeline again
        scheduler.step().await.unwrap_err();
        assert_eq!(scheduler.stats().runs, 2);
        assert_eq!(scheduler.job().pipeline().runner().programs(), vec!["raspivid", "raspivid"]);
    }
}
