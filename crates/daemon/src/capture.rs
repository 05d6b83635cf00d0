use std::path::Path;
use std::time::Duration;
use log::info;
use crate::artifact::{Artifact, ArtifactFormat, ArtifactStore};
use crate::error::{Stage, StageFailure};
use crate::job::{FrameSize, PipelineJob, CAPTURE_BITRATE, CAPTURE_FPS};
use crate::runner::{CommandSpec, ProcessRunner};

/// Build the capture tool invocation; without `output` the preview runs and nothing is saved
pub fn capture_command(
    capture_bin: &Path,
    job: &PipelineJob,
    output: Option<&Path>,
) -> CommandSpec {
    let mut cmd = CommandSpec::new(capture_bin)
        .arg("-t")
        .arg(job.duration_ms.to_string())
        .arg("-w")
        .arg(job.size.width.to_string())
        .arg("-h")
        .arg(job.size.height.to_string())
        .arg("-fps")
        .arg(job.fps.to_string())
        .arg("-b")
        .arg(job.bitrate.to_string());

    if let Some(path) = output {
        cmd = cmd.arg("-o").arg(path);
    }
    cmd
}

/// Record one clip into a fresh raw-video artifact
///
/// On failure the partially written artifact is removed before returning.
pub async fn capture<R: ProcessRunner>(
    runner: &R,
    store: &ArtifactStore,
    capture_bin: &Path,
    job: &PipelineJob,
) -> Result<Artifact, StageFailure> {
    let output = store
        .allocate(ArtifactFormat::RawVideo)
        .map_err(|e| StageFailure::artifact(Stage::Capture, e))?;

    let cmd = capture_command(capture_bin, job, Some(output.path()));
    info!("Start recording {} ({} ms at {})", output.path().display(), job.duration_ms, job.size);

    match runner.run(&cmd).await {
        Ok(_) => {
            info!("Successfully recorded {}", output.path().display());
            Ok(output)
        }
        Err(e) => {
            output.discard();
            Err(StageFailure::process(Stage::Capture, e))
        }
    }
}

/// Run the camera preview once so the lens can be focused by hand
///
/// Nothing is written to disk. Callers treat a failure as fatal.
pub async fn run_setup<R: ProcessRunner>(
    runner: &R,
    capture_bin: &Path,
    size: FrameSize,
    setup_time: Duration,
) -> Result<(), StageFailure> {
    let job = PipelineJob {
        size,
        duration_ms: setup_time.as_millis() as u64,
        fps: CAPTURE_FPS,
        bitrate: CAPTURE_BITRATE,
    };
    let cmd = capture_command(capture_bin, &job, None);

    info!("Start camera output for manual focus setup for {} seconds.", setup_time.as_secs());
    runner
        .run(&cmd)
        .await
        .map_err(|e| StageFailure::process(Stage::Setup, e))?;
    info!("Manual setup phase done.");
    Ok(())
}
