use std::path::Path;
use log::info;
use crate::artifact::{Artifact, ArtifactFormat, ArtifactStore};
use crate::config::TranscodeOptions;
use crate::error::{Stage, StageFailure};
use crate::runner::{CommandSpec, ProcessRunner};

pub fn transcode_command(
    transcode_bin: &Path,
    options: &TranscodeOptions,
    input: &Path,
    output: &Path,
) -> CommandSpec {
    let mut cmd = CommandSpec::new(transcode_bin).arg("-y").arg("-i").arg(input);

    if let Some(preset) = &options.preset {
        cmd = cmd.arg("-preset").arg(preset);
    }
    if let Some(qp) = options.qp {
        cmd = cmd.arg("-qp").arg(qp.to_string());
    }

    cmd.arg(output)
}

/// Wrap a raw capture into an MP4 artifact
///
/// Consumes `input`: it is deleted whatever the outcome. On failure the
/// partially written output is deleted as well.
pub async fn transcode<R: ProcessRunner>(
    runner: &R,
    store: &ArtifactStore,
    transcode_bin: &Path,
    options: &TranscodeOptions,
    input: Artifact,
) -> Result<Artifact, StageFailure> {
    let output = match store.allocate(ArtifactFormat::EncodedVideo) {
        Ok(output) => output,
        Err(e) => {
            input.discard();
            return Err(StageFailure::artifact(Stage::Transcode, e));
        }
    };

    let cmd = transcode_command(transcode_bin, options, input.path(), output.path());
    info!("Start encoding {}", output.path().display());

    let result = runner.run(&cmd).await;
    input.discard();

    match result {
        Ok(_) => {
            info!("Successfully encoded {}", output.path().display());
            Ok(output)
        }
        Err(e) => {
            output.discard();
            Err(StageFailure::process(Stage::Transcode, e))
        }
    }
}
