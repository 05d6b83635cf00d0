use std::path::Path;
use chrono::{DateTime, Local};
use log::info;
use crate::artifact::Artifact;
use crate::config::RemoteTarget;
use crate::error::{Stage, StageFailure};
use crate::runner::{CommandSpec, ProcessRunner};

/// Timestamp layout embedded in uploaded file names
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H_%M_%S";

/// `<prefix>_<YYYY-MM-DD-HH_MM_SS>.<extension>`
pub fn remote_filename(prefix: &str, extension: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.{}", prefix, at.format(TIMESTAMP_FORMAT), extension)
}

/// `user@host:remote_dir/filename`
pub fn remote_destination(target: &RemoteTarget, filename: &str) -> String {
    let dir = target.remote_dir.trim_end_matches('/');
    if dir.is_empty() {
        format!("{}@{}:{}", target.user, target.host, filename)
    } else {
        format!("{}@{}:{}/{}", target.user, target.host, dir, filename)
    }
}

pub fn upload_command(upload_bin: &Path, source: &Path, destination: &str) -> CommandSpec {
    CommandSpec::new(upload_bin)
        .args(["-o", "StrictHostKeyChecking=no", "-o", "UserKnownHostsFile=/dev/null"])
        .arg(source)
        .arg(destination)
}

/// Copy the finished video to the remote host
///
/// This is the last stage, so `input` is deleted whatever the outcome.
/// Returns the file name created on the remote host.
pub async fn upload<R: ProcessRunner>(
    runner: &R,
    upload_bin: &Path,
    target: &RemoteTarget,
    input: Artifact,
) -> Result<String, StageFailure> {
    let filename = remote_filename(&target.file_prefix, input.format().extension(), Local::now());
    let destination = remote_destination(target, &filename);
    let cmd = upload_command(upload_bin, input.path(), &destination);

    info!("Uploading {} to {}", input.path().display(), destination);
    let result = runner.run(&cmd).await;
    input.discard();

    result.map_err(|e| StageFailure::process(Stage::Upload, e))?;
    info!("Successfully uploaded {}", filename);
    Ok(filename)
}
