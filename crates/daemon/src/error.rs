use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Invalid startup input; fatal before any scheduling begins
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid size `{0}`: size must be WIDTH,HEIGHT with positive integers")]
    InvalidSize(String),
    #[error("invalid interval `{0}`: expected e.g. 'every 10 minutes'")]
    InvalidInterval(String),
}

/// Failure of a single external tool invocation
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("could not start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with code {exit_code}\nError output: {stderr}")]
    Failed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
    #[error("`{command}` did not finish within {}s and was killed", .timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },
}

impl ProcessError {
    /// The rendered command line that failed
    pub fn command(&self) -> &str {
        match self {
            ProcessError::Spawn { command, .. }
            | ProcessError::Failed { command, .. }
            | ProcessError::TimedOut { command, .. } => command,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Failed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    pub fn stderr(&self) -> Option<&str> {
        match self {
            ProcessError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Pipeline step in which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Setup,
    Capture,
    Transcode,
    Upload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Setup => "setup",
            Stage::Capture => "capture",
            Stage::Transcode => "transcode",
            Stage::Upload => "upload",
        };
        f.write_str(name)
    }
}

/// Underlying reason for a stage failure
#[derive(Debug, Error)]
pub enum StageCause {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("could not allocate temporary artifact: {0}")]
    Artifact(#[source] io::Error),
}

/// Typed failure returned by a pipeline stage
#[derive(Debug, Error)]
#[error("{stage} failed: {cause}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub cause: StageCause,
}

impl StageFailure {
    pub fn process(stage: Stage, err: ProcessError) -> Self {
        Self { stage, cause: StageCause::Process(err) }
    }

    pub fn artifact(stage: Stage, err: io::Error) -> Self {
        Self { stage, cause: StageCause::Artifact(err) }
    }

    /// Exit code of the failed tool, if it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match &self.cause {
            StageCause::Process(e) => e.exit_code(),
            StageCause::Artifact(_) => None,
        }
    }

    /// Captured standard error of the failed tool
    pub fn stderr(&self) -> Option<&str> {
        match &self.cause {
            StageCause::Process(e) => e.stderr(),
            StageCause::Artifact(_) => None,
        }
    }

    pub fn command(&self) -> Option<&str> {
        match &self.cause {
            StageCause::Process(e) => Some(e.command()),
            StageCause::Artifact(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_exposes_tool_context() {
        let failure = StageFailure::process(
            Stage::Capture,
            ProcessError::Failed {
                command: "raspivid -t 1000".to_string(),
                exit_code: 70,
                stderr: "device busy".to_string(),
            },
        );

        assert_eq!(failure.exit_code(), Some(70));
        assert_eq!(failure.stderr(), Some("device busy"));
        assert_eq!(failure.command(), Some("raspivid -t 1000"));

        let message = failure.to_string();
        assert!(message.starts_with("capture failed"));
        assert!(message.contains("exit"));
        assert!(message.contains("device busy"));
    }

    #[test]
    fn test_artifact_failure_has_no_exit_code() {
        let failure = StageFailure::artifact(
            Stage::Transcode,
            io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        );
        assert_eq!(failure.exit_code(), None);
        assert_eq!(failure.stderr(), None);
        assert!(failure.to_string().contains("transcode failed"));
    }
}
