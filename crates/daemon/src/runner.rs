use std::ffi::OsString;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use log::debug;
use tokio::process::Command;
use crate::error::ProcessError;

/// A program and its discrete argument list; never passed through a shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program file name without directories, e.g. `raspivid` for `/opt/vc/bin/raspivid`
    pub fn program_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Position of `flag` in the argument list
    #[cfg(test)]
    pub(crate) fn position_of(&self, flag: &str) -> Option<usize> {
        self.args.iter().position(|a| a == flag)
    }

    /// Argument directly following `flag`
    #[cfg(test)]
    pub(crate) fn value_of(&self, flag: &str) -> Option<&OsString> {
        self.position_of(flag).and_then(|i| self.args.get(i + 1))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs an external command to completion
///
/// Implementations return the captured standard output on a zero exit status
/// and a [`ProcessError`] carrying the exit code and captured standard error
/// otherwise. There is no retry at this layer.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, command: &CommandSpec) -> impl Future<Output = Result<String, ProcessError>> + Send;
}

/// Runner backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any tool that runs longer than `timeout`; `None` waits indefinitely
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl ProcessRunner for SystemRunner {
    async fn run(&self, command: &CommandSpec) -> Result<String, ProcessError> {
        let cmd_str = command.to_string();
        debug!("Executing: {}", cmd_str);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: cmd_str.clone(),
            source,
        })?;

        // The child is killed when the wait future is dropped on timeout
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(ProcessError::TimedOut {
                        command: cmd_str,
                        timeout: limit,
                    })
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|source| ProcessError::Spawn {
            command: cmd_str.clone(),
            source,
        })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        debug!("{} exit code: {}, stdout length: {}, stderr length: {}",
               command.program_name(), exit_code, stdout.len(), stderr.len());

        if !output.status.success() {
            return Err(ProcessError::Failed {
                command: cmd_str,
                exit_code,
                stderr,
            });
        }

        Ok(stdout)
    }
}
