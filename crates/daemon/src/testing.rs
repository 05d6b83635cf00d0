//! Scripted [`ProcessRunner`] used by the stage, pipeline and scheduler tests.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use crate::error::ProcessError;
use crate::runner::{CommandSpec, ProcessRunner};

/// Runner that records every command and answers from a script
///
/// Unscripted programs succeed. Like the real tools, `raspivid` writes the
/// path after `-o` and `ffmpeg` writes its last argument, also when they fail
/// (a partial file).
#[derive(Default)]
pub(crate) struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    failures: Mutex<HashMap<String, (i32, String)>>,
}

impl FakeRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every call to `program` exit with `code` and `stderr`
    pub(crate) fn failing(self, program: &str, code: i32, stderr: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(program.to_string(), (code, stderr.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Program names in invocation order
    pub(crate) fn programs(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::program_name).collect()
    }

    fn output_of(command: &CommandSpec) -> Option<PathBuf> {
        match command.program_name().as_str() {
            "raspivid" => command.value_of("-o").map(PathBuf::from),
            "ffmpeg" => command.args.last().map(PathBuf::from),
            _ => None,
        }
    }
}

impl ProcessRunner for FakeRunner {
    async fn run(&self, command: &CommandSpec) -> Result<String, ProcessError> {
        self.calls.lock().unwrap().push(command.clone());

        if let Some(output) = Self::output_of(command) {
            fs::write(&output, b"video").expect("fake tool could not write its output");
        }

        let failure = self
            .failures
            .lock()
            .unwrap()
            .get(&command.program_name())
            .cloned();

        match failure {
            Some((exit_code, stderr)) => Err(ProcessError::Failed {
                command: command.to_string(),
                exit_code,
                stderr,
            }),
            None => Ok(String::new()),
        }
    }
}
