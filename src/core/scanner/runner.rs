// src/core/scanner/runner.rs

use std::future::Future;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::core::models::{HardFailure, ProbeOutcome};

/// Exit status a POSIX shell reports when it cannot find a command.
const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Text captured from both output channels of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), stderr: stderr.into() }
    }
}

/// Launches external diagnostic programs on behalf of the probes.
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` and returns what it printed.
    ///
    /// A missing program is a [`HardFailure`]; a timeout or any other launch
    /// problem is reported as no data.
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = ProbeOutcome<CommandOutput>> + Send;
}

/// Runs commands as real child processes with a fixed deadline.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> ProbeOutcome<CommandOutput> {
        debug!(program, ?args, "Spawning command.");
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout also reaches what a shell started.
        #[cfg(unix)]
        command.process_group(0);
        let child = command.spawn();

        let child = match child {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                error!(program, "Command not found.");
                return Err(HardFailure::new(program));
            }
            Err(e) => {
                warn!(program, error = %e, "Unable to run command.");
                return Ok(None);
            }
        };

        let pid = child.id();
        // Dropping the pending future on timeout kills the child itself.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(program, error = %e, "Waiting for command failed.");
                return Ok(None);
            }
            Err(_) => {
                debug!(program, ?args, "Command timed out.");
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                return Ok(None);
            }
        };

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        classify(program, output.status.code(), result)
    }
}

/// Kills every process in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else { return };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => debug!(pid, "Killed timed-out process group."),
        // ESRCH: the group already exited.
        Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!(pid, error = %e, "Unable to kill process group."),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

/// Separates "a command inside this program was missing" from ordinary output.
fn classify(program: &str, code: Option<i32>, output: CommandOutput) -> ProbeOutcome<CommandOutput> {
    if code == Some(EXIT_COMMAND_NOT_FOUND)
        || output.stderr.to_lowercase().contains("command not found")
    {
        error!(program, stderr = %output.stderr.trim(), "Command reported a missing program.");
        return Err(HardFailure::new(program));
    }
    Ok(Some(output))
}
