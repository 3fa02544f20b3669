//! Worker process spawning and bookkeeping.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};

/// Lifecycle of one worker slot.
///
/// There is no terminal state while the master runs: `Exited` always
/// transitions back to `Starting` via an immediate respawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Starting,
    Online,
    Exited,
}

/// Supervisor-owned record of one worker slot.
///
/// The slot is the worker's logical identity; the pid changes on every
/// respawn.
#[derive(Debug)]
pub struct WorkerHandle {
    pub slot: usize,
    pub pid: u32,
    pub status: WorkerStatus,
}

/// Recipe for spawning a worker process.
///
/// Defaults to re-invoking the current executable in worker mode; tests
/// substitute shell stand-ins.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// The current executable with the given extra arguments.
    pub fn current_exe(args: impl IntoIterator<Item = String>) -> io::Result<Self> {
        let mut command = Self::new(std::env::current_exe()?);
        for arg in args {
            command = command.arg(arg);
        }
        Ok(command)
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Spawn the process with stdout piped back to the supervisor.
    ///
    /// Stderr is inherited so worker panics stay visible on the master's
    /// terminal.
    pub(crate) fn spawn(&self) -> io::Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
    }
}

/// Human-readable exit description: a signal name or an exit code.
pub fn describe_exit(status: &ExitStatus) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return signal_name(signal);
        }
    }
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "unknown cause".to_string(),
    }
}

#[cfg(unix)]
fn signal_name(signal: i32) -> String {
    match signal {
        1 => "SIGHUP".to_string(),
        2 => "SIGINT".to_string(),
        3 => "SIGQUIT".to_string(),
        6 => "SIGABRT".to_string(),
        9 => "SIGKILL".to_string(),
        11 => "SIGSEGV".to_string(),
        13 => "SIGPIPE".to_string(),
        15 => "SIGTERM".to_string(),
        other => format!("signal {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exit_code_is_described() {
        let mut child = WorkerCommand::new("/bin/sh")
            .arg("-c")
            .arg("exit 3")
            .spawn()
            .unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(describe_exit(&status), "exit code 3");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn kill_signal_is_named() {
        let mut child = WorkerCommand::new("/bin/sh")
            .arg("-c")
            .arg("sleep 30")
            .spawn()
            .unwrap();
        child.start_kill().unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(describe_exit(&status), "SIGKILL");
    }
}
