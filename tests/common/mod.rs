//! Shared utilities for supervisor integration tests.

use std::sync::Arc;
use std::time::Duration;

use stoker::ipc::IpcMessage;
use stoker::logging::MemorySink;
use stoker::supervisor::{Supervisor, WorkerCommand};

/// A worker stand-in running the given shell script.
pub fn shell_worker(script: &str) -> WorkerCommand {
    WorkerCommand::new("/bin/sh").arg("-c").arg(script)
}

/// A stand-in that announces readiness and then idles like a server.
pub fn online_then_idle() -> WorkerCommand {
    shell_worker(&format!("echo '{}'; sleep 30", IpcMessage::Online.encode()))
}

/// Build a supervisor over `count` slots plus the capturing sink it logs to.
pub fn supervisor_with_sink(command: WorkerCommand, count: usize) -> (Supervisor, MemorySink) {
    let sink = MemorySink::new();
    let supervisor = Supervisor::new(command, count, Arc::new(sink.clone()));
    (supervisor, sink)
}

/// Step the supervisor until the condition holds or the deadline passes.
pub async fn step_until(
    supervisor: &mut Supervisor,
    deadline: Duration,
    mut condition: impl FnMut(&Supervisor) -> bool,
) -> bool {
    let result = tokio::time::timeout(deadline, async {
        while !condition(supervisor) {
            if !supervisor.step().await {
                return false;
            }
        }
        true
    })
    .await;
    result.unwrap_or(false)
}
