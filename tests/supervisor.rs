//! Supervisor integration tests with shell stand-ins for workers.

mod common;

use std::time::Duration;

use serde_json::json;
use stoker::ipc::IpcMessage;
use stoker::logging::{Level, LogRecord};
use stoker::supervisor::WorkerStatus;

use common::{online_then_idle, shell_worker, step_until, supervisor_with_sink};

const DEADLINE: Duration = Duration::from_secs(10);

#[tokio::test]
async fn all_slots_reach_online() {
    for count in [1, 2, 4] {
        let (mut supervisor, _sink) = supervisor_with_sink(online_then_idle(), count);
        supervisor.start();
        assert_eq!(supervisor.statuses(), vec![WorkerStatus::Starting; count]);

        let ok = step_until(&mut supervisor, DEADLINE, |s| s.online_count() == count).await;
        assert!(ok, "never saw {count} workers online");
        assert_eq!(supervisor.statuses(), vec![WorkerStatus::Online; count]);
    }
}

#[tokio::test]
async fn every_exit_triggers_exactly_one_respawn() {
    // worker exits immediately; each exit must produce one new spawn
    let (mut supervisor, sink) = supervisor_with_sink(shell_worker("exit 7"), 2);
    supervisor.start();
    assert_eq!(supervisor.spawn_count(), 2);

    let ok = step_until(&mut supervisor, DEADLINE, |s| s.spawn_count() >= 4).await;
    assert!(ok, "respawns never happened");
    // slot count never changes; the pool is still exactly two slots
    assert_eq!(supervisor.statuses().len(), 2);

    let record = sink
        .find(|r| r.level == Level::Warn && r.message.contains("died with exit code 7"))
        .expect("exit warning missing");
    assert!(record.message.contains("Restarting..."));
}

#[tokio::test]
async fn worker_log_records_arrive_unmodified() {
    let record = LogRecord::new("X", Level::Warn, "m", Some(json!({"a": 1})));
    let line = IpcMessage::Log(record.clone()).encode();
    let (mut supervisor, sink) =
        supervisor_with_sink(shell_worker(&format!("echo '{line}'; sleep 30")), 1);
    supervisor.start();

    let ok = step_until(&mut supervisor, DEADLINE, |_| {
        sink.find(|r| r.component == "X").is_some()
    })
    .await;
    assert!(ok, "forwarded record never arrived");

    let relayed = sink.find(|r| r.component == "X").unwrap();
    assert_eq!(relayed, record);
}

#[cfg(unix)]
#[tokio::test]
async fn sigkill_is_reported_and_the_slot_respawns() {
    let (mut supervisor, sink) = supervisor_with_sink(online_then_idle(), 1);
    supervisor.start();
    let ok = step_until(&mut supervisor, DEADLINE, |s| s.online_count() == 1).await;
    assert!(ok);

    let pid = supervisor.worker_pids()[0];
    assert!(pid > 0);
    let killed = std::process::Command::new("kill")
        .args(["-KILL", &pid.to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let ok = step_until(&mut supervisor, DEADLINE, |s| s.spawn_count() >= 2).await;
    assert!(ok, "no respawn after SIGKILL");

    let record = sink
        .find(|r| r.level == Level::Warn && r.message.contains("SIGKILL"))
        .expect("SIGKILL warning missing");
    assert!(record.message.contains(&pid.to_string()));

    // the replacement worker comes back up in the same slot
    let ok = step_until(&mut supervisor, DEADLINE, |s| {
        s.online_count() == 1 && s.worker_pids()[0] != pid
    })
    .await;
    assert!(ok, "replacement worker never came online");
}

#[tokio::test]
async fn exit_is_detected_while_a_grandchild_holds_the_pipe() {
    // the shell exits immediately but leaves `sleep` holding its stdout
    // open; the exit must still be seen right away
    let script = format!("echo '{}'; sleep 30 & exit 3", IpcMessage::Online.encode());
    let (mut supervisor, sink) = supervisor_with_sink(shell_worker(&script), 1);
    supervisor.start();

    let ok = step_until(&mut supervisor, DEADLINE, |s| s.spawn_count() >= 2).await;
    assert!(ok, "exit went unnoticed while the pipe stayed open");
    assert!(sink
        .find(|r| r.level == Level::Warn && r.message.contains("died with exit code 3"))
        .is_some());
}

#[tokio::test]
async fn unknown_message_kinds_warn_without_respawn() {
    let (mut supervisor, sink) =
        supervisor_with_sink(shell_worker(r#"echo '{"type": 99}'; sleep 30"#), 1);
    supervisor.start();

    let ok = step_until(&mut supervisor, DEADLINE, |_| {
        sink.find(|r| r.message.contains("strange message")).is_some()
    })
    .await;
    assert!(ok, "unknown-kind warning missing");

    let record = sink.find(|r| r.message.contains("strange message")).unwrap();
    assert_eq!(record.level, Level::Warn);
    assert_eq!(record.object.unwrap()["kind"], 99);
    // still exactly the original spawn; the worker was not restarted
    assert_eq!(supervisor.spawn_count(), 1);
}

#[tokio::test]
async fn undecodable_lines_warn_and_are_dropped() {
    let (mut supervisor, sink) =
        supervisor_with_sink(shell_worker("echo 'not json'; sleep 30"), 1);
    supervisor.start();

    let ok = step_until(&mut supervisor, DEADLINE, |_| {
        sink.find(|r| r.message.contains("Undecodable")).is_some()
    })
    .await;
    assert!(ok, "decode warning missing");
    assert_eq!(supervisor.spawn_count(), 1);
}

#[tokio::test]
async fn the_real_worker_binary_comes_online() {
    use std::io::Write;

    // ephemeral port so parallel test runs don't collide
    let mut config = tempfile::NamedTempFile::new().unwrap();
    config
        .write_all(b"[server]\nhttp_port = 0\n")
        .unwrap();

    let command = stoker::supervisor::WorkerCommand::new(env!("CARGO_BIN_EXE_stoker"))
        .arg("--worker")
        .arg("--config")
        .arg(config.path().as_os_str());
    let (mut supervisor, _sink) = supervisor_with_sink(command, 1);
    supervisor.start();

    let ok = step_until(&mut supervisor, Duration::from_secs(30), |s| {
        s.online_count() == 1
    })
    .await;
    assert!(ok, "real worker never announced itself");
}

#[tokio::test]
async fn real_workers_share_a_fixed_port() {
    use std::io::Write;

    // fixed port: the whole point is that both workers bind it
    let mut config = tempfile::NamedTempFile::new().unwrap();
    config
        .write_all(b"[server]\nhttp_port = 47911\n")
        .unwrap();

    let command = stoker::supervisor::WorkerCommand::new(env!("CARGO_BIN_EXE_stoker"))
        .arg("--worker")
        .arg("--config")
        .arg(config.path().as_os_str());
    let (mut supervisor, _sink) = supervisor_with_sink(command, 2);
    supervisor.start();

    let ok = step_until(&mut supervisor, Duration::from_secs(30), |s| {
        s.online_count() == 2
    })
    .await;
    assert!(ok, "two workers never came online on one port");
    // both initial spawns survived; nothing crash-looped on AddrInUse
    assert_eq!(supervisor.spawn_count(), 2);
}

#[tokio::test]
async fn spawn_failure_takes_the_respawn_path() {
    let command = stoker::supervisor::WorkerCommand::new("/nonexistent/worker-binary");
    let (mut supervisor, sink) = supervisor_with_sink(command, 1);
    supervisor.start();
    // the failed spawn surfaces as an exit event and is retried
    let ok = step_until(&mut supervisor, DEADLINE, |s| s.spawn_count() >= 3).await;
    assert!(ok, "spawn failure never re-entered the respawn path");
    assert!(sink
        .find(|r| r.level == Level::Warn && r.message.contains("spawn failure"))
        .is_some());
}
