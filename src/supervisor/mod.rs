//! Master-side worker pool supervision.
//!
//! # Data Flow
//! ```text
//! start():  spawn N workers, one watcher task per child
//! watcher:  child stdout line → Event::Line
//!           child exit        → Event::Exit
//! loop:     Event::Line → decode → Log: relay via Logger::raw
//!                                  Online: mark slot online
//!                                  Unknown: warn, ignore
//!           Event::Exit → warn with pid and cause, respawn same slot
//! ```
//!
//! # Design Decisions
//! - Event handlers never block; all child I/O lives in watcher tasks
//! - Watchers await the exit concurrently with the line reader, so a
//!   grandchild inheriting the worker's stdout cannot delay exit detection
//! - Exit always respawns immediately: no backoff, no restart cap, and no
//!   distinction between clean shutdown and crash
//! - A spawn failure surfaces as an immediate exit event and takes the
//!   same respawn path as a crash

pub mod worker;

use serde_json::json;
use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::ipc::IpcMessage;
use crate::logging::{LogSink, Logger};

pub use worker::{describe_exit, WorkerCommand, WorkerHandle, WorkerStatus};

/// Detected CPU parallelism, the default worker count.
pub fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

enum Event {
    /// One NDJSON line from a worker's channel.
    Line { slot: usize, pid: u32, line: String },
    /// A worker process terminated (or never started).
    Exit {
        slot: usize,
        pid: u32,
        status: io::Result<ExitStatus>,
    },
}

/// Owns the master/worker topology: spawns N workers, relays their log
/// records into the sink, and respawns any worker that exits.
pub struct Supervisor {
    command: WorkerCommand,
    count: usize,
    log: Logger,
    workers: Vec<WorkerHandle>,
    spawn_count: usize,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Supervisor {
    /// Build a supervisor over `count` worker slots, logging to `sink`.
    pub fn new(command: WorkerCommand, count: usize, sink: Arc<dyn LogSink>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            command,
            count: count.max(1),
            log: Logger::new("Core", sink),
            workers: Vec::new(),
            spawn_count: 0,
            tx,
            rx,
        }
    }

    /// Spawn all worker slots. Fire and forget: failures surface as exit
    /// events on the regular path.
    pub fn start(&mut self) {
        self.log.info(
            &format!("Cluster mode enabled, spawning {} workers.", self.count),
            None,
        );
        for slot in 0..self.count {
            self.workers.push(WorkerHandle {
                slot,
                pid: 0,
                status: WorkerStatus::Starting,
            });
            self.spawn_slot(slot);
        }
    }

    /// Run until SIGINT. Every worker exit triggers an immediate respawn.
    pub async fn run(mut self) {
        self.start();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    self.log.warn("Got SIGINT. Exiting...", None);
                    return;
                }
                event = self.rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => return,
                    }
                }
            }
        }
    }

    /// Process one pending event. Test hook; `run` is the production loop.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Current status of every slot.
    pub fn statuses(&self) -> Vec<WorkerStatus> {
        self.workers.iter().map(|w| w.status).collect()
    }

    pub fn online_count(&self) -> usize {
        self.workers
            .iter()
            .filter(|w| w.status == WorkerStatus::Online)
            .count()
    }

    /// Total processes spawned since start, counting respawns.
    pub fn spawn_count(&self) -> usize {
        self.spawn_count
    }

    pub fn worker_pids(&self) -> Vec<u32> {
        self.workers.iter().map(|w| w.pid).collect()
    }

    fn spawn_slot(&mut self, slot: usize) {
        self.spawn_count += 1;
        match self.command.spawn() {
            Ok(mut child) => {
                let pid = child.id().unwrap_or(0);
                self.workers[slot].pid = pid;
                self.workers[slot].status = WorkerStatus::Starting;

                let stdout = child.stdout.take();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    // Exit must not wait for pipe EOF: a grandchild can keep
                    // the worker's stdout open long after the worker died.
                    let status = match stdout {
                        Some(stdout) => {
                            let mut lines = BufReader::new(stdout).lines();
                            loop {
                                tokio::select! {
                                    next = lines.next_line() => match next {
                                        Ok(Some(line)) => {
                                            if tx.send(Event::Line { slot, pid, line }).is_err() {
                                                return;
                                            }
                                        }
                                        _ => break child.wait().await,
                                    },
                                    status = child.wait() => {
                                        // relay whatever the worker flushed
                                        // before it went down
                                        while let Ok(Ok(Some(line))) =
                                            timeout(Duration::from_millis(50), lines.next_line())
                                                .await
                                        {
                                            if tx.send(Event::Line { slot, pid, line }).is_err() {
                                                return;
                                            }
                                        }
                                        break status;
                                    }
                                }
                            }
                        }
                        None => child.wait().await,
                    };
                    let _ = tx.send(Event::Exit { slot, pid, status });
                });
            }
            Err(e) => {
                // treated like a crash: the exit event below re-enters the
                // respawn path
                let _ = self.tx.send(Event::Exit {
                    slot,
                    pid: 0,
                    status: Err(e),
                });
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Line { slot, pid, line } => self.handle_line(slot, pid, &line),
            Event::Exit { slot, pid, status } => self.handle_exit(slot, pid, status),
        }
    }

    fn handle_line(&mut self, slot: usize, pid: u32, line: &str) {
        match IpcMessage::decode(line) {
            Ok(IpcMessage::Log(record)) => {
                // the component tag travels inside the payload
                self.log
                    .raw(&record.component, record.level, &record.message, record.object);
            }
            Ok(IpcMessage::Online) => {
                self.workers[slot].status = WorkerStatus::Online;
                self.log
                    .info(&format!("Worker {pid} is online."), None);
            }
            Ok(IpcMessage::Unknown(kind)) => {
                self.log.warn(
                    "Received strange message from worker, revolution might be underway.",
                    Some(json!({ "pid": pid, "kind": kind })),
                );
            }
            Err(e) => {
                self.log.warn(
                    "Undecodable message from worker.",
                    Some(json!({ "pid": pid, "error": e.to_string(), "line": line })),
                );
            }
        }
    }

    fn handle_exit(&mut self, slot: usize, pid: u32, status: io::Result<ExitStatus>) {
        let cause = match &status {
            Ok(status) => describe_exit(status),
            Err(e) => format!("spawn failure: {e}"),
        };
        self.log.warn(
            &format!("Worker {pid} died with {cause}. Restarting..."),
            None,
        );
        self.workers[slot].status = WorkerStatus::Exited;
        self.spawn_slot(slot);
    }
}
