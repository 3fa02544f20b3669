//! Log sinks.
//!
//! # Responsibilities
//! - `DirectSink`: master-side console + rotating file output
//! - `ForwardingSink`: worker-side relay over the IPC channel
//! - `MemorySink`: capture for tests
//!
//! # Design Decisions
//! - `submit` never blocks: the direct sink hands records to a dedicated
//!   writer thread over a channel
//! - Sink I/O failures are reported on stderr and never propagate

use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::config::LoggingConfig;
use crate::ipc::{IpcMessage, IpcSender};
use crate::logging::file::RotatingFileWriter;
use crate::logging::{Level, LogRecord};

/// Destination for log records.
pub trait LogSink: Send + Sync {
    fn submit(&self, record: LogRecord);
}

/// Render one record as a plain log line.
pub fn format_line(record: &LogRecord) -> String {
    let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut line = format!(
        "{ts} {level}: [{component}] {message}",
        level = record.level,
        component = record.component,
        message = record.message
    );
    if let Some(object) = &record.object {
        line.push(' ');
        line.push_str(&object.to_string());
    }
    line
}

fn colorize_level(level: Level) -> colored::ColoredString {
    let name = level.as_str();
    match level {
        Level::Fatal | Level::Error => name.red(),
        Level::Warn => name.yellow(),
        Level::Info => name.bright_black(),
        Level::Debug => name.green(),
        Level::Verbose => name.blue(),
        Level::Telemetry => name.cyan(),
    }
}

fn format_console(record: &LogRecord) -> String {
    let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut line = format!(
        "{ts} {level}: [{component}] {message}",
        level = colorize_level(record.level),
        component = record.component,
        message = record.message
    );
    if let Some(object) = &record.object {
        line.push(' ');
        line.push_str(&object.to_string());
    }
    line
}

/// Master-side sink: colored console plus a size-rotated file.
///
/// Records below the configured threshold are dropped before they reach the
/// writer thread. The default threshold is `telemetry`, which passes every
/// level through.
pub struct DirectSink {
    tx: mpsc::Sender<LogRecord>,
    threshold: Level,
}

impl DirectSink {
    /// Spawn the writer thread and return the sink.
    ///
    /// A file that cannot be opened disables the file sink; console output
    /// still works and the failure is reported on stderr.
    pub fn new(config: &LoggingConfig) -> Self {
        let (tx, rx) = mpsc::channel::<LogRecord>();
        let mut file =
            match RotatingFileWriter::open(&config.file, config.max_size, config.max_files) {
                Ok(writer) => Some(writer),
                Err(e) => {
                    eprintln!("ERROR Something bad happened to logging: {e}");
                    None
                }
            };
        thread::Builder::new()
            .name("log-writer".into())
            .spawn(move || {
                while let Ok(record) = rx.recv() {
                    println!("{}", format_console(&record));
                    if let Some(writer) = file.as_mut() {
                        if let Err(e) = writer.write_line(&format_line(&record)) {
                            eprintln!("ERROR Something bad happened to logging: {e}");
                            file = None;
                        }
                    }
                }
            })
            .expect("failed to spawn log writer thread");
        Self {
            tx,
            threshold: config.level,
        }
    }
}

impl LogSink for DirectSink {
    fn submit(&self, record: LogRecord) {
        if !self.threshold.admits(record.level) {
            return;
        }
        // receiver gone means the process is shutting down; drop silently
        let _ = self.tx.send(record);
    }
}

/// Worker-side sink: every record becomes a `Log` envelope on the IPC
/// channel. Nothing is written locally.
pub struct ForwardingSink {
    ipc: IpcSender,
}

impl ForwardingSink {
    pub fn new(ipc: IpcSender) -> Self {
        Self { ipc }
    }
}

impl LogSink for ForwardingSink {
    fn submit(&self, record: LogRecord) {
        self.ipc.send(&IpcMessage::Log(record));
    }
}

/// Capturing sink for tests.
#[derive(Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().expect("sink poisoned").clone()
    }

    /// First captured record matching the predicate.
    pub fn find(&self, predicate: impl Fn(&LogRecord) -> bool) -> Option<LogRecord> {
        self.records().into_iter().find(|r| predicate(r))
    }
}

impl LogSink for MemorySink {
    fn submit(&self, record: LogRecord) {
        self.records.lock().expect("sink poisoned").push(record);
    }
}
