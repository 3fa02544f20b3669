//! Component-tagged logger handle.

use serde_json::Value;
use std::sync::Arc;

use crate::logging::{Level, LogRecord, LogSink};

/// Cheap, cloneable handle that tags records with a component name and
/// hands them to the process's sink.
///
/// Whether the record ends up on the master's console or on the IPC channel
/// is decided by the sink chosen at process start, not here.
#[derive(Clone)]
pub struct Logger {
    component: String,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(component: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            component: component.into(),
            sink,
        }
    }

    /// A logger for another component sharing this one's sink.
    pub fn scoped(&self, component: impl Into<String>) -> Logger {
        Logger::new(component, Arc::clone(&self.sink))
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn sink(&self) -> Arc<dyn LogSink> {
        Arc::clone(&self.sink)
    }

    /// Entry point that bypasses this logger's component tag. The
    /// supervisor uses it to relay records that already carry the worker's
    /// component name.
    pub fn raw(&self, component: &str, level: Level, message: &str, object: Option<Value>) {
        self.sink
            .submit(LogRecord::new(component, level, message, object));
    }

    fn log(&self, level: Level, message: &str, object: Option<Value>) {
        self.sink
            .submit(LogRecord::new(&self.component, level, message, object));
    }

    pub fn fatal(&self, message: &str, object: Option<Value>) {
        self.log(Level::Fatal, message, object);
    }

    pub fn error(&self, message: &str, object: Option<Value>) {
        self.log(Level::Error, message, object);
    }

    pub fn warn(&self, message: &str, object: Option<Value>) {
        self.log(Level::Warn, message, object);
    }

    pub fn info(&self, message: &str, object: Option<Value>) {
        self.log(Level::Info, message, object);
    }

    pub fn debug(&self, message: &str, object: Option<Value>) {
        self.log(Level::Debug, message, object);
    }

    pub fn verbose(&self, message: &str, object: Option<Value>) {
        self.log(Level::Verbose, message, object);
    }

    pub fn telemetry(&self, message: &str, object: Option<Value>) {
        self.log(Level::Telemetry, message, object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use serde_json::json;

    #[test]
    fn every_level_reaches_the_sink_tagged() {
        let sink = MemorySink::new();
        let log = Logger::new("Core", Arc::new(sink.clone()));
        log.fatal("f", None);
        log.error("e", None);
        log.warn("w", None);
        log.info("i", None);
        log.debug("d", None);
        log.verbose("v", None);
        log.telemetry("t", None);

        let records = sink.records();
        assert_eq!(records.len(), 7);
        assert!(records.iter().all(|r| r.component == "Core"));
        assert_eq!(records[0].level, Level::Fatal);
        assert_eq!(records[6].level, Level::Telemetry);
    }

    #[test]
    fn raw_overrides_the_component_tag() {
        let sink = MemorySink::new();
        let log = Logger::new("Core", Arc::new(sink.clone()));
        log.raw("Worker", Level::Warn, "m", Some(json!({"a": 1})));

        let record = sink.find(|r| r.component == "Worker").unwrap();
        assert_eq!(record.level, Level::Warn);
        assert_eq!(record.message, "m");
        assert_eq!(record.object, Some(json!({"a": 1})));
    }

    #[test]
    fn scoped_loggers_share_the_sink() {
        let sink = MemorySink::new();
        let log = Logger::new("Core", Arc::new(sink.clone()));
        log.scoped("Cache").debug("hit", None);
        assert!(sink.find(|r| r.component == "Cache").is_some());
    }
}
