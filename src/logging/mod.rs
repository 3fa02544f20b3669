//! Leveled structured logging.
//!
//! # Data Flow
//! ```text
//! Master / single process:
//!     Logger → DirectSink → writer thread → console (colored)
//!                                         → rotating file
//!
//! Worker:
//!     Logger → ForwardingSink → IPC Log envelope → master
//!         master supervisor → Logger::raw → DirectSink
//! ```
//!
//! # Design Decisions
//! - Sink variant is chosen once at process start based on role,
//!   not branched on per call
//! - Sink I/O errors fall back to stderr and never reach callers
//! - No delivery guarantee across worker restarts (best effort)

pub mod file;
pub mod level;
pub mod logger;
pub mod record;
pub mod sink;

pub use level::Level;
pub use logger::Logger;
pub use record::LogRecord;
pub use sink::{DirectSink, ForwardingSink, LogSink, MemorySink};
