//! Clustered web API scaffold.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌────────────────────── MASTER ──────────────────────┐
//!                 │                                                     │
//!                 │  supervisor ── fork ──▶ worker 0 ┐                  │
//!                 │      │        respawn   worker 1 │  one per CPU     │
//!                 │      │        on exit   worker N ┘                  │
//!                 │      │                     │                        │
//!                 │      ◀── IPC log records ──┘ (NDJSON over stdout)   │
//!                 │      │                                              │
//!                 │      ▼                                              │
//!                 │  Logger → DirectSink → colored console              │
//!                 │                      → rotating file                │
//!                 └─────────────────────────────────────────────────────┘
//!
//!                 ┌────────────────────── WORKER ──────────────────────┐
//!                 │  axum HTTP(S) server                                │
//!                 │      routes, telemetry middleware, 404 fallback     │
//!                 │  Logger → ForwardingSink → IPC channel to master    │
//!                 │  collaborators: Redis cache, Postgres model         │
//!                 └─────────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod ipc;
pub mod logging;
pub mod supervisor;

// Worker-side serving
pub mod http;

// Collaborators and demo logic
pub mod cache;
pub mod domain;
pub mod helpers;
pub mod model;

pub use config::AppConfig;
pub use http::ApiServer;
pub use logging::{Level, Logger};
pub use supervisor::Supervisor;
