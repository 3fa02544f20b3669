//! Worker-side HTTP server.
//!
//! # Data Flow
//! ```text
//! request → telemetry middleware → router
//!     GET /            hello world
//!     GET /demo        domain pipeline demo
//!     GET /users/{id}  public user projection
//!     /static          files from disk
//!     (anything else)  404 plain text
//! ```
//!
//! # Design Decisions
//! - Every error response goes through the fixed status mapping in
//!   `response.rs`, logged as a warning; internals never leak to clients
//! - With `force_https` the plain port only issues 301 redirects

pub mod response;
pub mod server;

pub use server::{bind_listener, ApiServer, AppState};
