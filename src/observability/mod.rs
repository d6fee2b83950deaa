//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (local structured log events)
//!     → metrics.rs (counters, histograms)
//!     → remote.rs (records for the external collector)
//!
//! Consumers:
//!     → stdout (tracing fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//!     → Log collector (POST /add-log, best effort)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every span
//! - Metrics are cheap (atomic increments)
//! - Remote delivery never sits on the request path

pub mod logging;
pub mod metrics;
pub mod remote;

pub use remote::{LogLevel, LogRecord, LogShipper, RemoteLogSink};
