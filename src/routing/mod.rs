//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, `version` header)
//!     → router.rs (group selection, ordered scan)
//!     → matcher.rs (case-insensitive prefix test)
//!     → Return: matched RouteEntry or NoMatch
//!
//! Route Table Construction (at startup):
//!     routes.json
//!     → table.rs (RouteTableSource → RouteTable)
//!     → Freeze as immutable table shared via Arc
//! ```
//!
//! # Design Decisions
//! - Table built once at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by declaration, never by specificity)

pub mod matcher;
pub mod router;
pub mod table;

pub use router::resolve;
pub use table::{RouteEntry, RouteGroup, RouteTable, RouteTableSource};
