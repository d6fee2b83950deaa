//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all handler)
//!     → boundary.rs (unhandled failures → 500 envelope)
//!     → [auth layer validates tokens]
//!     → [routing layer resolves the route]
//!     → forward.rs → request.rs (buffer body, build outbound request)
//!     → client.rs (shared pooled client)
//!     → response.rs (status, headers, streamed body)
//!     → Send to client
//! ```

pub mod boundary;
pub mod client;
pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{BufferedBody, ForwardRequest};
pub use server::{AppState, GatewayServer, ServerError};
