//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Request headers (Authorization, lp-auth-token)
//!     → validator.rs (presence checks, bearer extraction)
//!     → crypto.rs (base64 → AES-128-CBC → UTF-8)
//!     → validator.rs (payload must be JSON)
//!     → AuthContext in request extensions, api-auth-key header set
//! ```
//!
//! # Security Constraints
//! - Key material ONLY from configuration / environment
//! - Never log tokens or key material
//! - Clients never learn why decryption failed

pub mod crypto;
pub mod validator;

pub use crypto::{CryptoError, TokenCipher, TokenSecrets};
pub use validator::{auth_middleware, AuthContext, AuthError, TokenValidator, API_AUTH_KEY, LP_AUTH_TOKEN};
