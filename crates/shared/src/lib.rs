//! # s3-source-shared
//!
//! Shared error handling, secret redaction, and validation proofs for the
//! s3-source-spec workspace.
//!
//! This crate provides foundational types used by the other crates:
//!
//! - Error envelope and result types
//! - Secret wrappers that never print their value
//! - The `Validated<T>` proof wrapper
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - Public types support serialization

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod invariants;
pub mod redaction;
pub mod result;

pub use errors::{
    ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, REDACTED_VALUE,
};
pub use invariants::Validated;
pub use redaction::{REDACTED, SecretString, is_secret_key};
pub use result::Result;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
