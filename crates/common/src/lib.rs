//! Shared error plumbing for the kartina crates.
//!
//! Crates that want `.context()` / `.with_context()` on their own error type
//! implement [`FromMessage`] and invoke [`impl_context!`] in their error
//! module.

pub mod error;

pub use error::FromMessage;
