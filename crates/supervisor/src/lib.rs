//! Detached-bot process supervision.
//!
//! Finds running `kartina run` instances by their command line, stops them
//! with a polite-then-forceful signal pair, starts a detached instance with
//! its output appended to a log file, and reports per-instance status. The
//! commands run against the [`ProcessInspector`] seam so they can be tested
//! without touching real processes.

pub mod commands;
pub mod error;
pub mod inspector;

pub use {
    commands::{find, start, status, stop},
    error::{Error, Result},
    inspector::{ProcessInspector, ProcessRecord, SysinfoInspector},
};
