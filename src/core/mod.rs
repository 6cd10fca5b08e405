//! Core types for chartpin.
//!
//! This module hosts the foundation the rest of the codebase builds on: the
//! strongly-typed error enumeration and the user-facing error reporting
//! machinery.
//!
//! # Error Management
//!
//! chartpin separates error handling into two layers:
//! - **Strongly-typed errors** ([`ChartpinError`]) for precise handling in code,
//!   e.g. distinguishing a missing branch from a transport failure
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable suggestions
//!   printed by the binary when a run fails
//!
//! Every fallible operation returns a [`Result`]; errors are either matched on
//! where the variant matters (prompt loops, per-chart overrides) or propagated
//! to `main` and rendered via [`user_friendly_error`].

pub mod error;

pub use error::{ChartpinError, ErrorContext, create_error_context, user_friendly_error};

/// Convenient Result alias used by modules that only fail with [`ChartpinError`].
pub type Result<T> = std::result::Result<T, ChartpinError>;
