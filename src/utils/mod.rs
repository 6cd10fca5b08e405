//! Shared utilities: file helpers and progress indicators.
//!
//! # Modules
//!
//! - [`fs`] - File operations with atomic writes
//! - [`progress`] - Progress bars and spinners for long-running operations

pub mod fs;
pub mod progress;

pub use fs::{ensure_dir, read_text_file, remove_file_if_present, write_text_file};
pub use progress::{ProgressBar, spinner_with_message};
