//! Progress indicators for long-running GitLab walks.
//!
//! Thin wrapper around [`indicatif`] that gives every chartpin operation the
//! same look and a single switch to turn progress off in CI and scripted
//! runs. Bars are used where the amount of work is known (one tick per chart
//! project), spinners where it is not (pagination of unknown depth).
//!
//! # Environment Variables
//!
//! - `CHARTPIN_NO_PROGRESS`: set to any value to disable all indicators
//!
//! # Examples
//!
//! ```rust
//! use chartpin_cli::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::new(12);
//! progress.set_prefix("🔖");
//! for _ in 0..12 {
//!     // fetch one project's tags
//!     progress.inc(1);
//! }
//! progress.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Progress indicators are disabled when the `CHARTPIN_NO_PROGRESS`
/// environment variable is set (to any value). The CLI sets it for
/// `--no-progress`; CI environments can export it directly.
fn is_progress_disabled() -> bool {
    std::env::var("CHARTPIN_NO_PROGRESS").is_ok()
}

/// A progress indicator that renders only in interactive runs.
///
/// When progress is disabled the wrapper holds a hidden bar, so call sites
/// never need to branch on the setting themselves.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Create a bar for an operation with `len` known steps.
    #[must_use]
    pub fn new(len: u64) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar
        };
        Self { inner: bar }
    }

    /// Create a spinner for an operation of unknown length.
    ///
    /// The spinner animates with Braille patterns every 100ms until it is
    /// finished or cleared.
    #[must_use]
    pub fn new_spinner() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self { inner: bar }
    }

    /// Set the message shown to the right of the indicator.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Set the bold prefix shown to the left of the indicator.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Advance the bar by `delta` steps.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Finish and leave a final message on screen.
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    /// Finish and remove the indicator from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    /// Whether this indicator is a hidden placeholder.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }
}

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap()
        .progress_chars("━╸━")
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{prefix:.bold} {spinner:.cyan} {msg}")
        .unwrap()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

/// Create a spinner that already shows a message.
#[must_use]
pub fn spinner_with_message(msg: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(msg);
    spinner
}
