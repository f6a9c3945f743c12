// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Progress and message sink shared between a worker and its observer.
//!
//! ```text
//! worker                         caller (CLI / UI)
//!   message(sev, text) ---+      messages()  (snapshot under lock)
//!     Fatal => failed=1   |      is_failed() (atomic)
//!   set_progress(f)  -----+----> progress()  (atomic f32 bits)
//!   set_status(s)                status()
//!
//! ProgressSpan: local 0..1 --> [start, start + width) of the overall range
//!   loader: patch [0, 1/3)  load [1/3, 2/3)  init [2/3, 1]
//! ```
//!
//! The message log is append-only. `Failed` is a latch: once a fatal
//! message has been recorded it stays set until [`ProgressTracker::reset`]
//! starts a new operation.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::logging::PROGRESS_TARGET;

/// Severity of a tracker message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    /// Latches the tracker into the failed state.
    Fatal,
}

impl Severity {
    /// Short label for display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    severity: Severity,
    text: String,
}

impl Message {
    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the message text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether this message is fatal.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.text)
    }
}

/// Thread-safe progress and message sink.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    progress: AtomicU32,
    failed: AtomicBool,
    fatal_count: AtomicUsize,
    messages: Mutex<Vec<Message>>,
    status: Mutex<String>,
}

impl ProgressTracker {
    /// Creates an empty tracker at progress 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, mirroring it to `tracing`.
    ///
    /// A [`Severity::Fatal`] message latches the failed state.
    pub fn message(&self, severity: Severity, text: impl Into<String>) {
        let text = text.into();
        match severity {
            Severity::Debug => tracing::debug!(target: PROGRESS_TARGET, "{text}"),
            Severity::Info => tracing::info!(target: PROGRESS_TARGET, "{text}"),
            Severity::Warning => tracing::warn!(target: PROGRESS_TARGET, "{text}"),
            Severity::Fatal => tracing::error!(target: PROGRESS_TARGET, "{text}"),
        }

        self.lock_messages().push(Message { severity, text });

        if severity == Severity::Fatal {
            self.fatal_count.fetch_add(1, Ordering::AcqRel);
            self.failed.store(true, Ordering::Release);
        }
    }

    /// Shorthand for a debug message.
    pub fn debug(&self, text: impl Into<String>) {
        self.message(Severity::Debug, text);
    }

    /// Shorthand for an info message.
    pub fn info(&self, text: impl Into<String>) {
        self.message(Severity::Info, text);
    }

    /// Shorthand for a warning message.
    pub fn warning(&self, text: impl Into<String>) {
        self.message(Severity::Warning, text);
    }

    /// Shorthand for a fatal message.
    pub fn fatal(&self, text: impl Into<String>) {
        self.message(Severity::Fatal, text);
    }

    /// Sets the overall progress fraction, clamped to `[0, 1]`.
    pub fn set_progress(&self, fraction: f32) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.progress.store(fraction.to_bits(), Ordering::Release);
    }

    /// Returns the overall progress fraction.
    #[must_use]
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.progress.load(Ordering::Acquire))
    }

    /// Sets the status line shown next to the progress.
    pub fn set_status(&self, status: impl Into<String>) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status.into();
    }

    /// Returns the current status line.
    #[must_use]
    pub fn status(&self) -> String {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns whether a fatal message has been recorded.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Returns how many fatal messages have been recorded.
    #[must_use]
    pub fn fatal_count(&self) -> usize {
        self.fatal_count.load(Ordering::Acquire)
    }

    /// Returns a snapshot of the message log.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.lock_messages().clone()
    }

    /// Returns messages appended after the first `skip` entries.
    ///
    /// Lets a polling observer print only what is new since its last tick.
    #[must_use]
    pub fn messages_since(&self, skip: usize) -> Vec<Message> {
        self.lock_messages().iter().skip(skip).cloned().collect()
    }

    /// Returns the most recent fatal message, if any.
    #[must_use]
    pub fn last_fatal(&self) -> Option<Message> {
        self.lock_messages()
            .iter()
            .rev()
            .find(|m| m.is_fatal())
            .cloned()
    }

    /// Clears all state for a new operation.
    pub fn reset(&self) {
        self.lock_messages().clear();
        self.set_status(String::new());
        self.fatal_count.store(0, Ordering::Release);
        self.failed.store(false, Ordering::Release);
        self.set_progress(0.0);
    }

    /// Returns a span covering the whole `[0, 1]` range.
    #[must_use]
    pub const fn span(&self) -> ProgressSpan<'_> {
        ProgressSpan {
            tracker: self,
            start: 0.0,
            width: 1.0,
        }
    }

    fn lock_messages(&self) -> std::sync::MutexGuard<'_, Vec<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A sub-range of a tracker's progress.
///
/// Components report a local fraction in `[0, 1]`; the span scales it into
/// its slice of the overall range. Messages pass straight through.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSpan<'a> {
    tracker: &'a ProgressTracker,
    start: f32,
    width: f32,
}

impl<'a> ProgressSpan<'a> {
    /// Returns the underlying tracker.
    #[must_use]
    pub const fn tracker(&self) -> &'a ProgressTracker {
        self.tracker
    }

    /// Reports a local fraction of this span.
    pub fn set(&self, local: f32) {
        let local = if local.is_nan() {
            0.0
        } else {
            local.clamp(0.0, 1.0)
        };
        self.tracker.set_progress(local.mul_add(self.width, self.start));
    }

    /// Reports `done` out of `total` steps; an empty total counts as done.
    pub fn set_ratio(&self, done: usize, total: usize) {
        if total == 0 {
            self.set(1.0);
        } else {
            #[allow(clippy::cast_precision_loss)]
            self.set(done as f32 / total as f32);
        }
    }

    /// Splits off the `index`-th of `count` equal sub-spans.
    #[must_use]
    pub fn part(&self, index: usize, count: usize) -> Self {
        let count = count.max(1);
        #[allow(clippy::cast_precision_loss)]
        let step = self.width / count as f32;
        #[allow(clippy::cast_precision_loss)]
        let start = (index.min(count - 1) as f32).mul_add(step, self.start);
        Self {
            tracker: self.tracker,
            start,
            width: step,
        }
    }

    /// Forwards a message to the tracker.
    pub fn message(&self, severity: Severity, text: impl Into<String>) {
        self.tracker.message(severity, text);
    }

    /// Shorthand for a debug message.
    pub fn debug(&self, text: impl Into<String>) {
        self.tracker.debug(text);
    }

    /// Shorthand for an info message.
    pub fn info(&self, text: impl Into<String>) {
        self.tracker.info(text);
    }

    /// Shorthand for a warning message.
    pub fn warning(&self, text: impl Into<String>) {
        self.tracker.warning(text);
    }

    /// Shorthand for a fatal message.
    pub fn fatal(&self, text: impl Into<String>) {
        self.tracker.fatal(text);
    }
}
