// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Terminal rendering of a running job's tracker.
//!
//! ```text
//! loop every poll interval:
//!   job.is_finished()? --> final tick, stop
//!   tracker.progress() --> bar position (per mille)
//!   tracker.status()   --> bar message
//!   new warnings/fatals --> printed above the bar
//! ```
//!
//! A visible bar owns the terminal, so the console log layer mutes
//! [`crate::logging::PROGRESS_TARGET`] and the bar prints the messages that matter instead.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::job::Job;
use crate::core::progress::{ProgressTracker, Severity};

const BAR_LENGTH: u64 = 1000;

fn bar_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {percent:>3}% {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        })
        .clone()
}

/// Progress bar fed by polling a [`ProgressTracker`].
#[derive(Debug)]
pub struct JobDisplay {
    bar: ProgressBar,
    poll: Duration,
    seen: AtomicUsize,
}

impl JobDisplay {
    /// A visible bar, or a hidden one if `visible` is false.
    #[must_use]
    pub fn new(visible: bool, poll: Duration) -> Self {
        let bar = if visible {
            ProgressBar::new(BAR_LENGTH).with_style(bar_style())
        } else {
            ProgressBar::hidden()
        };
        Self {
            bar,
            poll,
            seen: AtomicUsize::new(0),
        }
    }

    /// Copies the tracker's state onto the bar.
    pub fn tick(&self, tracker: &ProgressTracker) {
        self.print_new_messages(tracker);

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            clippy::cast_sign_loss
        )]
        let position = (tracker.progress() * BAR_LENGTH as f32).round() as u64;
        self.bar.set_position(position.min(BAR_LENGTH));

        let fatal = tracker.fatal_count();
        if fatal == 0 {
            self.bar.set_message(tracker.status());
        } else {
            self.bar
                .set_message(format!("{} ({fatal} fatal)", tracker.status()));
        }
    }

    /// Polls `job` until it finishes, ticking the bar each interval.
    pub async fn watch(&self, job: &Job, tracker: &ProgressTracker) {
        while !job.is_finished() {
            self.tick(tracker);
            tokio::time::sleep(self.poll).await;
        }
        self.tick(tracker);
    }

    /// Prints warnings and fatals recorded since the last tick. Returns how
    /// many were printed.
    pub fn print_new_messages(&self, tracker: &ProgressTracker) -> usize {
        let seen = self.seen.load(Ordering::Relaxed);
        let fresh = tracker.messages_since(seen);
        self.seen.store(seen + fresh.len(), Ordering::Relaxed);

        let mut printed = 0;
        for message in fresh.iter().filter(|m| m.severity() >= Severity::Warning) {
            self.bar
                .println(format!("{}: {}", message.severity(), message.text()));
            printed += 1;
        }
        printed
    }

    /// Removes the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
