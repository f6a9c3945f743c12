// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fire-and-forget background job with lock-free completion polling.
//!
//! ```text
//! Job::start(work)
//!   tokio runtime?  --> spawn_blocking(work)   (pool refuses --> work() inline)
//!   else thread?    --> std::thread::spawn(work)
//!   else            --> work() inline
//!        |
//!        v
//!   worker: error.set(e)  then  finished.store(true, Release)
//!   caller: is_finished() (Acquire) --> error()
//! ```
//!
//! Each field is written exactly once by the worker and only polled by the
//! caller, so no lock is needed. A panic inside `work` is caught and surfaces
//! through [`Job::error`] like any other failure.
//!
//! # Example
//! ```no_run
//! use hotmod::core::job::Job;
//!
//! let job = Job::start(|| {
//!     tracing::info!("working off the caller's thread");
//!     Ok(())
//! });
//!
//! while !job.is_finished() {
//!     std::thread::sleep(std::time::Duration::from_millis(16));
//! }
//! assert!(job.error().is_none());
//! ```

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::{JobError, Result};

/// Shared completion state between the worker and the caller.
#[derive(Debug, Default)]
struct JobState {
    finished: AtomicBool,
    /// Set when the blocking pool dropped the work and it ran on the dropping thread.
    inline: AtomicBool,
    error: OnceLock<anyhow::Error>,
}

impl JobState {
    fn complete(&self, result: Result<()>) {
        if let Err(e) = result {
            // Only this worker ever sets the error, so the cell is empty here.
            let _ = self.error.set(e);
        }
        self.finished.store(true, Ordering::Release);
    }
}

/// How a job ended up being scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduling {
    /// Ran on the tokio blocking pool.
    BlockingPool,
    /// Ran on a dedicated OS thread.
    Thread,
    /// No worker could accept the work; ran on the caller's thread.
    Inline,
}

/// Handle to a background job.
///
/// Cloning the handle shares the same completion state.
#[derive(Debug, Clone)]
pub struct Job {
    state: Arc<JobState>,
    scheduling: Scheduling,
}

impl Job {
    /// Schedules `work` on a background worker and returns immediately.
    ///
    /// Uses the tokio blocking pool when called inside a runtime, otherwise
    /// a named OS thread. If the pool refuses the work or the thread cannot
    /// be spawned, `work` runs synchronously before `start` returns, so work
    /// is never dropped.
    pub fn start<F>(work: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let state = Arc::new(JobState::default());

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let parked = Parked {
                work: Some(work),
                state: Arc::clone(&state),
            };
            drop(handle.spawn_blocking(move || parked.run()));
            // A pool that is shutting down drops the closure before returning.
            let scheduling = if state.inline.load(Ordering::Acquire) {
                Scheduling::Inline
            } else {
                Scheduling::BlockingPool
            };
            return Self { state, scheduling };
        }

        // The closure is parked in a slot so it can be recovered if the
        // thread never starts.
        let slot = Arc::new(std::sync::Mutex::new(Some(work)));
        let worker_slot = Arc::clone(&slot);
        let worker_state = Arc::clone(&state);
        let spawned = std::thread::Builder::new()
            .name("hotmod-job".to_string())
            .spawn(move || {
                let work = worker_slot
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .take();
                if let Some(work) = work {
                    run_guarded(&worker_state, work);
                }
            });

        match spawned {
            Ok(_) => Self {
                state,
                scheduling: Scheduling::Thread,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to spawn job thread, running inline");
                let work = slot
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .take();
                if let Some(work) = work {
                    run_guarded(&state, work);
                }
                Self {
                    state,
                    scheduling: Scheduling::Inline,
                }
            }
        }
    }

    /// Runs `work` on the caller's thread and returns an already finished job.
    pub fn run_inline<F>(work: F) -> Self
    where
        F: FnOnce() -> Result<()>,
    {
        let state = Arc::new(JobState::default());
        run_guarded(&state, work);
        Self {
            state,
            scheduling: Scheduling::Inline,
        }
    }

    /// Returns whether the work has completed (successfully or not).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    /// Returns the error the work ended with.
    ///
    /// Always `None` until [`Job::is_finished`] returns `true`.
    #[must_use]
    pub fn error(&self) -> Option<&anyhow::Error> {
        if self.is_finished() {
            self.state.error.get()
        } else {
            None
        }
    }

    /// Returns how the work was scheduled.
    #[must_use]
    pub const fn scheduling(&self) -> Scheduling {
        self.scheduling
    }
}

/// Work handed to the blocking pool. Runs on drop if the pool never ran it.
struct Parked<F>
where
    F: FnOnce() -> Result<()>,
{
    work: Option<F>,
    state: Arc<JobState>,
}

impl<F> Parked<F>
where
    F: FnOnce() -> Result<()>,
{
    fn run(mut self) {
        if let Some(work) = self.work.take() {
            run_guarded(&self.state, work);
        }
    }
}

impl<F> Drop for Parked<F>
where
    F: FnOnce() -> Result<()>,
{
    fn drop(&mut self) {
        if let Some(work) = self.work.take() {
            tracing::warn!("Blocking pool dropped job, running inline");
            self.state.inline.store(true, Ordering::Release);
            run_guarded(&self.state, work);
        }
    }
}

fn run_guarded<F>(state: &JobState, work: F)
where
    F: FnOnce() -> Result<()>,
{
    let result = catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::error!(panic = %message, "Job panicked");
        Err(JobError::Panicked(message).into())
    });
    state.complete(result);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
