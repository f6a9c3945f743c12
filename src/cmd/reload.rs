// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `load` and `reload`: drive the lifecycle against the configured mods root.
//!
//! ```text
//! ReloadSession::from_config
//!   cycle()  --> spawn_reload (Job) --> JobDisplay::watch --> ReloadReport
//!   ...      (Ctrl+C stops before the next cycle)
//!   shutdown() --> unload_all --> leaked modules
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, bail};
use tokio_util::sync::CancellationToken;

use crate::cli::reload::{LoadArgs, ReloadArgs};
use crate::cmd::display::JobDisplay;
use crate::config::Config;
use crate::core::progress::ProgressTracker;
use crate::error::Result;
use crate::host::demo::demo_host;
use crate::lifecycle::context::HostContext;
use crate::lifecycle::{LifecycleOrchestrator, ReloadReport, spawn_reload};

/// An orchestrator bound to one configuration and its tracker.
#[derive(Debug)]
pub struct ReloadSession {
    orchestrator: Arc<Mutex<LifecycleOrchestrator>>,
    progress: Arc<ProgressTracker>,
    poll: Duration,
}

impl ReloadSession {
    /// Builds a session over the demo host.
    ///
    /// # Errors
    ///
    /// Returns an error if `paths.mods` is unset or a pool glob is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let ctx = HostContext::from_config(config, Arc::new(demo_host()))?;
        Ok(Self {
            orchestrator: Arc::new(Mutex::new(LifecycleOrchestrator::new(Arc::new(ctx)))),
            progress: Arc::new(ProgressTracker::new()),
            poll: Duration::from_millis(config.reload.poll_interval_ms.max(1)),
        })
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Names of the currently loaded modules, in load order.
    #[must_use]
    pub fn loaded(&self) -> Vec<String> {
        self.lock().loaded().names()
    }

    /// Runs one reload in the background and waits for it.
    ///
    /// The tracker is reset first, so its messages belong to this cycle only.
    ///
    /// # Errors
    ///
    /// Returns an error if the reload produced no report.
    pub async fn cycle(&self, display: &JobDisplay) -> Result<ReloadReport> {
        self.progress.reset();
        let job = spawn_reload(&self.orchestrator, &self.progress);
        display.watch(&job, &self.progress).await;

        if let Some(e) = job.error() {
            tracing::debug!(error = %e, "Reload job failed");
        }
        self.lock()
            .last_report()
            .cloned()
            .ok_or_else(|| anyhow!("reload finished without a report"))
    }

    /// Unloads everything; returns the modules that leaked.
    pub fn shutdown(&self) -> Vec<String> {
        self.progress.reset();
        self.lock().unload_all(&self.progress)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LifecycleOrchestrator> {
        self.orchestrator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run the load command: one generation, then unload.
///
/// # Errors
///
/// Returns an error if the session cannot be built or the load was aborted.
pub async fn run_load_command(args: &LoadArgs, config: &Config) -> Result<()> {
    let session = ReloadSession::from_config(config)?;
    let display = JobDisplay::new(!args.no_progress, session.poll);
    let report = session.cycle(&display).await;
    display.finish();
    let report = report?;
    print_report(&session, &report);

    finish_session(&session);
    if report.is_aborted() {
        bail!("load of generation {} was aborted", report.generation);
    }
    Ok(())
}

/// Run the reload command: an initial load followed by `args.cycles` reloads.
///
/// # Errors
///
/// Returns an error if the session cannot be built or any cycle was aborted.
pub async fn run_reload_command(args: &ReloadArgs, config: &Config) -> Result<()> {
    let session = ReloadSession::from_config(config)?;

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, stopping after the current reload...");
            watcher.cancel();
        }
    });

    let mut aborted = Vec::new();
    for cycle in 0..=args.cycles {
        if cancel.is_cancelled() {
            tracing::info!(completed = cycle, "Reload cycles interrupted");
            break;
        }
        let display = JobDisplay::new(!args.no_progress, session.poll);
        let report = session.cycle(&display).await;
        display.finish();
        let report = report?;
        print_report(&session, &report);
        if report.is_aborted() {
            aborted.push(report.generation);
        }
    }

    finish_session(&session);
    if !aborted.is_empty() {
        let generations: Vec<String> = aborted.iter().map(ToString::to_string).collect();
        bail!("aborted generation(s): {}", generations.join(", "));
    }
    Ok(())
}

fn print_report(session: &ReloadSession, report: &ReloadReport) {
    println!("{report}");
    if let Some(fatal) = session.progress().last_fatal() {
        println!("  last fatal: {}", fatal.text());
    }
}

fn finish_session(session: &ReloadSession) {
    let leaked = session.shutdown();
    if leaked.is_empty() {
        println!("unloaded all modules");
    } else {
        println!("unloaded all modules, leaked: {}", leaked.join(", "));
    }
}
