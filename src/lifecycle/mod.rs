// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hot reload orchestration.
//!
//! ```text
//! Idle ─► CapturingState ─► Unloading ─► Rebuilding ─► Loading ─► Replaying ─► Idle
//!          capture_state     reverse       storage       ModuleLoader   apply_state
//!          (initialized)     order,        + ModulePool  │
//!                            leak check    (next gen)    │ fatal while loading
//!                                                        ▼
//!                                               unload new generation ─► Failed
//! ```
//!
//! Each step restarts the tracker's progress at 0 and names itself in the
//! status line. Failures before `Loading` are reported and the reload carries
//! on; a fatal message raised while loading abandons the reload and leaves
//! nothing loaded. `Failed` holds until the next reload.

pub mod context;
pub mod leak;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::job::Job;
use crate::core::progress::{ProgressSpan, ProgressTracker};
use crate::error::LoadError;
use crate::host::StatePayload;
use crate::loader::{LoadedModulePool, ModuleLoader};
use crate::module::Lifecycle;
use crate::pool::ModulePool;

pub use context::{HostContext, ReloadFlags};
pub use leak::{Leak, LeakTracker};

/// Where the orchestrator currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReloadPhase {
    #[default]
    Idle,
    CapturingState,
    Unloading,
    Rebuilding,
    Loading,
    Replaying,
    /// The last reload was abandoned; nothing is loaded.
    Failed,
}

impl ReloadPhase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CapturingState => "capturing state",
            Self::Unloading => "unloading",
            Self::Rebuilding => "rebuilding",
            Self::Loading => "loading",
            Self::Replaying => "replaying state",
            Self::Failed => "failed",
        }
    }

    const fn status(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::CapturingState => "Capturing reload state",
            Self::Unloading => "Unloading modules",
            Self::Rebuilding => "Reading module pool",
            Self::Loading => "Loading modules",
            Self::Replaying => "Replaying reload state",
            Self::Failed => "Reload failed",
        }
    }
}

impl fmt::Display for ReloadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State captured from one module of the outgoing generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadState {
    module: String,
    payload: Option<StatePayload>,
}

impl ReloadState {
    #[must_use]
    pub fn new(module: impl Into<String>, payload: Option<StatePayload>) -> Self {
        Self {
            module: module.into(),
            payload,
        }
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub const fn payload(&self) -> Option<&StatePayload> {
        self.payload.as_ref()
    }
}

/// How a reload ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The new generation is loaded; per-module failures may have been
    /// reported.
    Completed,
    /// Loading reported a fatal message; nothing is loaded.
    Aborted,
}

impl fmt::Display for ReloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

/// Summary of one reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    /// Generation the reload built.
    pub generation: u64,
    pub outcome: ReloadOutcome,
    /// Modules left loaded, in load order.
    pub load_order: Vec<String>,
    /// Modules whose state was captured with a payload.
    pub captured: Vec<String>,
    /// Modules that received their captured state.
    pub replayed: Vec<String>,
    /// Captured state with no taker in the new generation.
    pub discarded: Vec<String>,
    /// Modules with handles that outlived unloading.
    pub leaked: Vec<String>,
    /// Fatal messages reported during this reload.
    pub fatal_count: usize,
}

impl ReloadReport {
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self.outcome, ReloadOutcome::Aborted)
    }
}

impl fmt::Display for ReloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |names: &[String]| {
            if names.is_empty() {
                "-".to_string()
            } else {
                names.join(", ")
            }
        };
        writeln!(f, "generation {}: {}", self.generation, self.outcome)?;
        writeln!(f, "  load order: {}", list(&self.load_order))?;
        writeln!(f, "  captured:   {}", list(&self.captured))?;
        writeln!(f, "  replayed:   {}", list(&self.replayed))?;
        writeln!(f, "  discarded:  {}", list(&self.discarded))?;
        writeln!(f, "  leaked:     {}", list(&self.leaked))?;
        write!(f, "  fatal:      {}", self.fatal_count)
    }
}

/// Owns the loaded generation and drives reloads.
#[derive(Debug)]
pub struct LifecycleOrchestrator {
    ctx: Arc<HostContext>,
    loaded: LoadedModulePool,
    generation: u64,
    phase: ReloadPhase,
    last_report: Option<ReloadReport>,
}

impl LifecycleOrchestrator {
    #[must_use]
    pub fn new(ctx: Arc<HostContext>) -> Self {
        Self {
            ctx,
            loaded: LoadedModulePool::default(),
            generation: 0,
            phase: ReloadPhase::Idle,
            last_report: None,
        }
    }

    #[must_use]
    pub const fn context(&self) -> &Arc<HostContext> {
        &self.ctx
    }

    /// The current generation's modules, in load order.
    #[must_use]
    pub const fn loaded(&self) -> &LoadedModulePool {
        &self.loaded
    }

    #[must_use]
    pub const fn phase(&self) -> ReloadPhase {
        self.phase
    }

    /// The most recently started generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn last_report(&self) -> Option<&ReloadReport> {
        self.last_report.as_ref()
    }

    /// First load; a reload with nothing to capture or unload.
    pub fn load_initial(&mut self, progress: &ProgressTracker) -> ReloadReport {
        if !self.loaded.is_empty() {
            tracing::debug!(
                loaded = self.loaded.len(),
                "Modules already loaded, performing a full reload"
            );
        }
        self.reload(progress)
    }

    /// Captures, unloads, rebuilds, loads and replays.
    pub fn reload(&mut self, progress: &ProgressTracker) -> ReloadReport {
        let generation = self.generation + 1;
        let flags = self.ctx.flags();
        let start_fatals = progress.fatal_count();

        tracing::info!(generation, loaded = self.loaded.len(), "Reload started");

        self.enter(progress, ReloadPhase::CapturingState);
        let states = if flags.contains(ReloadFlags::CAPTURE_STATE) {
            self.capture(progress.span())
        } else {
            progress.set_progress(1.0);
            Vec::new()
        };
        let captured: Vec<String> = states
            .iter()
            .filter(|s| s.payload.is_some())
            .map(|s| s.module.clone())
            .collect();

        self.enter(progress, ReloadPhase::Unloading);
        let leaks = self.unload_current(progress.span());
        let leaked = if flags.contains(ReloadFlags::LEAK_CHECK) {
            self.check_leaks(progress.span(), &leaks)
        } else {
            Vec::new()
        };
        drop(leaks);

        self.enter(progress, ReloadPhase::Rebuilding);
        self.generation = generation;
        let pool = self.rebuild(progress.span(), generation);

        self.enter(progress, ReloadPhase::Loading);
        let watermark = progress.fatal_count();
        let loaded = ModuleLoader::new(Arc::clone(self.ctx.host()))
            .with_patchers(self.ctx.patchers().iter().cloned())
            .load(progress.span(), pool);
        let load_fatals = progress.fatal_count().saturating_sub(watermark);
        self.loaded = loaded;

        if load_fatals > 0 {
            progress.fatal(
                LoadError::Aborted {
                    generation,
                    fatal_count: load_fatals,
                }
                .to_string(),
            );
            tracing::warn!(
                generation,
                abandoned = self.loaded.len(),
                "Unloading partial generation"
            );
            drop(self.unload_current(progress.span()));
            self.phase = ReloadPhase::Failed;
            progress.set_status(ReloadPhase::Failed.status());

            return self.finish(ReloadReport {
                generation,
                outcome: ReloadOutcome::Aborted,
                load_order: Vec::new(),
                captured,
                replayed: Vec::new(),
                discarded: states
                    .into_iter()
                    .filter(|s| s.payload.is_some())
                    .map(|s| s.module)
                    .collect(),
                leaked,
                fatal_count: progress.fatal_count().saturating_sub(start_fatals),
            });
        }

        self.enter(progress, ReloadPhase::Replaying);
        let (replayed, discarded) = if flags.contains(ReloadFlags::REPLAY_STATE) {
            self.replay(progress.span(), states)
        } else {
            progress.set_progress(1.0);
            (Vec::new(), captured.clone())
        };

        self.enter(progress, ReloadPhase::Idle);
        progress.set_progress(1.0);

        self.finish(ReloadReport {
            generation,
            outcome: ReloadOutcome::Completed,
            load_order: self.loaded.names(),
            captured,
            replayed,
            discarded,
            leaked,
            fatal_count: progress.fatal_count().saturating_sub(start_fatals),
        })
    }

    /// Unloads every module without capturing state. Returns the modules
    /// whose handles outlived unloading.
    pub fn unload_all(&mut self, progress: &ProgressTracker) -> Vec<String> {
        self.enter(progress, ReloadPhase::Unloading);
        let leaks = self.unload_current(progress.span());
        let leaked = if self.ctx.flags().contains(ReloadFlags::LEAK_CHECK) {
            self.check_leaks(progress.span(), &leaks)
        } else {
            Vec::new()
        };
        self.enter(progress, ReloadPhase::Idle);
        progress.set_progress(1.0);
        leaked
    }

    fn enter(&mut self, progress: &ProgressTracker, phase: ReloadPhase) {
        tracing::debug!(phase = %phase, generation = self.generation, "Entering reload phase");
        self.phase = phase;
        progress.set_status(phase.status());
        progress.set_progress(0.0);
    }

    fn finish(&mut self, report: ReloadReport) -> ReloadReport {
        tracing::info!(
            generation = report.generation,
            outcome = %report.outcome,
            loaded = report.load_order.len(),
            replayed = report.replayed.len(),
            fatal = report.fatal_count,
            "Reload finished"
        );
        self.last_report = Some(report.clone());
        report
    }

    fn capture(&self, progress: ProgressSpan<'_>) -> Vec<ReloadState> {
        let total = self.loaded.len();
        let mut states = Vec::with_capacity(total);

        progress.set_ratio(0, total);
        for (done, module) in self.loaded.iter().enumerate() {
            if module.is_initialized() {
                match module.descriptor().capture_state() {
                    Ok(payload) => states.push(ReloadState::new(module.name(), payload)),
                    Err(e) => progress.fatal(e.to_string()),
                }
            }
            progress.set_ratio(done + 1, total);
        }

        states
    }

    /// Unloads the current generation in reverse load order.
    fn unload_current(&mut self, progress: ProgressSpan<'_>) -> LeakTracker {
        let host = Arc::clone(self.ctx.host());
        let loaded = std::mem::replace(&mut self.loaded, LoadedModulePool::empty(self.generation));
        let modules = loaded.into_modules();
        let total = modules.len();
        let mut leaks = LeakTracker::new();

        progress.set_ratio(0, total);
        for (done, mut module) in modules.into_iter().rev().enumerate() {
            let name = module.name().to_string();
            if let Some(instance) = module.descriptor().instance() {
                leaks.track_instance(&name, instance);
            }
            leaks.track_unit(&name, module.unit());

            if let Err(e) = module.descriptor_mut().unload(host.as_ref()) {
                progress.fatal(e.to_string());
            }
            host.unload_unit(module.unit());
            drop(module);

            tracing::debug!(module = %name, "Module unloaded");
            progress.set_ratio(done + 1, total);
        }

        leaks
    }

    fn check_leaks(&self, progress: ProgressSpan<'_>, leaks: &LeakTracker) -> Vec<String> {
        self.ctx.host().collect_garbage();

        let mut leaked: Vec<String> = Vec::new();
        for leak in leaks.survivors() {
            progress.warning(leak.to_string());
            if !leaked.iter().any(|m| m == leak.module()) {
                leaked.push(leak.module().to_string());
            }
        }
        progress.set(1.0);
        leaked
    }

    fn rebuild(&self, progress: ProgressSpan<'_>, generation: u64) -> ModulePool {
        let storage = self.ctx.storage();
        let bundles = match storage.bundles() {
            Ok(bundles) => bundles,
            Err(e) => {
                progress.fatal(format!(
                    "failed to read bundles from {}: {e:#}",
                    storage.describe()
                ));
                Vec::new()
            }
        };
        ModulePool::read(progress, &bundles, self.ctx.pool_options(), generation)
    }

    /// Returns `(replayed, discarded)` module names.
    fn replay(
        &self,
        progress: ProgressSpan<'_>,
        states: Vec<ReloadState>,
    ) -> (Vec<String>, Vec<String>) {
        let total = states.len();
        let mut replayed = Vec::new();
        let mut discarded = Vec::new();

        progress.set_ratio(0, total);
        for (done, state) in states.into_iter().enumerate() {
            let ReloadState { module, payload } = state;
            let Some(payload) = payload else {
                progress.set_ratio(done + 1, total);
                continue;
            };

            let target = self
                .loaded
                .get(&module)
                .filter(|m| m.is_initialized() && m.descriptor().is_reload_aware());
            match target {
                Some(target) => match target.descriptor().apply_state(payload) {
                    Ok(()) => replayed.push(module),
                    Err(e) => progress.fatal(e.to_string()),
                },
                None => {
                    tracing::debug!(module = %module, "Discarding reload state without a taker");
                    discarded.push(module);
                }
            }
            progress.set_ratio(done + 1, total);
        }

        (replayed, discarded)
    }
}

/// Runs one reload of `orchestrator` on a background [`Job`].
///
/// The job fails with [`LoadError::Aborted`] if the reload is abandoned; the
/// full report stays available through
/// [`LifecycleOrchestrator::last_report`].
pub fn spawn_reload(
    orchestrator: &Arc<Mutex<LifecycleOrchestrator>>,
    progress: &Arc<ProgressTracker>,
) -> Job {
    let orchestrator = Arc::clone(orchestrator);
    let progress = Arc::clone(progress);
    Job::start(move || {
        let report = orchestrator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reload(&progress);
        match report.outcome {
            ReloadOutcome::Completed => Ok(()),
            ReloadOutcome::Aborted => Err(LoadError::Aborted {
                generation: report.generation,
                fatal_count: report.fatal_count,
            }
            .into()),
        }
    })
}
