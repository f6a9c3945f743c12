// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Three-phase module loader.
//!
//! ```text
//! ModulePool (consumed)
//!     │
//!     ▼  patch   [0, 1/3)   every hook over every binary; failures restore bytes
//!     ▼  load    [1/3, 2/3) Kahn order; references -> <name>@g<generation>
//!     │                     cycle => fatal, nothing loaded
//!     │                     host error => fatal, dependents skipped
//!     ▼  init    [2/3, 1]   descriptor.initialize in load order
//! LoadedModulePool (load order)
//! ```
//!
//! The loader never fails as a whole. Every problem becomes a fatal tracker
//! message and the modules that made it through are returned.

pub mod graph;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::progress::ProgressSpan;
use crate::error::LoadError;
use crate::host::{CodeUnit, HostRuntime, PreparedImage};
use crate::module::{Lifecycle, ModuleDescriptor};
use crate::patch::{PatchTarget, Patcher};
use crate::pool::{ModulePool, RecordSummary};
use graph::DependencyGraph;

/// A module that made it into the host.
#[derive(Debug)]
pub struct LoadedModule {
    summary: RecordSummary,
    unit: Arc<CodeUnit>,
    descriptor: ModuleDescriptor,
    initialized: bool,
}

impl LoadedModule {
    #[must_use]
    pub fn name(&self) -> &str {
        self.summary.name()
    }

    /// The pool record this module was loaded from.
    #[must_use]
    pub const fn summary(&self) -> &RecordSummary {
        &self.summary
    }

    #[must_use]
    pub const fn unit(&self) -> &Arc<CodeUnit> {
        &self.unit
    }

    #[must_use]
    pub const fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    pub(crate) const fn descriptor_mut(&mut self) -> &mut ModuleDescriptor {
        &mut self.descriptor
    }

    /// Whether `initialize` succeeded.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Loaded modules of one generation, in load order.
#[derive(Debug, Default)]
pub struct LoadedModulePool {
    generation: u64,
    modules: Vec<LoadedModule>,
}

impl LoadedModulePool {
    /// A generation in which nothing loaded.
    #[must_use]
    pub const fn empty(generation: u64) -> Self {
        Self {
            generation,
            modules: Vec::new(),
        }
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module names in load order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name().to_string()).collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LoadedModule> {
        self.modules.iter().find(|m| m.name() == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Modules in load order.
    pub fn iter(&self) -> std::slice::Iter<'_, LoadedModule> {
        self.modules.iter()
    }

    /// Consumes the pool, yielding modules in load order.
    #[must_use]
    pub fn into_modules(self) -> Vec<LoadedModule> {
        self.modules
    }
}

impl<'a> IntoIterator for &'a LoadedModulePool {
    type Item = &'a LoadedModule;
    type IntoIter = std::slice::Iter<'a, LoadedModule>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A pool record on its way through the phases.
struct Staged {
    summary: RecordSummary,
    path: PathBuf,
    bytes: Vec<u8>,
    references: Vec<String>,
    descriptor: ModuleDescriptor,
}

/// Patches, loads and initializes a module pool.
pub struct ModuleLoader {
    host: Arc<dyn HostRuntime>,
    patchers: Vec<Arc<dyn Patcher>>,
}

impl ModuleLoader {
    #[must_use]
    pub fn new(host: Arc<dyn HostRuntime>) -> Self {
        Self {
            host,
            patchers: Vec::new(),
        }
    }

    /// Installs patch hooks, run in the given order.
    #[must_use]
    pub fn with_patchers(mut self, patchers: impl IntoIterator<Item = Arc<dyn Patcher>>) -> Self {
        self.patchers.extend(patchers);
        self
    }

    /// Runs the patch, load and init phases over `pool`.
    #[must_use]
    pub fn load(&self, progress: ProgressSpan<'_>, pool: ModulePool) -> LoadedModulePool {
        let generation = pool.generation();
        let mut staged: Vec<Staged> = pool
            .into_records()
            .into_iter()
            .map(|record| {
                let (summary, path, bytes, image, descriptor) = record.into_parts();
                Staged {
                    summary,
                    path,
                    bytes,
                    references: image.references().to_vec(),
                    descriptor,
                }
            })
            .collect();

        tracing::info!(modules = staged.len(), generation, "Loading module pool");

        progress.tracker().set_status("Patching modules");
        self.patch_phase(progress.part(0, 3), &mut staged);

        progress.tracker().set_status("Loading modules");
        let units = self.load_phase(progress.part(1, 3), &mut staged, generation);

        progress.tracker().set_status("Initializing modules");
        let modules = self.init_phase(progress.part(2, 3), staged, units);

        tracing::info!(loaded = modules.len(), generation, "Module pool loaded");
        LoadedModulePool {
            generation,
            modules,
        }
    }

    fn patch_phase(&self, progress: ProgressSpan<'_>, staged: &mut [Staged]) {
        if self.patchers.is_empty() || staged.is_empty() {
            progress.set(1.0);
            return;
        }

        let mut targets: Vec<PatchTarget> = staged
            .iter_mut()
            .map(|s| {
                PatchTarget::new(
                    s.summary.name(),
                    s.path.clone(),
                    std::mem::take(&mut s.bytes),
                )
            })
            .collect();

        for (done, hook) in self.patchers.iter().enumerate() {
            let before: Vec<Vec<u8>> = targets.iter().map(|t| t.bytes().to_vec()).collect();

            match hook.patch(&mut targets) {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        let Some(error) = outcome.error() else {
                            continue;
                        };
                        progress.fatal(format!(
                            "failed to patch module '{}' with '{}': {error}",
                            outcome.module(),
                            hook.name()
                        ));
                        let failed = targets.iter().position(|t| t.module() == outcome.module());
                        if let Some(i) = failed {
                            targets[i].set_bytes(before[i].clone());
                        }
                    }
                }
                Err(e) => {
                    progress.fatal(format!("patch hook '{}' failed: {e:#}", hook.name()));
                    for (target, bytes) in targets.iter_mut().zip(before) {
                        target.set_bytes(bytes);
                    }
                }
            }

            progress.set_ratio(done + 1, self.patchers.len());
        }

        for (s, target) in staged.iter_mut().zip(targets) {
            s.bytes = target.into_bytes();
        }
    }

    /// Returns `(staged index, unit)` pairs in load order.
    fn load_phase(
        &self,
        progress: ProgressSpan<'_>,
        staged: &mut [Staged],
        generation: u64,
    ) -> Vec<(usize, Arc<CodeUnit>)> {
        let graph = DependencyGraph::build(
            staged
                .iter()
                .map(|s| (s.summary.name(), s.references.iter().map(String::as_str))),
        );

        let order = match graph.topological_order() {
            Ok(order) => order,
            Err(e) => {
                progress.fatal(e.to_string());
                progress.set(1.0);
                return Vec::new();
            }
        };

        let internal: BTreeMap<&str, &str> = staged
            .iter()
            .map(|s| (s.summary.name(), s.summary.internal_name()))
            .collect();
        let rewritten: Vec<Vec<String>> = staged
            .iter()
            .map(|s| {
                s.references
                    .iter()
                    .filter(|r| r.as_str() != s.summary.name())
                    .map(|r| {
                        internal
                            .get(r.as_str())
                            .map_or_else(|| r.clone(), |n| (*n).to_string())
                    })
                    .collect()
            })
            .collect();

        let mut failed = vec![false; staged.len()];
        let mut units = Vec::with_capacity(order.len());

        for (step, &node) in order.iter().enumerate() {
            let name = graph.name(node).to_string();

            if let Some(&dependency) = graph.dependencies(node).iter().find(|&&d| failed[d]) {
                progress.fatal(
                    LoadError::MissingDependency {
                        module: name,
                        dependency: graph.name(dependency).to_string(),
                    }
                    .to_string(),
                );
                failed[node] = true;
                progress.set_ratio(step + 1, order.len());
                continue;
            }

            let image = PreparedImage::new(
                name.clone(),
                staged[node].summary.internal_name().to_string(),
                generation,
                rewritten[node].clone(),
                std::mem::take(&mut staged[node].bytes),
            );

            match self.host.load(&image) {
                Ok(unit) => {
                    tracing::debug!(module = %name, unit = %unit.internal_name(), "Module loaded");
                    units.push((node, unit));
                }
                Err(e) => {
                    progress.fatal(
                        LoadError::Host {
                            module: name,
                            message: format!("{e:#}"),
                        }
                        .to_string(),
                    );
                    failed[node] = true;
                }
            }

            progress.set_ratio(step + 1, order.len());
        }

        progress.set(1.0);
        units
    }

    fn init_phase(
        &self,
        progress: ProgressSpan<'_>,
        staged: Vec<Staged>,
        units: Vec<(usize, Arc<CodeUnit>)>,
    ) -> Vec<LoadedModule> {
        let mut slots: Vec<Option<Staged>> = staged.into_iter().map(Some).collect();
        let total = units.len();
        let mut modules = Vec::with_capacity(total);

        progress.set_ratio(0, total);
        for (done, (node, unit)) in units.into_iter().enumerate() {
            let Some(Staged {
                summary,
                mut descriptor,
                ..
            }) = slots.get_mut(node).and_then(Option::take)
            else {
                continue;
            };

            let initialized = match descriptor.initialize(self.host.as_ref(), &unit) {
                Ok(()) => true,
                Err(e) => {
                    progress.fatal(e.to_string());
                    false
                }
            };

            modules.push(LoadedModule {
                summary,
                unit,
                descriptor,
                initialized,
            });
            progress.set_ratio(done + 1, total);
        }

        modules
    }
}

impl fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field(
                "patchers",
                &self.patchers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
