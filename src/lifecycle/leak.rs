// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Post-unload liveness tracking.
//!
//! Every mod object and code unit of an unloaded generation is downgraded to
//! a [`Weak`] before its descriptor lets go of it. Once the host has dropped
//! its caches, any handle that still has a strong count is held by someone
//! outside the orchestrator.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::host::{CodeUnit, ModObject};

enum Handle {
    Instance(Weak<dyn ModObject>),
    Unit(Weak<CodeUnit>),
}

impl Handle {
    fn is_alive(&self) -> bool {
        match self {
            Self::Instance(weak) => weak.strong_count() > 0,
            Self::Unit(weak) => weak.strong_count() > 0,
        }
    }

    const fn what(&self) -> &'static str {
        match self {
            Self::Instance(_) => "entry instance",
            Self::Unit(_) => "code unit",
        }
    }
}

/// A handle that outlived its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leak {
    module: String,
    what: &'static str,
}

impl Leak {
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// `"entry instance"` or `"code unit"`.
    #[must_use]
    pub const fn what(&self) -> &'static str {
        self.what
    }
}

impl fmt::Display for Leak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of module '{}' is still referenced after unload",
            self.what, self.module
        )
    }
}

/// Weak handles of one unloaded generation.
#[derive(Default)]
pub struct LeakTracker {
    handles: Vec<(String, Handle)>,
}

impl LeakTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_instance(&mut self, module: &str, instance: &Arc<dyn ModObject>) {
        self.handles
            .push((module.to_string(), Handle::Instance(Arc::downgrade(instance))));
    }

    pub fn track_unit(&mut self, module: &str, unit: &Arc<CodeUnit>) {
        self.handles
            .push((module.to_string(), Handle::Unit(Arc::downgrade(unit))));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Handles that can still be upgraded, in tracking order.
    #[must_use]
    pub fn survivors(&self) -> Vec<Leak> {
        self.handles
            .iter()
            .filter(|(_, handle)| handle.is_alive())
            .map(|(module, handle)| Leak {
                module: module.clone(),
                what: handle.what(),
            })
            .collect()
    }
}

impl fmt::Debug for LeakTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeakTracker")
            .field("tracked", &self.handles.len())
            .finish()
    }
}
