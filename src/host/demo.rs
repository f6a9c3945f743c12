// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Built-in entry types for the `hotmod` binary.
//!
//! ```text
//! counter  plugin-style, ReloadAware: {"reloads": n} survives each reload
//! greeter  legacy-style: logs init / enable / disable
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::json;

use super::{CatalogHost, CodeUnit, ModObject, ReloadAware, StatePayload};
use crate::error::Result;

/// Name the binary reserves for itself.
pub const HOST_MODULE_NAME: &str = "hotmod";

/// Returns a host preloaded with the demo entry types.
#[must_use]
pub fn demo_host() -> CatalogHost {
    CatalogHost::new()
        .with_reserved(HOST_MODULE_NAME)
        .with_entry("counter", |unit: &CodeUnit| {
            Ok(Arc::new(CounterMod::new(unit.module())) as Arc<dyn ModObject>)
        })
        .with_entry("greeter", |unit: &CodeUnit| {
            Ok(Arc::new(GreeterMod::new(unit.module())) as Arc<dyn ModObject>)
        })
}

/// Counts how many reloads it has survived.
#[derive(Debug)]
pub struct CounterMod {
    module: String,
    reloads: AtomicU64,
}

impl CounterMod {
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            reloads: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn reloads(&self) -> u64 {
        self.reloads.load(Ordering::Acquire)
    }
}

impl ModObject for CounterMod {
    fn destroy(&self) -> Result<()> {
        tracing::info!(module = %self.module, reloads = self.reloads(), "Counter destroyed");
        Ok(())
    }

    fn reload_aware(self: Arc<Self>) -> Option<Arc<dyn ReloadAware>> {
        Some(self)
    }
}

impl ReloadAware for CounterMod {
    fn capture_state(&self) -> Result<Option<StatePayload>> {
        Ok(Some(json!({ "reloads": self.reloads() })))
    }

    fn apply_state(&self, payload: StatePayload) -> Result<()> {
        let previous = payload
            .get("reloads")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow::anyhow!("counter state has no 'reloads' field"))?;
        self.reloads.store(previous + 1, Ordering::Release);
        tracing::info!(module = %self.module, reloads = previous + 1, "Counter state restored");
        Ok(())
    }
}

/// Legacy mod that logs its lifecycle.
#[derive(Debug)]
pub struct GreeterMod {
    module: String,
}

impl GreeterMod {
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
        }
    }
}

impl ModObject for GreeterMod {
    fn init(&self) -> Result<()> {
        tracing::info!(module = %self.module, "Greeter initialized");
        Ok(())
    }

    fn enable(&self) -> Result<()> {
        tracing::info!(module = %self.module, "Hello from the greeter");
        Ok(())
    }

    fn disable(&self) -> Result<()> {
        tracing::info!(module = %self.module, "Goodbye from the greeter");
        Ok(())
    }
}
