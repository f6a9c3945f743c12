// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `scan`: reads the module pool without loading anything.

use std::sync::Arc;

use anyhow::{Context, bail};

use crate::cli::reload::ScanArgs;
use crate::config::Config;
use crate::core::progress::{ProgressTracker, Severity};
use crate::error::Result;
use crate::host::demo::demo_host;
use crate::lifecycle::context::HostContext;
use crate::pool::ModulePool;

/// Reads the configured mods root into a generation-1 pool.
///
/// # Errors
///
/// Returns an error if `paths.mods` is unset, a glob is invalid or the
/// storage cannot be enumerated.
pub fn scan_pool(config: &Config, progress: &ProgressTracker) -> Result<ModulePool> {
    let ctx = HostContext::from_config(config, Arc::new(demo_host()))?;
    let bundles = ctx
        .storage()
        .bundles()
        .with_context(|| format!("failed to read bundles from {}", ctx.storage().describe()))?;
    Ok(ModulePool::read(progress.span(), &bundles, ctx.pool_options(), 1))
}

/// Run the scan command.
///
/// # Errors
///
/// Returns an error if the pool cannot be read or a fatal message was raised.
pub fn run_scan_command(args: &ScanArgs, config: &Config) -> Result<()> {
    let progress = ProgressTracker::new();
    let pool = scan_pool(config, &progress)?;

    if pool.is_empty() {
        println!("No modules found");
    }
    for record in pool.records() {
        println!(
            "{:<24} {:<10} {:<8} {}",
            record.name(),
            record.version().to_string(),
            record.summary().kind().to_string(),
            record.origin()
        );
    }

    let threshold = if args.verbose {
        Severity::Debug
    } else {
        Severity::Warning
    };
    for message in progress.messages() {
        if message.severity() >= threshold {
            println!("{message}");
        }
    }

    if progress.is_failed() {
        bail!("scan raised {} fatal error(s)", progress.fatal_count());
    }
    Ok(())
}
