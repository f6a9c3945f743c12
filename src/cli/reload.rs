// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the pool and reload commands.

use clap::Args;

/// Arguments for `scan`.
#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Also print debug messages (skipped and replaced candidates).
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Arguments for `load`.
#[derive(Debug, Clone, Default, Args)]
pub struct LoadArgs {
    /// Hides the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

/// Arguments for `reload`.
#[derive(Debug, Clone, Args)]
pub struct ReloadArgs {
    /// Number of reload cycles after the initial load.
    #[arg(short = 'n', long, value_name = "N", default_value_t = 1)]
    pub cycles: u32,

    /// Hides the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

impl Default for ReloadArgs {
    fn default() -> Self {
        Self {
            cycles: 1,
            no_progress: false,
        }
    }
}
