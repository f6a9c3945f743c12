// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for hotmod using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! hotmod [global options] <command>
//! version | options | inis
//! scan [-v]
//! load [--no-progress]
//! reload [--cycles N] [--no-progress]
//! ```

pub mod global;
pub mod reload;

#[cfg(test)]
mod tests;

use crate::cli::global::GlobalOptions;
use crate::cli::reload::{LoadArgs, ReloadArgs, ScanArgs};
use clap::{Parser, Subcommand};

/// Hot-reloading mod host.
#[derive(Debug, Parser)]
#[command(
    name = "hotmod",
    author,
    version,
    about = "Hot-reloading mod host",
    long_about = "hotmod Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Loads versioned mods from a directory of bundles, resolves\n\
                  version conflicts and dependency order, and reloads them in\n\
                  place while carrying their state across generations.\n\n\
                  Invoking `hotmod -m some/mods reload` loads every bundle under\n\
                  some/mods and reloads it once. See `hotmod <command> --help`\n\
                  for more information about a command.",
    after_help = "CONFIG FILES:\n\n\
                  hotmod reads `hotmod.toml` from the current directory if it\n\
                  exists. Additional files given with --ini are loaded after it,\n\
                  followed by HOTMOD_* environment variables (e.g.\n\
                  HOTMOD_PATHS__MODS) and finally --set overrides."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    Version,

    /// Lists all options and their values.
    Options,

    /// Lists the config files used by hotmod.
    Inis,

    /// Reads the module pool and lists the modules it would load.
    Scan(ScanArgs),

    /// Loads every module once, then unloads.
    Load(LoadArgs),

    /// Loads every module, then reloads it one or more times.
    Reload(ReloadArgs),
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
