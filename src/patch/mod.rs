// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Patch hooks run over module binaries before they are loaded.
//!
//! ```text
//! ModuleLoader patch phase
//!   for hook in hooks:                 (each hook sees every binary once)
//!     snapshot bytes
//!     hook.patch(&mut targets) --> Vec<PatchOutcome>
//!       Err(_)            => fatal, every target restored
//!       outcome.error     => fatal, that target restored
//! ```
//!
//! A failed patch never removes a module from the load: it is loaded with
//! the bytes it had before the failing hook ran.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{PatchError, Result};

/// A module binary handed to patch hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTarget {
    module: String,
    path: PathBuf,
    bytes: Vec<u8>,
}

impl PatchTarget {
    #[must_use]
    pub fn new(module: impl Into<String>, path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            module: module.into(),
            path: path.into(),
            bytes,
        }
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Source path of the binary, for diagnostics.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.bytes = bytes;
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Per-target result of one hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    module: String,
    error: Option<String>,
}

impl PatchOutcome {
    #[must_use]
    pub fn ok(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(module: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            module: module.into(),
            error: Some(error.to_string()),
        }
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// An installed patch hook.
pub trait Patcher: Send + Sync {
    /// Hook name used in messages.
    fn name(&self) -> &str;

    /// Patches `targets` in place.
    ///
    /// Targets missing from the returned outcomes count as patched.
    ///
    /// # Errors
    ///
    /// Returns an error only if the hook could not run at all; failures of
    /// individual targets belong in the outcomes.
    fn patch(&self, targets: &mut [PatchTarget]) -> Result<Vec<PatchOutcome>>;
}

/// Placeholder in [`CommandPatcher`] arguments replaced by the staged file.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Runs an external command once per binary.
///
/// Each binary is staged in a temporary directory; the command gets the
/// staged path (via [`FILE_PLACEHOLDER`], or appended as the last argument)
/// and may rewrite the file in place. A non-zero exit fails that binary only.
#[derive(Debug, Clone)]
pub struct CommandPatcher {
    name: String,
    program: String,
    args: Vec<String>,
}

impl CommandPatcher {
    #[must_use]
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn command_for(&self, path: &Path) -> Command {
        let mut command = Command::new(&self.program);
        let file = path.to_string_lossy();
        let mut substituted = false;
        for arg in &self.args {
            if arg.contains(FILE_PLACEHOLDER) {
                substituted = true;
                command.arg(arg.replace(FILE_PLACEHOLDER, &file));
            } else {
                command.arg(arg);
            }
        }
        if !substituted {
            command.arg(path);
        }
        command
    }

    fn patch_one(
        &self,
        staging: &Path,
        index: usize,
        target: &mut PatchTarget,
    ) -> std::result::Result<(), PatchError> {
        let staged = staging.join(format!("{index}-{}.bin", sanitize(target.module())));
        let staging_error = |source| PatchError::Staging {
            target: target.module().to_string(),
            source,
        };

        std::fs::write(&staged, target.bytes()).map_err(staging_error)?;

        // Hook output is captured, never inherited.
        let output = self
            .command_for(&staged)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PatchError::SpawnFailed {
                command: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(
                hook = %self.name,
                module = %target.module(),
                stdout = %stdout.trim(),
                "Patch hook output"
            );
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                tracing::error!(
                    hook = %self.name,
                    module = %target.module(),
                    stderr = %stderr.trim(),
                    "Patch hook error output"
                );
            }
            return Err(PatchError::CommandFailed {
                command: self.program.clone(),
                target: target.module().to_string(),
                code: output.status.code().unwrap_or(-1),
            });
        }

        let patched = std::fs::read(&staged).map_err(staging_error)?;
        target.set_bytes(patched);
        Ok(())
    }
}

impl Patcher for CommandPatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn patch(&self, targets: &mut [PatchTarget]) -> Result<Vec<PatchOutcome>> {
        let staging = tempfile::Builder::new().prefix("hotmod-patch-").tempdir()?;

        let outcomes = targets
            .iter_mut()
            .enumerate()
            .map(|(index, target)| match self.patch_one(staging.path(), index, target) {
                Ok(()) => PatchOutcome::ok(target.module()),
                Err(e) => PatchOutcome::failed(target.module(), e),
            })
            .collect();

        tracing::debug!(hook = %self.name, program = %self.program, "Patch hook finished");
        Ok(outcomes)
    }
}

/// Keeps staged file names portable.
fn sanitize(module: &str) -> String {
    module
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests;
