// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Parallel glob search over a bundle directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bon::Builder;
use flume::unbounded;
use ignore::WalkBuilder;
use wax::{Glob, Program};

use crate::error::StorageError;

/// Options for the bundle walk.
#[derive(Debug, Clone, Builder)]
pub struct WalkOptions {
    /// Maximum depth below the bundle root (None = unlimited)
    #[builder(setters(name = with_max_depth))]
    max_depth: Option<usize>,
    /// Follow symbolic links
    #[builder(setters(name = with_follow_links), default = false)]
    follow_links: bool,
    /// Include hidden files/directories
    #[builder(setters(name = with_include_hidden), default = false)]
    include_hidden: bool,
    /// Number of threads (None = auto-detect)
    #[builder(setters(name = with_threads))]
    threads: Option<usize>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WalkOptions {
    #[must_use]
    pub const fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[must_use]
    pub const fn follow_links(&self) -> bool {
        self.follow_links
    }

    #[must_use]
    pub const fn include_hidden(&self) -> bool {
        self.include_hidden
    }

    #[must_use]
    pub const fn threads(&self) -> Option<usize> {
        self.threads
    }
}

fn build_walker(root: &Path, options: &WalkOptions) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);

    if let Some(depth) = options.max_depth() {
        builder.max_depth(Some(depth));
    }

    builder.follow_links(options.follow_links());
    builder.hidden(!options.include_hidden());

    // Bundles are installed content, not source trees.
    builder.git_ignore(false);
    builder.git_global(false);
    builder.git_exclude(false);
    builder.ignore(false);
    builder.parents(false);

    if let Some(threads) = options.threads() {
        builder.threads(threads);
    }

    builder
}

/// Validates a glob pattern.
///
/// # Errors
///
/// Returns `StorageError::InvalidPattern` if `pattern` is not a valid glob.
pub fn compile_glob(pattern: &str) -> Result<Glob<'static>, StorageError> {
    Glob::new(pattern)
        .map(Glob::into_owned)
        .map_err(|e| StorageError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Finds files under `root` whose root-relative path matches `glob`.
///
/// Results are sorted so bundle contents are read in a stable order.
/// Unreadable entries are logged and skipped; the returned count says how
/// many there were.
#[must_use]
pub fn find_files(
    root: &Path,
    glob: &Arc<Glob<'static>>,
    options: &WalkOptions,
) -> (Vec<PathBuf>, usize) {
    let (tx, rx) = unbounded::<PathBuf>();
    let error_count = Arc::new(AtomicUsize::new(0));
    let root_path = root.to_path_buf();

    build_walker(root, options).build_parallel().run(|| {
        let tx = tx.clone();
        let glob = Arc::clone(glob);
        let root_path = root_path.clone();
        let error_count = Arc::clone(&error_count);

        Box::new(move |entry_result| {
            match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file())
                        && let Ok(rel_path) = entry.path().strip_prefix(&root_path)
                        && glob.is_match(rel_path)
                    {
                        let _ = tx.send(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "walk error");
                    error_count.fetch_add(1, Ordering::Relaxed);
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut files: Vec<PathBuf> = rx.iter().collect();
    files.sort();
    (files, error_count.load(Ordering::Relaxed))
}
