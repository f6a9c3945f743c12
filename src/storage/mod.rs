// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bundle enumeration.
//!
//! ```text
//! <mods root>/
//! ├── bundle-a/            Bundle { id: "bundle-a" }
//! │   ├── Foo.mod          BundleEntry { name: "Foo.mod" }
//! │   └── lib/Bar.mod      BundleEntry { name: "lib/Bar.mod" }
//! └── bundle-b/
//!     └── Foo.mod
//! ```
//!
//! Storage is read-only: a bundle snapshot is taken once per reload and
//! handed to the pool. Bundles come back sorted by id, entries by name.

pub mod walk;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use wax::Glob;

use crate::error::{Result, StorageError};
use walk::{WalkOptions, compile_glob, find_files};

/// Default pattern for module binaries inside a bundle.
pub const DEFAULT_PATTERN: &str = "**/*.mod";

/// A single binary inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    name: String,
    path: PathBuf,
    bytes: Vec<u8>,
}

impl BundleEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            bytes,
        }
    }

    /// Bundle-relative name, `/`-separated.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the entry came from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A named container of module binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    id: String,
    entries: Vec<BundleEntry>,
}

impl Bundle {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: Vec::new(),
        }
    }

    /// Adds an in-memory entry; the path is `<id>/<name>`.
    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let path = Path::new(&self.id).join(&name);
        self.entries.push(BundleEntry::new(name, path, bytes.into()));
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn entries(&self) -> &[BundleEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source of module bundles.
pub trait Storage: Send + Sync {
    /// Returns a snapshot of every bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be enumerated.
    fn bundles(&self) -> Result<Vec<Bundle>>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Bundles as immediate sub-directories of a mods root.
pub struct DirectoryStorage {
    root: PathBuf,
    pattern: String,
    glob: Arc<Glob<'static>>,
    walk: WalkOptions,
}

impl DirectoryStorage {
    /// Creates a storage over `root` whose entries match `pattern`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPattern` if `pattern` is not a valid glob.
    pub fn new(
        root: impl Into<PathBuf>,
        pattern: &str,
    ) -> std::result::Result<Self, StorageError> {
        Ok(Self {
            root: root.into(),
            pattern: pattern.to_string(),
            glob: Arc::new(compile_glob(pattern)?),
            walk: WalkOptions::default(),
        })
    }

    #[must_use]
    pub fn with_walk_options(mut self, walk: WalkOptions) -> Self {
        self.walk = walk;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn read_bundle(&self, id: String, dir: &Path) -> std::result::Result<Bundle, StorageError> {
        let (files, errors) = find_files(dir, &self.glob, &self.walk);
        if errors > 0 {
            tracing::warn!(bundle = %id, errors, "Some bundle entries could not be walked");
        }

        let mut entries = Vec::with_capacity(files.len());
        for path in files {
            let bytes = std::fs::read(&path).map_err(|source| StorageError::Read {
                path: path.display().to_string(),
                source,
            })?;
            let name = path
                .strip_prefix(dir)
                .unwrap_or(path.as_path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            entries.push(BundleEntry::new(name, path, bytes));
        }

        tracing::debug!(bundle = %id, entries = entries.len(), "Read bundle");
        Ok(Bundle { id, entries })
    }
}

impl Storage for DirectoryStorage {
    fn bundles(&self) -> Result<Vec<Bundle>> {
        if !self.root.is_dir() {
            return Err(StorageError::RootNotFound(self.root.display().to_string()).into());
        }

        let read_error = |source| StorageError::Read {
            path: self.root.display().to_string(),
            source,
        };

        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            if entry.file_type().map_err(read_error)?.is_dir() {
                dirs.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
            }
        }
        dirs.sort();

        let mut bundles = Vec::with_capacity(dirs.len());
        for (id, dir) in dirs {
            bundles.push(self.read_bundle(id, &dir)?);
        }
        Ok(bundles)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.root.display(), self.pattern)
    }
}

impl fmt::Debug for DirectoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryStorage")
            .field("root", &self.root)
            .field("pattern", &self.pattern)
            .field("walk", &self.walk)
            .finish_non_exhaustive()
    }
}

/// In-memory bundles; swapped wholesale between reloads.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    bundles: Mutex<Vec<Bundle>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new(bundles: Vec<Bundle>) -> Self {
        Self {
            bundles: Mutex::new(bundles),
        }
    }

    /// Replaces every bundle.
    pub fn set(&self, bundles: Vec<Bundle>) {
        *self.bundles.lock().unwrap_or_else(PoisonError::into_inner) = bundles;
    }

    /// Adds or replaces the bundle with the same id.
    pub fn push(&self, bundle: Bundle) {
        let mut bundles = self.bundles.lock().unwrap_or_else(PoisonError::into_inner);
        bundles.retain(|b| b.id() != bundle.id());
        bundles.push(bundle);
    }

    /// Removes a bundle by id.
    pub fn remove(&self, id: &str) -> Option<Bundle> {
        let mut bundles = self.bundles.lock().unwrap_or_else(PoisonError::into_inner);
        let index = bundles.iter().position(|b| b.id() == id)?;
        Some(bundles.remove(index))
    }
}

impl Storage for MemoryStorage {
    fn bundles(&self) -> Result<Vec<Bundle>> {
        let mut bundles = self
            .bundles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        bundles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(bundles)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
