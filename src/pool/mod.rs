// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Module pool: discovery, filtering and conflict resolution.
//!
//! ```text
//! bundles ──► every entry ──► parse ──► blacklist ──► marker? ──► conflict ──► record
//!                              │ err      │ hit         │ none      │
//!                              ▼          ▼             ▼           ▼
//!                            skip       skip          skip    see below
//!
//! existing vs incoming (same name):
//!   major differs          fatal VersionConflict, keep existing
//!   incoming <= existing   drop incoming
//!   incoming >  existing   replace
//! ```
//!
//! Entries are counted before any is processed, so the reported progress
//! rises monotonically and reaches 1.0 on the last entry.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use wax::{Glob, Program};

use crate::core::progress::ProgressSpan;
use crate::error::{ConfigError, PoolError};
use crate::module::{
    Lifecycle, ModuleDescriptor, ModuleImage, ModuleKind, ModuleVersion, internal_name,
};
use crate::storage::{Bundle, BundleEntry};

/// Filters applied while reading a pool.
#[derive(Debug, Default)]
pub struct PoolOptions {
    blacklist: Vec<Glob<'static>>,
    disabled: BTreeSet<String>,
    reserved: BTreeSet<String>,
}

impl PoolOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds blacklist globs matched against module names.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a pattern that is not a glob.
    pub fn with_blacklist<I, S>(mut self, patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern)
                .map_err(|e| ConfigError::InvalidValue {
                    section: "pool".to_string(),
                    key: "blacklist".to_string(),
                    message: format!("'{pattern}': {e}"),
                })?
                .into_owned();
            self.blacklist.push(glob);
        }
        Ok(self)
    }

    /// Names the user switched off.
    #[must_use]
    pub fn with_disabled<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled.extend(names.into_iter().map(Into::into));
        self
    }

    /// Names owned by the host.
    #[must_use]
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    /// Returns whether `name` is reserved or matches a blacklist glob.
    #[must_use]
    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.reserved.contains(name) || self.blacklist.iter().any(|glob| glob.is_match(name))
    }

    #[must_use]
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(name)
    }
}

/// Identity of a record, kept after the record itself is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    name: String,
    version: ModuleVersion,
    kind: ModuleKind,
    origin: String,
    internal_name: String,
    generation: u64,
}

impl RecordSummary {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn version(&self) -> ModuleVersion {
        self.version
    }

    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Id of the bundle the module came from.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// An accepted candidate module.
#[derive(Debug)]
pub struct ModuleRecord {
    summary: RecordSummary,
    path: PathBuf,
    bytes: Vec<u8>,
    image: ModuleImage,
    descriptor: ModuleDescriptor,
}

impl ModuleRecord {
    #[must_use]
    pub const fn summary(&self) -> &RecordSummary {
        &self.summary
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.summary.name
    }

    #[must_use]
    pub const fn version(&self) -> ModuleVersion {
        self.summary.version
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.summary.origin
    }

    #[must_use]
    pub fn internal_name(&self) -> &str {
        &self.summary.internal_name
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub const fn image(&self) -> &ModuleImage {
        &self.image
    }

    #[must_use]
    pub const fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// Splits the record for loading.
    #[must_use]
    pub fn into_parts(self) -> (RecordSummary, PathBuf, Vec<u8>, ModuleImage, ModuleDescriptor) {
        (
            self.summary,
            self.path,
            self.bytes,
            self.image,
            self.descriptor,
        )
    }
}

/// The conflict-resolved modules of one generation, keyed by name.
#[derive(Debug, Default)]
pub struct ModulePool {
    generation: u64,
    records: BTreeMap<String, ModuleRecord>,
}

impl ModulePool {
    /// Reads every entry of every bundle into a pool for `generation`.
    ///
    /// Never fails: unreadable entries are skipped and conflicts are reported
    /// through `progress`.
    #[must_use]
    pub fn read(
        progress: ProgressSpan<'_>,
        bundles: &[Bundle],
        options: &PoolOptions,
        generation: u64,
    ) -> Self {
        let total: usize = bundles.iter().map(Bundle::len).sum();
        let mut pool = Self {
            generation,
            records: BTreeMap::new(),
        };

        tracing::debug!(
            bundles = bundles.len(),
            entries = total,
            generation,
            "Reading module pool"
        );
        progress.set_ratio(0, total);

        let mut done = 0;
        for bundle in bundles {
            for entry in bundle.entries() {
                pool.consider(progress, bundle.id(), entry, options);
                done += 1;
                progress.set_ratio(done, total);
            }
        }

        tracing::info!(modules = pool.len(), generation, "Module pool ready");
        pool
    }

    fn consider(
        &mut self,
        progress: ProgressSpan<'_>,
        origin: &str,
        entry: &BundleEntry,
        options: &PoolOptions,
    ) {
        let stem = Path::new(entry.name())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let image = match ModuleImage::parse(entry.name(), entry.bytes()) {
            Ok(image) => image,
            Err(e) => {
                tracing::debug!(
                    bundle = %origin,
                    entry = %entry.name(),
                    error = %e,
                    "Skipping unreadable entry"
                );
                return;
            }
        };

        if options.is_blacklisted(&stem) {
            tracing::debug!(bundle = %origin, entry = %entry.name(), "Skipping blacklisted entry");
            return;
        }

        let Some(marker) = image.marker() else {
            tracing::debug!(bundle = %origin, entry = %entry.name(), "Entry has no module marker");
            return;
        };
        let name = marker.name().to_string();

        if options.is_blacklisted(&name) {
            tracing::debug!(module = %name, bundle = %origin, "Skipping blacklisted module");
            return;
        }
        if options.is_disabled(&name) {
            tracing::info!(module = %name, bundle = %origin, "Skipping disabled module");
            return;
        }

        let incoming = marker.version();
        if let Some(existing) = self.records.get(&name) {
            let current = existing.version();
            if !incoming.is_compatible_with(&current) {
                let conflict = PoolError::VersionConflict {
                    module: name,
                    existing: current.to_string(),
                    existing_origin: existing.origin().to_string(),
                    incoming: incoming.to_string(),
                    incoming_origin: origin.to_string(),
                };
                progress.fatal(conflict.to_string());
                return;
            }
            if incoming <= current {
                progress.debug(format!(
                    "Keeping {name} {current} from '{}' over {incoming} from '{origin}'",
                    existing.origin()
                ));
                return;
            }
            progress.debug(format!(
                "Replacing {name} {current} from '{}' with {incoming} from '{origin}'",
                existing.origin()
            ));
        }

        let descriptor = match ModuleDescriptor::from_marker(marker) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::debug!(module = %name, error = %e, "Skipping module without an entry");
                return;
            }
        };

        let record = ModuleRecord {
            summary: RecordSummary {
                internal_name: internal_name(&name, self.generation),
                name: name.clone(),
                version: incoming,
                kind: marker.kind(),
                origin: origin.to_string(),
                generation: self.generation,
            },
            path: entry.path().to_path_buf(),
            bytes: entry.bytes().to_vec(),
            descriptor,
            image,
        };
        debug_assert_eq!(record.descriptor.module(), record.name());
        self.records.insert(name, record);
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModuleRecord> {
        self.records.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Records in name order.
    pub fn records(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.records.values()
    }

    /// Name to version mapping.
    #[must_use]
    pub fn versions(&self) -> BTreeMap<String, ModuleVersion> {
        self.records
            .iter()
            .map(|(name, record)| (name.clone(), record.version()))
            .collect()
    }

    /// Summaries in name order.
    #[must_use]
    pub fn summaries(&self) -> Vec<RecordSummary> {
        self.records.values().map(|r| r.summary.clone()).collect()
    }

    /// Consumes the pool, yielding records in name order.
    #[must_use]
    pub fn into_records(self) -> Vec<ModuleRecord> {
        self.records.into_values().collect()
    }
}
