//! Report path collector.
//!
//! [`ReportPathCollector`] is the one piece of shared mutable state in an
//! analysis run. Sensors contribute paths concurrently through the `add_*`
//! entry points; aggregators read sealed snapshots afterwards.
//!
//! Phases: `Init -> Collecting -> Sealed`, and the collector is discarded when
//! dropped. Once sealed, every contribution is rejected with
//! [`CovregError::RegistrySealed`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{CovregError, Result};
use crate::kind::{BucketKey, ReportKind, TestScope};
use crate::obs;
use crate::path::CanonicalPath;

/// Identity of the module (project) that contributed a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleKey(String);

impl ModuleKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A contributed path together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPath {
    path: CanonicalPath,
    module: Option<ModuleKey>,
    kind: ReportKind,
    scope: Option<TestScope>,
}

impl ReportPath {
    pub fn path(&self) -> &CanonicalPath {
        &self.path
    }

    pub fn module(&self) -> Option<&ModuleKey> {
        self.module.as_ref()
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn scope(&self) -> Option<TestScope> {
        self.scope
    }
}

/// A Roslyn report file and the module whose build produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoslynReport {
    pub module: ModuleKey,
    pub path: CanonicalPath,
}

impl RoslynReport {
    pub fn new(module: ModuleKey, path: CanonicalPath) -> Self {
        Self { module, path }
    }
}

/// Lifecycle phase of a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryPhase {
    /// Created, nothing contributed yet.
    Init,
    /// At least one non-empty contribution accepted.
    Collecting,
    /// Read by an aggregator; no further writes.
    Sealed,
}

/// Ordered set of paths for one bucket. Deduplicates on the canonical path.
#[derive(Debug, Default)]
struct PathCollection {
    entries: Vec<ReportPath>,
    seen: HashSet<CanonicalPath>,
}

impl PathCollection {
    fn push(&mut self, entry: ReportPath) -> bool {
        if self.seen.insert(entry.path.clone()) {
            self.entries.push(entry);
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct CollectorState {
    phase: RegistryPhase,
    buckets: BTreeMap<BucketKey, PathCollection>,
}

/// Thread-safe, append-only collector of report paths for one analysis run.
///
/// Share it behind an `Arc`; all mutation is serialized by one registry-wide
/// lock that is never held across an `.await`.
#[derive(Debug)]
pub struct ReportPathCollector {
    language: Option<String>,
    state: Mutex<CollectorState>,
}

impl Default for ReportPathCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPathCollector {
    pub fn new() -> Self {
        Self {
            language: None,
            state: Mutex::new(CollectorState {
                phase: RegistryPhase::Init,
                buckets: BTreeMap::new(),
            }),
        }
    }

    /// A collector holding the reports of a single language.
    ///
    /// Aggregators refuse to build report sets for any other language from it.
    pub fn for_language(language: impl Into<String>) -> Self {
        let mut collector = Self::new();
        collector.language = Some(language.into());
        collector
    }

    /// Language this collector is bound to, if any.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Contribute paths for `(kind, scope)`, returning how many were new.
    ///
    /// An empty `paths` is a no-op. Paths already present in the bucket are
    /// skipped, so first-seen order is kept.
    pub fn add_paths<I>(&self, kind: ReportKind, scope: Option<TestScope>, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = CanonicalPath>,
    {
        self.contribute(BucketKey::new(kind, scope)?, None, paths)
    }

    /// [`add_paths`](Self::add_paths), tagging every entry with `module`.
    pub fn add_module_paths<I>(
        &self,
        module: &ModuleKey,
        kind: ReportKind,
        scope: Option<TestScope>,
        paths: I,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = CanonicalPath>,
    {
        self.contribute(BucketKey::new(kind, scope)?, Some(module), paths)
    }

    /// Contribute analyzer protobuf output directories.
    pub fn add_protobuf_dirs<I>(&self, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = CanonicalPath>,
    {
        self.contribute(BucketKey::analyzer(ReportKind::Protobuf)?, None, paths)
    }

    /// Contribute Roslyn report files, each tagged with its module.
    pub fn add_roslyn_dirs<I>(&self, reports: I) -> Result<usize>
    where
        I: IntoIterator<Item = RoslynReport>,
    {
        let bucket = BucketKey::analyzer(ReportKind::Roslyn)?;
        let entries: Vec<ReportPath> = reports
            .into_iter()
            .map(|report| ReportPath {
                path: report.path,
                module: Some(report.module),
                kind: bucket.kind,
                scope: None,
            })
            .collect();
        self.insert(bucket, entries)
    }

    /// Current paths for `(kind, scope)` in first-seen order.
    ///
    /// Never fails; unknown or mismatched buckets read as empty.
    pub fn snapshot(&self, kind: ReportKind, scope: Option<TestScope>) -> Vec<CanonicalPath> {
        self.entries(kind, scope)
            .into_iter()
            .map(|entry| entry.path)
            .collect()
    }

    /// Like [`snapshot`](Self::snapshot) but keeps module identity.
    pub fn entries(&self, kind: ReportKind, scope: Option<TestScope>) -> Vec<ReportPath> {
        let Ok(bucket) = BucketKey::new(kind, scope) else {
            return Vec::new();
        };
        self.lock()
            .buckets
            .get(&bucket)
            .map(|collection| collection.entries.clone())
            .unwrap_or_default()
    }

    pub fn roslyn_reports(&self) -> Vec<RoslynReport> {
        self.entries(ReportKind::Roslyn, None)
            .into_iter()
            .filter_map(|entry| {
                entry
                    .module
                    .map(|module| RoslynReport::new(module, entry.path))
            })
            .collect()
    }

    /// Stop accepting contributions.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn seal(&self) -> bool {
        let mut state = self.lock();
        if state.phase == RegistryPhase::Sealed {
            return false;
        }
        state.phase = RegistryPhase::Sealed;
        let total = total_paths(&state);
        drop(state);
        obs::emit_registry_sealed(total);
        true
    }

    pub fn phase(&self) -> RegistryPhase {
        self.lock().phase
    }

    pub fn is_sealed(&self) -> bool {
        self.phase() == RegistryPhase::Sealed
    }

    /// Number of distinct paths across all buckets.
    pub fn total_paths(&self) -> usize {
        total_paths(&self.lock())
    }

    fn contribute<I>(&self, bucket: BucketKey, module: Option<&ModuleKey>, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = CanonicalPath>,
    {
        let entries: Vec<ReportPath> = paths
            .into_iter()
            .map(|path| ReportPath {
                path,
                module: module.cloned(),
                kind: bucket.kind,
                scope: bucket.scope,
            })
            .collect();
        self.insert(bucket, entries)
    }

    fn insert(&self, bucket: BucketKey, entries: Vec<ReportPath>) -> Result<usize> {
        let mut state = self.lock();
        if state.phase == RegistryPhase::Sealed {
            drop(state);
            let err = CovregError::sealed(bucket.kind, bucket.scope);
            obs::emit_contribution_rejected(bucket.kind, bucket.scope, &err);
            return Err(err);
        }
        if entries.is_empty() {
            return Ok(0);
        }

        let offered = entries.len();
        let collection = state.buckets.entry(bucket).or_default();
        let added = entries
            .into_iter()
            .map(|entry| collection.push(entry))
            .filter(|pushed| *pushed)
            .count();
        state.phase = RegistryPhase::Collecting;
        drop(state);

        obs::emit_paths_added(bucket.kind, bucket.scope, added, offered - added);
        Ok(added)
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        // Contributions are purely additive, so a poisoned lock still guards
        // consistent data.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ReportPathCollector {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        obs::emit_registry_discarded(total_paths(state));
    }
}

fn total_paths(state: &CollectorState) -> usize {
    state
        .buckets
        .values()
        .map(|collection| collection.entries.len())
        .sum()
}
