//! Lexical path normalization for contributed report paths.
//!
//! Every path entering the registry goes through [`normalize`]: relative
//! entries are resolved against the owning module's base directory, `.` and
//! `..` segments are collapsed without touching the filesystem, and results
//! that would climb above the root are rejected.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CovregError, PathError, Result};

/// An absolute, lexically normalized report path.
///
/// Two `CanonicalPath`s compare equal exactly when they name the same
/// location after normalization, which is what the collector deduplicates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalPath(PathBuf);

impl CanonicalPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Path relative to `base`, if this path lives under it.
    pub fn relative_to(&self, base: &Path) -> Option<&Path> {
        self.0.strip_prefix(base).ok()
    }
}

impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Normalize path separators to `/`.
pub fn normalize_slashes(path: &str) -> String {
    if path.contains('\\') {
        path.replace('\\', "/")
    } else {
        path.to_string()
    }
}

/// Split a comma-separated, multi-valued property into its entries.
///
/// Entries are trimmed; blank entries are dropped.
pub fn split_path_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve `raw` against `base` and collapse `.`/`..` segments.
pub fn normalize(raw: &str, base: &Path) -> Result<CanonicalPath> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid(raw, PathError::Empty));
    }
    normalize_path(Path::new(trimmed), base).map_err(|source| invalid(raw, source))
}

/// [`normalize`] for callers that already hold a `Path`.
///
/// Backslashes are treated as separators here too.
pub fn normalize_path(path: &Path, base: &Path) -> std::result::Result<CanonicalPath, PathError> {
    if path.as_os_str().is_empty() {
        return Err(PathError::Empty);
    }
    let slashed = PathBuf::from(normalize_slashes(&path.to_string_lossy()));
    let path = slashed.as_path();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        if !base.is_absolute() {
            return Err(PathError::RelativeBase {
                base: base.display().to_string(),
            });
        }
        base.join(path)
    };
    collapse(&joined)
        .map(CanonicalPath)
        .ok_or_else(|| PathError::EscapesRoot {
            raw: path.display().to_string(),
        })
}

/// Normalize every entry, isolating failures per path.
///
/// Valid entries keep their input order; rejected ones are returned
/// separately so one bad entry never discards the rest of a batch.
pub fn normalize_all<I, S>(raws: I, base: &Path) -> (Vec<CanonicalPath>, Vec<CovregError>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for raw in raws {
        match normalize(raw.as_ref(), base) {
            Ok(path) => accepted.push(path),
            Err(err) => rejected.push(err),
        }
    }
    (accepted, rejected)
}

fn collapse(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    Some(out)
}

fn invalid(raw: &str, source: PathError) -> CovregError {
    CovregError::InvalidPath {
        raw: raw.to_string(),
        source,
    }
}
