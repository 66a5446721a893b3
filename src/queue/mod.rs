//! Queue Reader
//!
//! Operator-submitted paths are processed ahead of the directory scan. Rows
//! are written by external tools; the walker only reads pending rows and
//! marks them done after its first attempt.

use crate::store::{Store, StoreResult};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Where a candidate came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOrigin {
    /// Pending queue entries; `rows` holds every row path that resolved here
    Queue { rows: Vec<String> },
    Scan,
}

/// A file to consider in the current run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub origin: CandidateOrigin,
}

impl Candidate {
    pub fn scanned(path: PathBuf) -> Self {
        Self {
            path,
            origin: CandidateOrigin::Scan,
        }
    }

    /// Queue row paths to mark done once this candidate has been attempted
    pub fn queue_rows(&self) -> &[String] {
        match &self.origin {
            CandidateOrigin::Queue { rows } => rows,
            CandidateOrigin::Scan => &[],
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self.origin, CandidateOrigin::Queue { .. })
    }
}

/// Pending queue entries in request order, de-duplicated by resolved path.
///
/// Paths are resolved the same way the scanner resolves its root (symlinks
/// and `..` followed), so a queued alias of a scanned file merges with it.
/// Entries whose file no longer exists (or is not a regular file) are left
/// out and stay pending.
pub fn pending_candidates(store: &Store) -> StoreResult<Vec<Candidate>> {
    let mut candidates: Vec<Candidate> = Vec::new();

    for row in store.pending_queue()? {
        let absolute = match resolve_path(Path::new(&row.path)) {
            Some(path) => path,
            None => {
                log::debug!("Queued path '{}' cannot be resolved", row.path);
                continue;
            }
        };

        if !absolute.is_file() {
            log::debug!(
                "Queued path {} is missing, leaving it pending",
                absolute.display()
            );
            continue;
        }

        if let Some(existing) = candidates.iter_mut().find(|c| c.path == absolute) {
            if let CandidateOrigin::Queue { rows } = &mut existing.origin {
                rows.push(row.path);
            }
            continue;
        }

        candidates.push(Candidate {
            path: absolute,
            origin: CandidateOrigin::Queue {
                rows: vec![row.path],
            },
        });
    }

    Ok(candidates)
}

/// Queued candidates first, then scanned paths not already queued
pub fn merge(queued: Vec<Candidate>, scanned: Vec<PathBuf>) -> Vec<Candidate> {
    let seen: HashSet<PathBuf> = queued.iter().map(|c| c.path.clone()).collect();
    let mut merged = queued;
    merged.extend(
        scanned
            .into_iter()
            .filter(|path| !seen.contains(path))
            .map(Candidate::scanned),
    );
    merged
}

/// Canonical form of a queued path; lexically normalized when the file
/// cannot be canonicalized (missing or unreadable)
pub fn resolve_path(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    match std::fs::canonicalize(path) {
        Ok(canonical) => Some(canonical),
        Err(_) => std::path::absolute(path).ok().map(|p| normalize_lexically(&p)),
    }
}

// Drop `.` and fold `..` into the preceding segment
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
