//! Candidate discovery over the scan root

use super::error::ScanError;
use super::filters::{extension_of, ScanFilters};
use crate::core::config::Config;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Walk the configured root and return every eligible file, shuffled.
///
/// Excluded directories are pruned before descent. Code-like files above the
/// size cap are dropped; log-like files are kept whatever their size. Errors
/// on individual paths drop that path only.
pub fn gather_candidates<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Vec<PathBuf> {
    let root = match config.root.canonicalize() {
        Ok(root) if root.is_dir() => root,
        Ok(root) => {
            log::warn!("Scan root {} is not a directory", root.display());
            return Vec::new();
        }
        Err(e) => {
            log::warn!("Scan root {} is not accessible: {}", config.root.display(), e);
            return Vec::new();
        }
    };

    log::debug!(
        "Scanning {} (types: {}, code cap: {} KB)",
        root.display(),
        config.file_types.join(","),
        config.max_filesize_kb
    );

    let filters = ScanFilters::from_config(config, &root);
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            !filters.is_excluded_dir(relative)
        });

    let mut candidates = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                let path = source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                log::debug!("{}", ScanError::Walk { path, source });
                continue;
            }
        };

        match consider(&entry, &root, &filters, config) {
            Ok(true) => candidates.push(entry.into_path()),
            Ok(false) => {}
            Err(e) => log::debug!("{}", e),
        }
    }

    candidates.shuffle(rng);
    candidates
}

fn consider(
    entry: &DirEntry,
    root: &Path,
    filters: &ScanFilters,
    config: &Config,
) -> Result<bool, ScanError> {
    if !entry.file_type().is_file() {
        return Ok(false);
    }

    let name = entry.file_name().to_string_lossy();
    let ext = match extension_of(&name) {
        Some(ext) if config.is_allowed_ext(&ext) => ext,
        _ => return Ok(false),
    };

    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    if filters.is_excluded_file(&name, relative) {
        return Ok(false);
    }

    let metadata = entry.metadata().map_err(|e| ScanError::Metadata {
        path: entry.path().to_path_buf(),
        source: e.into(),
    })?;

    if config.is_code_ext(&ext) && metadata.len() > config.max_file_bytes() {
        log::debug!(
            "Skipping {} ({} bytes exceeds code size cap)",
            entry.path().display(),
            metadata.len()
        );
        return Ok(false);
    }

    Ok(true)
}
