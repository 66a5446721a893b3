//! Path filters applied while walking the scan root

use crate::core::config::Config;
use glob::Pattern;
use std::path::{Component, Path};

/// Exclusion rules resolved once per scan
#[derive(Debug, Default)]
pub struct ScanFilters {
    exclude_dirs: Vec<Vec<String>>,
    ignored_dir_names: Vec<Pattern>,
    exclude_files: Vec<Pattern>,
}

impl ScanFilters {
    pub fn from_config(config: &Config, root: &Path) -> Self {
        let exclude_dirs = config
            .exclude_dirs
            .iter()
            .map(|d| {
                d.split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|segments| !segments.is_empty())
            .collect();

        let ignored_dir_names = if config.respect_gitignore {
            read_ignore_file(&root.join(&config.ignore_file))
        } else {
            Vec::new()
        };

        // Patterns were checked during config validation; anything that still
        // fails to compile is simply not applied.
        let exclude_files = config
            .exclude_files
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .filter_map(|p| Pattern::new(p).ok())
            .collect();

        Self {
            exclude_dirs,
            ignored_dir_names,
            exclude_files,
        }
    }

    /// True if a directory at `relative` (root-relative) must be pruned
    pub fn is_excluded_dir(&self, relative: &Path) -> bool {
        let segments = path_segments(relative);
        if segments.is_empty() {
            return false;
        }

        let segment_hit = self.exclude_dirs.iter().any(|excluded| {
            segments
                .windows(excluded.len())
                .any(|window| window == excluded.as_slice())
        });
        if segment_hit {
            return true;
        }

        match segments.last() {
            Some(name) => self.ignored_dir_names.iter().any(|p| p.matches(name)),
            None => false,
        }
    }

    /// Match exclusion globs against the basename and the root-relative path
    pub fn is_excluded_file(&self, name: &str, relative: &Path) -> bool {
        if self.exclude_files.is_empty() {
            return false;
        }
        let relative = slash_path(relative);
        self.exclude_files
            .iter()
            .any(|p| p.matches(name) || p.matches(&relative))
    }
}

/// Directory-name patterns from a root-level ignore file.
///
/// Only a coarse subset is honored: every non-blank, non-comment line is a
/// glob tested against directory names. Negation, anchoring and precedence
/// are not supported.
pub fn read_ignore_file(path: &Path) -> Vec<Pattern> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return Vec::new(),
    };
    let text = String::from_utf8_lossy(&bytes);

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_end_matches('/'))
        .filter(|line| !line.is_empty())
        .filter_map(|line| match Pattern::new(line) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::debug!("Ignoring pattern '{}' from {}: {}", line, path.display(), e);
                None
            }
        })
        .collect()
}

/// Lower-cased text after the last '.' of the file name
pub fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Root-relative path rendered with forward slashes
pub fn slash_path(relative: &Path) -> String {
    path_segments(relative).join("/")
}

fn path_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_with(exclude_dirs: &[&str], exclude_files: &[&str]) -> Config {
        Config {
            exclude_dirs: exclude_dirs.iter().map(|s| s.to_string()).collect(),
            exclude_files: exclude_files.iter().map(|s| s.to_string()).collect(),
            respect_gitignore: false,
            ..Config::default()
        }
    }

    #[test]
    fn test_directory_segments_match_whole_names() {
        let dir = TempDir::new().unwrap();
        let config = config_with(&["vendor", "storage/logs"], &[]);
        let filters = ScanFilters::from_config(&config, dir.path());

        assert!(filters.is_excluded_dir(Path::new("vendor")));
        assert!(filters.is_excluded_dir(Path::new("app/vendor")));
        assert!(!filters.is_excluded_dir(Path::new("vendors")));
        assert!(!filters.is_excluded_dir(Path::new("my-vendor/lib")));
        assert!(filters.is_excluded_dir(Path::new("app/storage/logs")));
        assert!(!filters.is_excluded_dir(Path::new("app/storage")));
        assert!(!filters.is_excluded_dir(Path::new("")));
    }

    #[test]
    fn test_file_globs_match_basename_or_relative_path() {
        let dir = TempDir::new().unwrap();
        let config = config_with(&[], &["codewalker.toml", "*/cache/*", "*.min.*"]);
        let filters = ScanFilters::from_config(&config, dir.path());

        assert!(filters.is_excluded_file("codewalker.toml", Path::new("conf/codewalker.toml")));
        assert!(filters.is_excluded_file("a.py", Path::new("app/cache/a.py")));
        assert!(filters.is_excluded_file("app.min.sh", Path::new("app.min.sh")));
        assert!(!filters.is_excluded_file("main.py", Path::new("src/main.py")));
    }

    #[test]
    fn test_ignore_file_is_directory_names_only() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".gitignore"),
            "# build output\n\nbuild/\n*.egg-info\n!keep\n",
        )
        .unwrap();

        let config = Config {
            respect_gitignore: true,
            exclude_dirs: Vec::new(),
            ..Config::default()
        };
        let filters = ScanFilters::from_config(&config, dir.path());

        assert!(filters.is_excluded_dir(Path::new("build")));
        assert!(filters.is_excluded_dir(Path::new("src/pkg.egg-info")));
        assert!(!filters.is_excluded_dir(Path::new("src")));
    }

    #[test]
    fn test_missing_ignore_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_ignore_file(&dir.path().join(".gitignore")).is_empty());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("index.PHP").as_deref(), Some("php"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(extension_of(".bashrc").as_deref(), Some("bashrc"));
    }
}
