use dashmap::DashMap;
use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::progress::ProgressReporter;

/// A video file found under one of the TV roots.
#[derive(Debug, Clone)]
pub struct FoundFile {
    pub root: PathBuf,
    pub size: u64,
}

/// Parallel traversal of every root. Builds a map of path → found file, keeping only
/// video extensions not matched by an ignore glob. Skips hidden entries, symlinks and 0-byte files.
///
/// Missing or unreadable directories are recorded in `warnings` and skipped; a file whose
/// metadata cannot be read is skipped silently. `reporter` hears about every file as it is found.
pub fn build_video_file_map(
    roots: &[PathBuf],
    config: &AppConfig,
    warnings: &DashMap<PathBuf, String>,
    reporter: &dyn ProgressReporter,
) -> DashMap<PathBuf, FoundFile> {
    let ignore_patterns: Vec<Pattern> = config
        .ignore_patterns
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    let walk = Walk {
        map: DashMap::new(),
        ignore_patterns,
        config,
        warnings,
        reporter,
        found: AtomicUsize::new(0),
    };

    roots.par_iter().for_each(|root| {
        if !root.is_dir() {
            warn!("TV directory does not exist: {}", root.display());
            warnings.insert(root.clone(), "directory does not exist".to_string());
            return;
        }
        walk.visit_dirs(root, root);
    });

    walk.map
}

struct Walk<'a> {
    map: DashMap<PathBuf, FoundFile>,
    ignore_patterns: Vec<Pattern>,
    config: &'a AppConfig,
    warnings: &'a DashMap<PathBuf, String>,
    reporter: &'a dyn ProgressReporter,
    found: AtomicUsize,
}

impl Walk<'_> {
    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }

    fn visit_dirs(&self, root: &Path, dir: &Path) {
        if self.is_ignored(dir) {
            return;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Cannot read directory {}: {}", dir.display(), err);
                self.warnings.insert(dir.to_path_buf(), err.to_string());
                return;
            }
        };

        entries.par_bridge().for_each(|entry_result| {
            let Ok(entry) = entry_result else {
                return;
            };

            if entry.file_name().to_string_lossy().starts_with('.') {
                return;
            }

            let path = entry.path();
            let Ok(metadata) = fs::symlink_metadata(&path) else {
                return;
            };

            if metadata.file_type().is_symlink() {
                return;
            }

            if metadata.is_dir() {
                self.visit_dirs(root, &path);
            } else if metadata.len() > 0
                && self.config.is_video_extension(&path)
                && !self.is_ignored(&path)
            {
                let found = self.found.fetch_add(1, Ordering::Relaxed) + 1;
                self.reporter.on_scan_progress(found, &path.to_string_lossy());
                self.map.insert(
                    path,
                    FoundFile {
                        root: root.to_path_buf(),
                        size: metadata.len(),
                    },
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingReporter {
        counts: Mutex<Vec<usize>>,
    }

    impl ProgressReporter for CountingReporter {
        fn on_scan_progress(&self, files_found: usize, _current_path: &str) {
            self.counts.lock().unwrap().push(files_found);
        }
    }

    #[test]
    fn test_progress_reported_during_walk() {
        let dir = TempDir::new().unwrap();
        let show = dir.path().join("Show").join("Season 01");
        fs::create_dir_all(&show).unwrap();
        for name in ["Show.S01E01.mkv", "Show.S01E02.mkv", "Show.S01E03.mp4"] {
            fs::write(show.join(name), b"video").unwrap();
        }
        fs::write(show.join("notes.txt"), b"text").unwrap();
        fs::write(show.join("Show.S01E04.mkv"), b"").unwrap();

        let reporter = CountingReporter::default();
        let warnings = DashMap::new();
        let map = build_video_file_map(
            &[dir.path().to_path_buf()],
            &AppConfig::default(),
            &warnings,
            &reporter,
        );

        assert_eq!(map.len(), 3);
        assert!(warnings.is_empty());
        let mut counts = reporter.counts.lock().unwrap().clone();
        counts.sort();
        assert_eq!(counts, vec![1, 2, 3]);
    }
}
