pub mod walk;

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::episode::parser::{comparable_name, is_generic_folder, parse_episode_name, season_folder_number};
use crate::episode::{Episode, EpisodeStatus};
use crate::progress::ProgressReporter;
use crate::resolver::matching::name_similarity;

pub use walk::{build_video_file_map, FoundFile};

/// Folder/show names at or above this similarity are treated as the same show.
const FOLDER_MATCH_THRESHOLD: f64 = 0.8;

/// Result of scanning the TV roots: every parsed episode plus the directories that were skipped.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Sorted by path.
    pub episodes: Vec<Episode>,
    pub warnings: Vec<ScanWarning>,
    pub video_files_seen: usize,
}

#[derive(Debug, Clone)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Walk `roots` in parallel, parse every video file and classify where it sits.
/// Files whose names carry no episode marker are dropped.
pub fn scan_episodes(
    roots: &[PathBuf],
    config: &AppConfig,
    reporter: &dyn ProgressReporter,
) -> ScanOutcome {
    reporter.on_scan_start(roots.len());
    let start = Instant::now();

    let warnings: DashMap<PathBuf, String> = DashMap::new();
    let files = build_video_file_map(roots, config, &warnings, reporter);
    let video_files_seen = files.len();

    let mut warnings: Vec<ScanWarning> = warnings
        .into_iter()
        .map(|(path, message)| ScanWarning { path, message })
        .collect();
    warnings.sort_by(|a, b| a.path.cmp(&b.path));
    for warning in &warnings {
        reporter.on_scan_warning(&format!("{}: {}", warning.path.display(), warning.message));
    }

    let mut episodes: Vec<Episode> = files
        .into_iter()
        .filter_map(|(path, found)| {
            let file_name = path.file_name()?.to_string_lossy().into_owned();
            let parsed = parse_episode_name(&file_name);
            let Some(parsed) = parsed else {
                debug!("Not an episode: {}", path.display());
                return None;
            };
            let status = classify_location(&found.root, &path, &parsed.show_name);
            Episode::from_file(&path, found.size, status)
        })
        .collect();
    episodes.sort_by(|a, b| a.path.cmp(&b.path));

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "Scanned {} video files, {} episodes in {:.2}s ({} warnings)",
        video_files_seen,
        episodes.len(),
        elapsed,
        warnings.len()
    );
    reporter.on_scan_complete(episodes.len(), elapsed);

    ScanOutcome {
        episodes,
        warnings,
        video_files_seen,
    }
}

/// Classify an episode's location relative to the TV root it was found under.
pub fn classify_location(root: &Path, path: &Path, show_name: &str) -> EpisodeStatus {
    let Some(parent) = path.parent() else {
        return EpisodeStatus::LooseRoot;
    };
    let Ok(relative) = parent.strip_prefix(root) else {
        return EpisodeStatus::LooseRoot;
    };

    let folders: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    let Some(top) = folders.first() else {
        return EpisodeStatus::LooseRoot;
    };

    if folders.iter().any(|f| is_generic_folder(f)) {
        return EpisodeStatus::LooseGeneric;
    }

    // A folder named after the release itself, e.g. "Show.S01E01.720p.HDTV/".
    if folders
        .last()
        .is_some_and(|f| parse_episode_name(f).is_some())
    {
        return EpisodeStatus::LooseGeneric;
    }

    if season_folder_number(top).is_some() {
        return EpisodeStatus::LooseSeasonFolder;
    }

    let folder = comparable_name(top);
    let show = comparable_name(show_name);
    if folder == show
        || folder.contains(&show)
        || show.contains(&folder)
        || name_similarity(&folder, &show) >= FOLDER_MATCH_THRESHOLD
    {
        EpisodeStatus::Organized
    } else {
        EpisodeStatus::MisnamedFolder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(relative: &str, show: &str) -> EpisodeStatus {
        let root = Path::new("/tv");
        classify_location(root, &root.join(relative), show)
    }

    #[test]
    fn test_file_in_root_is_loose() {
        assert_eq!(classify("Severance.S01E01.mkv", "Severance"), EpisodeStatus::LooseRoot);
    }

    #[test]
    fn test_generic_and_release_folders() {
        assert_eq!(
            classify("Downloads/Severance.S01E01.mkv", "Severance"),
            EpisodeStatus::LooseGeneric
        );
        assert_eq!(
            classify("Severance.S01E01.1080p.WEB-DL/Severance.S01E01.mkv", "Severance"),
            EpisodeStatus::LooseGeneric
        );
    }

    #[test]
    fn test_season_folder_directly_in_root() {
        assert_eq!(
            classify("Season 02/Severance.S02E01.mkv", "Severance"),
            EpisodeStatus::LooseSeasonFolder
        );
    }

    #[test]
    fn test_show_folder_match() {
        assert_eq!(
            classify("Breaking Bad (2008)/Season 01/Breaking.Bad.S01E01.mkv", "Breaking Bad"),
            EpisodeStatus::Organized
        );
        assert_eq!(
            classify("The Wire/Season 01/Breaking.Bad.S01E01.mkv", "Breaking Bad"),
            EpisodeStatus::MisnamedFolder
        );
    }
}
