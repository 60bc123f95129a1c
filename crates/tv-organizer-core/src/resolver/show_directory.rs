use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::episode::parser::{
    comparable_name, is_generic_folder, parse_episode_name, season_folder_number,
};
use crate::episode::{Episode, EpisodeStatus};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// An existing show folder under a TV root.
#[derive(Debug, Clone, Serialize)]
pub struct ShowDirectory {
    pub path: PathBuf,
    pub actual_name: String,
    /// Comparison form of `actual_name`.
    pub normalized_name: String,
    pub tv_root: PathBuf,
    pub season_folders: BTreeMap<u32, PathBuf>,
    pub seasons_present: BTreeSet<u32>,
    /// Episodes sitting directly in the show folder.
    pub loose_episodes: Vec<Episode>,
    pub total_episodes: usize,
    /// Episodes inside a season folder.
    pub organized_episodes: usize,
    pub total_size: u64,
    /// Both loose and season-foldered episodes are present.
    pub has_mixed_structure: bool,
    pub organization_score: f64,
}

impl ShowDirectory {
    pub fn season_folder(&self, season: u32) -> Option<&Path> {
        self.season_folders.get(&season).map(PathBuf::as_path)
    }

    pub fn total_size_gb(&self) -> f64 {
        self.total_size as f64 / GIB
    }
}

/// Every show folder under `roots`, analysed in parallel and returned sorted by path.
/// A folder only counts when it holds at least one episode.
pub fn discover_show_directories(roots: &[PathBuf], config: &AppConfig) -> Vec<ShowDirectory> {
    let candidates: Vec<(PathBuf, PathBuf)> = roots
        .iter()
        .flat_map(|root| {
            let entries = match fs::read_dir(root) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!("Cannot read TV directory {}: {}", root.display(), err);
                    return Vec::new();
                }
            };
            entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.is_dir() && !is_hidden(p))
                .map(|p| (root.clone(), p))
                .collect::<Vec<_>>()
        })
        .collect();

    let mut shows: Vec<ShowDirectory> = candidates
        .par_iter()
        .filter_map(|(root, path)| analyze_show_directory(path, root, config))
        .collect();
    shows.sort_by(|a, b| a.path.cmp(&b.path));

    debug!("Discovered {} show directories", shows.len());
    shows
}

/// Inspect one candidate folder. `None` when it holds no episodes.
pub fn analyze_show_directory(path: &Path, root: &Path, config: &AppConfig) -> Option<ShowDirectory> {
    let actual_name = path.file_name()?.to_string_lossy().into_owned();
    // Season, download and per-release folders directly under a root hold loose episodes.
    if season_folder_number(&actual_name).is_some()
        || is_generic_folder(&actual_name)
        || parse_episode_name(&actual_name).is_some()
    {
        return None;
    }

    let mut loose_episodes = Vec::new();
    let mut foldered_episodes = Vec::new();
    let mut season_folders = BTreeMap::new();
    let mut seasons_present = BTreeSet::new();

    for entry in fs::read_dir(path).ok()?.filter_map(Result::ok) {
        let item = entry.path();
        if is_hidden(&item) {
            continue;
        }
        if item.is_file() {
            if let Some(episode) = read_episode(&item, config) {
                seasons_present.insert(episode.season);
                loose_episodes.push(episode);
            }
        } else if item.is_dir() {
            let Some(season) = item
                .file_name()
                .and_then(|n| season_folder_number(&n.to_string_lossy()))
            else {
                continue;
            };
            seasons_present.insert(season);
            let Ok(files) = fs::read_dir(&item) else {
                continue;
            };
            for file in files.filter_map(Result::ok).map(|e| e.path()) {
                if let Some(episode) = read_episode(&file, config) {
                    seasons_present.insert(episode.season);
                    foldered_episodes.push(episode);
                }
            }
            season_folders.insert(season, item);
        }
    }

    let total_episodes = loose_episodes.len() + foldered_episodes.len();
    if total_episodes == 0 {
        return None;
    }

    let total_size: u64 = loose_episodes
        .iter()
        .chain(foldered_episodes.iter())
        .map(|e| e.size)
        .sum();
    let has_mixed_structure = !loose_episodes.is_empty() && !foldered_episodes.is_empty();

    let mut show = ShowDirectory {
        path: path.to_path_buf(),
        normalized_name: comparable_name(&actual_name),
        actual_name,
        tv_root: root.to_path_buf(),
        season_folders,
        seasons_present,
        loose_episodes,
        total_episodes,
        organized_episodes: foldered_episodes.len(),
        total_size,
        has_mixed_structure,
        organization_score: 0.0,
    };
    show.organization_score =
        organization_score(&show, config.resolver.min_content_size_gb);
    Some(show)
}

/// 40 points for the share of episodes in season folders, 30 for a consistent layout,
/// 20 for season coverage up to the highest season seen, 10 for holding real content.
pub fn organization_score(show: &ShowDirectory, min_content_size_gb: f64) -> f64 {
    if show.total_episodes == 0 {
        return 0.0;
    }

    let mut score = 40.0 * show.organized_episodes as f64 / show.total_episodes as f64;

    if !show.has_mixed_structure {
        score += 30.0;
    }

    if let Some(&max_season) = show.seasons_present.iter().next_back() {
        let expected = max_season.max(1) as f64;
        score += 20.0 * (show.seasons_present.len() as f64 / expected).min(1.0);
    }

    if show.total_size_gb() > min_content_size_gb {
        score += 10.0;
    }

    score.min(100.0)
}

fn read_episode(path: &Path, config: &AppConfig) -> Option<Episode> {
    if !config.is_video_extension(path) {
        return None;
    }
    let size = fs::metadata(path).ok()?.len();
    Episode::from_file(path, size, EpisodeStatus::Organized)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}
