use ahash::AHashMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use super::{DuplicateGroup, RecommendedAction};
use crate::episode::{Episode, Quality};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Members whose sizes differ by more than this factor get a note (and manual review when
/// no quality is known).
const SIZE_RATIO_WARNING: f64 = 2.0;

/// Release sources ranked best first, for deletion reasons.
const SOURCE_RANKING: &[&str] = &["BluRay", "WEB-DL", "WEBRip", "HDTV", "DVDRip", "WEB", "TS", "CAM"];

/// Aggregate figures for a set of duplicate groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateStatistics {
    pub group_count: usize,
    pub duplicate_files: usize,
    pub removable_files: usize,
    pub total_size_bytes: u64,
    pub space_saved_bytes: u64,
    pub total_size_gb: f64,
    pub space_saved_gb: f64,
    pub space_efficiency_percent: f64,
}

/// Group episodes by identity. Every identity with two or more files becomes a group,
/// returned in identity order.
pub fn detect_duplicates(episodes: &[Episode]) -> Vec<DuplicateGroup> {
    let mut by_identity: AHashMap<String, Vec<&Episode>> = AHashMap::new();
    for episode in episodes {
        by_identity.entry(episode.identity()).or_default().push(episode);
    }

    let mut keys: Vec<&String> = by_identity
        .iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(key, _)| key)
        .collect();
    keys.sort();

    let groups: Vec<DuplicateGroup> = keys
        .into_iter()
        .map(|key| build_group(&by_identity[key]))
        .collect();

    info!(
        "Found {} duplicate groups among {} episodes",
        groups.len(),
        episodes.len()
    );
    groups
}

fn build_group(members: &[&Episode]) -> DuplicateGroup {
    let mut episodes: Vec<Episode> = members.iter().map(|e| (*e).clone()).collect();
    episodes.sort_by(|a, b| a.path.cmp(&b.path));

    let mut notes = Vec::new();
    let first_score = episodes[0].quality_score();
    let all_tied = episodes.iter().all(|e| e.quality_score() == first_score);
    let all_unknown = episodes.iter().all(|e| e.quality == Quality::Unknown);
    let size_ratio = size_ratio(&episodes);

    let (keeper_index, action) = if all_unknown && size_ratio > SIZE_RATIO_WARNING {
        notes.push("No quality markers and sizes differ widely; review manually".to_string());
        (largest_index(&episodes), RecommendedAction::ManualReview)
    } else if all_tied {
        notes.push(format!(
            "All files share quality score {}; keeping the largest file",
            first_score
        ));
        (largest_index(&episodes), RecommendedAction::KeepLargest)
    } else {
        (best_quality_index(&episodes), RecommendedAction::KeepBestQuality)
    };

    notes.extend(analysis_notes(&episodes, size_ratio));

    let keeper = episodes[keeper_index].clone();
    let removals: Vec<Episode> = episodes
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != keeper_index)
        .map(|(_, e)| e.clone())
        .collect();
    let potential_space_saved = removals.iter().map(|e| e.size).sum();

    debug!(
        "Group {}: keeping {} ({} candidates for removal)",
        keeper.identity(),
        keeper.path.display(),
        removals.len()
    );

    DuplicateGroup {
        show_name: keeper.show_name.clone(),
        season: keeper.season,
        episode: keeper.episode,
        has_version_markers: episodes.iter().any(|e| e.version_marker().is_some()),
        episodes,
        keeper,
        removals,
        recommended_action: action,
        potential_space_saved,
        analysis_notes: notes,
        confidence: None,
    }
}

/// Largest file; the first one wins a size tie.
fn largest_index(episodes: &[Episode]) -> usize {
    let mut best = 0;
    for (i, episode) in episodes.iter().enumerate() {
        if episode.size > episodes[best].size {
            best = i;
        }
    }
    best
}

/// Highest quality score, then largest size; the first one wins a full tie.
fn best_quality_index(episodes: &[Episode]) -> usize {
    let mut best = 0;
    for (i, episode) in episodes.iter().enumerate() {
        let current = &episodes[best];
        let better = (episode.quality_score(), episode.size) > (current.quality_score(), current.size);
        if better {
            best = i;
        }
    }
    best
}

fn size_ratio(episodes: &[Episode]) -> f64 {
    let max = episodes.iter().map(|e| e.size).max().unwrap_or(0);
    let min = episodes.iter().map(|e| e.size).min().unwrap_or(0);
    if min == 0 {
        return if max == 0 { 1.0 } else { f64::INFINITY };
    }
    max as f64 / min as f64
}

fn analysis_notes(episodes: &[Episode], size_ratio: f64) -> Vec<String> {
    let mut notes = Vec::new();

    let qualities: BTreeSet<Quality> = episodes.iter().map(|e| e.quality).collect();
    if qualities.len() > 1 {
        let labels: Vec<&str> = qualities.iter().map(|q| q.label()).collect();
        notes.push(format!("Quality variations: {}", labels.join(", ")));
    }

    let sources: BTreeSet<&str> = episodes.iter().filter_map(|e| e.source.as_deref()).collect();
    if sources.len() > 1 {
        let labels: Vec<&str> = sources.into_iter().collect();
        notes.push(format!("Source variations: {}", labels.join(", ")));
    }

    if size_ratio > SIZE_RATIO_WARNING {
        let min = episodes.iter().map(|e| e.size_mb()).fold(f64::INFINITY, f64::min);
        let max = episodes.iter().map(|e| e.size_mb()).fold(0.0, f64::max);
        notes.push(format!("Significant size difference: {:.1} MB to {:.1} MB", min, max));
    }

    let folders: BTreeSet<&Path> = episodes.iter().map(|e| e.parent_dir()).collect();
    if folders.len() > 1 {
        notes.push(format!("Files spread across {} folders", folders.len()));
    }

    notes
}

/// Why `removal` is a deletion candidate next to `keeper`.
pub fn deletion_reason(removal: &Episode, keeper: &Episode) -> String {
    if removal.quality < keeper.quality {
        return format!("Lower quality ({} vs {})", removal.quality, keeper.quality);
    }
    if removal.size < keeper.size {
        return format!(
            "Smaller file ({:.1} MB vs {:.1} MB)",
            removal.size_mb(),
            keeper.size_mb()
        );
    }
    if let (Some(removed), Some(kept)) = (&removal.source, &keeper.source) {
        if source_rank(removed) > source_rank(kept) {
            return format!("Lower-quality source ({} vs {})", removed, kept);
        }
    }
    format!("Duplicate of {}", keeper.file_name())
}

/// Position in the source ranking; unknown sources rank last.
fn source_rank(source: &str) -> usize {
    SOURCE_RANKING
        .iter()
        .position(|s| *s == source)
        .unwrap_or(SOURCE_RANKING.len())
}

pub fn duplicate_statistics(groups: &[DuplicateGroup]) -> DuplicateStatistics {
    let total_size_bytes: u64 = groups.iter().map(|g| g.total_size()).sum();
    let space_saved_bytes: u64 = groups.iter().map(|g| g.potential_space_saved).sum();
    let space_efficiency_percent = if total_size_bytes == 0 {
        0.0
    } else {
        space_saved_bytes as f64 / total_size_bytes as f64 * 100.0
    };

    DuplicateStatistics {
        group_count: groups.len(),
        duplicate_files: groups.iter().map(|g| g.file_count()).sum(),
        removable_files: groups.iter().map(|g| g.removals.len()).sum(),
        total_size_bytes,
        space_saved_bytes,
        total_size_gb: total_size_bytes as f64 / GIB,
        space_saved_gb: space_saved_bytes as f64 / GIB,
        space_efficiency_percent,
    }
}

/// Groups whose show name contains `show` (case-insensitive).
pub fn groups_for_show<'a>(groups: &'a [DuplicateGroup], show: &str) -> Vec<&'a DuplicateGroup> {
    let needle = show.to_lowercase();
    groups
        .iter()
        .filter(|g| g.show_name.to_lowercase().contains(&needle))
        .collect()
}
