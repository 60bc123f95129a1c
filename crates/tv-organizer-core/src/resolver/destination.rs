use serde::Serialize;
use std::path::{Path, PathBuf};

use super::show_directory::ShowDirectory;
use crate::config::{ResolverSettings, RootWeights, ScoringWeights};
use crate::episode::Episode;
use crate::platform::SpaceProbe;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Free-space buckets in GB, best first. Below the last bucket scores 0.
const SPACE_BUCKETS: &[(f64, f64)] = &[(100.0, 100.0), (50.0, 80.0), (20.0, 60.0), (10.0, 40.0), (5.0, 20.0)];
const UNKNOWN_SPACE_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    ShowRoot,
    SeasonFolder,
}

/// Component scores for one kind of placement: (match, organization, proximity).
struct Profile {
    match_score: f64,
    organization: f64,
    proximity: f64,
}

const EXISTING_SEASON_FOLDER: Profile = Profile {
    match_score: 90.0,
    organization: 80.0,
    proximity: 90.0,
};
const NEW_SEASON_FOLDER: Profile = Profile {
    match_score: 85.0,
    organization: 85.0,
    proximity: 95.0,
};
const MIXED_SHOW_ROOT: Profile = Profile {
    match_score: 75.0,
    organization: 60.0,
    proximity: 80.0,
};
const NEW_SHOW_SEASON_FOLDER: Profile = Profile {
    match_score: 80.0,
    organization: 90.0,
    proximity: 50.0,
};
const NEW_SHOW_ROOT: Profile = Profile {
    match_score: 75.0,
    organization: 70.0,
    proximity: 50.0,
};

/// One candidate placement for a set of episodes.
#[derive(Debug, Clone, Serialize)]
pub struct PathDestination {
    pub path: PathBuf,
    pub kind: DestinationKind,
    pub season: Option<u32>,
    pub match_score: f64,
    pub organization_score: f64,
    pub space_score: f64,
    pub proximity_score: f64,
    pub total_score: f64,
    pub requires_creation: bool,
    pub available_space_bytes: Option<u64>,
    pub conflicts: Vec<String>,
}

impl PathDestination {
    fn new(
        path: PathBuf,
        kind: DestinationKind,
        season: Option<u32>,
        profile: &Profile,
        available_space_bytes: Option<u64>,
        weights: &ScoringWeights,
    ) -> Self {
        let space_score = space_score(available_space_bytes);
        Self {
            requires_creation: !path.is_dir(),
            path,
            kind,
            season,
            match_score: profile.match_score,
            organization_score: profile.organization,
            space_score,
            proximity_score: profile.proximity,
            total_score: total_score(
                profile.match_score,
                profile.organization,
                space_score,
                profile.proximity,
                weights,
            ),
            available_space_bytes,
            conflicts: Vec::new(),
        }
    }

    pub fn available_space_gb(&self) -> Option<f64> {
        self.available_space_bytes.map(|b| b as f64 / GIB)
    }

    /// Record conflicts for moving `episodes` here: name clashes and insufficient space.
    fn check_conflicts(&mut self, episodes: &[Episode], min_free_space_gb: f64) {
        for episode in episodes {
            let target = self.path.join(episode.file_name());
            if target.exists() && target != episode.path {
                self.conflicts
                    .push(format!("File already exists at destination: {}", target.display()));
            }
        }

        if let Some(available) = self.available_space_bytes {
            let needed: u64 = episodes.iter().map(|e| e.size).sum();
            let required = needed as f64 + min_free_space_gb * GIB;
            if (available as f64) < required {
                self.conflicts.push(format!(
                    "Insufficient space: {:.1} GB available, {:.1} GB required",
                    available as f64 / GIB,
                    required / GIB
                ));
            }
        }
    }
}

/// Free-space score from the bucket table; unknown space scores a neutral 50.
pub fn space_score(available_bytes: Option<u64>) -> f64 {
    let Some(bytes) = available_bytes else {
        return UNKNOWN_SPACE_SCORE;
    };
    let gb = bytes as f64 / GIB;
    SPACE_BUCKETS
        .iter()
        .find(|(min_gb, _)| gb >= *min_gb)
        .map(|(_, score)| *score)
        .unwrap_or(0.0)
}

/// Weighted blend of the four component scores, always within 0..=100.
pub fn total_score(
    match_score: f64,
    organization: f64,
    space: f64,
    proximity: f64,
    weights: &ScoringWeights,
) -> f64 {
    let weight_sum = weights.name_match + weights.organization + weights.space + weights.proximity;
    if weight_sum <= 0.0 {
        return 0.0;
    }
    let weighted = match_score.clamp(0.0, 100.0) * weights.name_match
        + organization.clamp(0.0, 100.0) * weights.organization
        + space.clamp(0.0, 100.0) * weights.space
        + proximity.clamp(0.0, 100.0) * weights.proximity;
    (weighted / weight_sum).clamp(0.0, 100.0)
}

/// Candidate destinations inside an existing show for one season, best first.
///
/// The existing season folder is offered when there is one, a new season folder otherwise,
/// and the show root only when the show already mixes loose and foldered episodes.
pub fn show_destinations(
    show: &ShowDirectory,
    season: u32,
    episodes: &[Episode],
    settings: &ResolverSettings,
    probe: &dyn SpaceProbe,
) -> Vec<PathDestination> {
    let available = probe.available_bytes(&show.path);
    let weights = &settings.weights;
    let mut destinations = Vec::new();

    match show.season_folder(season) {
        Some(folder) => destinations.push(PathDestination::new(
            folder.to_path_buf(),
            DestinationKind::SeasonFolder,
            Some(season),
            &EXISTING_SEASON_FOLDER,
            available,
            weights,
        )),
        None => destinations.push(PathDestination::new(
            show.path.join(season_folder_name(season)),
            DestinationKind::SeasonFolder,
            Some(season),
            &NEW_SEASON_FOLDER,
            available,
            weights,
        )),
    }

    if show.has_mixed_structure {
        destinations.push(PathDestination::new(
            show.path.clone(),
            DestinationKind::ShowRoot,
            None,
            &MIXED_SHOW_ROOT,
            available,
            weights,
        ));
    }

    for destination in destinations.iter_mut() {
        destination.check_conflicts(episodes, settings.min_free_space_gb);
    }
    destinations.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    destinations
}

/// Destination for a show with no folder yet: `root/Show Name/Season NN` when the episodes
/// span one season, the new show folder itself otherwise.
pub fn new_show_destination(
    root: &Path,
    show_name: &str,
    episodes: &[Episode],
    settings: &ResolverSettings,
    probe: &dyn SpaceProbe,
) -> PathDestination {
    let show_path = root.join(show_name);
    let available = probe.available_bytes(root);
    let first_season = episodes.first().map(|e| e.season);
    let single_season = episodes.iter().all(|e| Some(e.season) == first_season);

    let mut destination = match (single_season, first_season) {
        (true, Some(season)) => PathDestination::new(
            show_path.join(season_folder_name(season)),
            DestinationKind::SeasonFolder,
            Some(season),
            &NEW_SHOW_SEASON_FOLDER,
            available,
            &settings.weights,
        ),
        _ => PathDestination::new(
            show_path,
            DestinationKind::ShowRoot,
            None,
            &NEW_SHOW_ROOT,
            available,
            &settings.weights,
        ),
    };
    destination.check_conflicts(episodes, settings.min_free_space_gb);
    destination
}

/// Pick the TV root for a new show: free space, how many shows it already holds, and the
/// configured order. Missing roots are skipped; the first root is the fallback.
pub fn choose_root_for_new_show(
    roots: &[PathBuf],
    shows: &[ShowDirectory],
    weights: &RootWeights,
    probe: &dyn SpaceProbe,
) -> Option<PathBuf> {
    let mut best: Option<(f64, &PathBuf)> = None;

    for (index, root) in roots.iter().enumerate() {
        if !root.is_dir() {
            continue;
        }
        let show_count = shows.iter().filter(|s| &s.tv_root == root).count();
        let score = space_score(probe.available_bytes(root)) * weights.space
            + (show_count as f64 * 5.0).min(100.0) * weights.show_count
            + (100.0 - index as f64 * 20.0).max(0.0) * weights.preference;
        if best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, root));
        }
    }

    best.map(|(_, root)| root.clone())
        .or_else(|| roots.first().cloned())
}

pub fn season_folder_name(season: u32) -> String {
    format!("Season {:02}", season)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_space_buckets() {
        assert_eq!(space_score(Some(150 * GB)), 100.0);
        assert_eq!(space_score(Some(100 * GB)), 100.0);
        assert_eq!(space_score(Some(60 * GB)), 80.0);
        assert_eq!(space_score(Some(25 * GB)), 60.0);
        assert_eq!(space_score(Some(10 * GB)), 40.0);
        assert_eq!(space_score(Some(7 * GB)), 20.0);
        assert_eq!(space_score(Some(GB)), 0.0);
        assert_eq!(space_score(None), 50.0);
    }

    #[test]
    fn test_total_score_stays_in_range() {
        let weights = ScoringWeights::default();
        let samples = [0.0, 12.5, 50.0, 99.9, 100.0];
        for m in samples {
            for o in samples {
                for s in samples {
                    for p in samples {
                        let total = total_score(m, o, s, p, &weights);
                        assert!((0.0..=100.0).contains(&total));
                    }
                }
            }
        }
        assert!((total_score(100.0, 100.0, 100.0, 100.0, &weights) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_weights_blend() {
        let weights = ScoringWeights::default();
        let total = total_score(85.0, 85.0, 100.0, 95.0, &weights);
        assert!((total - 89.0).abs() < 1e-9);
    }
}
