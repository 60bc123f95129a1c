//! Path resolution for loose episodes.
//!
//! Discovers the show folders already present under each TV root, matches every loose
//! episode's show against them, and scores where its files should go.

pub mod destination;
pub mod matching;
pub mod show_directory;

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{AppConfig, ConfidenceRule, ConfidenceThresholds};
use crate::episode::parser::comparable_name;
use crate::episode::{Episode, EpisodeStatus};
use crate::platform::SpaceProbe;

pub use destination::{DestinationKind, PathDestination};
pub use matching::{find_matching_shows, name_similarity, ShowMatch};
pub use show_directory::{discover_show_directories, ShowDirectory};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const SECONDS_PER_EXISTING_SHOW_MOVE: f64 = 2.0;
const SECONDS_PER_NEW_SHOW_MOVE: f64 = 3.0;
/// Shows scoring below this are reported as needing attention.
const ATTENTION_SCORE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    MoveToExistingShow,
    CreateNewShow,
    NoAction,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResolutionKind::MoveToExistingShow => "move to existing show",
            ResolutionKind::CreateNewShow => "create new show",
            ResolutionKind::NoAction => "no action",
        };
        f.write_str(label)
    }
}

/// Ordered lowest to highest so levels compare naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Uncertain,
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Weight used when ordering a plan for execution.
    pub fn score(self) -> f64 {
        match self {
            ConfidenceLevel::High => 100.0,
            ConfidenceLevel::Medium => 75.0,
            ConfidenceLevel::Low => 50.0,
            ConfidenceLevel::Uncertain => 25.0,
        }
    }

    pub fn for_existing_show(similarity: f64, score: f64, thresholds: &ConfidenceThresholds) -> Self {
        let meets = |rule: &ConfidenceRule| {
            similarity >= rule.min_similarity && score >= rule.min_score
        };
        if meets(&thresholds.high) {
            ConfidenceLevel::High
        } else if meets(&thresholds.medium) {
            ConfidenceLevel::Medium
        } else if meets(&thresholds.low) {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::Uncertain
        }
    }

    /// New shows never rise above medium.
    pub fn for_new_show(score: f64, thresholds: &ConfidenceThresholds) -> Self {
        if score >= thresholds.new_show_medium_score {
            ConfidenceLevel::Medium
        } else if score >= thresholds.new_show_low_score {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::Uncertain
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Uncertain => "uncertain",
        };
        f.write_str(label)
    }
}

/// A proposed relocation of one show's loose episodes for one season.
#[derive(Debug, Clone, Serialize)]
pub struct PathResolution {
    pub episodes: Vec<Episode>,
    pub kind: ResolutionKind,
    pub show_name: String,
    pub season: u32,
    pub primary_destination: Option<PathDestination>,
    pub alternative_destinations: Vec<PathDestination>,
    pub matched_show: Option<PathBuf>,
    pub name_similarity: Option<f64>,
    pub confidence: ConfidenceLevel,
    pub reasoning: Vec<String>,
    pub warnings: Vec<String>,
    pub blocking_issues: Vec<String>,
    pub requires_user_confirmation: bool,
    pub estimated_time_seconds: f64,
    pub estimated_space_needed_gb: f64,
}

impl PathResolution {
    fn new(episodes: Vec<Episode>, kind: ResolutionKind, show_name: String, season: u32) -> Self {
        let estimated_space_needed_gb = episodes.iter().map(|e| e.size_gb()).sum();
        Self {
            episodes,
            kind,
            show_name,
            season,
            primary_destination: None,
            alternative_destinations: Vec::new(),
            matched_show: None,
            name_similarity: None,
            confidence: ConfidenceLevel::Uncertain,
            reasoning: Vec::new(),
            warnings: Vec::new(),
            blocking_issues: Vec::new(),
            requires_user_confirmation: false,
            estimated_time_seconds: 0.0,
            estimated_space_needed_gb,
        }
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    pub fn total_size(&self) -> u64 {
        self.episodes.iter().map(|e| e.size).sum()
    }

    pub fn total_size_gb(&self) -> f64 {
        self.total_size() as f64 / GIB
    }

    /// Has a destination, nothing blocking it, and at least medium confidence.
    pub fn is_executable(&self) -> bool {
        self.primary_destination.is_some()
            && self.blocking_issues.is_empty()
            && self.confidence >= ConfidenceLevel::Medium
    }

    pub fn summary(&self) -> String {
        format!(
            "{} Season {} ({} episodes, {:.1}GB)",
            self.show_name,
            self.season,
            self.episode_count(),
            self.total_size_gb()
        )
    }

    /// Copy destination conflicts into warnings; any conflict blocks the move.
    fn absorb_conflicts(&mut self) {
        let Some(destination) = &self.primary_destination else {
            return;
        };
        if !destination.conflicts.is_empty() {
            self.warnings.extend(destination.conflicts.iter().cloned());
            self.blocking_issues.extend(destination.conflicts.iter().cloned());
            self.requires_user_confirmation = true;
        }
    }
}

/// Overview of the TV roots for reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectoryStatistics {
    pub show_count: usize,
    pub total_episodes: usize,
    pub organized_episodes: usize,
    pub loose_episodes: usize,
    pub organization_percent: f64,
    pub average_organization_score: f64,
    pub shows_per_root: BTreeMap<String, usize>,
    pub shows_needing_attention: usize,
}

/// Resolves loose episodes against the show folders found under the TV roots.
pub struct PathResolver<'a> {
    config: &'a AppConfig,
    roots: Vec<PathBuf>,
    probe: &'a dyn SpaceProbe,
    shows: Vec<ShowDirectory>,
}

impl<'a> PathResolver<'a> {
    /// Discover the show folders under `roots`.
    pub fn new(config: &'a AppConfig, roots: Vec<PathBuf>, probe: &'a dyn SpaceProbe) -> Self {
        let shows = discover_show_directories(&roots, config);
        info!(
            "Found {} show directories across {} TV roots",
            shows.len(),
            roots.len()
        );
        Self {
            config,
            roots,
            probe,
            shows,
        }
    }

    pub fn shows(&self) -> &[ShowDirectory] {
        &self.shows
    }

    pub fn find_show_matches(&self, show_name: &str) -> Vec<ShowMatch<'_>> {
        find_matching_shows(
            show_name,
            &self.shows,
            self.config.resolver.similarity_threshold,
        )
    }

    /// One resolution per (show, season) among the episodes that need relocating.
    pub fn resolve(&self, episodes: &[Episode]) -> Vec<PathResolution> {
        let mut by_show: BTreeMap<String, Vec<Episode>> = BTreeMap::new();
        for episode in episodes.iter().filter(|e| e.status.needs_resolution()) {
            by_show
                .entry(comparable_name(&episode.show_name))
                .or_default()
                .push(episode.clone());
        }
        info!("{} shows have episodes needing path resolution", by_show.len());

        let groups: Vec<Vec<Episode>> = by_show.into_values().collect();
        groups
            .par_iter()
            .flat_map_iter(|show_episodes| self.resolve_show(show_episodes))
            .collect()
    }

    fn resolve_show(&self, episodes: &[Episode]) -> Vec<PathResolution> {
        let Some(sample) = episodes.first() else {
            return Vec::new();
        };
        let matches = self.find_show_matches(&sample.show_name);

        let mut by_season: BTreeMap<u32, Vec<Episode>> = BTreeMap::new();
        for episode in episodes {
            by_season.entry(episode.season).or_default().push(episode.clone());
        }

        by_season
            .into_iter()
            .map(|(season, season_episodes)| match matches.first() {
                Some(best) => self.existing_show_resolution(season_episodes, season, best),
                None => self.new_show_resolution(season_episodes, season),
            })
            .collect()
    }

    fn existing_show_resolution(
        &self,
        episodes: Vec<Episode>,
        season: u32,
        best: &ShowMatch<'_>,
    ) -> PathResolution {
        let settings = &self.config.resolver;
        let show = best.show;
        let mut destinations =
            destination::show_destinations(show, season, &episodes, settings, self.probe);

        let mut resolution = PathResolution::new(
            episodes,
            ResolutionKind::MoveToExistingShow,
            show.actual_name.clone(),
            season,
        );
        resolution.matched_show = Some(show.path.clone());
        resolution.name_similarity = Some(best.similarity);

        if destinations.is_empty() {
            resolution
                .blocking_issues
                .push("No destination available in show directory".to_string());
            return resolution;
        }
        let primary = destinations.remove(0);
        resolution.confidence =
            ConfidenceLevel::for_existing_show(best.similarity, primary.total_score, &settings.confidence);
        resolution.reasoning.push(format!(
            "Found existing show directory: {}",
            show.actual_name
        ));
        resolution
            .reasoning
            .push(format!("Show name similarity: {:.1}%", best.similarity * 100.0));
        resolution
            .reasoning
            .push(format!("Destination score: {:.1}", primary.total_score));
        resolution.primary_destination = Some(primary);
        resolution.alternative_destinations = destinations;
        resolution.absorb_conflicts();
        resolution.estimated_time_seconds =
            resolution.episode_count() as f64 * SECONDS_PER_EXISTING_SHOW_MOVE;

        debug!(
            "{} -> {} ({})",
            resolution.summary(),
            show.path.display(),
            resolution.confidence
        );
        resolution
    }

    fn new_show_resolution(&self, episodes: Vec<Episode>, season: u32) -> PathResolution {
        let settings = &self.config.resolver;
        let show_name = episodes
            .first()
            .map(|e| e.show_name.clone())
            .unwrap_or_default();
        let mut resolution =
            PathResolution::new(episodes, ResolutionKind::CreateNewShow, show_name.clone(), season);
        resolution.requires_user_confirmation = true;

        let Some(root) = destination::choose_root_for_new_show(
            &self.roots,
            &self.shows,
            &settings.root_weights,
            self.probe,
        ) else {
            resolution.kind = ResolutionKind::NoAction;
            resolution
                .blocking_issues
                .push("No TV directory available for a new show".to_string());
            return resolution;
        };

        let primary = destination::new_show_destination(
            &root,
            &show_name,
            &resolution.episodes,
            settings,
            self.probe,
        );
        resolution.confidence = ConfidenceLevel::for_new_show(primary.total_score, &settings.confidence);
        resolution
            .reasoning
            .push(format!("No existing show directory found for: {}", show_name));
        resolution
            .reasoning
            .push(format!("Will create new show directory in: {}", root.display()));
        resolution
            .reasoning
            .push(format!("Destination score: {:.1}", primary.total_score));
        resolution.primary_destination = Some(primary);
        resolution.absorb_conflicts();
        resolution.estimated_time_seconds =
            resolution.episode_count() as f64 * SECONDS_PER_NEW_SHOW_MOVE;
        resolution
    }

    pub fn directory_statistics(&self, episodes: &[Episode]) -> DirectoryStatistics {
        let organized_episodes = episodes
            .iter()
            .filter(|e| e.status == EpisodeStatus::Organized)
            .count();
        let loose_episodes = episodes
            .iter()
            .filter(|e| e.status.needs_resolution())
            .count();
        let organization_percent = if episodes.is_empty() {
            0.0
        } else {
            organized_episodes as f64 / episodes.len() as f64 * 100.0
        };
        let average_organization_score = if self.shows.is_empty() {
            0.0
        } else {
            self.shows.iter().map(|s| s.organization_score).sum::<f64>() / self.shows.len() as f64
        };

        let mut shows_per_root: BTreeMap<String, usize> = self
            .roots
            .iter()
            .map(|r| (r.display().to_string(), 0))
            .collect();
        for show in &self.shows {
            *shows_per_root
                .entry(show.tv_root.display().to_string())
                .or_insert(0) += 1;
        }

        DirectoryStatistics {
            show_count: self.shows.len(),
            total_episodes: episodes.len(),
            organized_episodes,
            loose_episodes,
            organization_percent,
            average_organization_score,
            shows_per_root,
            shows_needing_attention: self
                .shows
                .iter()
                .filter(|s| s.organization_score < ATTENTION_SCORE)
                .count(),
        }
    }

    /// Shows scoring below the attention threshold, worst first.
    pub fn shows_needing_attention(&self) -> Vec<&ShowDirectory> {
        let mut shows: Vec<&ShowDirectory> = self
            .shows
            .iter()
            .filter(|s| s.organization_score < ATTENTION_SCORE)
            .collect();
        shows.sort_by(|a, b| a.organization_score.total_cmp(&b.organization_score));
        shows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_show_confidence_levels() {
        let t = ConfidenceThresholds::default();
        assert_eq!(ConfidenceLevel::for_existing_show(1.0, 85.0, &t), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::for_existing_show(0.9, 85.0, &t), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::for_existing_show(1.0, 70.0, &t), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::for_existing_show(0.82, 45.0, &t), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::for_existing_show(1.0, 30.0, &t), ConfidenceLevel::Uncertain);
    }

    #[test]
    fn test_new_show_confidence_caps_at_medium() {
        let t = ConfidenceThresholds::default();
        assert_eq!(ConfidenceLevel::for_new_show(100.0, &t), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::for_new_show(65.0, &t), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::for_new_show(10.0, &t), ConfidenceLevel::Uncertain);
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(ConfidenceLevel::High > ConfidenceLevel::Medium);
        assert!(ConfidenceLevel::Low > ConfidenceLevel::Uncertain);
    }
}
