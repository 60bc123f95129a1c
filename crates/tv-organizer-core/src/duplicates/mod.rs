//! Duplicate episode detection.
//!
//! [`detector`] groups scanned episodes by identity and picks a keeper per group.
//! [`filter`] rejects groups whose members are really different content and scores the rest.

pub mod detector;
pub mod filter;

use serde::Serialize;
use std::fmt;

use crate::episode::Episode;

pub use detector::{
    deletion_reason, detect_duplicates, duplicate_statistics, groups_for_show, DuplicateStatistics,
};
pub use filter::{filter_duplicate_groups, FilterOutcome, FilterStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    KeepLargest,
    KeepBestQuality,
    ManualReview,
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecommendedAction::KeepLargest => "keep largest",
            RecommendedAction::KeepBestQuality => "keep best quality",
            RecommendedAction::ManualReview => "manual review",
        };
        f.write_str(label)
    }
}

/// Two or more files sharing one episode identity.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub show_name: String,
    pub season: u32,
    pub episode: u32,
    /// Every member, ordered by path.
    pub episodes: Vec<Episode>,
    pub keeper: Episode,
    pub removals: Vec<Episode>,
    pub recommended_action: RecommendedAction,
    pub potential_space_saved: u64,
    pub analysis_notes: Vec<String>,
    /// Set by the enhanced filter.
    pub confidence: Option<f64>,
    pub has_version_markers: bool,
}

impl DuplicateGroup {
    pub fn total_size(&self) -> u64 {
        self.episodes.iter().map(|e| e.size).sum()
    }

    pub fn file_count(&self) -> usize {
        self.episodes.len()
    }

    pub fn identity(&self) -> String {
        self.keeper.identity()
    }
}
