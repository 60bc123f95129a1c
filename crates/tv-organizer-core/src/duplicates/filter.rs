use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::DuplicateGroup;
use crate::config::DuplicateSettings;
use crate::episode::parser::{
    contains_phrase, is_multi_episode, is_release_token, joined_tokens, strip_version_marker, tokenize,
};
use crate::episode::Episode;

/// Terms naming a per-episode subject. Two files sharing an identity but carrying different
/// differentiators are different episodes (documentary series, multi-part specials).
const DIFFERENTIATORS: &[&str] = &[
    "alaska", "boston", "dubai", "tokyo", "hong kong", "iceland", "venice", "transatlantic",
    "panama", "gotthard", "cooper river", "oakland", "tunnel", "bridge", "airport", "stadium",
    "platform", "excavator", "dam", "cable car", "subway", "pyramid", "resort", "barriers",
    "part 1", "part 2", "part i", "part ii", "chapter", "volume", "disc 1", "disc 2", "cd1", "cd2",
];

/// Diagnostics from one filter pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterStats {
    pub groups_checked: usize,
    pub multi_episode_rejections: usize,
    pub content_rejections: usize,
    pub low_confidence_rejections: usize,
    pub accepted: usize,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub groups: Vec<DuplicateGroup>,
    pub stats: FilterStats,
}

enum Verdict {
    MultiEpisode,
    DifferentContent(String),
    Scored(f64),
}

/// Drop groups that are not true duplicates, score the rest and keep those at or above
/// `min_confidence`. Rejected groups are only logged.
pub fn filter_duplicate_groups(
    groups: Vec<DuplicateGroup>,
    settings: &DuplicateSettings,
    min_confidence: f64,
) -> FilterOutcome {
    let mut stats = FilterStats {
        groups_checked: groups.len(),
        ..FilterStats::default()
    };
    let mut accepted = Vec::new();

    for mut group in groups {
        match evaluate(&group, settings) {
            Verdict::MultiEpisode => {
                debug!("Rejected {}: multi-episode file in group", group.identity());
                stats.multi_episode_rejections += 1;
            }
            Verdict::DifferentContent(why) => {
                debug!("Rejected {}: {}", group.identity(), why);
                stats.content_rejections += 1;
            }
            Verdict::Scored(confidence) if confidence < min_confidence => {
                debug!(
                    "Rejected {}: confidence {:.2} below {:.2}",
                    group.identity(),
                    confidence,
                    min_confidence
                );
                stats.low_confidence_rejections += 1;
            }
            Verdict::Scored(confidence) => {
                group.confidence = Some(confidence);
                accepted.push(group);
            }
        }
    }

    stats.accepted = accepted.len();
    info!(
        "Duplicate filter: {} checked, {} accepted ({} multi-episode, {} different content, {} low confidence)",
        stats.groups_checked,
        stats.accepted,
        stats.multi_episode_rejections,
        stats.content_rejections,
        stats.low_confidence_rejections
    );

    FilterOutcome {
        groups: accepted,
        stats,
    }
}

fn evaluate(group: &DuplicateGroup, settings: &DuplicateSettings) -> Verdict {
    let names: Vec<String> = group.episodes.iter().map(Episode::file_name).collect();

    if names.iter().any(|name| is_multi_episode(name)) {
        return Verdict::MultiEpisode;
    }

    let differentiators: Vec<BTreeSet<&str>> = names.iter().map(|n| differentiators_in(n)).collect();
    if differentiators.windows(2).any(|w| w[0] != w[1]) {
        return Verdict::DifferentContent("members name different subjects".to_string());
    }

    let signatures: Vec<BTreeSet<String>> = names.iter().map(|n| content_signature(n)).collect();
    let mut similarities = Vec::new();
    for i in 0..signatures.len() {
        for j in (i + 1)..signatures.len() {
            let similarity = jaccard(&signatures[i], &signatures[j]);
            if similarity < settings.min_signature_similarity {
                return Verdict::DifferentContent(format!(
                    "content similarity {:.2} between '{}' and '{}'",
                    similarity, names[i], names[j]
                ));
            }
            similarities.push(similarity);
        }
    }
    let average_similarity = if similarities.is_empty() {
        1.0
    } else {
        similarities.iter().sum::<f64>() / similarities.len() as f64
    };

    Verdict::Scored(confidence(group, settings, average_similarity))
}

fn confidence(group: &DuplicateGroup, settings: &DuplicateSettings, average_similarity: f64) -> f64 {
    let mut score = settings.base_confidence;
    if group.has_version_markers {
        score += settings.version_marker_bonus;
    }
    score += settings.similarity_weight * average_similarity;
    score += settings.size_weight * size_consistency(&group.episodes);
    score.min(1.0)
}

/// Smallest size over largest size; 1.0 when every file is the same size.
fn size_consistency(episodes: &[Episode]) -> f64 {
    let max = episodes.iter().map(|e| e.size).max().unwrap_or(0);
    let min = episodes.iter().map(|e| e.size).min().unwrap_or(0);
    if max == 0 {
        1.0
    } else {
        min as f64 / max as f64
    }
}

/// Filename tokens with the version marker and release tokens removed.
pub fn content_signature(file_name: &str) -> BTreeSet<String> {
    let stem = std::path::Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    tokenize(strip_version_marker(&stem))
        .into_iter()
        .filter(|t| !is_release_token(t))
        .collect()
}

fn differentiators_in(file_name: &str) -> BTreeSet<&'static str> {
    let joined = joined_tokens(file_name);
    DIFFERENTIATORS
        .iter()
        .copied()
        .filter(|d| contains_phrase(&joined, d))
        .collect()
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
