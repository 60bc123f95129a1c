use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::platform;
use crate::progress::ProgressReporter;
use crate::resolver::{ConfidenceLevel, PathResolution};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const CONFIDENCE_WEIGHT: f64 = 0.7;
const SIZE_WEIGHT: f64 = 0.3;

/// A batch of resolutions with an execution order and plan-wide counts.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionPlan {
    pub resolutions: Vec<PathResolution>,
    /// Indices into `resolutions`, first to execute first.
    pub execution_order: Vec<usize>,
    pub total_episodes: usize,
    pub total_size_gb: f64,
    pub estimated_duration_minutes: f64,
    pub high_confidence_count: usize,
    pub medium_confidence_count: usize,
    pub low_confidence_count: usize,
    pub uncertain_count: usize,
    pub requires_review: bool,
}

impl ResolutionPlan {
    pub fn new(resolutions: Vec<PathResolution>) -> Self {
        let execution_order = execution_order(&resolutions);
        let count = |level: ConfidenceLevel| {
            resolutions
                .iter()
                .filter(|r| r.confidence == level)
                .count()
        };

        let high_confidence_count = count(ConfidenceLevel::High);
        let medium_confidence_count = count(ConfidenceLevel::Medium);
        let low_confidence_count = count(ConfidenceLevel::Low);
        let uncertain_count = count(ConfidenceLevel::Uncertain);
        let requires_review = low_confidence_count > 0
            || uncertain_count > 0
            || resolutions.iter().any(|r| r.requires_user_confirmation);

        Self {
            total_episodes: resolutions.iter().map(|r| r.episode_count()).sum(),
            total_size_gb: resolutions.iter().map(|r| r.total_size_gb()).sum(),
            estimated_duration_minutes: resolutions
                .iter()
                .map(|r| r.estimated_time_seconds)
                .sum::<f64>()
                / 60.0,
            resolutions,
            execution_order,
            high_confidence_count,
            medium_confidence_count,
            low_confidence_count,
            uncertain_count,
            requires_review,
        }
    }

    pub fn executable_resolutions(&self) -> Vec<&PathResolution> {
        self.resolutions.iter().filter(|r| r.is_executable()).collect()
    }

    /// Executable resolutions at or above `min_level`, in execution order.
    pub fn executable_at(&self, min_level: ConfidenceLevel) -> Vec<&PathResolution> {
        self.ordered()
            .filter(|r| r.is_executable() && r.confidence >= min_level)
            .collect()
    }

    /// Share of resolutions that can run, as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.resolutions.is_empty() {
            return 0.0;
        }
        self.executable_resolutions().len() as f64 / self.resolutions.len() as f64 * 100.0
    }

    /// Resolutions in execution order.
    pub fn ordered(&self) -> impl Iterator<Item = &PathResolution> {
        self.execution_order.iter().map(|&i| &self.resolutions[i])
    }

    pub fn summary(&self) -> String {
        format!(
            "Resolution Plan: {}/{} executable ({} episodes, {:.1}GB, {:.1}% success rate)",
            self.executable_resolutions().len(),
            self.resolutions.len(),
            self.total_episodes,
            self.total_size_gb,
            self.success_rate()
        )
    }
}

/// Confidence score weighted 70% plus an inverse-size score weighted 30%, highest first.
/// Ties keep their original order.
pub fn execution_order(resolutions: &[PathResolution]) -> Vec<usize> {
    let scores: Vec<f64> = resolutions
        .iter()
        .map(|r| {
            let size_score = (100.0 - r.total_size() as f64 / GIB).max(0.0);
            r.confidence.score() * CONFIDENCE_WEIGHT + size_score * SIZE_WEIGHT
        })
        .collect();

    let mut order: Vec<usize> = (0..resolutions.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Result of one file move.
#[derive(Debug, Clone, Serialize)]
pub struct MoveRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub success: bool,
    pub error_message: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
}

/// Outcome of executing a plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MoveReport {
    pub dry_run: bool,
    pub moves: Vec<MoveRecord>,
    pub resolutions_executed: usize,
    pub resolutions_skipped: usize,
}

impl MoveReport {
    pub fn succeeded(&self) -> usize {
        self.moves.iter().filter(|m| m.success).count()
    }

    pub fn failed(&self) -> usize {
        self.moves.iter().filter(|m| !m.success).count()
    }
}

/// Move the episodes of every executable resolution at or above `min_level`, in execution
/// order, one file at a time. A failed move is recorded and the batch continues. A dry run
/// lists the same moves without touching the filesystem.
pub fn execute_resolution_plan(
    plan: &ResolutionPlan,
    min_level: ConfidenceLevel,
    dry_run: bool,
    reporter: &dyn ProgressReporter,
) -> MoveReport {
    let mut report = MoveReport {
        dry_run,
        ..MoveReport::default()
    };

    let selected = plan.executable_at(min_level);
    report.resolutions_skipped = plan.resolutions.len() - selected.len();

    let total: usize = selected.iter().map(|r| r.episode_count()).sum();
    let mut completed = 0;

    for resolution in selected {
        let Some(destination) = &resolution.primary_destination else {
            continue;
        };
        report.resolutions_executed += 1;

        if !dry_run && destination.requires_creation {
            if let Err(e) = fs::create_dir_all(&destination.path) {
                error!(
                    "Cannot create {}: {}",
                    destination.path.display(),
                    e
                );
            }
        }

        for episode in &resolution.episodes {
            let target = destination.path.join(episode.file_name());
            let mut record = MoveRecord {
                source: episode.path.clone(),
                destination: target.clone(),
                success: true,
                error_message: None,
                executed_at: None,
            };

            if !dry_run {
                record.executed_at = Some(Utc::now());
                let outcome = if target.exists() {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        format!("{} already exists", target.display()),
                    ))
                } else {
                    platform::move_file(&episode.path, &target)
                };
                match outcome {
                    Ok(()) => info!("Moved {} -> {}", episode.path.display(), target.display()),
                    Err(e) => {
                        warn!("Move failed for {}: {}", episode.path.display(), e);
                        record.success = false;
                        record.error_message = Some(e.to_string());
                    }
                }
            }

            completed += 1;
            reporter.on_operation_progress(completed, total, &episode.file_name());
            report.moves.push(record);
        }
    }

    info!(
        "{} {} moves ({} failed) across {} resolutions",
        if dry_run { "Planned" } else { "Executed" },
        report.moves.len(),
        report.failed(),
        report.resolutions_executed
    );
    report
}
