use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::DeletionSettings;
use crate::confirm::{ConfirmDecision, Confirmer};
use crate::duplicates::{deletion_reason, DuplicateGroup};
use crate::episode::Episode;
use crate::error::Error;
use crate::platform;
use crate::progress::ProgressReporter;

const TRASH_DIR_NAME: &str = ".trash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionMode {
    /// Preview only; the filesystem is never touched.
    DryRun,
    /// Move into a recoverable holding area.
    Trash,
    Permanent,
}

impl fmt::Display for DeletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeletionMode::DryRun => "dry-run",
            DeletionMode::Trash => "trash",
            DeletionMode::Permanent => "permanent",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCheck {
    FileExists,
    FileNotLocked,
    SizeReasonable,
    UserConfirmation,
}

impl SafetyCheck {
    /// Checks evaluated from the filesystem before anyone is asked to confirm.
    const FILE_CHECKS: [SafetyCheck; 3] = [
        SafetyCheck::FileExists,
        SafetyCheck::FileNotLocked,
        SafetyCheck::SizeReasonable,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    Pending,
    Success,
    Failed,
    Skipped,
    Cancelled,
}

impl DeletionStatus {
    pub fn is_terminal(self) -> bool {
        self != DeletionStatus::Pending
    }

    /// Pending may move to any terminal state; terminal states never change.
    pub fn transition(self, to: DeletionStatus) -> Result<DeletionStatus, Error> {
        if self.is_terminal() || to == DeletionStatus::Pending {
            return Err(Error::InvalidTransition { from: self, to });
        }
        Ok(to)
    }
}

impl fmt::Display for DeletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeletionStatus::Pending => "pending",
            DeletionStatus::Success => "success",
            DeletionStatus::Failed => "failed",
            DeletionStatus::Skipped => "skipped",
            DeletionStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// One planned removal.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionOperation {
    pub episode: Episode,
    pub mode: DeletionMode,
    pub reason: String,
    pub safety_checks: BTreeMap<SafetyCheck, bool>,
    pub safety_warnings: Vec<String>,
    pub status: DeletionStatus,
    pub backup_location: Option<PathBuf>,
    pub error_message: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl DeletionOperation {
    pub fn new(episode: Episode, mode: DeletionMode, reason: String) -> Self {
        Self {
            episode,
            mode,
            reason,
            safety_checks: BTreeMap::new(),
            safety_warnings: Vec::new(),
            status: DeletionStatus::Pending,
            backup_location: None,
            error_message: None,
            executed_at: None,
        }
    }

    /// Evaluate the filesystem checks against the file as it is now.
    pub fn run_safety_checks(&mut self, settings: &DeletionSettings) {
        let path = self.episode.path.clone();
        let metadata = fs::metadata(&path).ok();
        let exists = metadata.as_ref().is_some_and(|m| m.is_file());
        let size = metadata.map(|m| m.len()).unwrap_or(self.episode.size);

        self.safety_warnings.clear();

        self.safety_checks.insert(SafetyCheck::FileExists, exists);
        if !exists {
            self.safety_warnings
                .push(format!("File no longer exists: {}", path.display()));
        }

        let locked = exists && platform::is_file_locked(&path);
        self.safety_checks
            .insert(SafetyCheck::FileNotLocked, exists && !locked);
        if locked {
            self.safety_warnings
                .push("File is locked or in use".to_string());
        }

        let size_ok = (settings.min_file_size_bytes..=settings.max_file_size_bytes).contains(&size);
        self.safety_checks.insert(SafetyCheck::SizeReasonable, size_ok);
        if !size_ok {
            self.safety_warnings.push(format!(
                "File size {} bytes outside {}..={} bytes",
                size, settings.min_file_size_bytes, settings.max_file_size_bytes
            ));
        }
    }

    fn check(&self, check: SafetyCheck) -> bool {
        self.safety_checks.get(&check).copied().unwrap_or(false)
    }

    pub fn passes_file_checks(&self) -> bool {
        SafetyCheck::FILE_CHECKS.iter().all(|c| self.check(*c))
    }

    /// All required checks pass; confirmation is waived under `force`.
    pub fn is_safe(&self, force: bool) -> bool {
        self.passes_file_checks() && (force || self.check(SafetyCheck::UserConfirmation))
    }

    pub fn set_confirmed(&mut self, confirmed: bool) {
        self.safety_checks
            .insert(SafetyCheck::UserConfirmation, confirmed);
    }

    fn set_status(&mut self, to: DeletionStatus) -> Result<(), Error> {
        self.status = self.status.transition(to)?;
        self.executed_at = Some(Utc::now());
        Ok(())
    }

    fn fail(&mut self, message: String) -> Result<(), Error> {
        error!("Failed to delete {}: {}", self.episode.path.display(), message);
        self.error_message = Some(message);
        self.set_status(DeletionStatus::Failed)
    }
}

/// Ordered removals for one deletion run.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionPlan {
    pub operations: Vec<DeletionOperation>,
    pub mode: DeletionMode,
    pub force: bool,
    pub confirm_each: bool,
    /// Holding area for trash mode; `None` means a `.trash` folder beside each file.
    pub trash_dir: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DeletionPlan {
    /// One operation per removal candidate of every group, in group order.
    pub fn from_groups(
        groups: &[DuplicateGroup],
        mode: DeletionMode,
        force: bool,
        settings: &DeletionSettings,
    ) -> Self {
        let operations = groups
            .iter()
            .flat_map(|group| {
                group.removals.iter().map(|removal| {
                    DeletionOperation::new(
                        removal.clone(),
                        mode,
                        deletion_reason(removal, &group.keeper),
                    )
                })
            })
            .collect();

        let mut plan = Self {
            operations,
            mode,
            force,
            confirm_each: settings.confirm_each,
            trash_dir: settings.trash_directory.as_ref().map(PathBuf::from),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };
        plan.refresh_safety_checks(settings);
        plan
    }

    pub fn refresh_safety_checks(&mut self, settings: &DeletionSettings) {
        for op in self.operations.iter_mut() {
            op.run_safety_checks(settings);
        }
    }

    /// Operations passing every required check. Always a subset of `operations`.
    pub fn safe_operations(&self) -> Vec<&DeletionOperation> {
        self.operations
            .iter()
            .filter(|op| op.is_safe(self.force))
            .collect()
    }

    /// Operations whose filesystem checks pass, regardless of confirmation.
    pub fn ready_operations(&self) -> Vec<&DeletionOperation> {
        self.operations
            .iter()
            .filter(|op| op.passes_file_checks())
            .collect()
    }

    pub fn total_size(&self) -> u64 {
        self.operations.iter().map(|op| op.episode.size).sum()
    }

    /// Bytes freed if every operation whose file checks pass succeeds.
    pub fn estimated_space_saved(&self) -> u64 {
        self.ready_operations().iter().map(|op| op.episode.size).sum()
    }

    /// Successes over attempted (succeeded or failed) operations, as a percentage.
    pub fn success_rate(&self) -> f64 {
        let summary = self.status_summary();
        let success = summary.get(&DeletionStatus::Success).copied().unwrap_or(0);
        let failed = summary.get(&DeletionStatus::Failed).copied().unwrap_or(0);
        if success + failed == 0 {
            return 0.0;
        }
        success as f64 / (success + failed) as f64 * 100.0
    }

    pub fn status_summary(&self) -> BTreeMap<DeletionStatus, usize> {
        let mut summary = BTreeMap::new();
        for op in &self.operations {
            *summary.entry(op.status).or_insert(0) += 1;
        }
        summary
    }

    /// Phrase the user must type to approve this plan; none for a dry run.
    pub fn confirmation_phrase<'a>(&self, settings: &'a DeletionSettings) -> Option<&'a str> {
        match self.mode {
            DeletionMode::DryRun => None,
            DeletionMode::Trash => Some(settings.trash_phrase.as_str()),
            DeletionMode::Permanent => Some(settings.permanent_phrase.as_str()),
        }
    }

    fn cancel_pending(&mut self, from: usize) -> Result<(), Error> {
        for op in self.operations.iter_mut().skip(from) {
            if op.status == DeletionStatus::Pending {
                op.set_status(DeletionStatus::Cancelled)?;
            }
        }
        Ok(())
    }

    fn trash_location_for(&self, path: &Path) -> PathBuf {
        match &self.trash_dir {
            Some(dir) => dir.clone(),
            None => path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(TRASH_DIR_NAME),
        }
    }
}

/// Execute the plan sequentially. Returns (success_count, error_count).
///
/// A dry run only refreshes safety checks. Otherwise the batch needs the mode's phrase
/// confirmed (unless forced); a decline or abort cancels every pending operation. Each
/// failure is recorded on its own operation and the batch carries on.
pub fn execute_deletion_plan(
    plan: &mut DeletionPlan,
    settings: &DeletionSettings,
    confirmer: &dyn Confirmer,
    reporter: &dyn ProgressReporter,
) -> Result<(usize, usize), Error> {
    plan.refresh_safety_checks(settings);

    let Some(phrase) = plan.confirmation_phrase(settings) else {
        info!(
            "Dry run: {} of {} deletions would proceed, freeing {} bytes",
            plan.ready_operations().len(),
            plan.operations.len(),
            plan.estimated_space_saved()
        );
        return Ok((0, 0));
    };

    if plan.force {
        for op in plan.operations.iter_mut() {
            op.set_confirmed(true);
        }
    } else {
        match confirmer.confirm_plan(plan, phrase) {
            ConfirmDecision::Approve => {
                if !plan.confirm_each {
                    for op in plan.operations.iter_mut() {
                        op.set_confirmed(true);
                    }
                }
            }
            ConfirmDecision::Decline | ConfirmDecision::Abort => {
                warn!("Deletion plan not confirmed; cancelling {} operations", plan.operations.len());
                plan.cancel_pending(0)?;
                return Ok((0, 0));
            }
        }
    }

    plan.started_at = Some(Utc::now());
    let total = plan.operations.len();
    let mut success_count = 0;
    let mut error_count = 0;

    for index in 0..total {
        if plan.operations[index].status.is_terminal() {
            continue;
        }

        if plan.confirm_each && !plan.force && plan.operations[index].passes_file_checks() {
            match confirmer.confirm_operation(&plan.operations[index]) {
                ConfirmDecision::Approve => plan.operations[index].set_confirmed(true),
                ConfirmDecision::Decline => {
                    plan.operations[index].set_confirmed(false);
                    plan.operations[index].set_status(DeletionStatus::Cancelled)?;
                    reporter.on_operation_progress(index + 1, total, "declined");
                    continue;
                }
                ConfirmDecision::Abort => {
                    warn!("Deletion aborted by user at operation {} of {}", index + 1, total);
                    plan.cancel_pending(index)?;
                    break;
                }
            }
        }

        let trash_dir = plan.trash_location_for(&plan.operations[index].episode.path);
        let force = plan.force;
        let op = &mut plan.operations[index];

        if !op.is_safe(force) {
            warn!(
                "Skipping {}: {}",
                op.episode.path.display(),
                op.safety_warnings.join("; ")
            );
            op.set_status(DeletionStatus::Skipped)?;
        } else {
            let outcome = match op.mode {
                DeletionMode::Trash => move_to_trash(&op.episode.path, &trash_dir).map(Some),
                DeletionMode::Permanent => fs::remove_file(&op.episode.path).map(|_| None),
                DeletionMode::DryRun => Ok(None),
            };
            match outcome {
                Ok(backup) => {
                    info!("Deleted ({}) {}", op.mode, op.episode.path.display());
                    op.backup_location = backup;
                    op.set_status(DeletionStatus::Success)?;
                    success_count += 1;
                }
                Err(e) => {
                    op.fail(e.to_string())?;
                    error_count += 1;
                }
            }
        }

        reporter.on_operation_progress(index + 1, total, &op.episode.file_name());
    }

    plan.finished_at = Some(Utc::now());
    info!(
        "Deletion finished: {} succeeded, {} failed, success rate {:.1}%",
        success_count,
        error_count,
        plan.success_rate()
    );
    Ok((success_count, error_count))
}

/// Move `path` into `trash_dir` under a unique name and return where it landed.
pub fn move_to_trash(path: &Path, trash_dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(trash_dir)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dest = platform::unique_destination(trash_dir, &file_name);
    platform::move_file(path, &dest)?;
    Ok(dest)
}
