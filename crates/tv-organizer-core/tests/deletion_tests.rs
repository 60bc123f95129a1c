use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::{tempdir, TempDir};

use tv_organizer_core::analysis::{
    execute_deletion_plan, DeletionMode, DeletionOperation, DeletionPlan, DeletionStatus,
    SafetyCheck,
};
use tv_organizer_core::config::DeletionSettings;
use tv_organizer_core::duplicates::{detect_duplicates, DuplicateGroup};
use tv_organizer_core::{
    AlwaysDecline, ConfirmDecision, Confirmer, Episode, EpisodeStatus, SilentReporter,
};

const KB: u64 = 1024;

/// Answers the plan prompt once and then each per-file prompt from a script.
struct ScriptedConfirmer {
    plan: ConfirmDecision,
    operations: Mutex<VecDeque<ConfirmDecision>>,
    phrases: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    fn new(plan: ConfirmDecision, operations: &[ConfirmDecision]) -> Self {
        Self {
            plan,
            operations: Mutex::new(operations.iter().copied().collect()),
            phrases: Mutex::new(Vec::new()),
        }
    }

    fn phrases(&self) -> Vec<String> {
        self.phrases.lock().unwrap().clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm_plan(&self, _plan: &DeletionPlan, phrase: &str) -> ConfirmDecision {
        self.phrases.lock().unwrap().push(phrase.to_string());
        self.plan
    }

    fn confirm_operation(&self, _operation: &DeletionOperation) -> ConfirmDecision {
        self.operations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConfirmDecision::Decline)
    }
}

fn write_file(path: &Path, size: u64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = fs::File::create(path).unwrap();
    file.set_len(size).unwrap();
}

/// Two duplicate groups, each a 720p copy (removal) next to a 1080p copy (keeper).
fn duplicate_library(dir: &TempDir) -> (Vec<DuplicateGroup>, Vec<PathBuf>) {
    let show = dir.path().join("Show");
    let mut episodes = Vec::new();
    let mut removals = Vec::new();

    for number in 1..=2 {
        let low = show.join(format!("Show.S01E0{}.720p.mkv", number));
        let high = show.join(format!("Show.S01E0{}.1080p.mkv", number));
        write_file(&low, 200 * KB);
        write_file(&high, 400 * KB);
        episodes.push(Episode::from_file(&low, 200 * KB, EpisodeStatus::Organized).unwrap());
        episodes.push(Episode::from_file(&high, 400 * KB, EpisodeStatus::Organized).unwrap());
        removals.push(low);
    }

    (detect_duplicates(&episodes), removals)
}

#[test]
fn test_dry_run_never_touches_files() {
    let dir = tempdir().unwrap();
    let (groups, removals) = duplicate_library(&dir);
    let settings = DeletionSettings::default();

    let mut plan = DeletionPlan::from_groups(&groups, DeletionMode::DryRun, true, &settings);
    assert_eq!(plan.operations.len(), 2);

    let (succeeded, failed) =
        execute_deletion_plan(&mut plan, &settings, &AlwaysDecline, &SilentReporter).unwrap();

    assert_eq!((succeeded, failed), (0, 0));
    for path in &removals {
        assert!(path.exists());
    }
    assert!(plan
        .operations
        .iter()
        .all(|op| op.status == DeletionStatus::Pending));
    assert_eq!(plan.estimated_space_saved(), 400 * KB);
}

#[test]
fn test_safe_operations_are_a_subset() {
    let dir = tempdir().unwrap();
    let (groups, removals) = duplicate_library(&dir);
    let settings = DeletionSettings::default();

    fs::remove_file(&removals[0]).unwrap();
    let plan = DeletionPlan::from_groups(&groups, DeletionMode::Trash, true, &settings);

    let safe = plan.safe_operations();
    assert_eq!(safe.len(), 1);
    for op in &safe {
        assert!(plan
            .operations
            .iter()
            .any(|candidate| candidate.episode.path == op.episode.path));
    }

    let missing = &plan.operations[0];
    assert!(!missing.safety_checks[&SafetyCheck::FileExists]);
    assert!(!missing.safety_warnings.is_empty());
}

#[test]
fn test_unforced_plan_needs_confirmation_to_be_safe() {
    let dir = tempdir().unwrap();
    let (groups, _) = duplicate_library(&dir);
    let settings = DeletionSettings::default();

    let plan = DeletionPlan::from_groups(&groups, DeletionMode::Trash, false, &settings);
    assert!(plan.safe_operations().is_empty());
    assert_eq!(plan.ready_operations().len(), 2);
}

#[test]
fn test_forced_trash_moves_files_aside() {
    let dir = tempdir().unwrap();
    let (groups, removals) = duplicate_library(&dir);
    let trash = dir.path().join("trash");
    let settings = DeletionSettings {
        trash_directory: Some(trash.to_string_lossy().into_owned()),
        ..DeletionSettings::default()
    };

    let mut plan = DeletionPlan::from_groups(&groups, DeletionMode::Trash, true, &settings);
    let (succeeded, failed) =
        execute_deletion_plan(&mut plan, &settings, &AlwaysDecline, &SilentReporter).unwrap();

    assert_eq!((succeeded, failed), (2, 0));
    for (op, original) in plan.operations.iter().zip(&removals) {
        assert_eq!(op.status, DeletionStatus::Success);
        assert!(!original.exists());
        let backup = op.backup_location.as_ref().unwrap();
        assert!(backup.starts_with(&trash));
        assert!(backup.exists());
        assert!(op.executed_at.is_some());
    }
    assert_eq!(plan.success_rate(), 100.0);
    assert!(plan.finished_at.is_some());
}

#[test]
fn test_declined_plan_cancels_everything() {
    let dir = tempdir().unwrap();
    let (groups, removals) = duplicate_library(&dir);
    let settings = DeletionSettings::default();

    let mut plan = DeletionPlan::from_groups(&groups, DeletionMode::Permanent, false, &settings);
    let (succeeded, failed) =
        execute_deletion_plan(&mut plan, &settings, &AlwaysDecline, &SilentReporter).unwrap();

    assert_eq!((succeeded, failed), (0, 0));
    assert!(plan
        .operations
        .iter()
        .all(|op| op.status == DeletionStatus::Cancelled));
    for path in &removals {
        assert!(path.exists());
    }
}

#[test]
fn test_each_mode_asks_for_its_own_phrase() {
    let dir = tempdir().unwrap();
    let (groups, removals) = duplicate_library(&dir);
    let settings = DeletionSettings::default();

    let mut asked = Vec::new();
    for mode in [DeletionMode::DryRun, DeletionMode::Trash, DeletionMode::Permanent] {
        let confirmer = ScriptedConfirmer::new(ConfirmDecision::Decline, &[]);
        let mut plan = DeletionPlan::from_groups(&groups, mode, false, &settings);
        execute_deletion_plan(&mut plan, &settings, &confirmer, &SilentReporter).unwrap();
        asked.push(confirmer.phrases());
    }

    assert!(asked[0].is_empty());
    assert_eq!(asked[1], vec![settings.trash_phrase.clone()]);
    assert_eq!(asked[2], vec![settings.permanent_phrase.clone()]);
    assert_ne!(asked[1], asked[2]);
    for path in &removals {
        assert!(path.exists());
    }
}

#[test]
fn test_abort_during_confirm_each_stops_the_batch() {
    let dir = tempdir().unwrap();
    let (groups, removals) = duplicate_library(&dir);
    let settings = DeletionSettings {
        confirm_each: true,
        ..DeletionSettings::default()
    };
    let confirmer = ScriptedConfirmer::new(
        ConfirmDecision::Approve,
        &[ConfirmDecision::Approve, ConfirmDecision::Abort],
    );

    let mut plan = DeletionPlan::from_groups(&groups, DeletionMode::Permanent, false, &settings);
    let (succeeded, failed) =
        execute_deletion_plan(&mut plan, &settings, &confirmer, &SilentReporter).unwrap();

    assert_eq!((succeeded, failed), (1, 0));
    assert_eq!(plan.operations[0].status, DeletionStatus::Success);
    assert_eq!(plan.operations[1].status, DeletionStatus::Cancelled);
    assert!(!removals[0].exists());
    assert!(removals[1].exists());
}

#[test]
fn test_declined_file_is_cancelled_and_batch_continues() {
    let dir = tempdir().unwrap();
    let (groups, removals) = duplicate_library(&dir);
    let settings = DeletionSettings {
        confirm_each: true,
        ..DeletionSettings::default()
    };
    let confirmer = ScriptedConfirmer::new(
        ConfirmDecision::Approve,
        &[ConfirmDecision::Decline, ConfirmDecision::Approve],
    );

    let mut plan = DeletionPlan::from_groups(&groups, DeletionMode::Permanent, false, &settings);
    execute_deletion_plan(&mut plan, &settings, &confirmer, &SilentReporter).unwrap();

    assert_eq!(plan.operations[0].status, DeletionStatus::Cancelled);
    assert_eq!(plan.operations[1].status, DeletionStatus::Success);
    assert!(removals[0].exists());
    assert!(!removals[1].exists());
}

#[test]
fn test_failures_are_recorded_and_batch_continues() {
    let dir = tempdir().unwrap();
    let (groups, removals) = duplicate_library(&dir);

    // A regular file where the trash directory should be makes every move fail.
    let blocker = dir.path().join("not-a-directory");
    fs::write(&blocker, "x").unwrap();
    let settings = DeletionSettings {
        trash_directory: Some(blocker.to_string_lossy().into_owned()),
        ..DeletionSettings::default()
    };

    let mut plan = DeletionPlan::from_groups(&groups, DeletionMode::Trash, true, &settings);
    let (succeeded, failed) =
        execute_deletion_plan(&mut plan, &settings, &AlwaysDecline, &SilentReporter).unwrap();

    assert_eq!((succeeded, failed), (0, 2));
    for op in &plan.operations {
        assert_eq!(op.status, DeletionStatus::Failed);
        assert!(op.error_message.is_some());
        assert!(op.backup_location.is_none());
    }
    for path in &removals {
        assert!(path.exists());
    }
    assert_eq!(plan.success_rate(), 0.0);
}

#[test]
fn test_vanished_file_is_skipped() {
    let dir = tempdir().unwrap();
    let (groups, removals) = duplicate_library(&dir);
    let settings = DeletionSettings::default();

    let mut plan = DeletionPlan::from_groups(&groups, DeletionMode::Permanent, true, &settings);
    fs::remove_file(&removals[1]).unwrap();

    let (succeeded, failed) =
        execute_deletion_plan(&mut plan, &settings, &AlwaysDecline, &SilentReporter).unwrap();

    assert_eq!((succeeded, failed), (1, 0));
    assert_eq!(plan.operations[0].status, DeletionStatus::Success);
    assert_eq!(plan.operations[1].status, DeletionStatus::Skipped);

    let summary = plan.status_summary();
    assert_eq!(summary[&DeletionStatus::Success], 1);
    assert_eq!(summary[&DeletionStatus::Skipped], 1);
}

#[test]
fn test_undersized_file_fails_size_check() {
    let dir = tempdir().unwrap();
    let (groups, _) = duplicate_library(&dir);
    let settings = DeletionSettings {
        min_file_size_bytes: 300 * KB,
        ..DeletionSettings::default()
    };

    let plan = DeletionPlan::from_groups(&groups, DeletionMode::Trash, true, &settings);
    assert!(plan.safe_operations().is_empty());
    assert!(plan
        .operations
        .iter()
        .all(|op| !op.safety_checks[&SafetyCheck::SizeReasonable]));
}
