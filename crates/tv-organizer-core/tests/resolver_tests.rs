use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use tv_organizer_core::analysis::{execute_resolution_plan, ResolutionPlan};
use tv_organizer_core::platform::FixedSpaceProbe;
use tv_organizer_core::resolver::{
    ConfidenceLevel, DestinationKind, PathResolution, PathResolver, ResolutionKind,
};
use tv_organizer_core::scanner::scan_episodes;
use tv_organizer_core::{AppConfig, EpisodeStatus, SilentReporter};

const MB: u64 = 1024 * 1024;

fn write_file(path: &Path, size: u64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = fs::File::create(path).unwrap();
    file.set_len(size).unwrap();
}

fn config_for(root: &Path) -> AppConfig {
    AppConfig {
        tv_directories: vec![root.to_string_lossy().into_owned()],
        ..AppConfig::default()
    }
}

/// `Breaking Bad/Season 01..04`, one episode each, plus a loose season 5 episode in the root.
fn breaking_bad_library(root: &Path) -> PathBuf {
    for season in 1..=4 {
        write_file(
            &root
                .join("Breaking Bad")
                .join(format!("Season {:02}", season))
                .join(format!("Breaking.Bad.S{:02}E01.mkv", season)),
            MB,
        );
    }
    let loose = root.join("Breaking.Bad.S05E10.mkv");
    write_file(&loose, MB);
    loose
}

fn resolve(root: &Path, probe: &FixedSpaceProbe) -> Vec<PathResolution> {
    let config = config_for(root);
    let roots = vec![root.to_path_buf()];
    let scan = scan_episodes(&roots, &config, &SilentReporter);
    let resolver = PathResolver::new(&config, roots, probe);
    resolver.resolve(&scan.episodes)
}

#[test]
fn test_loose_episode_goes_to_new_season_folder() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    breaking_bad_library(root);

    let resolutions = resolve(root, &FixedSpaceProbe::gigabytes(200));
    assert_eq!(resolutions.len(), 1);

    let resolution = &resolutions[0];
    assert_eq!(resolution.kind, ResolutionKind::MoveToExistingShow);
    assert_eq!(resolution.season, 5);
    assert!(resolution.confidence >= ConfidenceLevel::Medium);
    assert!(resolution.is_executable());
    assert!(!resolution.requires_user_confirmation);

    let destination = resolution.primary_destination.as_ref().unwrap();
    assert_eq!(destination.path, root.join("Breaking Bad").join("Season 05"));
    assert_eq!(destination.kind, DestinationKind::SeasonFolder);
    assert!(destination.requires_creation);
    assert!((0.0..=100.0).contains(&destination.total_score));
    assert_eq!(
        resolution.matched_show.as_deref(),
        Some(root.join("Breaking Bad").as_path())
    );
}

#[test]
fn test_show_root_offered_only_for_mixed_shows() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    breaking_bad_library(root);
    let probe = FixedSpaceProbe::gigabytes(200);

    let tidy = resolve(root, &probe);
    assert_eq!(tidy.len(), 1);
    assert!(tidy[0]
        .alternative_destinations
        .iter()
        .all(|d| d.kind != DestinationKind::ShowRoot));

    // An episode sitting in the show folder next to its season folders.
    write_file(&root.join("Breaking Bad").join("Breaking.Bad.S04E02.mkv"), MB);

    let mixed = resolve(root, &probe);
    assert_eq!(mixed.len(), 1);
    let resolution = &mixed[0];
    let primary = resolution.primary_destination.as_ref().unwrap();
    assert_eq!(primary.kind, DestinationKind::SeasonFolder);
    assert_eq!(primary.path, root.join("Breaking Bad").join("Season 05"));

    let show_root = resolution
        .alternative_destinations
        .iter()
        .find(|d| d.kind == DestinationKind::ShowRoot)
        .unwrap();
    assert_eq!(show_root.path, root.join("Breaking Bad"));
    assert!(show_root.total_score < primary.total_score);
}

#[test]
fn test_unknown_free_space_still_reaches_medium() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    breaking_bad_library(root);

    let resolutions = resolve(root, &FixedSpaceProbe(None));
    assert_eq!(resolutions[0].confidence, ConfidenceLevel::Medium);
    assert_eq!(resolutions[0].primary_destination.as_ref().unwrap().space_score, 50.0);
}

#[test]
fn test_unmatched_show_needs_a_new_folder() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    breaking_bad_library(root);
    write_file(&root.join("Severance.S01E01.mkv"), MB);

    let resolutions = resolve(root, &FixedSpaceProbe::gigabytes(200));
    let severance = resolutions
        .iter()
        .find(|r| r.show_name == "Severance")
        .unwrap();

    assert_eq!(severance.kind, ResolutionKind::CreateNewShow);
    assert!(severance.confidence <= ConfidenceLevel::Medium);
    assert!(severance.requires_user_confirmation);
    assert!(severance.matched_show.is_none());

    let destination = severance.primary_destination.as_ref().unwrap();
    assert_eq!(destination.path, root.join("Severance").join("Season 01"));
    assert!(destination.requires_creation);
}

#[test]
fn test_existing_season_folder_and_season_folder_in_root() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    breaking_bad_library(root);
    // Season folder sitting directly under the TV root, away from its show.
    write_file(&root.join("Season 02").join("Breaking.Bad.S02E07.mkv"), MB);

    let config = config_for(root);
    let roots = vec![root.to_path_buf()];
    let scan = scan_episodes(&roots, &config, &SilentReporter);
    let stray = scan
        .episodes
        .iter()
        .find(|e| e.season == 2 && e.episode == 7)
        .unwrap();
    assert_eq!(stray.status, EpisodeStatus::LooseSeasonFolder);

    let probe = FixedSpaceProbe::gigabytes(200);
    let resolver = PathResolver::new(&config, roots, &probe);
    assert_eq!(resolver.shows().len(), 1);

    let resolutions = resolver.resolve(&scan.episodes);
    let season_two = resolutions.iter().find(|r| r.season == 2).unwrap();
    let destination = season_two.primary_destination.as_ref().unwrap();
    assert_eq!(destination.path, root.join("Breaking Bad").join("Season 02"));
    assert!(!destination.requires_creation);
    assert_eq!(season_two.confidence, ConfidenceLevel::High);
}

#[test]
fn test_name_clash_blocks_execution() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    breaking_bad_library(root);
    // Same file name already in the destination season folder.
    write_file(
        &root.join("Breaking Bad").join("Season 01").join("Breaking.Bad.S01E02.mkv"),
        MB,
    );
    write_file(&root.join("Downloads").join("Breaking.Bad.S01E02.mkv"), MB);

    let resolutions = resolve(root, &FixedSpaceProbe::gigabytes(200));
    let clash = resolutions.iter().find(|r| r.season == 1).unwrap();

    assert!(!clash.blocking_issues.is_empty());
    assert!(clash.requires_user_confirmation);
    assert!(!clash.is_executable());
}

#[test]
fn test_low_free_space_is_a_conflict() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    breaking_bad_library(root);

    // Half a gigabyte free is below the one gigabyte reserve.
    let resolutions = resolve(root, &FixedSpaceProbe(Some(512 * MB)));
    let resolution = &resolutions[0];
    assert!(resolution
        .warnings
        .iter()
        .any(|w| w.starts_with("Insufficient space")));
    assert!(!resolution.is_executable());
}

#[test]
fn test_plan_orders_and_counts_resolutions() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    breaking_bad_library(root);
    write_file(&root.join("Severance.S01E01.mkv"), MB);

    let plan = ResolutionPlan::new(resolve(root, &FixedSpaceProbe::gigabytes(200)));

    assert_eq!(plan.resolutions.len(), 2);
    assert_eq!(plan.total_episodes, 2);
    assert_eq!(plan.high_confidence_count, 1);
    assert_eq!(plan.medium_confidence_count, 1);
    assert!(plan.requires_review);
    assert_eq!(plan.executable_resolutions().len(), 2);
    assert_eq!(plan.success_rate(), 100.0);
    assert!(plan.summary().starts_with("Resolution Plan: 2/2 executable"));
    // 2 seconds for an existing show, 3 for a new one.
    assert!((plan.estimated_duration_minutes - 5.0 / 60.0).abs() < 1e-9);

    let first = plan.ordered().next().unwrap();
    assert_eq!(first.confidence, ConfidenceLevel::High);
}

#[test]
fn test_move_execution_and_dry_run() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    let loose = breaking_bad_library(root);
    let target = root
        .join("Breaking Bad")
        .join("Season 05")
        .join("Breaking.Bad.S05E10.mkv");

    let plan = ResolutionPlan::new(resolve(root, &FixedSpaceProbe::gigabytes(200)));

    let preview = execute_resolution_plan(&plan, ConfidenceLevel::Medium, true, &SilentReporter);
    assert!(preview.dry_run);
    assert_eq!(preview.moves.len(), 1);
    assert_eq!(preview.moves[0].destination, target);
    assert!(loose.exists());
    assert!(!target.exists());

    let report = execute_resolution_plan(&plan, ConfidenceLevel::Medium, false, &SilentReporter);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 0);
    assert_eq!(report.resolutions_executed, 1);
    assert!(!loose.exists());
    assert!(target.exists());
}

#[test]
fn test_minimum_level_filters_moves() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    breaking_bad_library(root);
    let severance = root.join("Severance.S01E01.mkv");
    write_file(&severance, MB);

    let plan = ResolutionPlan::new(resolve(root, &FixedSpaceProbe::gigabytes(200)));
    assert_eq!(plan.executable_resolutions().len(), 2);
    let selected = plan.executable_at(ConfidenceLevel::High);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].show_name, "Breaking Bad");
    assert_eq!(plan.executable_at(ConfidenceLevel::Medium).len(), 2);

    let report = execute_resolution_plan(&plan, ConfidenceLevel::High, false, &SilentReporter);

    assert_eq!(report.resolutions_executed, 1);
    assert_eq!(report.resolutions_skipped, 1);
    assert!(severance.exists());
}
