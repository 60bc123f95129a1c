use std::path::Path;

use tv_organizer_core::config::DuplicateSettings;
use tv_organizer_core::duplicates::{
    detect_duplicates, duplicate_statistics, filter_duplicate_groups, RecommendedAction,
};
use tv_organizer_core::{Episode, EpisodeStatus, Quality};

const MB: u64 = 1024 * 1024;

fn episode(path: &str, size: u64) -> Episode {
    Episode::from_file(Path::new(path), size, EpisodeStatus::Organized).unwrap()
}

#[test]
fn test_nature_walks_keeps_1080p() {
    let episodes = vec![
        episode("/tv/Nature Walks/Nature.Walks.S02E05.720p.HDTV.mkv", 900 * MB),
        episode("/tv/Nature Walks/Nature.Walks.S02E05.1080p.BluRay.mkv", 2200 * MB),
    ];

    let groups = detect_duplicates(&episodes);
    assert_eq!(groups.len(), 1);

    let group = &groups[0];
    assert_eq!(group.season, 2);
    assert_eq!(group.episode, 5);
    assert_eq!(group.keeper.quality, Quality::Fhd1080p);
    assert!(group.keeper.file_name().contains("1080p"));
    assert_eq!(group.recommended_action, RecommendedAction::KeepBestQuality);
    assert_eq!(group.potential_space_saved, 900 * MB);
    assert_eq!(group.removals.len(), 1);
    assert!(group
        .analysis_notes
        .iter()
        .any(|n| n.starts_with("Quality variations")));
}

#[test]
fn test_every_group_has_one_keeper_and_sizes_add_up() {
    let episodes = vec![
        episode("/tv/a/Show.S01E01.480p.mkv", 300 * MB),
        episode("/tv/b/Show.S01E01.720p.mkv", 700 * MB),
        episode("/tv/c/Show.S01E01.1080p.mkv", 1500 * MB),
        episode("/tv/a/Show.S01E02.mkv", 400 * MB),
        episode("/tv/b/Show.S01E02.mkv", 410 * MB),
        episode("/tv/a/Other.S03E07.mkv", 100 * MB),
    ];

    let groups = detect_duplicates(&episodes);
    assert_eq!(groups.len(), 2);

    for group in &groups {
        let keepers = group
            .episodes
            .iter()
            .filter(|e| e.path == group.keeper.path)
            .count();
        assert_eq!(keepers, 1);
        assert!(group.removals.iter().all(|r| r.path != group.keeper.path));

        let removal_size: u64 = group.removals.iter().map(|e| e.size).sum();
        assert_eq!(group.keeper.size + removal_size, group.total_size());
        assert_eq!(group.potential_space_saved, removal_size);
    }

    let stats = duplicate_statistics(&groups);
    assert_eq!(stats.group_count, 2);
    assert_eq!(stats.duplicate_files, 5);
    assert_eq!(stats.removable_files, 3);
}

#[test]
fn test_version_suffix_is_a_confident_duplicate() {
    let episodes = vec![
        episode("/tv/Show/Show.S01E01.mkv", 500 * MB),
        episode("/tv/Show/Show.S01E01_1.mkv", 500 * MB),
    ];

    let groups = detect_duplicates(&episodes);
    assert_eq!(groups.len(), 1);
    assert!(groups[0].has_version_markers);

    let settings = DuplicateSettings::default();
    let outcome = filter_duplicate_groups(groups, &settings, settings.min_confidence);
    assert_eq!(outcome.groups.len(), 1);
    assert!(outcome.groups[0].confidence.unwrap() >= 0.8);
    assert_eq!(outcome.groups[0].file_count(), 2);
}

#[test]
fn test_multi_episode_file_is_never_a_duplicate() {
    let episodes = vec![
        episode("/tv/Show/Show.S01E01-S01E02.Title.mkv", 900 * MB),
        episode("/tv/Show/Show.S01E01.Title.mkv", 450 * MB),
    ];

    let settings = DuplicateSettings::default();
    let outcome = filter_duplicate_groups(detect_duplicates(&episodes), &settings, 0.0);

    assert!(outcome.groups.is_empty());
    assert_eq!(outcome.stats.multi_episode_rejections, 1);
}

#[test]
fn test_distinct_documentary_episodes_are_rejected() {
    let episodes = vec![
        episode("/tv/Planet/Planet.S01E03.Alaska.1080p.mkv", 2000 * MB),
        episode("/tv/Planet/Planet.S01E03.Iceland.1080p.mkv", 2000 * MB),
    ];

    let settings = DuplicateSettings::default();
    let outcome = filter_duplicate_groups(detect_duplicates(&episodes), &settings, 0.0);

    assert!(outcome.groups.is_empty());
    assert_eq!(outcome.stats.content_rejections, 1);
}

#[test]
fn test_high_threshold_drops_mid_confidence_group() {
    let episodes = vec![
        episode("/tv/Show/Show.S01E01.720p.mkv", 300 * MB),
        episode("/tv/Show/Show.S01E01.1080p.mkv", 400 * MB),
    ];
    let settings = DuplicateSettings::default();

    let lenient = filter_duplicate_groups(detect_duplicates(&episodes), &settings, 0.7);
    assert_eq!(lenient.groups.len(), 1);
    let confidence = lenient.groups[0].confidence.unwrap();
    assert!((confidence - 0.75).abs() < 1e-9);

    let strict = filter_duplicate_groups(detect_duplicates(&episodes), &settings, 0.9);
    assert!(strict.groups.is_empty());
    assert_eq!(strict.stats.low_confidence_rejections, 1);
    assert_eq!(strict.stats.accepted, 0);
}
