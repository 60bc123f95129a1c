use colored::*;
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tv_organizer_core::analysis::{DeletionPlan, DeletionStatus, MoveReport};
use tv_organizer_core::duplicates::{deletion_reason, DuplicateGroup};
use tv_organizer_core::{DuplicateReport, ResolutionReport};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Print `content` or write it to `output`. Files never get ANSI colours.
pub fn emit(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Disable colours when the report goes to a file.
pub fn configure_colors(output: Option<&Path>) {
    if output.is_some() {
        colored::control::set_override(false);
    }
}

fn group_json(group: &DuplicateGroup) -> Value {
    let files: Vec<Value> = group
        .episodes
        .iter()
        .map(|e| {
            json!({
                "path": e.path,
                "size": e.size,
                "quality": e.quality,
                "source": e.source,
                "version": e.version_marker(),
                "keep": e.path == group.keeper.path,
            })
        })
        .collect();

    json!({
        "show": group.show_name,
        "season": group.season,
        "episode": group.episode,
        "confidence": group.confidence,
        "has_version_markers": group.has_version_markers,
        "recommended_action": group.recommended_action,
        "keeper": group.keeper.path,
        "potential_space_saved": group.potential_space_saved,
        "total_size": group.total_size(),
        "files": files,
        "notes": group.analysis_notes,
    })
}

pub fn duplicates_json(report: &DuplicateReport, groups: &[&DuplicateGroup]) -> anyhow::Result<String> {
    let value = json!({
        "statistics": report.statistics,
        "filter": report.filter_stats,
        "scan_warnings": report
            .scan
            .warnings
            .iter()
            .map(|w| format!("{}: {}", w.path.display(), w.message))
            .collect::<Vec<_>>(),
        "groups": groups.iter().map(|g| group_json(g)).collect::<Vec<_>>(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn duplicates_text(report: &DuplicateReport, groups: &[&DuplicateGroup]) -> String {
    let mut out = String::new();
    let stats = &report.statistics;

    let _ = writeln!(out, "{}", "Duplicate Episodes".bold().underline());
    let _ = writeln!(
        out,
        "{} groups, {} files, {} removable, {:.2} GB of {:.2} GB reclaimable ({:.1}%)",
        stats.group_count.to_string().red(),
        stats.duplicate_files,
        stats.removable_files,
        stats.space_saved_gb,
        stats.total_size_gb,
        stats.space_efficiency_percent
    );
    if let Some(filter) = &report.filter_stats {
        let _ = writeln!(
            out,
            "Filter: {} checked, {} multi-episode, {} different content, {} low confidence",
            filter.groups_checked,
            filter.multi_episode_rejections,
            filter.content_rejections,
            filter.low_confidence_rejections
        );
    }
    for warning in &report.scan.warnings {
        let _ = writeln!(
            out,
            "{} {}: {}",
            "warning:".yellow(),
            warning.path.display(),
            warning.message
        );
    }

    for group in groups {
        let _ = writeln!(out);
        let mut header = format!(
            "{} S{:02}E{:02} - {}",
            group.show_name, group.season, group.episode, group.recommended_action
        );
        if let Some(confidence) = group.confidence {
            let _ = write!(header, " (confidence {:.2})", confidence);
        }
        let _ = writeln!(out, "{}", header.cyan().bold());

        for episode in &group.episodes {
            let is_keeper = episode.path == group.keeper.path;
            let marker = if is_keeper { "KEEP".green() } else { "DEL ".red() };
            let version = episode
                .version_marker()
                .map(|v| format!(" v{}", v))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {} {} [{}{}] {:.1} MB",
                marker,
                episode.path.display(),
                episode.quality,
                version,
                episode.size as f64 / MIB
            );
            if !is_keeper {
                let _ = writeln!(out, "       {}", deletion_reason(episode, &group.keeper).dimmed());
            }
        }
        for note in &group.analysis_notes {
            let _ = writeln!(out, "  - {}", note);
        }
        let _ = writeln!(
            out,
            "  Space saved: {:.1} MB",
            group.potential_space_saved as f64 / MIB
        );
    }

    out
}

pub fn deletion_preview(plan: &DeletionPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} operations, {} ready, {:.2} GB)",
        format!("Deletion plan [{}]", plan.mode).bold(),
        plan.operations.len(),
        plan.ready_operations().len(),
        plan.estimated_space_saved() as f64 / GIB
    );
    for op in &plan.operations {
        let status = if op.passes_file_checks() {
            "ok".green()
        } else {
            "unsafe".red()
        };
        let _ = writeln!(out, "  [{}] {} - {}", status, op.episode.path.display(), op.reason);
        for warning in &op.safety_warnings {
            let _ = writeln!(out, "       {}", warning.yellow());
        }
    }
    out
}

pub fn deletion_result(plan: &DeletionPlan) -> String {
    let mut out = String::new();
    let summary: Vec<String> = plan
        .status_summary()
        .iter()
        .map(|(status, count)| format!("{} {}", count, status))
        .collect();
    let _ = writeln!(out, "Deletion results: {}", summary.join(", "));
    let _ = writeln!(out, "Success rate: {:.1}%", plan.success_rate());
    for op in &plan.operations {
        if op.status == DeletionStatus::Failed {
            let _ = writeln!(
                out,
                "  {} {}: {}",
                "failed".red(),
                op.episode.path.display(),
                op.error_message.as_deref().unwrap_or("unknown error")
            );
        }
        if let Some(backup) = &op.backup_location {
            let _ = writeln!(out, "  trashed {} -> {}", op.episode.path.display(), backup.display());
        }
    }
    out
}

pub fn resolution_json(report: &ResolutionReport) -> anyhow::Result<String> {
    let value = json!({
        "statistics": report.statistics,
        "shows_needing_attention": report.shows_needing_attention,
        "summary": report.plan.summary(),
        "plan": report.plan,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn resolution_text(report: &ResolutionReport) -> String {
    let mut out = String::new();
    let stats = &report.statistics;

    let _ = writeln!(out, "{}", "TV Directory Overview".bold().underline());
    let _ = writeln!(
        out,
        "{} shows, {} episodes ({} organized, {} loose, {:.1}% organized)",
        stats.show_count,
        stats.total_episodes,
        stats.organized_episodes,
        stats.loose_episodes,
        stats.organization_percent
    );
    let _ = writeln!(
        out,
        "Average Organization Score: {:.1}/100",
        stats.average_organization_score
    );
    for (root, count) in &stats.shows_per_root {
        let _ = writeln!(out, "  {}: {} shows", root, count);
    }
    if !report.shows_needing_attention.is_empty() {
        let _ = writeln!(out, "Shows needing attention:");
        for (name, score) in &report.shows_needing_attention {
            let _ = writeln!(out, "  {}: {:.1}/100", name, score);
        }
    }

    let plan = &report.plan;
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", plan.summary().bold());
    let _ = writeln!(
        out,
        "Confidence: {} high, {} medium, {} low, {} uncertain; ~{:.1} minutes",
        plan.high_confidence_count.to_string().green(),
        plan.medium_confidence_count.to_string().cyan(),
        plan.low_confidence_count.to_string().yellow(),
        plan.uncertain_count.to_string().red(),
        plan.estimated_duration_minutes
    );
    if plan.requires_review {
        let _ = writeln!(out, "{}", "This plan needs review before execution.".yellow());
    }

    for resolution in plan.ordered() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} - {} [{}]{}",
            resolution.summary().cyan().bold(),
            resolution.kind,
            resolution.confidence,
            if resolution.requires_user_confirmation {
                " (confirmation required)"
            } else {
                ""
            }
        );
        if let Some(destination) = &resolution.primary_destination {
            let _ = writeln!(
                out,
                "  -> {}{}",
                destination.path.display(),
                if destination.requires_creation { " (new)" } else { "" }
            );
            let _ = writeln!(
                out,
                "     score {:.1} (match {:.0}, organization {:.0}, space {:.0}, proximity {:.0})",
                destination.total_score,
                destination.match_score,
                destination.organization_score,
                destination.space_score,
                destination.proximity_score
            );
        }
        for episode in &resolution.episodes {
            let _ = writeln!(out, "     {}", episode.path.display());
        }
        for reason in &resolution.reasoning {
            let _ = writeln!(out, "  - {}", reason);
        }
        for warning in &resolution.warnings {
            let _ = writeln!(out, "  {} {}", "warning:".yellow(), warning);
        }
    }

    out
}

pub fn move_result(report: &MoveReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} files across {} resolutions ({} skipped): {} ok, {} failed",
        if report.dry_run { "Would move" } else { "Moved" },
        report.moves.len(),
        report.resolutions_executed,
        report.resolutions_skipped,
        report.succeeded().to_string().green(),
        report.failed().to_string().red()
    );
    for record in &report.moves {
        let status = if record.success { "ok".green() } else { "failed".red() };
        let _ = writeln!(
            out,
            "  [{}] {} -> {}",
            status,
            record.source.display(),
            record.destination.display()
        );
        if let Some(message) = &record.error_message {
            let _ = writeln!(out, "       {}", message);
        }
    }
    out
}
