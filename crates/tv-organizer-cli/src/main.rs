mod commands;
mod logging;
mod progress;
mod prompt;
mod report;

use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, DeleteArgs, DuplicatesArgs, OutputFormat, ResolveArgs};
use dotenv::dotenv;
use progress::CliReporter;
use prompt::TerminalConfirmer;
use tracing::{error, info, warn};
use tv_organizer_core::analysis::{execute_deletion_plan, execute_resolution_plan, DeletionPlan};
use tv_organizer_core::duplicates::groups_for_show;
use tv_organizer_core::resolver::ConfidenceLevel;
use tv_organizer_core::{AppConfig, OrganizerEngine};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Cli::parse();
    let _guard = logging::init_logger(args.verbose);

    let config = match tv_organizer_core::config::load_configuration() {
        Ok(config) => config.with_directory_override(args.directories.clone()),
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let result = match args.command {
        Some(Commands::Duplicates(cmd)) => run_duplicates(config, &cmd),
        Some(Commands::Delete(cmd)) => run_delete(config, &cmd),
        Some(Commands::Resolve(cmd)) => run_resolve(config, &cmd),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {}", err);
        process::exit(1);
    }

    Ok(())
}

fn engine_for(config: AppConfig) -> OrganizerEngine {
    OrganizerEngine::new(config).with_reporter(Box::new(CliReporter::new()))
}

fn run_duplicates(config: AppConfig, args: &DuplicatesArgs) -> anyhow::Result<()> {
    let engine = engine_for(config);
    let report = engine.find_duplicates(!args.basic, args.min_confidence)?;

    let groups = match &args.show {
        Some(show) => groups_for_show(&report.groups, show),
        None => report.groups.iter().collect(),
    };

    let output = args.output.as_deref();
    report::configure_colors(output);
    let content = match args.format {
        OutputFormat::Json => report::duplicates_json(&report, &groups)?,
        OutputFormat::Text => report::duplicates_text(&report, &groups),
    };
    report::emit(&content, output)
}

fn run_delete(config: AppConfig, args: &DeleteArgs) -> anyhow::Result<()> {
    let mut settings = config.deletion.clone();
    if args.confirm_each {
        settings.confirm_each = true;
    }

    let engine = engine_for(config);
    let report = engine.find_duplicates(true, args.min_confidence)?;
    if report.groups.is_empty() {
        println!("{}", "No duplicate episodes found.".green());
        return Ok(());
    }

    let mut plan = DeletionPlan::from_groups(&report.groups, args.mode.into(), args.force, &settings);
    println!("{}", report::deletion_preview(&plan));

    let (succeeded, failed) =
        execute_deletion_plan(&mut plan, &settings, &TerminalConfirmer, engine.reporter())?;
    info!(
        "Deletion finished: {} succeeded, {} failed",
        format!("{}", succeeded).green(),
        format!("{}", failed).red(),
    );
    println!("{}", report::deletion_result(&plan));

    Ok(())
}

fn run_resolve(config: AppConfig, args: &ResolveArgs) -> anyhow::Result<()> {
    let move_phrase = config.resolver.move_phrase.clone();
    let engine = engine_for(config);
    let report = engine.resolve_paths()?;

    let output = args.output.as_deref();
    report::configure_colors(output);
    let content = match args.format {
        OutputFormat::Json => report::resolution_json(&report)?,
        OutputFormat::Text => report::resolution_text(&report),
    };
    report::emit(&content, output)?;

    let min_level: ConfidenceLevel = args.min_confidence.into();
    if !args.execute {
        let preview = execute_resolution_plan(&report.plan, min_level, true, engine.reporter());
        if args.format == OutputFormat::Text && output.is_none() {
            println!("{}", report::move_result(&preview));
        }
        return Ok(());
    }

    let selected = report.plan.executable_at(min_level);
    if selected.is_empty() {
        println!("Nothing to move.");
        return Ok(());
    }
    if report.plan.requires_review {
        warn!("Plan contains resolutions that need review; only {} or better will be moved", min_level);
    }

    let episodes: usize = selected.iter().map(|r| r.episode_count()).sum();
    let size_gb: f64 = selected.iter().map(|r| r.total_size_gb()).sum();
    let prompt = format!(
        "About to move {} episodes ({:.2} GB) in {} of {} resolutions.",
        episodes,
        size_gb,
        selected.len(),
        report.plan.resolutions.len()
    );
    if !prompt::prompt_phrase(&prompt, &move_phrase)? {
        println!("Cancelled.");
        return Ok(());
    }

    let moves = execute_resolution_plan(&report.plan, min_level, false, engine.reporter());
    println!("{}", report::move_result(&moves));

    Ok(())
}
