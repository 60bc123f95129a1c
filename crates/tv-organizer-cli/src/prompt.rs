use colored::*;
use std::io::{self, Write};
use tv_organizer_core::analysis::{DeletionOperation, DeletionPlan};
use tv_organizer_core::{ConfirmDecision, Confirmer};

/// Ask the user to type `phrase` exactly. Anything else declines.
pub fn prompt_phrase(prompt: &str, phrase: &str) -> io::Result<bool> {
    print!("{} Type '{}' to continue: ", prompt, phrase.bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim() == phrase)
}

/// Yes/no/quit question. Quit aborts the rest of the batch.
fn prompt_yes_no_quit(prompt: &str) -> io::Result<ConfirmDecision> {
    let mut input = String::new();

    loop {
        input.clear();
        print!("{} (y/N/q): ", prompt);
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(ConfirmDecision::Abort);
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(ConfirmDecision::Approve),
            "N" | "" => return Ok(ConfirmDecision::Decline),
            "Q" => return Ok(ConfirmDecision::Abort),
            _ => continue,
        }
    }
}

/// Confirms deletions on the terminal.
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm_plan(&self, plan: &DeletionPlan, phrase: &str) -> ConfirmDecision {
        let prompt = format!(
            "About to {} {} files ({:.2} GB).",
            plan.mode.to_string().red().bold(),
            plan.ready_operations().len(),
            plan.estimated_space_saved() as f64 / (1024.0 * 1024.0 * 1024.0)
        );
        match prompt_phrase(&prompt, phrase) {
            Ok(true) => ConfirmDecision::Approve,
            Ok(false) => ConfirmDecision::Decline,
            Err(_) => ConfirmDecision::Abort,
        }
    }

    fn confirm_operation(&self, operation: &DeletionOperation) -> ConfirmDecision {
        let prompt = format!(
            "Delete {} ({})?",
            operation.episode.path.display(),
            operation.reason
        );
        prompt_yes_no_quit(&prompt).unwrap_or(ConfirmDecision::Abort)
    }
}
