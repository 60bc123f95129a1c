use crate::analysis::deletion_plan::{DeletionOperation, DeletionPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    Approve,
    Decline,
    /// Stop the whole batch before anything else is touched.
    Abort,
}

/// Interactive approval for destructive batches. The CLI prompts on the terminal.
pub trait Confirmer: Send + Sync {
    /// Batch-level approval; `phrase` is what the user must type for this mode.
    fn confirm_plan(&self, _plan: &DeletionPlan, _phrase: &str) -> ConfirmDecision {
        ConfirmDecision::Decline
    }

    /// Per-file approval, asked only when the plan confirms each operation.
    fn confirm_operation(&self, _operation: &DeletionOperation) -> ConfirmDecision {
        ConfirmDecision::Decline
    }
}

/// Declines everything. Used when no one is around to answer.
pub struct AlwaysDecline;

impl Confirmer for AlwaysDecline {}
