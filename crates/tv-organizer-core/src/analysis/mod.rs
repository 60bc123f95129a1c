pub mod deletion_plan;
pub mod resolution_plan;

pub use deletion_plan::{
    execute_deletion_plan, DeletionMode, DeletionOperation, DeletionPlan, DeletionStatus,
    SafetyCheck,
};
pub use resolution_plan::{execute_resolution_plan, MoveRecord, MoveReport, ResolutionPlan};
