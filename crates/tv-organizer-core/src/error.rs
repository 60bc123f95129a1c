use thiserror::Error;

use crate::analysis::deletion_plan::DeletionStatus;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("No TV directories configured")]
    NoDirectories,

    #[error("Illegal deletion status transition: {from} -> {to}")]
    InvalidTransition {
        from: DeletionStatus,
        to: DeletionStatus,
    },
}
