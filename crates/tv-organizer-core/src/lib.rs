pub mod analysis;
pub mod config;
pub mod confirm;
pub mod duplicates;
pub mod engine;
pub mod episode;
pub mod error;
pub mod platform;
pub mod progress;
pub mod resolver;
pub mod scanner;

pub use config::AppConfig;
pub use confirm::{AlwaysDecline, ConfirmDecision, Confirmer};
pub use engine::{DuplicateReport, OrganizerEngine, ResolutionReport};
pub use episode::{Episode, EpisodeStatus, Quality};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
