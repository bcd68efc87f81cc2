pub mod config;
pub mod errors;
pub mod feed;
pub mod logging;
pub mod progress;
pub mod registry;
pub mod snapshot;
pub mod status;
pub mod substage;
pub mod token;
pub mod ui;

pub use progress::{FailedProgress, overall_percent, overall_percent_with};
pub use registry::{PhaseDescriptor, PhaseRegistry};
pub use snapshot::{ProgressReport, Snapshot, Tracker, evaluate};
pub use status::{PhaseStatus, PhaseStatusEntry, resolve_all, resolve_status};
pub use substage::{SubStageProgress, stage_percent};
pub use token::PhaseToken;
