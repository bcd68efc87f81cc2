pub mod icons;
pub mod progress;

pub use progress::{
    TrackerUI, UiMode, format_json, format_minimal, format_percent, format_summary, print_report,
};
