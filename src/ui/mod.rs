//! Operator-facing output.
//!
//! Log lines go through `tracing`; this module prints the short summary a
//! person reads at the end of a CI job.

pub mod formatter;

pub use formatter::{
    display_boundary_warning, display_error, display_outcome, display_publish_report,
    display_release_summary, display_status, display_success,
};
