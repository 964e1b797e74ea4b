//! Formatting of run results.
//!
//! `format_*` functions build the text and are tested; `display_*` functions
//! only print it.

use crate::boundary::BoundaryWarning;
use crate::pipeline::{ReleaseSummary, RunOutcome};
use crate::publish::{PublishOutcome, PublishReport};
use console::style;
use std::fmt::Write as _;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// One line per publish call, grouped in call order.
pub fn format_publish_report(report: &PublishReport) -> String {
    let mut out = String::new();
    for record in &report.records {
        let (mark, detail) = match &record.outcome {
            PublishOutcome::Succeeded { url } => (
                style("✓").green().to_string(),
                url.clone().unwrap_or_default(),
            ),
            PublishOutcome::Failed { reason } => (style("✗").red().to_string(), reason.clone()),
            PublishOutcome::Skipped { reason } => (style("-").dim().to_string(), reason.clone()),
        };
        if detail.is_empty() {
            let _ = writeln!(out, "  {} [{}] {}", mark, record.target, record.item);
        } else {
            let _ = writeln!(
                out,
                "  {} [{}] {} ({})",
                mark, record.target, record.item, detail
            );
        }
    }
    out
}

pub fn format_release_summary(summary: &ReleaseSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style("Release").bold());
    let _ = writeln!(
        out,
        "  From: {}",
        summary.base_tag.as_deref().unwrap_or("<start of history>")
    );
    let _ = writeln!(out, "  To:   {}", style(&summary.version).green());
    let _ = writeln!(out, "  Commits: {}", summary.commit_count);
    if summary.restart_required {
        let _ = writeln!(out, "  {}", style("Restart required").yellow());
    }

    for section in &summary.changelog.sections {
        let _ = writeln!(out, "  {}", style(&section.title).underlined());
        for entry in &section.entries {
            let _ = writeln!(out, "    - {}", entry);
        }
    }
    for artifact in &summary.artifacts {
        let _ = writeln!(out, "  Artifact: {}", artifact.path.display());
    }
    if summary.tagged {
        let _ = writeln!(out, "  Tagged: {}", summary.version);
    }
    out
}

pub fn display_publish_report(report: &PublishReport) {
    if report.records.is_empty() {
        return;
    }
    println!("\n{}", style("Publish results:").bold());
    print!("{}", format_publish_report(report));
}

pub fn display_release_summary(summary: &ReleaseSummary) {
    println!();
    print!("{}", format_release_summary(summary));
}

/// Print everything the operator needs for one run outcome.
pub fn display_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::NothingToRelease { base_tag, warnings } => {
            for warning in warnings {
                display_boundary_warning(warning);
            }
            display_status(&format!(
                "Nothing to release since {}",
                base_tag.as_deref().unwrap_or("the start of history")
            ));
        }
        RunOutcome::DryRun(summary) => {
            for warning in &summary.warnings {
                display_boundary_warning(warning);
            }
            display_release_summary(summary);
            for document in &summary.documents {
                display_status(&format!("Rendered {}", document.display()));
            }
            display_success(&format!("Dry run for {} complete", summary.version));
        }
        RunOutcome::Released(summary) => {
            for warning in &summary.warnings {
                display_boundary_warning(warning);
            }
            display_release_summary(summary);
            display_publish_report(&summary.report);
            let failed = summary.report.failures().count();
            if failed == 0 {
                display_success(&format!("Released {}", summary.version));
            } else {
                display_status(&format!(
                    "Released {} with {} failed publish call(s)",
                    summary.version, failed
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ChangeSection, Changelog};
    use crate::domain::ReleaseVersion;
    use crate::publish::{PublishRecord, PublishTarget};
    use chrono::NaiveDate;

    fn summary() -> ReleaseSummary {
        let now = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        ReleaseSummary {
            version: ReleaseVersion::next(&semver::Version::new(1, 2, 0), "stable", now).unwrap(),
            base_tag: None,
            commit_count: 2,
            changelog: Changelog {
                sections: vec![ChangeSection {
                    title: "Fixes".to_string(),
                    entries: vec!["fix Y".to_string()],
                }],
            },
            restart_required: true,
            documents: Vec::new(),
            artifacts: Vec::new(),
            report: PublishReport::default(),
            tagged: false,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_format_release_summary() {
        console::set_colors_enabled(false);
        let text = format_release_summary(&summary());

        assert!(text.contains("From: <start of history>"));
        assert!(text.contains("To:   1.2.0-stable.20240601_0930"));
        assert!(text.contains("Restart required"));
        assert!(text.contains("    - fix Y"));
    }

    #[test]
    fn test_format_publish_report() {
        console::set_colors_enabled(false);
        let report = PublishReport {
            records: vec![
                PublishRecord {
                    target: PublishTarget::ReleaseHost,
                    item: "1.2.0".to_string(),
                    outcome: PublishOutcome::Succeeded {
                        url: Some("https://host.test/r".to_string()),
                    },
                },
                PublishRecord {
                    target: PublishTarget::Forum,
                    item: "1.2.0".to_string(),
                    outcome: PublishOutcome::Skipped {
                        reason: "not stable".to_string(),
                    },
                },
                PublishRecord {
                    target: PublishTarget::ObjectStore,
                    item: "stable/index.json".to_string(),
                    outcome: PublishOutcome::Succeeded { url: None },
                },
            ],
        };

        let text = format_publish_report(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  ✓ [release host] 1.2.0 (https://host.test/r)");
        assert_eq!(lines[1], "  - [forum] 1.2.0 (not stable)");
        assert_eq!(lines[2], "  ✓ [object store] stable/index.json");
    }

    #[test]
    fn test_display_helpers_do_not_panic() {
        display_error("test error");
        display_success("test success");
        display_status("test status");
        display_outcome(&RunOutcome::NothingToRelease {
            base_tag: None,
            warnings: vec![BoundaryWarning::NoTags],
        });
    }
}
