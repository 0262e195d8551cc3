//! CLI output formatting.
//!
//! Every `format_*` function is pure and returns lines, so tests check the
//! exact text; the `print_*` wrappers only write those lines to stdout.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! Gatos Raros
//!     SUCCESS → featured/gatos-raros.jpg
//!     Source: https://example.com/cat.jpg
//! ```
//!
//! ```text
//! Gatos Raros
//!     FALLBACK_SUCCESS → featured/gatos-raros.jpg
//!     Title: diagnostic "Font 'Roboto' not found"
//! ```
//!
//! ## Log
//!
//! ```text
//! 2026-10-18 09:12:44 [SUCCESS] Image saved for 'Gatos Raros': ...
//! 2026-10-18 09:12:41 [INFO]    Search term: 'Gatos Raros'.
//! ```
//!
//! ## Bulk
//!
//! ```text
//! Processed 3 items: 1 success, 1 fallback, 1 failure
//! ```

use crate::activity_log::LogEntry;
use crate::generator::Outcome;
use crate::imaging::TitleRender;

const INDENT: &str = "    ";

/// Lines describing the outcome for one title.
pub fn format_outcome(title: &str, outcome: &Outcome) -> Vec<String> {
    let mut lines = vec![title.to_string()];
    match outcome {
        Outcome::Success {
            artifact,
            source_url,
        } => {
            lines.push(format!(
                "{INDENT}{} → {}",
                outcome.label(),
                artifact.path.display()
            ));
            lines.push(format!("{INDENT}Source: {source_url}"));
        }
        Outcome::FallbackSuccess { artifact, title } => {
            lines.push(format!(
                "{INDENT}{} → {}",
                outcome.label(),
                artifact.path.display()
            ));
            if let TitleRender::Diagnostic(message) = title {
                lines.push(format!("{INDENT}Title: diagnostic \"{message}\""));
            }
        }
        Outcome::Failure(reason) => {
            lines.push(format!("{INDENT}{}: {reason}", outcome.label()));
        }
    }
    lines
}

pub fn print_outcome(title: &str, outcome: &Outcome) {
    for line in format_outcome(title, outcome) {
        println!("{}", line);
    }
}

/// One line per entry, newest first, severity column padded.
pub fn format_log<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> Vec<String> {
    let lines: Vec<String> = entries
        .into_iter()
        .map(|entry| {
            let tag = format!("[{}]", entry.kind.label());
            format!("{} {tag:<9} {}", entry.date, entry.message)
        })
        .collect();
    if lines.is_empty() {
        vec!["Activity log is empty.".to_string()]
    } else {
        lines
    }
}

pub fn print_log<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) {
    for line in format_log(entries) {
        println!("{}", line);
    }
}

/// Tally of a bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkSummary {
    pub success: usize,
    pub fallback: usize,
    pub failure: usize,
}

impl BulkSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success { .. } => self.success += 1,
            Outcome::FallbackSuccess { .. } => self.fallback += 1,
            Outcome::Failure(_) => self.failure += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.fallback + self.failure
    }

    /// Whether the run should exit non-zero.
    pub fn has_failures(&self) -> bool {
        self.failure > 0
    }
}

pub fn format_bulk_summary(summary: &BulkSummary) -> Vec<String> {
    vec![format!(
        "Processed {} items: {} success, {} fallback, {} failure",
        summary.total(),
        summary.success,
        summary.fallback,
        summary.failure
    )]
}

pub fn print_bulk_summary(summary: &BulkSummary) {
    for line in format_bulk_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_log::LogKind;
    use crate::generator::FailureReason;
    use crate::store::{ArtifactRecord, StoredArtifact};
    use std::path::PathBuf;

    fn stored(path: &str) -> StoredArtifact {
        StoredArtifact {
            path: PathBuf::from(path),
            record: ArtifactRecord {
                title: "t".into(),
                alt: "t".into(),
                file: path.into(),
                source_url: None,
                sha256: String::new(),
                created: String::new(),
            },
        }
    }

    #[test]
    fn success_lines() {
        let outcome = Outcome::Success {
            artifact: stored("featured/gatos-raros.jpg"),
            source_url: "https://a.com/cat.jpg".into(),
        };
        assert_eq!(
            format_outcome("Gatos Raros", &outcome),
            vec![
                "Gatos Raros",
                "    SUCCESS → featured/gatos-raros.jpg",
                "    Source: https://a.com/cat.jpg",
            ]
        );
    }

    #[test]
    fn fallback_with_diagnostic() {
        let outcome = Outcome::FallbackSuccess {
            artifact: stored("featured/x.jpg"),
            title: TitleRender::Diagnostic("Font 'Roboto' not found".into()),
        };
        let lines = format_outcome("x", &outcome);
        assert_eq!(lines[1], "    FALLBACK_SUCCESS → featured/x.jpg");
        assert_eq!(lines[2], "    Title: diagnostic \"Font 'Roboto' not found\"");
    }

    #[test]
    fn fallback_with_title_has_no_extra_line() {
        let outcome = Outcome::FallbackSuccess {
            artifact: stored("featured/x.jpg"),
            title: TitleRender::Title(vec!["x".into()]),
        };
        assert_eq!(format_outcome("x", &outcome).len(), 2);
    }

    #[test]
    fn failure_line_has_reason() {
        let outcome = Outcome::Failure(FailureReason::NoImage);
        assert_eq!(
            format_outcome("x", &outcome)[1],
            "    FAILURE: no candidate succeeded and the fallback card is disabled"
        );
    }

    #[test]
    fn log_lines_pad_severity() {
        let entries = vec![
            LogEntry {
                date: "2026-10-18 09:12:44".into(),
                message: "saved".into(),
                kind: LogKind::Success,
            },
            LogEntry {
                date: "2026-10-18 09:12:41".into(),
                message: "term".into(),
                kind: LogKind::Info,
            },
        ];
        assert_eq!(
            format_log(&entries),
            vec![
                "2026-10-18 09:12:44 [SUCCESS] saved",
                "2026-10-18 09:12:41 [INFO]    term",
            ]
        );
    }

    #[test]
    fn empty_log_message() {
        assert_eq!(format_log(&Vec::new()), vec!["Activity log is empty."]);
    }

    #[test]
    fn bulk_summary_flags_failures() {
        let mut summary = BulkSummary::default();
        summary.record(&Outcome::FallbackSuccess {
            artifact: stored("a.jpg"),
            title: TitleRender::Skipped,
        });
        assert!(!summary.has_failures());
        summary.record(&Outcome::Failure(FailureReason::NoImage));
        assert!(summary.has_failures());
    }

    #[test]
    fn bulk_summary_counts() {
        let mut summary = BulkSummary::default();
        summary.record(&Outcome::Failure(FailureReason::Disabled));
        summary.record(&Outcome::Success {
            artifact: stored("a.jpg"),
            source_url: "u".into(),
        });
        assert_eq!(
            format_bulk_summary(&summary),
            vec!["Processed 2 items: 1 success, 0 fallback, 1 failure"]
        );
    }
}
