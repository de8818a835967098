//! Operator-facing preview of parsed reports.

use std::fmt::Write;

use crate::models::{AuthorReport, ModReport};

const REPORT_RULE: &str = "----------------------------------------";

/// Render mod reports, one paragraph per report.
pub fn mod_reports(reports: &[ModReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "Game: {}", report.game);
        let _ = writeln!(out, "Mod ID: {}", report.mod_id);
        let _ = writeln!(out, "Status: {}", report.status);
        if let Some(reason) = &report.reason {
            let _ = writeln!(out, "Reason: {}", indent_continuation(reason));
        }
        let _ = writeln!(
            out,
            "Alternative: {}",
            report.alternative.as_deref().unwrap_or("None")
        );
        out.push('\n');
    }
    out
}

/// Render author reports with their label sections, separated by a dashed rule.
pub fn author_reports(reports: &[AuthorReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "Username: {}", report.username);
        let _ = writeln!(out, "Labels: {}\n", report.label_list.join(", "));
        for label in &report.label_list {
            let details = report.details_for(label);
            let _ = writeln!(out, "{label}:");
            let _ = writeln!(
                out,
                "  Label: {}",
                details.description.as_deref().unwrap_or("None")
            );
            let _ = writeln!(
                out,
                "  Reference: {}\n",
                details.reference_link.as_deref().unwrap_or("None")
            );
        }
        let unlisted: Vec<&str> = report.unlisted_sections().collect();
        if !unlisted.is_empty() {
            let _ = writeln!(out, "Ignored (not in Labels): {}\n", unlisted.join(", "));
        }
        let _ = writeln!(out, "{REPORT_RULE}\n");
    }
    out
}

fn indent_continuation(text: &str) -> String {
    text.replace('\n', "\n        ")
}
