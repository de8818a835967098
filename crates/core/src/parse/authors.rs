use indexmap::IndexMap;
use tracing::debug;

use super::{is_indented, normalize_optional, split_key_value, ParseOutcome, Segmenter};
use crate::models::{AuthorReport, LabelDetails};

/// Parse every author report in `text`, using the default segmentation order.
pub fn parse_author_reports(text: &str) -> ParseOutcome<AuthorReport> {
    parse_author_reports_with(text, &Segmenter::author_reports())
}

/// Parse every author report in `text` with a custom segmenter.
pub fn parse_author_reports_with(text: &str, segmenter: &Segmenter) -> ParseOutcome<AuthorReport> {
    let mut outcome = ParseOutcome::default();
    for block in segmenter.segment(text) {
        match parse_author_block(&block) {
            Some(report) => outcome.records.push(report),
            None => outcome.dropped += 1,
        }
    }
    debug!(
        parsed = outcome.records.len(),
        dropped = outcome.dropped,
        "parsed author reports"
    );
    outcome
}

/// Parse a single author block.
///
/// Unindented lines carry `Username`, `Labels` (comma separated) or open a label
/// section named by their key. Indented `Label:` and `Reference:` lines fill the
/// open section. Returns `None` unless a username, a non-empty label list and at
/// least one section are present.
pub fn parse_author_block(block: &str) -> Option<AuthorReport> {
    let mut username: Option<String> = None;
    let mut label_list: Vec<String> = Vec::new();
    let mut labels: IndexMap<String, LabelDetails> = IndexMap::new();
    let mut current: Option<String> = None;

    for line in block.lines() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        if is_indented(line) {
            let Some(section) = current.as_ref().and_then(|name| labels.get_mut(name)) else {
                continue;
            };
            let Some((key, value)) = split_key_value(text) else {
                continue;
            };
            match key {
                "Label" => section.description = normalize_optional(value),
                "Reference" => section.reference_link = normalize_optional(value),
                _ => {}
            }
            continue;
        }

        let Some((key, value)) = split_key_value(text) else {
            continue;
        };
        match key {
            "Username" => username = Some(value.to_string()).filter(|name| !name.is_empty()),
            "Labels" => {
                label_list = value
                    .split(',')
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            section => {
                labels.insert(section.to_string(), LabelDetails::default());
                current = Some(section.to_string());
            }
        }
    }

    let Some(username) = username else {
        debug!("dropping author report block without Username");
        return None;
    };
    if label_list.is_empty() || labels.is_empty() {
        debug!(%username, "dropping author report block without labels");
        return None;
    }

    Some(AuthorReport {
        username,
        label_list,
        labels,
    })
}
