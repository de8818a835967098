use tracing::{debug, warn};

use super::{is_indented, normalize_optional, split_key_value, ParseOutcome, Segmenter};
use crate::models::ModReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Game,
    ModId,
    Status,
    Reason,
    Alternative,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "Game Shortname" => Some(Self::Game),
            "Mod ID" => Some(Self::ModId),
            "Status" => Some(Self::Status),
            "Reason" => Some(Self::Reason),
            "Alternative" => Some(Self::Alternative),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Draft {
    game: Option<String>,
    mod_id: Option<String>,
    status: Option<String>,
    reason: Option<String>,
    alternative: Option<String>,
}

impl Draft {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Game => &mut self.game,
            Field::ModId => &mut self.mod_id,
            Field::Status => &mut self.status,
            Field::Reason => &mut self.reason,
            Field::Alternative => &mut self.alternative,
        }
    }

    fn set(&mut self, field: Field, value: &str) {
        *self.slot(field) = Some(value.to_string());
    }

    fn append(&mut self, field: Field, line: &str) {
        let slot = self.slot(field);
        let joined = match slot.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{line}"),
            _ => line.to_string(),
        };
        *slot = Some(joined);
    }

    fn finish(self) -> Result<ModReport, &'static str> {
        let game = required(self.game).ok_or("Game Shortname")?;
        let mod_id = required(self.mod_id).ok_or("Mod ID")?;
        let status = required(self.status).ok_or("Status")?;
        Ok(ModReport {
            game,
            mod_id,
            status,
            reason: self.reason.filter(|reason| !reason.is_empty()),
            alternative: self.alternative.as_deref().and_then(normalize_optional),
        })
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Parse every mod report in `text`, using the default segmentation order.
pub fn parse_mod_reports(text: &str) -> ParseOutcome<ModReport> {
    parse_mod_reports_with(text, &Segmenter::mod_reports())
}

/// Parse every mod report in `text` with a custom segmenter.
pub fn parse_mod_reports_with(text: &str, segmenter: &Segmenter) -> ParseOutcome<ModReport> {
    let mut outcome = ParseOutcome::default();
    for block in segmenter.segment(text) {
        match parse_mod_block(&block) {
            Some(report) => {
                if !report.has_known_status() {
                    warn!(
                        game = %report.game,
                        mod_id = %report.mod_id,
                        "unrecognised status {:?}", report.status
                    );
                }
                outcome.records.push(report);
            }
            None => outcome.dropped += 1,
        }
    }
    debug!(
        parsed = outcome.records.len(),
        dropped = outcome.dropped,
        "parsed mod reports"
    );
    outcome
}

/// Parse a single block. Returns `None` when game, mod id or status is missing.
///
/// Unindented `Key: Value` lines set fields; any other non-blank line continues
/// the most recent field on a new line. Lines after an unrecognised key are
/// ignored until the next key.
pub fn parse_mod_block(block: &str) -> Option<ModReport> {
    let mut draft = Draft::default();
    let mut current: Option<Field> = None;

    for line in block.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if !is_indented(line) {
            if let Some((key, value)) = split_key_value(line) {
                current = Field::from_key(key);
                if let Some(field) = current {
                    draft.set(field, value);
                }
                continue;
            }
        }

        if let Some(field) = current {
            draft.append(field, line.trim());
        }
    }

    match draft.finish() {
        Ok(report) => Some(report),
        Err(missing) => {
            debug!("dropping mod report block without {missing}");
            None
        }
    }
}
