//! Deterministic splitting of pasted text into report blocks.

/// A kind of boundary between two reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// A line made only of `-` characters, at least two of them.
    ///
    /// Older versions of the updater also split on a lone `-`. That line is kept
    /// inside the block here, since `-` on its own line is a common "none" value.
    SeparatorLine,
    /// A run of at least `min` consecutive blank lines. Shorter runs stay inside a block.
    BlankRun {
        /// Minimum run length that counts as a boundary.
        min: usize,
    },
}

/// Splits text into blocks using the first [`Boundary`] that occurs in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmenter {
    order: Vec<Boundary>,
}

impl Segmenter {
    /// Build a segmenter that tries boundaries in the given priority order.
    pub fn new(order: impl Into<Vec<Boundary>>) -> Self {
        Self {
            order: order.into(),
        }
    }

    /// Order used for mod reports, which are written one blank line apart.
    pub fn mod_reports() -> Self {
        Self::new([
            Boundary::SeparatorLine,
            Boundary::BlankRun { min: 2 },
            Boundary::BlankRun { min: 1 },
        ])
    }

    /// Order used for author reports, whose label sections are one blank line apart.
    pub fn author_reports() -> Self {
        Self::new([Boundary::SeparatorLine, Boundary::BlankRun { min: 2 }])
    }

    /// Boundaries in priority order.
    pub fn order(&self) -> &[Boundary] {
        &self.order
    }

    /// Split `text` into blocks. See [`segment`].
    pub fn segment(&self, text: &str) -> Vec<String> {
        segment(text, &self.order)
    }
}

/// Split `text` into report blocks.
///
/// The first boundary in `order` that occurs between two non-blank lines is used
/// for the whole text. When none occurs, the text is a single block. Blocks lose
/// their leading and trailing blank lines; inner lines are kept verbatim, so
/// indentation survives. Empty blocks are never returned.
pub fn segment(text: &str, order: &[Boundary]) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();

    for boundary in order {
        if let Some(blocks) = split_on(*boundary, &lines) {
            return blocks;
        }
    }

    finish_block(&lines).into_iter().collect()
}

fn split_on(boundary: Boundary, lines: &[&str]) -> Option<Vec<String>> {
    match boundary {
        Boundary::SeparatorLine => {
            if !lines.iter().any(|line| is_separator(line)) {
                return None;
            }
            let blocks = lines
                .split(|line| is_separator(line))
                .filter_map(finish_block)
                .collect();
            Some(blocks)
        }
        Boundary::BlankRun { min } => split_on_blank_runs(lines, min.max(1)),
    }
}

fn split_on_blank_runs(lines: &[&str], min: usize) -> Option<Vec<String>> {
    let first = lines.iter().position(|line| !is_blank(line))?;
    let last = lines.iter().rposition(|line| !is_blank(line))?;
    let body = &lines[first..=last];

    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut pending_blanks: Vec<&str> = Vec::new();
    let mut split = false;

    for &line in body {
        if is_blank(line) {
            pending_blanks.push(line);
            continue;
        }
        if pending_blanks.len() >= min {
            blocks.extend(finish_block(&current));
            current.clear();
            split = true;
        } else {
            current.append(&mut pending_blanks);
        }
        pending_blanks.clear();
        current.push(line);
    }
    blocks.extend(finish_block(&current));

    split.then_some(blocks)
}

fn finish_block(lines: &[&str]) -> Option<String> {
    let first = lines.iter().position(|line| !is_blank(line))?;
    let last = lines.iter().rposition(|line| !is_blank(line))?;
    Some(lines[first..=last].join("\n"))
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.chars().all(|ch| ch == '-')
}
