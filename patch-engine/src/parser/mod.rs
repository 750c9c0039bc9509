//! Unified-diff line model shared by every stage.
//!
//! Features:
//! - Hunk header codec (`header`), byte decoding with fallbacks (`decode`).
//! - Per-line classification by leading character.
//! - `\ No newline at end of file` markers are tagged separately and never numbered.
//! - [`HunkCursor`] carries the running hunk position through a linear scan.

pub mod decode;
pub mod header;

pub use header::{Hunk, format_header, is_hunk_header, parse_header};

use tracing::debug;

use crate::types::HunkRange;

/// Role of one raw patch line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `@@ ... @@` line.
    Header,
    /// `+` line, present in the new file only.
    Added,
    /// `-` line, present in the old file only.
    Removed,
    /// Unchanged line (leading space, or an empty line whose space was trimmed).
    Context,
    /// `\ No newline at end of file`.
    NoNewlineMarker,
}

impl LineKind {
    /// Line exists in the new file.
    pub fn in_new(self) -> bool {
        matches!(self, LineKind::Added | LineKind::Context)
    }

    /// Line exists in the old file.
    pub fn in_old(self) -> bool {
        matches!(self, LineKind::Removed | LineKind::Context)
    }
}

/// Classify a raw patch line by its leading character.
pub fn classify(line: &str) -> LineKind {
    if is_hunk_header(line) {
        LineKind::Header
    } else if line.starts_with('+') {
        LineKind::Added
    } else if line.starts_with('-') {
        LineKind::Removed
    } else if is_no_newline_marker(line) {
        LineKind::NoNewlineMarker
    } else {
        LineKind::Context
    }
}

pub fn is_no_newline_marker(line: &str) -> bool {
    line.starts_with('\\')
        && line
            .to_ascii_lowercase()
            .contains("no newline at end of file")
}

/// Running position inside a patch scan.
///
/// Reset on every hunk header; advanced once per body line. Lines seen before
/// the first header (the `diff --git` / `---` / `+++` preamble) leave the
/// cursor outside any hunk.
#[derive(Debug, Clone, Default)]
pub struct HunkCursor {
    hunk: Option<Hunk>,
    new_delta: usize,
    old_delta: usize,
}

impl HunkCursor {
    pub fn enter(&mut self, hunk: Hunk) {
        self.hunk = Some(hunk);
        self.new_delta = 0;
        self.old_delta = 0;
    }

    pub fn advance(&mut self, kind: LineKind) {
        if kind.in_new() {
            self.new_delta += 1;
        }
        if kind.in_old() {
            self.old_delta += 1;
        }
    }

    /// `new_start + delta - 1`: the new-file line of the last advanced
    /// non-removed line. `-1` outside a hunk.
    pub fn absolute_new_line(&self) -> i64 {
        match &self.hunk {
            Some(h) => h.new_start as i64 + self.new_delta as i64 - 1,
            None => -1,
        }
    }

    /// New-file line the *next* non-removed line will get.
    pub fn next_new_line(&self) -> usize {
        self.hunk
            .as_ref()
            .map(|h| h.new_first_line() + self.new_delta)
            .unwrap_or(0)
    }

    /// Old-file line the *next* non-added line will get.
    pub fn next_old_line(&self) -> usize {
        self.hunk
            .as_ref()
            .map(|h| h.old_first_line() + self.old_delta)
            .unwrap_or(0)
    }
}

/// Collect `(new_start, new_start + new_size - 1)` for every hunk header.
///
/// Malformed `@@` lines are skipped; the ranges stay usable for the others.
pub fn hunk_ranges_of(patch: &str) -> Vec<HunkRange> {
    patch
        .lines()
        .filter(|l| is_hunk_header(l))
        .filter_map(|l| match parse_header(l) {
            Ok(h) => Some(HunkRange::from_new_side(&h)),
            Err(e) => {
                debug!("parser: skip malformed header in range scan: {e}");
                None
            }
        })
        .collect()
}
