//! Map between new-file line numbers, line text, and raw patch positions.
//!
//! Every lookup shares one walk: a [`HunkCursor`] is entered at each header
//! and advanced per body line, so after advancing a non-removed line
//! `absolute_new_line = new_start + delta - 1`.
//!
//! Lookups:
//! 1) by absolute new-file line -> raw index;
//! 2) by literal (or near-literal) text -> raw index + absolute line;
//! 3) by raw index -> absolute line (reverse).
//!
//! Not found is never an error: callers get [`LineLocation::NOT_FOUND`].

use tracing::{debug, trace};

use crate::parser::{HunkCursor, LineKind, classify, parse_header};
use crate::types::{FileDiff, LineLocation};

/// Similarity ratio a fuzzy candidate must reach.
const FUZZY_CUTOFF: f32 = 0.93;
/// Number of fuzzy candidates considered.
const FUZZY_CANDIDATES: usize = 3;

/// One raw patch line as seen by the walk.
#[derive(Debug, Clone, Copy)]
struct WalkedLine<'a> {
    index: usize,
    text: &'a str,
    kind: LineKind,
    /// `-1` outside a hunk.
    absolute_new_line: i64,
}

impl WalkedLine<'_> {
    /// Lines a new-side lookup may land on.
    fn is_new_side_body(&self) -> bool {
        self.kind.in_new() && self.absolute_new_line >= 0
    }
}

/// Walk `patch` line by line, tracking the new-file position.
///
/// Malformed headers leave the walk outside any hunk until the next valid
/// header, so their body lines can never match.
fn walk(patch: &str) -> impl Iterator<Item = WalkedLine<'_>> {
    let mut cursor = HunkCursor::default();
    let mut lost = false;
    patch.lines().enumerate().map(move |(index, text)| {
        let kind = classify(text);
        match kind {
            LineKind::Header => match parse_header(text) {
                Ok(h) => {
                    cursor.enter(h);
                    lost = false;
                }
                Err(e) => {
                    debug!("map: skip hunk with malformed header at line {index}: {e}");
                    lost = true;
                }
            },
            LineKind::NoNewlineMarker => {}
            _ => cursor.advance(kind),
        }
        let absolute_new_line = if lost || kind == LineKind::Header {
            -1
        } else {
            cursor.absolute_new_line()
        };
        WalkedLine {
            index,
            text,
            kind,
            absolute_new_line,
        }
    })
}

/// Raw index of the line that sits at new-file line `target`.
pub fn locate_by_absolute_line(patch: &str, target: usize) -> LineLocation {
    walk(patch)
        .find(|l| l.is_new_side_body() && l.absolute_new_line == target as i64)
        .map(|l| LineLocation::found(l.index, l.absolute_new_line))
        .unwrap_or(LineLocation::NOT_FOUND)
}

/// First non-removed line containing `text`, with fuzzy and `+`-stripped fallbacks.
pub fn locate_by_text(patch: &str, text: &str) -> LineLocation {
    if text.is_empty() {
        return LineLocation::NOT_FOUND;
    }

    let raw: Vec<&str> = patch.lines().collect();
    let fuzzy = similar::get_close_matches(text, &raw, FUZZY_CANDIDATES, FUZZY_CUTOFF);
    let needle = match fuzzy.as_slice() {
        [only] if only.starts_with('+') => {
            trace!("map: fuzzy match replaces search text with {only:?}");
            *only
        }
        _ => text,
    };

    let found = find_containing(patch, needle);
    if found.is_found() {
        return found;
    }

    match needle.strip_prefix('+') {
        Some(rest) => {
            let stripped = rest.trim();
            if stripped.is_empty() {
                LineLocation::NOT_FOUND
            } else {
                find_containing(patch, stripped)
            }
        }
        None => LineLocation::NOT_FOUND,
    }
}

fn find_containing(patch: &str, needle: &str) -> LineLocation {
    walk(patch)
        .find(|l| l.is_new_side_body() && l.text.contains(needle))
        .map(|l| LineLocation::found(l.index, l.absolute_new_line))
        .unwrap_or(LineLocation::NOT_FOUND)
}

/// New-file line of raw line `index`. Not found for headers, removed lines,
/// markers, preamble and out-of-range indices.
pub fn locate_by_patch_index(patch: &str, index: usize) -> LineLocation {
    walk(patch)
        .nth(index)
        .filter(WalkedLine::is_new_side_body)
        .map(|l| LineLocation::found(l.index, l.absolute_new_line))
        .unwrap_or(LineLocation::NOT_FOUND)
}

/// What to look up in [`locate_in_files`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineQuery<'a> {
    Absolute(usize),
    Text(&'a str),
    PatchIndex(usize),
}

/// Resolve `filename` among `files` and run `query` against its patch.
pub fn locate_in_files(files: &[FileDiff], filename: &str, query: LineQuery<'_>) -> LineLocation {
    let Some(file) = files.iter().find(|f| f.filename == filename) else {
        debug!("map: file '{filename}' is not part of the diff");
        return LineLocation::NOT_FOUND;
    };
    match query {
        LineQuery::Absolute(line) => locate_by_absolute_line(file.patch(), line),
        LineQuery::Text(text) => locate_by_text(file.patch(), text),
        LineQuery::PatchIndex(index) => locate_by_patch_index(file.patch(), index),
    }
}
