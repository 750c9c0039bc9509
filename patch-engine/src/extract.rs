//! Pull the hunks (and raw lines) that cover a line range on one side of a diff.

use tracing::{debug, warn};

use crate::errors::EngineResult;
use crate::parser::{Hunk, HunkCursor, LineKind, classify, parse_header};
use crate::types::Side;

/// `(contextual_rendering, raw_matching_lines)` for `[start_line, end_line]`
/// on `side`, with trailing whitespace trimmed. Two empty strings when no hunk
/// overlaps the range or the patch cannot be parsed.
pub fn extract_hunk_lines(
    patch: &str,
    filename: &str,
    start_line: usize,
    end_line: usize,
    side: Side,
) -> (String, String) {
    extract_hunk_lines_with(patch, filename, start_line, end_line, side, true)
}

pub fn extract_hunk_lines_with(
    patch: &str,
    filename: &str,
    start_line: usize,
    end_line: usize,
    side: Side,
    trim_trailing: bool,
) -> (String, String) {
    match try_extract_hunk_lines(patch, filename, start_line, end_line, side) {
        Ok(Some((rendering, selected))) if trim_trailing => (
            rendering.trim_end().to_string(),
            selected.trim_end().to_string(),
        ),
        Ok(Some(found)) => found,
        Ok(None) => {
            debug!("extract: no hunk in '{filename}' covers {start_line}..={end_line} ({side:?})");
            (String::new(), String::new())
        }
        Err(e) => {
            warn!("extract: failed to scan patch for '{filename}': {e}");
            (String::new(), String::new())
        }
    }
}

/// Inclusive range of `hunk` on `side`. An empty side still touches its start line.
fn side_range(hunk: &Hunk, side: Side) -> (usize, usize) {
    let (start, size) = match side {
        Side::Old => (hunk.old_start, hunk.old_size),
        Side::New => (hunk.new_start, hunk.new_size),
    };
    (start, start + size.max(1) - 1)
}

fn try_extract_hunk_lines(
    patch: &str,
    filename: &str,
    start_line: usize,
    end_line: usize,
    side: Side,
) -> EngineResult<Option<(String, String)>> {
    let mut rendering = format!("## File: '{}'\n", filename.trim());
    let mut selected = String::new();
    let mut matched_any = false;
    let mut cursor = HunkCursor::default();
    let mut in_range_hunk = false;

    for line in patch.lines() {
        let kind = classify(line);
        if kind == LineKind::Header {
            let hunk = parse_header(line)?;
            let (range_start, range_end) = side_range(&hunk, side);
            in_range_hunk = range_start <= end_line && start_line <= range_end;
            if in_range_hunk {
                matched_any = true;
                rendering.push('\n');
                rendering.push_str(line);
                rendering.push('\n');
            }
            cursor.enter(hunk);
            continue;
        }
        if !in_range_hunk {
            continue;
        }

        rendering.push_str(line);
        rendering.push('\n');
        if kind == LineKind::NoNewlineMarker {
            continue;
        }
        let position = match side {
            Side::New => cursor.next_new_line(),
            Side::Old => cursor.next_old_line(),
        };
        if (start_line..=end_line).contains(&position) {
            selected.push_str(line);
            selected.push('\n');
        }
        cursor.advance(kind);
    }

    Ok(matched_any.then_some((rendering, selected)))
}
