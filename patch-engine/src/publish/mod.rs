//! Comment-to-hunk validation before publishing.
//!
//! - A comment whose `[start_line, end_line]` lies inside a hunk's new-side
//!   range is left alone.
//! - A near miss (one-sided overlap, distance below the configured limit) is
//!   clamped onto the nearest hunk and its suggestion block becomes a diff.
//! - Anything else keeps its range and is marked invalid for the publisher
//!   to reject. Comments are never dropped here.
//!
//! Each outcome is stored in [`CommentPlacement::status`] so the caller can
//! report which hunk was nearest and by how much.

pub mod suggestion;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PatchConfig;
use crate::types::{FileDiff, HunkRange, Side};

pub use suggestion::{full_context_diff, rewrite_suggestion_body};

/// Diagnostic trail of one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlacementStatus {
    /// Not evaluated (missing lines or code, or unknown file).
    #[default]
    Unchecked,
    InsideHunk,
    /// Range was moved from `from` into `hunk`.
    Clamped {
        from: (usize, usize),
        hunk: HunkRange,
        distance: usize,
    },
    /// No hunk close enough; the publisher should reject the comment.
    Invalid {
        nearest: Option<HunkRange>,
        distance: Option<usize>,
    },
}

/// An inline comment proposed for one file of the diff.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentPlacement {
    pub file: String,
    /// 1-based, inclusive.
    pub start_line: Option<usize>,
    /// 1-based, inclusive.
    pub end_line: Option<usize>,
    pub side: Side,
    pub body: String,
    pub original_before_code: Option<String>,
    pub original_after_code: Option<String>,
    #[serde(default)]
    pub status: PlacementStatus,
}

impl CommentPlacement {
    pub fn new(file: impl Into<String>, start_line: usize, end_line: usize, body: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            start_line: Some(start_line),
            end_line: Some(end_line),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.original_before_code = Some(before.into());
        self.original_after_code = Some(after.into());
        self
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.status, PlacementStatus::Invalid { .. })
    }
}

/// Counts of one [`validate_comments_inside_hunks`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub inside: usize,
    pub clamped: usize,
    pub invalid: usize,
    pub skipped: usize,
}

/// Nearest one-sided overlap of `[start, end]` with any of `ranges`.
///
/// `d1 = start - range.start`, `d2 = range.end - end`; a range is a candidate
/// when `d1 * d2 <= 0`, scored by `max(|min(d1, 0)|, |min(d2, 0)|)`. Ties keep
/// the first range.
fn nearest_range(ranges: &[HunkRange], start: usize, end: usize) -> Option<(HunkRange, usize)> {
    let mut best: Option<(HunkRange, usize)> = None;
    for range in ranges {
        let d1 = start as i64 - range.start as i64;
        let d2 = range.end as i64 - end as i64;
        if d1 * d2 > 0 {
            continue;
        }
        let distance = d1.min(0).unsigned_abs().max(d2.min(0).unsigned_abs()) as usize;
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((*range, distance));
        }
    }
    best
}

/// Validate one comment against `file`'s hunks and update it in place.
pub fn validate_comment(file: &FileDiff, comment: &mut CommentPlacement, max_distance: usize) -> PlacementStatus {
    let (Some(start), Some(end), Some(before), Some(after)) = (
        comment.start_line,
        comment.end_line,
        comment.original_before_code.as_deref(),
        comment.original_after_code.as_deref(),
    ) else {
        debug!("validate: comment on '{}' lacks lines or code, passing through", comment.file);
        return comment.status.clone();
    };

    let ranges = file.hunk_ranges();
    comment.status = if ranges.iter().any(|r| r.contains(start, end)) {
        PlacementStatus::InsideHunk
    } else if start > end {
        warn!("validate: comment on '{}' has reversed range {start}..={end}", comment.file);
        PlacementStatus::Invalid {
            nearest: None,
            distance: None,
        }
    } else {
        match nearest_range(ranges, start, end) {
            Some((hunk, distance)) if distance < max_distance => {
                let new_start = start.clamp(hunk.start, hunk.end);
                let new_end = end.clamp(hunk.start, hunk.end);
                comment.start_line = Some(new_start);
                comment.end_line = Some(new_end);
                comment.body = rewrite_suggestion_body(&comment.body, before, after);
                info!(
                    "validate: comment moved to a valid hunk file={} from={}..={} to={}..={} distance={}",
                    comment.file, start, end, new_start, new_end, distance
                );
                PlacementStatus::Clamped {
                    from: (start, end),
                    hunk,
                    distance,
                }
            }
            nearest => {
                warn!(
                    "validate: comment is not inside a valid hunk file={} lines={}..={} nearest={:?}",
                    comment.file, start, end, nearest
                );
                PlacementStatus::Invalid {
                    nearest: nearest.map(|(h, _)| h),
                    distance: nearest.map(|(_, d)| d),
                }
            }
        }
    };
    comment.status.clone()
}

/// Validate every comment against the diff it belongs to.
///
/// Hunk ranges are computed once per [`FileDiff`] and reused for every
/// comment on that file.
pub fn validate_comments_inside_hunks(
    files: &[FileDiff],
    comments: &mut [CommentPlacement],
    cfg: &PatchConfig,
) -> ValidationSummary {
    let mut summary = ValidationSummary::default();
    for comment in comments.iter_mut() {
        let path = comment.file.trim();
        let Some(file) = files.iter().find(|f| f.filename == path) else {
            debug!("validate: file '{path}' is not part of the diff, passing comment through");
            summary.skipped += 1;
            continue;
        };
        match validate_comment(file, comment, cfg.max_comment_hunk_distance) {
            PlacementStatus::Unchecked => summary.skipped += 1,
            PlacementStatus::InsideHunk => summary.inside += 1,
            PlacementStatus::Clamped { .. } => summary.clamped += 1,
            PlacementStatus::Invalid { .. } => summary.invalid += 1,
        }
    }

    info!(
        "validate: done comments={} inside={} clamped={} invalid={} skipped={}",
        comments.len(),
        summary.inside,
        summary.clamped,
        summary.invalid,
        summary.skipped
    );
    summary
}
