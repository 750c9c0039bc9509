//! Hunk validity check: does the hunk still line up with the supplied original file?

use tracing::info;

use crate::parser::decode::{FALLBACK_ENCODINGS, FallbackEncoding, reencode_as_utf8};
use crate::parser::{Hunk, LineKind, classify};

/// Outcome of comparing a hunk's first old-side line with the original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkValidity {
    /// Offsets match; safe to pull extra context from the file.
    Valid,
    /// Matches only after re-encoding the file line. Not an error, but the
    /// file text is not trustworthy enough to copy context from.
    EncodingMismatch(FallbackEncoding),
    /// No match under any encoding; the hunk keeps its original bounds.
    Invalid,
}

impl HunkValidity {
    pub fn is_extendable(self) -> bool {
        matches!(self, HunkValidity::Valid)
    }
}

/// Compare the line right after the header with `original_lines[old_start - 1]`.
///
/// Only context and removed lines carry old-file text; if the hunk starts with
/// an added line (or has no body) there is nothing to compare and the hunk is
/// considered valid.
pub fn check_hunk_against_file(
    hunk: &Hunk,
    first_body_line: Option<&str>,
    original_lines: &[&str],
) -> HunkValidity {
    let Some(body) = first_body_line else {
        return HunkValidity::Valid;
    };
    let patch_text = match classify(body) {
        LineKind::Context | LineKind::Removed => body.get(1..).unwrap_or("").trim(),
        _ => return HunkValidity::Valid,
    };
    if hunk.old_start == 0 {
        return HunkValidity::Valid;
    }

    let Some(file_line) = original_lines.get(hunk.old_start - 1) else {
        info!(
            "extend: hunk starts at old line {} but original has {} lines",
            hunk.old_start,
            original_lines.len()
        );
        return HunkValidity::Invalid;
    };
    let file_text = file_line.trim();
    if file_text == patch_text {
        return HunkValidity::Valid;
    }

    for enc in FALLBACK_ENCODINGS {
        if reencode_as_utf8(file_text, enc).is_some_and(|s| s.trim() == patch_text) {
            info!(
                "extend: different encoding in hunk at old line {}, needed encoding: {}",
                hunk.old_start,
                enc.label()
            );
            return HunkValidity::EncodingMismatch(enc);
        }
    }

    info!(
        "extend: invalid hunk at old line {}: patch has {:?}, original has {:?}",
        hunk.old_start, patch_text, file_text
    );
    HunkValidity::Invalid
}
