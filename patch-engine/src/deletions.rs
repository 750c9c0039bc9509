//! Deletion handling: drop pure-deletion hunks, or collapse deleted files.

use tracing::{info, warn};

use crate::errors::EngineResult;
use crate::parser::{LineKind, classify, parse_header};
use crate::types::{EditKind, FileDiff};

/// Result of [`handle_patch_deletions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The whole file was deleted; show a marker instead of the patch.
    FileDeleted,
    /// Some hunks were removed; use this patch instead.
    Filtered(String),
    /// Nothing to drop; keep the caller's patch as is.
    Unchanged,
}

/// Keep only hunks that add at least one line. Fail-soft: returns the input on error.
pub fn omit_deletion_hunks(patch: &str) -> String {
    match try_omit_deletion_hunks(patch) {
        Ok(s) => s,
        Err(e) => {
            warn!("deletions: failed to filter hunks, keeping original: {e}");
            patch.to_string()
        }
    }
}

/// Keep only hunks that add at least one line.
///
/// Pure-deletion hunks disappear entirely (header and `-` lines). Kept hunks
/// are reproduced line for line. Preamble lines before the first header stay.
pub fn try_omit_deletion_hunks(patch: &str) -> EngineResult<String> {
    let mut kept: Vec<&str> = Vec::new();
    let mut hunk: Vec<&str> = Vec::new();
    let mut inside_hunk = false;
    let mut has_added = false;

    for line in patch.lines() {
        match classify(line) {
            LineKind::Header => {
                parse_header(line)?;
                if inside_hunk && has_added {
                    kept.append(&mut hunk);
                }
                hunk.clear();
                hunk.push(line);
                inside_hunk = true;
                has_added = false;
            }
            kind if inside_hunk => {
                has_added |= kind == LineKind::Added;
                hunk.push(line);
            }
            _ => kept.push(line),
        }
    }
    if inside_hunk && has_added {
        kept.append(&mut hunk);
    }

    Ok(kept.join("\n"))
}

/// Decide what to show for a file with deletions.
///
/// A file without new content whose edit kind is `Deleted` or `Unknown` is
/// collapsed to [`DeletionOutcome::FileDeleted`]. Otherwise pure-deletion hunks
/// are dropped, and the filtered patch is returned only if it differs.
pub fn handle_patch_deletions(file: &FileDiff) -> DeletionOutcome {
    let no_new_content = file.new_content.as_deref().is_none_or(str::is_empty);
    if no_new_content && matches!(file.edit_kind, EditKind::Deleted | EditKind::Unknown) {
        info!("deletions: file '{}' was deleted, minimizing patch", file.filename);
        return DeletionOutcome::FileDeleted;
    }

    let filtered = omit_deletion_hunks(file.patch());
    if filtered != file.patch() {
        info!("deletions: file '{}', deletion-only hunks were dropped", file.filename);
        DeletionOutcome::Filtered(filtered)
    } else {
        DeletionOutcome::Unchanged
    }
}
