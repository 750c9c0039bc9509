//! Public entry for the patch-engine.
//!
//! Takes a minimal unified diff plus the full old/new file contents and turns
//! it into something a reviewer model can read and a publisher can anchor to.
//!
//! 1) **Deletions** (`deletions`)
//!    - Collapse deleted files to a marker
//!    - Drop hunks that only remove lines
//!
//! 2) **Context extension** (`extend`)
//!    - Check each hunk against the original file (with encoding fallbacks)
//!    - Add static or section-anchored context above, and context below
//!
//! 3) **Line-annotated rendering** (`render`)
//!    - `__new hunk__` with absolute new-file numbers, `__old hunk__` unnumbered
//!
//! 4) **Mapping and publishing helpers** (`map`, `extract`, `publish`)
//!    - Line number / text / patch index lookups
//!    - Hunk extraction for a line range on either side
//!    - Clamp or reject inline comments that miss every hunk
//!
//! Everything is synchronous and pure. Stages that rewrite a patch are
//! fail-soft: on error they log a warning and return their input.

pub mod config;
pub mod deletions;
pub mod errors;
pub mod extend;
pub mod extract;
pub mod map; // line locator
pub mod parser;
pub mod publish; // comment-to-hunk validation
pub mod render;
pub mod telemetry;
pub mod types;

use tracing::debug;

pub use config::{ExtendOptions, PatchConfig};
pub use deletions::{DeletionOutcome, handle_patch_deletions, omit_deletion_hunks};
pub use errors::{EngineError, EngineResult};
pub use extend::{extend_file_patch, extend_patch};
pub use extract::extract_hunk_lines;
pub use map::{LineQuery, locate_by_absolute_line, locate_by_patch_index, locate_by_text, locate_in_files};
pub use parser::{Hunk, format_header, parse_header};
pub use publish::{CommentPlacement, PlacementStatus, ValidationSummary, validate_comments_inside_hunks};
pub use render::{render_file, render_with_line_numbers};
pub use types::{EditKind, FileDiff, HunkRange, LineLocation, Side};

/// Run deletions, extension and rendering for one file.
///
/// `file` is not modified; the returned text is the `## File:` block with
/// `__new hunk__` / `__old hunk__` sections, or the deletion marker.
pub fn prepare_file_patch(file: &FileDiff, cfg: &PatchConfig) -> String {
    let patch = match handle_patch_deletions(file) {
        DeletionOutcome::FileDeleted => {
            return render_file(&file.filename, EditKind::Deleted, file.patch());
        }
        DeletionOutcome::Filtered(filtered) => filtered,
        DeletionOutcome::Unchanged => file.patch().to_string(),
    };

    let extended = if cfg.should_skip_extension(&file.filename) {
        debug!("extend: skip '{}' by extension", file.filename);
        patch
    } else {
        extend_patch(
            file.original_content.as_deref(),
            file.new_content.as_deref(),
            &patch,
            &cfg.extend_options(),
        )
    };

    render_file(&file.filename, file.edit_kind, &extended)
}
