//! Caller-facing data model: one file's diff and the results the engine hands back.
//!
//! A [`FileDiff`] is built by the caller (usually from a provider's "files"
//! payload) for a single diff/comment-publishing operation. The engine borrows
//! it and never keeps it.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::parser::decode::decode_bytes;
use crate::parser::{Hunk, hunk_ranges_of};

/// How the file changed in the change request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EditKind {
    Added,
    Deleted,
    Modified,
    Renamed,
    #[default]
    Unknown,
}

/// Side of a diff a line range refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Side {
    /// Old file (GitHub "LEFT").
    Old,
    /// New file (GitHub "RIGHT").
    #[default]
    New,
}

/// Inclusive new-file line range covered by one hunk (1-based).
///
/// An empty hunk side yields `end == start - 1`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HunkRange {
    pub start: usize,
    pub end: usize,
}

impl HunkRange {
    pub fn from_new_side(h: &Hunk) -> Self {
        Self {
            start: h.new_start,
            end: (h.new_start + h.new_size).saturating_sub(1),
        }
    }

    /// True if `[start, end]` lies fully inside this range.
    pub fn contains(&self, start: usize, end: usize) -> bool {
        start >= self.start && end <= self.end
    }
}

/// Position of a line inside a raw patch.
///
/// Both fields are `-1` when nothing matched; never partially populated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineLocation {
    /// 0-based index into `patch.lines()`.
    pub patch_line_index: i64,
    /// 1-based line number in the new file.
    pub absolute_new_line: i64,
}

impl LineLocation {
    pub const NOT_FOUND: LineLocation = LineLocation {
        patch_line_index: -1,
        absolute_new_line: -1,
    };

    pub fn found(patch_line_index: usize, absolute_new_line: i64) -> Self {
        Self {
            patch_line_index: patch_line_index as i64,
            absolute_new_line,
        }
    }

    pub fn is_found(&self) -> bool {
        self.patch_line_index >= 0
    }
}

/// One file of a change request: contents on both sides plus the raw patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDiff {
    /// Repo-relative path in the new revision.
    pub filename: String,
    /// Full file at the base revision (absent for added files).
    pub original_content: Option<String>,
    /// Full file at the head revision (absent for deleted files).
    pub new_content: Option<String>,
    pub edit_kind: EditKind,
    patch: String,
    /// Lazily computed hunk ranges; reset whenever `patch` is replaced.
    #[serde(skip)]
    hunk_ranges: OnceLock<Vec<HunkRange>>,
}

impl FileDiff {
    pub fn new(filename: impl Into<String>, patch: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            patch: patch.into(),
            ..Self::default()
        }
    }

    pub fn with_original(mut self, content: impl Into<String>) -> Self {
        self.original_content = Some(content.into());
        self
    }

    pub fn with_new(mut self, content: impl Into<String>) -> Self {
        self.new_content = Some(content.into());
        self
    }

    /// Same as [`FileDiff::with_original`] for raw provider bytes.
    pub fn with_original_bytes(self, bytes: &[u8]) -> Self {
        self.with_original(decode_bytes(bytes))
    }

    /// Same as [`FileDiff::with_new`] for raw provider bytes.
    pub fn with_new_bytes(self, bytes: &[u8]) -> Self {
        self.with_new(decode_bytes(bytes))
    }

    pub fn with_edit_kind(mut self, kind: EditKind) -> Self {
        self.edit_kind = kind;
        self
    }

    pub fn patch(&self) -> &str {
        &self.patch
    }

    /// Replace the patch text and drop the cached hunk ranges.
    pub fn set_patch(&mut self, patch: impl Into<String>) {
        self.patch = patch.into();
        self.hunk_ranges = OnceLock::new();
    }

    /// New-side ranges of every hunk, computed once per patch text.
    ///
    /// Concurrent first calls may race; the computation is pure so whichever
    /// value lands first is identical to the others.
    pub fn hunk_ranges(&self) -> &[HunkRange] {
        self.hunk_ranges.get_or_init(|| hunk_ranges_of(&self.patch))
    }
}
