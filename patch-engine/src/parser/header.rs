//! Hunk header codec: `@@ -a,b +c,d @@ section` <-> [`Hunk`].

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// One hunk header of a unified diff.
///
/// Starts are 1-based line numbers, sizes are line counts. A start of `0`
/// only appears together with a size of `0` (insertion into an empty side).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_size: usize,
    pub new_start: usize,
    pub new_size: usize,
    /// Free text after the closing `@@`, usually the enclosing function signature.
    pub section_header: String,
    /// The header wrote `-a` instead of `-a,b`.
    #[serde(default)]
    pub old_size_omitted: bool,
    /// The header wrote `+c` instead of `+c,d`.
    #[serde(default)]
    pub new_size_omitted: bool,
}

impl Hunk {
    /// Build a hunk with explicit sizes (the form emitted for rewritten headers).
    pub fn new(
        old_start: usize,
        old_size: usize,
        new_start: usize,
        new_size: usize,
        section_header: impl Into<String>,
    ) -> Self {
        Self {
            old_start,
            old_size,
            new_start,
            new_size,
            section_header: section_header.into(),
            old_size_omitted: false,
            new_size_omitted: false,
        }
    }

    /// True for `@@ -0,0 +N @@` style hunks that only insert lines.
    pub fn is_pure_insertion(&self) -> bool {
        self.old_start == 0 && self.old_size == 0
    }

    /// First old-file line covered by the hunk. For an empty old range this is
    /// the line right after the insertion point.
    pub fn old_first_line(&self) -> usize {
        first_line(self.old_start, self.old_size)
    }

    /// First new-file line covered by the hunk (see [`Hunk::old_first_line`]).
    pub fn new_first_line(&self) -> usize {
        first_line(self.new_start, self.new_size)
    }
}

fn first_line(start: usize, size: usize) -> usize {
    if size == 0 { start + 1 } else { start }
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@[ ]?(.*)")
            .expect("hunk header regex is valid")
    })
}

/// Cheap prefix check used by line scanners before calling [`parse_header`].
pub fn is_hunk_header(line: &str) -> bool {
    line.starts_with("@@")
}

/// Parse a hunk header line.
///
/// Omitted sizes default to 1, except for the `@@ -0,0 +1 @@` insertion form
/// where the old side is `(0, 0)` by construction.
pub fn parse_header(line: &str) -> Result<Hunk, ParseError> {
    let caps = header_re()
        .captures(line)
        .ok_or_else(|| ParseError::InvalidHunkHeader(line.to_string()))?;

    let num = |idx: usize| -> Result<Option<usize>, ParseError> {
        match caps.get(idx) {
            Some(m) => m
                .as_str()
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ParseError::Overflow(line.to_string())),
            None => Ok(None),
        }
    };

    let old_start = num(1)?.unwrap_or(0);
    let old_size = num(2)?;
    let new_start = num(3)?.unwrap_or(0);
    let new_size = num(4)?;

    let (old_start, old_size) = if old_start == 0 {
        (0, old_size.unwrap_or(0))
    } else {
        (old_start, old_size.unwrap_or(1))
    };

    Ok(Hunk {
        old_start,
        old_size,
        new_start,
        new_size: new_size.unwrap_or(1),
        section_header: caps
            .get(5)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        old_size_omitted: caps.get(2).is_none(),
        new_size_omitted: caps.get(4).is_none(),
    })
}

/// Serialize a hunk back into its header line. Exact inverse of [`parse_header`].
pub fn format_header(hunk: &Hunk) -> String {
    let old = if hunk.old_size_omitted {
        format!("-{}", hunk.old_start)
    } else {
        format!("-{},{}", hunk.old_start, hunk.old_size)
    };
    let new = if hunk.new_size_omitted {
        format!("+{}", hunk.new_start)
    } else {
        format!("+{},{}", hunk.new_start, hunk.new_size)
    };

    if hunk.section_header.is_empty() {
        format!("@@ {old} {new} @@")
    } else {
        format!("@@ {old} {new} @@ {}", hunk.section_header)
    }
}
