//! Line-annotated rendering: the `__new hunk__` / `__old hunk__` dual view.
//!
//! Output per hunk:
//! ```text
//! @@ -1,3 +1,4 @@ fn a()
//! __new hunk__
//! 1  a
//! 2 +B
//! 3 +C
//! 4  c
//! __old hunk__
//!  a
//! -b
//!  c
//! ```
//! The labels and the `{line} {raw}` prefixing are consumed by prompt parsers
//! downstream and must not change.

use tracing::{debug, warn};

use crate::errors::EngineResult;
use crate::parser::{Hunk, LineKind, classify, is_hunk_header, parse_header};
use crate::types::EditKind;

pub const NEW_HUNK_LABEL: &str = "__new hunk__";
pub const OLD_HUNK_LABEL: &str = "__old hunk__";

/// Lines collected for the hunk currently being scanned.
struct PendingHunk<'a> {
    header: &'a str,
    hunk: Hunk,
    new_lines: Vec<&'a str>,
    old_lines: Vec<&'a str>,
    has_added: bool,
    has_removed: bool,
}

impl<'a> PendingHunk<'a> {
    fn open(header: &'a str) -> EngineResult<Self> {
        Ok(Self {
            header,
            hunk: parse_header(header)?,
            new_lines: Vec::new(),
            old_lines: Vec::new(),
            has_added: false,
            has_removed: false,
        })
    }

    fn push(&mut self, line: &'a str, kind: LineKind) {
        match kind {
            LineKind::Added => {
                self.has_added = true;
                self.new_lines.push(line);
            }
            LineKind::Removed => {
                self.has_removed = true;
                self.old_lines.push(line);
            }
            LineKind::Context => {
                self.new_lines.push(line);
                self.old_lines.push(line);
            }
            LineKind::Header | LineKind::NoNewlineMarker => {}
        }
    }

    fn flush_into(self, out: &mut String) {
        out.push('\n');
        out.push_str(self.header.trim_end());
        out.push('\n');

        if self.has_added {
            out.push_str(NEW_HUNK_LABEL);
            out.push('\n');
            for (i, line) in self.new_lines.iter().enumerate() {
                out.push_str(&format!("{} {}\n", self.hunk.new_start + i, line));
            }
        }
        if self.has_removed {
            out.push_str(OLD_HUNK_LABEL);
            out.push('\n');
            for line in &self.old_lines {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
}

/// Render every hunk of `patch`. Fail-soft: returns the input on error.
pub fn render_with_line_numbers(patch: &str) -> String {
    match try_render_with_line_numbers(patch) {
        Ok(s) => s,
        Err(e) => {
            warn!("render: failed to annotate patch, keeping original: {e}");
            patch.to_string()
        }
    }
}

pub fn try_render_with_line_numbers(patch: &str) -> EngineResult<String> {
    let mut out = String::new();
    render_hunks(patch, &mut out)?;
    Ok(out.trim_matches('\n').to_string())
}

/// Render one file with its `## File:` heading, or the deletion marker.
pub fn render_file(filename: &str, edit_kind: EditKind, patch: &str) -> String {
    let name = filename.trim();
    if edit_kind == EditKind::Deleted {
        return format!("\n\n## File '{name}' was deleted\n");
    }

    let mut out = format!("\n\n## File: '{name}'\n");
    let heading_len = out.len();
    if let Err(e) = render_hunks(patch, &mut out) {
        warn!("render: file '{name}': failed to annotate patch, keeping original: {e}");
        out.truncate(heading_len);
        out.push('\n');
        out.push_str(patch);
    }
    out.trim_end_matches('\n').to_string()
}

/// Append the dual view of every hunk in `patch` to `out`.
///
/// A hunk is flushed when the next header arrives or the input ends. Preamble
/// lines before the first header are not content and are skipped. Only truly
/// empty separator lines are dropped: `" "` is an empty file line in context.
fn render_hunks(patch: &str, out: &mut String) -> EngineResult<()> {
    let lines: Vec<&str> = patch.lines().collect();
    let mut current: Option<PendingHunk<'_>> = None;

    for (i, &line) in lines.iter().enumerate() {
        if line.is_empty() {
            let last = i + 1 == lines.len();
            let before_header = lines.get(i + 1).is_some_and(|next| is_hunk_header(next));
            if last || before_header {
                continue;
            }
        }

        let kind = classify(line);
        match (kind, current.as_mut()) {
            (LineKind::Header, _) => {
                if let Some(done) = current.take() {
                    done.flush_into(out);
                }
                current = Some(PendingHunk::open(line)?);
            }
            (LineKind::NoNewlineMarker, _) => {}
            (_, Some(hunk)) => hunk.push(line, kind),
            (_, None) => debug!("render: skip preamble line {i}"),
        }
    }
    if let Some(done) = current {
        done.flush_into(out);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PATCH: &str = "@@ -1,3 +1,4 @@ fn a()\n a\n-b\n+B\n+C\n c";

    #[test]
    fn renders_both_sections() {
        let expected = "@@ -1,3 +1,4 @@ fn a()\n__new hunk__\n1  a\n2 +B\n3 +C\n4  c\n__old hunk__\n a\n-b\n c";
        assert_eq!(render_with_line_numbers(PATCH), expected);
    }

    #[test]
    fn omits_missing_sections() {
        let add_only = "@@ -4,1 +4,2 @@\n x\n+y";
        assert_eq!(
            render_with_line_numbers(add_only),
            "@@ -4,1 +4,2 @@\n__new hunk__\n4  x\n5 +y"
        );

        let remove_only = "@@ -4,2 +4,1 @@\n x\n-y";
        assert_eq!(
            render_with_line_numbers(remove_only),
            "@@ -4,2 +4,1 @@\n__old hunk__\n x\n-y"
        );
    }

    #[test]
    fn flushes_each_hunk_in_order() {
        let patch = "--- a/f\n+++ b/f\n@@ -1,1 +1,2 @@\n a\n+b\n\n@@ -10,2 +11,1 @@\n c\n-d\n\\ No newline at end of file\n";
        let expected = "@@ -1,1 +1,2 @@\n__new hunk__\n1  a\n2 +b\n\n@@ -10,2 +11,1 @@\n__old hunk__\n c\n-d";
        assert_eq!(render_with_line_numbers(patch), expected);
    }

    #[test]
    fn new_section_counts_non_removed_lines() {
        let patch = "@@ -100,5 +100,8 @@\n a\n-b\n-c\n+d\n+e\n+f\n+g\n+h\n i\n j\n k";
        let rendered = render_with_line_numbers(patch);
        let numbered: Vec<&str> = rendered
            .split(OLD_HUNK_LABEL)
            .next()
            .unwrap()
            .lines()
            .skip_while(|l| *l != NEW_HUNK_LABEL)
            .skip(1)
            .collect();
        assert_eq!(numbered.len(), 9);
        assert_eq!(numbered[0], "100  a");
        assert_eq!(numbered[8], "108  k");
    }

    #[test]
    fn file_heading_and_deleted_marker() {
        assert_eq!(
            render_file(" src/a.rs ", EditKind::Modified, "@@ -1 +1 @@\n-a\n+b"),
            "\n\n## File: 'src/a.rs'\n\n@@ -1 +1 @@\n__new hunk__\n1 +b\n__old hunk__\n-a"
        );
        assert_eq!(
            render_file("old.rs", EditKind::Deleted, "@@ -1 +0,0 @@\n-a"),
            "\n\n## File 'old.rs' was deleted\n"
        );
    }

    #[test]
    fn malformed_header_returns_input() {
        let bad = "@@ nonsense @@\n+x";
        assert_eq!(render_with_line_numbers(bad), bad);
    }

    #[test]
    fn blank_file_lines_in_context_are_kept() {
        // " " is an empty line of the file, both before a header and at the end.
        let patch = "@@ -1,3 +1,4 @@\n a\n+b\n c\n \n@@ -20,2 +21,3 @@\n x\n+y\n ";
        let expected = "@@ -1,3 +1,4 @@\n__new hunk__\n1  a\n2 +b\n3  c\n4  \n\n@@ -20,2 +21,3 @@\n__new hunk__\n21  x\n22 +y\n23  ";
        assert_eq!(render_with_line_numbers(patch), expected);
    }

    #[test]
    fn new_section_matches_header_size_with_trailing_blank_context() {
        let patch = "@@ -1,4 +1,4 @@\n fn a() {\n-    1\n+    2\n }\n ";
        let rendered = render_with_line_numbers(patch);
        let new_section: Vec<&str> = rendered
            .split(OLD_HUNK_LABEL)
            .next()
            .unwrap()
            .lines()
            .skip_while(|l| *l != NEW_HUNK_LABEL)
            .skip(1)
            .collect();
        assert_eq!(new_section, vec!["1  fn a() {", "2 +    2", "3  }", "4  "]);
        assert!(rendered.ends_with("__old hunk__\n fn a() {\n-    1\n }\n "));
    }
}
