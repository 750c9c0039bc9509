//! Rewrite of inline suggestion blocks for comments moved to another range.
//!
//! A ```` ```suggestion ```` block only applies to the exact lines it was
//! written for. Once a comment is clamped onto a neighbouring hunk the block
//! would overwrite the wrong lines, so it is replaced by a read-only diff.

use std::sync::OnceLock;

use regex::{NoExpand, Regex};
use similar::{ChangeTag, TextDiff};

fn suggestion_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```suggestion.*?```").expect("suggestion regex is valid"))
}

/// Unified diff body between `old` and `new` with every line kept as context.
///
/// No `---`/`+++`/`@@` lines: only ` `, `-` and `+` prefixed lines.
pub fn full_context_diff(old: &str, new: &str) -> String {
    let old = format!("{}\n", old.trim_end());
    let new = format!("{}\n", new.trim_end());
    let diff = TextDiff::from_lines(&old, &new);

    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => ' ',
        };
        out.push(sign);
        out.push_str(change.value().trim_end_matches(['\r', '\n']));
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Replace every suggestion block in `body` with a collapsible diff of
/// `before` -> `after`. Without a suggestion block the diff is appended.
/// Each inserted `<details>` carries its own closing tag.
pub fn rewrite_suggestion_body(body: &str, before: &str, after: &str) -> String {
    let diff = full_context_diff(before, after);
    let block = format!(
        "\n\n<details><summary>New proposed code:</summary>\n\n```diff\n{diff}\n```\n\n</details>"
    );

    let body = body.trim();
    if suggestion_re().is_match(body) {
        suggestion_re()
            .replace_all(body, NoExpand(block.as_str()))
            .into_owned()
    } else {
        format!("{body}{block}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn diff_keeps_all_lines_as_context() {
        let diff = full_context_diff("let a = 1;\nlet b = 2;\n", "let a = 1;\nlet b = 3;");
        assert_eq!(diff, " let a = 1;\n-let b = 2;\n+let b = 3;");
    }

    #[test]
    fn replaces_suggestion_block() {
        let body = "Prefer 3 here.\n```suggestion\nlet b = 3;\n```\n";
        let out = rewrite_suggestion_body(body, "let b = 2;", "let b = 3;");
        assert_eq!(
            out,
            "Prefer 3 here.\n\n\n<details><summary>New proposed code:</summary>\n\n```diff\n-let b = 2;\n+let b = 3;\n```\n\n</details>"
        );
    }

    #[test]
    fn appends_diff_without_suggestion_block() {
        let out = rewrite_suggestion_body("Rename it.", "old_name()", "new_name()");
        assert!(out.starts_with("Rename it.\n\n<details>"));
        assert!(out.contains("```diff\n-old_name()\n+new_name()\n```"));
        assert!(out.ends_with("</details>"));
    }

    #[test]
    fn every_replaced_block_is_closed() {
        let body = "Two options.\n```suggestion\nlet b = 3;\n```\nor\n```suggestion\nlet b = 4;\n```\nEither works.";
        let out = rewrite_suggestion_body(body, "let b = 2;", "let b = 3;");
        assert_eq!(out.matches("<details>").count(), 2);
        assert_eq!(out.matches("</details>").count(), 2);
        assert!(!out.contains("```suggestion"));
        assert!(out.ends_with("</details>\nEither works."));

        let first_close = out.find("</details>").unwrap();
        let second_open = out.rfind("<details>").unwrap();
        assert!(first_close < second_open);
    }

    #[test]
    fn dollar_signs_in_code_are_literal() {
        let out = rewrite_suggestion_body("```suggestion\nx\n```", "$a", "$b");
        assert!(out.contains("-$a\n+$b"));
    }
}
