//! Context extension: rewrite a patch's hunks to carry more surrounding lines.
//!
//! Flow per hunk (header order):
//!   1) Validity check against the original file (`validity`);
//!   2) Static bounds: `before` lines above, `after` lines below, capped by file length;
//!   3) Dynamic context (new content known): search a wider window above the hunk
//!      for the `section_header` line and anchor there if old/new agree;
//!   4) Mini-match: if the old/new "before" blocks differ, keep only their common
//!      tail, or drop the extension for this hunk;
//!   5) Drop the section header if it is already visible in the context;
//!   6) Emit `""`, the rewritten header, before-context, body, after-context.
//!
//! Any error aborts the whole patch; [`extend_patch`] then returns the input unchanged.

pub mod validity;

use tracing::{debug, warn};

use crate::config::{ExtendOptions, PatchConfig};
use crate::errors::{EngineError, EngineResult};
use crate::parser::{Hunk, format_header, is_hunk_header, parse_header};
use crate::types::FileDiff;
use validity::check_hunk_against_file;

/// Extend a file's patch with the configured context.
///
/// Returns the patch unchanged when the filename is on the skip list, the
/// original content is missing, or extension fails anywhere.
pub fn extend_file_patch(file: &FileDiff, cfg: &PatchConfig) -> String {
    if cfg.should_skip_extension(&file.filename) {
        debug!("extend: skip '{}' by extension", file.filename);
        return file.patch().to_string();
    }
    extend_patch(
        file.original_content.as_deref(),
        file.new_content.as_deref(),
        file.patch(),
        &cfg.extend_options(),
    )
}

/// Fail-soft extension: any error yields the input patch.
pub fn extend_patch(
    original: Option<&str>,
    new: Option<&str>,
    patch: &str,
    opts: &ExtendOptions,
) -> String {
    let Some(original) = original.filter(|s| !s.is_empty()) else {
        return patch.to_string();
    };
    if patch.is_empty() || (opts.before == 0 && opts.after == 0) {
        return patch.to_string();
    }
    match try_extend_patch(original, new, patch, opts) {
        Ok(extended) => extended,
        Err(e) => {
            warn!("extend: failed to extend patch, keeping original: {e}");
            patch.to_string()
        }
    }
}

/// Extension with errors surfaced to the caller.
pub fn try_extend_patch(
    original: &str,
    new: Option<&str>,
    patch: &str,
    opts: &ExtendOptions,
) -> EngineResult<String> {
    let old_lines: Vec<&str> = original.lines().collect();
    let new_lines: Option<Vec<&str>> = new
        .filter(|s| !s.is_empty())
        .map(|s| s.lines().collect());
    let patch_lines: Vec<&str> = patch.lines().collect();

    let mut out: Vec<String> = Vec::with_capacity(patch_lines.len() * 2);
    let mut pending_after: Vec<String> = Vec::new();
    let mut extended_hunks = 0usize;

    for (i, line) in patch_lines.iter().enumerate() {
        if is_hunk_header(line) {
            let hunk = parse_header(line)?;
            out.append(&mut pending_after);

            let validity = check_hunk_against_file(&hunk, patch_lines.get(i + 1).copied(), &old_lines);
            let plan = if validity.is_extendable() {
                plan_extension(&hunk, &old_lines, new_lines.as_deref(), opts)?
            } else {
                HunkPlan::unchanged(&hunk)
            };
            if plan.lead > 0 || plan.trail > 0 {
                extended_hunks += 1;
            }

            out.push(String::new());
            out.push(format_header(&plan.hunk));
            out.extend(plan.before.iter().map(|l| format!(" {l}")));
            pending_after = plan.after.iter().map(|l| format!(" {l}")).collect();
            continue;
        }

        // Our own blank separator replaces one that is already there.
        if line.is_empty() && patch_lines.get(i + 1).is_some_and(|n| is_hunk_header(n)) {
            continue;
        }
        out.push(line.to_string());
    }
    out.append(&mut pending_after);

    debug!("extend: extended {} hunk(s)", extended_hunks);
    Ok(out.join("\n"))
}

/// Final shape of one hunk after extension.
#[derive(Debug)]
struct HunkPlan<'a> {
    hunk: Hunk,
    lead: usize,
    trail: usize,
    before: &'a [&'a str],
    after: &'a [&'a str],
}

impl<'a> HunkPlan<'a> {
    fn unchanged(hunk: &Hunk) -> Self {
        Self {
            hunk: hunk.clone(),
            lead: 0,
            trail: 0,
            before: &[],
            after: &[],
        }
    }
}

/// Lines of context added above (`lead`) and below (`trail`) a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extension {
    lead: usize,
    trail: usize,
}

/// Static bounds: as many of `before` lines as both files have above the hunk,
/// and as many of `after` lines as the original has below it.
fn static_extension(hunk: &Hunk, before: usize, after: usize, old_len: usize) -> Extension {
    let lead = before
        .min(hunk.old_first_line().saturating_sub(1))
        .min(hunk.new_first_line().saturating_sub(1));
    let old_last = (hunk.old_first_line() + hunk.old_size).saturating_sub(1);
    let trail = after.min(old_len.saturating_sub(old_last));
    Extension { lead, trail }
}

/// Window of `lead` lines directly above the hunk's first line (1-based `first`).
fn window_above<'a>(lines: &'a [&'a str], first: usize, lead: usize) -> Option<&'a [&'a str]> {
    let end = first.checked_sub(1)?;
    lines.get(end.checked_sub(lead)?..end)
}

fn plan_extension<'a>(
    hunk: &Hunk,
    old_lines: &'a [&'a str],
    new_lines: Option<&'a [&'a str]>,
    opts: &ExtendOptions,
) -> EngineResult<HunkPlan<'a>> {
    let mut section = hunk.section_header.clone();
    let old_first = hunk.old_first_line();
    let new_first = hunk.new_first_line();

    let mut ext = match (new_lines, opts.dynamic_before) {
        (Some(new_lines), Some(dynamic_before)) => {
            dynamic_extension(hunk, old_lines, new_lines, dynamic_before, opts.after)
                .inspect(|_| section.clear())
                .unwrap_or_else(|| static_extension(hunk, opts.before, opts.after, old_lines.len()))
        }
        _ => static_extension(hunk, opts.before, opts.after, old_lines.len()),
    };

    let mut before = window_above(old_lines, old_first, ext.lead).ok_or_else(|| {
        EngineError::OutOfBounds(format!(
            "{} lines above old line {} (file has {})",
            ext.lead,
            old_first,
            old_lines.len()
        ))
    })?;

    if let Some(new_lines) = new_lines {
        let new_before = window_above(new_lines, new_first, ext.lead).unwrap_or(&[]);
        if before != new_before {
            match common_tail_offset(before, new_before) {
                Some(skip) => {
                    ext.lead -= skip;
                    before = &before[skip..];
                }
                None => {
                    debug!(
                        "extend: context above old line {} differs between old and new file",
                        old_first
                    );
                    ext = Extension { lead: 0, trail: 0 };
                    before = &[];
                }
            }
        }
    }

    if !section.is_empty() && before.iter().any(|l| l.contains(section.as_str())) {
        section.clear();
    }

    let after_start = (old_first + hunk.old_size).saturating_sub(1);
    let after = old_lines
        .get(after_start..after_start + ext.trail)
        .unwrap_or(&[]);

    Ok(HunkPlan {
        hunk: extended_header(hunk, ext, section),
        lead: ext.lead,
        trail: ext.trail,
        before,
        after,
    })
}

/// Dynamic context: anchor the extension on the line holding the section header.
///
/// Scans the `dynamic_before` window above the hunk in the old file for the
/// first line containing the section header. The anchor is accepted only if
/// the new file has identical lines from that point down to the hunk.
/// Without a section header there is nothing to anchor on: `None`, so the
/// caller uses static bounds.
fn dynamic_extension(
    hunk: &Hunk,
    old_lines: &[&str],
    new_lines: &[&str],
    dynamic_before: usize,
    after: usize,
) -> Option<Extension> {
    if hunk.section_header.is_empty() {
        return None;
    }
    let wide = static_extension(hunk, dynamic_before, after, old_lines.len());
    let old_window = window_above(old_lines, hunk.old_first_line(), wide.lead)?;
    let new_window = window_above(new_lines, hunk.new_first_line(), wide.lead)?;

    let anchor = old_window
        .iter()
        .position(|l| l.contains(hunk.section_header.as_str()))?;
    if old_window[anchor..] == new_window[anchor..] {
        debug!(
            "extend: dynamic context anchored {} lines above old line {}",
            wide.lead - anchor,
            hunk.old_first_line()
        );
        Some(Extension {
            lead: wide.lead - anchor,
            trail: wide.trail,
        })
    } else {
        None
    }
}

/// Smallest `i` such that `old[i..] == new[i..]` with a non-empty tail.
fn common_tail_offset(old: &[&str], new: &[&str]) -> Option<usize> {
    (0..old.len()).find(|&i| new.get(i..).is_some_and(|tail| old[i..] == *tail))
}

fn extended_header(hunk: &Hunk, ext: Extension, section: String) -> Hunk {
    if ext.lead == 0 && ext.trail == 0 {
        return Hunk {
            section_header: section,
            ..hunk.clone()
        };
    }
    Hunk::new(
        hunk.old_first_line() - ext.lead,
        hunk.old_size + ext.lead + ext.trail,
        hunk.new_first_line() - ext.lead,
        hunk.new_size + ext.lead + ext.trail,
        section,
    )
}
