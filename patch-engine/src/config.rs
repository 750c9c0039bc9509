//! Runtime configuration loaded from environment variables.
//!
//! ## Env flags
//! - `PATCH_ENGINE_EXTRA_LINES_BEFORE` (usize): static context added before each hunk (default: 5)
//! - `PATCH_ENGINE_EXTRA_LINES_AFTER` (usize): context added after each hunk (default: 1)
//! - `PATCH_ENGINE_ALLOW_DYNAMIC_CONTEXT` (bool): anchor context on section headers (default: true)
//! - `PATCH_ENGINE_MAX_EXTRA_LINES_BEFORE_DYNAMIC` (usize): search window for the anchor (default: 10)
//! - `PATCH_ENGINE_SKIP_EXTENSIONS` (comma list): filename suffixes never extended (default: `.md,.txt`)
//! - `PATCH_ENGINE_MAX_COMMENT_DISTANCE` (usize): max lines a comment may sit outside a hunk and still be clamped (default: 10)

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

const ENV_BEFORE: &str = "PATCH_ENGINE_EXTRA_LINES_BEFORE";
const ENV_AFTER: &str = "PATCH_ENGINE_EXTRA_LINES_AFTER";
const ENV_DYNAMIC: &str = "PATCH_ENGINE_ALLOW_DYNAMIC_CONTEXT";
const ENV_DYNAMIC_BEFORE: &str = "PATCH_ENGINE_MAX_EXTRA_LINES_BEFORE_DYNAMIC";
const ENV_SKIP: &str = "PATCH_ENGINE_SKIP_EXTENSIONS";
const ENV_DISTANCE: &str = "PATCH_ENGINE_MAX_COMMENT_DISTANCE";

/// Knobs for context extension and comment validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    pub extra_lines_before: usize,
    pub extra_lines_after: usize,
    pub allow_dynamic_context: bool,
    pub max_extra_lines_before_dynamic_context: usize,
    /// Filename suffixes (e.g. `.md`) whose patches are returned unchanged.
    pub patch_extension_skip_types: Vec<String>,
    pub max_comment_hunk_distance: usize,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            extra_lines_before: 5,
            extra_lines_after: 1,
            allow_dynamic_context: true,
            max_extra_lines_before_dynamic_context: 10,
            patch_extension_skip_types: vec![".md".into(), ".txt".into()],
            max_comment_hunk_distance: 10,
        }
    }
}

/// Context counts for one extension run, derived from [`PatchConfig`] or built by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendOptions {
    pub before: usize,
    pub after: usize,
    /// Search window for dynamic context; `None` disables it.
    pub dynamic_before: Option<usize>,
}

impl ExtendOptions {
    /// Static context only.
    pub fn fixed(before: usize, after: usize) -> Self {
        Self {
            before,
            after,
            dynamic_before: None,
        }
    }
}

impl PatchConfig {
    /// Build from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup (env, settings file, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let cfg = Self {
            extra_lines_before: parse_usize(&lookup, ENV_BEFORE, d.extra_lines_before)?,
            extra_lines_after: parse_usize(&lookup, ENV_AFTER, d.extra_lines_after)?,
            allow_dynamic_context: lookup(ENV_DYNAMIC)
                .map(|v| is_truthy(&v))
                .unwrap_or(d.allow_dynamic_context),
            max_extra_lines_before_dynamic_context: parse_usize(
                &lookup,
                ENV_DYNAMIC_BEFORE,
                d.max_extra_lines_before_dynamic_context,
            )?,
            patch_extension_skip_types: lookup(ENV_SKIP)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or(d.patch_extension_skip_types),
            max_comment_hunk_distance: parse_usize(
                &lookup,
                ENV_DISTANCE,
                d.max_comment_hunk_distance,
            )?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject degenerate combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_comment_hunk_distance == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_comment_hunk_distance",
                detail: "must be greater than 0",
            });
        }
        if self.allow_dynamic_context
            && self.max_extra_lines_before_dynamic_context < self.extra_lines_before
        {
            return Err(ConfigError::OutOfRange {
                field: "max_extra_lines_before_dynamic_context",
                detail: "must be >= extra_lines_before when dynamic context is enabled",
            });
        }
        Ok(())
    }

    /// Filenames whose extension is on the deny-list bypass extension entirely.
    pub fn should_skip_extension(&self, filename: &str) -> bool {
        !filename.is_empty()
            && self
                .patch_extension_skip_types
                .iter()
                .any(|ext| filename.ends_with(ext.as_str()))
    }

    pub fn extend_options(&self) -> ExtendOptions {
        ExtendOptions {
            before: self.extra_lines_before,
            after: self.extra_lines_after,
            dynamic_before: self
                .allow_dynamic_context
                .then_some(self.max_extra_lines_before_dynamic_context),
        }
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_usize<F>(lookup: &F, var: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(v) if !v.trim().is_empty() => {
            v.trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidNumber { var, value: v })
        }
        _ => Ok(default),
    }
}
