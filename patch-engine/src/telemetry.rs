//! Log output for the engine's `tracing` events.
//!
//! The engine only emits events under the `patch_engine` target; the host
//! decides where they go. Compose [`layer`] into the host's subscriber:
//!
//! ```ignore
//! use tracing_subscriber::prelude::*;
//!
//! tracing_subscriber::registry()
//!     .with(patch_engine::telemetry::env_filter("warn"))
//!     .with(patch_engine::telemetry::layer())
//!     .init();
//! ```
//!
//! `PATCH_ENGINE_LOG=debug` raises the engine's level without touching
//! the host's `RUST_LOG`.

use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::{Level, Subscriber};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Target prefix of every event emitted by this crate.
pub const TARGET_PREFIX: &str = "patch_engine";

/// Env variable holding the engine's own level (`error` .. `trace`).
pub const ENV_LOG_LEVEL: &str = "PATCH_ENGINE_LOG";

/// `patch_engine` itself or one of its modules; `patch_engine_x` is not.
pub fn is_engine_target(target: &str) -> bool {
    match target.strip_prefix(TARGET_PREFIX) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

/// UTC timestamps with milliseconds, e.g. `2025-09-12T10:20:30.123Z`.
#[derive(Clone, Debug, Default)]
struct UtcMillis;

impl FormatTime for UtcMillis {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }
}

/// Compact stderr layer rendering only this crate's events.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    engine_layer(io::stderr, io::stderr().is_terminal())
}

/// Same as [`layer`], writing plain text to `writer`.
pub fn layer_with_writer<S, W>(writer: W) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    engine_layer(writer, false)
}

fn engine_layer<S, W>(writer: W, ansi: bool) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_timer(UtcMillis)
        .with_target(true)
        .with_ansi(ansi)
        .compact()
        .with_filter(filter::filter_fn(|meta| is_engine_target(meta.target())))
}

/// `patch_engine=<level>` for a level name such as `debug` or `WARN`.
pub fn engine_directive(level: &str) -> Option<Directive> {
    let level = Level::from_str(level.trim()).ok()?;
    let directive = format!("{TARGET_PREFIX}={}", level.as_str().to_lowercase());
    Directive::from_str(&directive).ok()
}

/// `RUST_LOG` (or `default` when unset), plus the engine level from
/// [`ENV_LOG_LEVEL`] when it names a valid level.
pub fn env_filter(default: &str) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let engine = std::env::var(ENV_LOG_LEVEL).ok();
    match engine.as_deref().and_then(engine_directive) {
        Some(directive) => base.add_directive(directive),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::prelude::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn directive_accepts_level_names_only() {
        let d = engine_directive("DEBUG").map(|d| d.to_string());
        assert_eq!(d.as_deref(), Some("patch_engine=debug"));
        assert_eq!(
            engine_directive(" warn ").map(|d| d.to_string()).as_deref(),
            Some("patch_engine=warn")
        );
        assert!(engine_directive("loud").is_none());
        assert!(engine_directive("").is_none());
    }

    #[test]
    fn engine_targets() {
        assert!(is_engine_target("patch_engine"));
        assert!(is_engine_target("patch_engine::render"));
        assert!(!is_engine_target("patch_engine_cli"));
        assert!(!is_engine_target("hyper::proto"));
    }

    #[test]
    fn layer_writes_engine_events_only() {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::registry().with(layer_with_writer(move || sink.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let bad = "@@ nonsense @@\n+x";
            assert_eq!(crate::render::render_with_line_numbers(bad), bad);
            tracing::warn!(target: "host_app", "host event");
        });

        let text = captured.text();
        let line = text
            .lines()
            .find(|l| l.contains("render: failed to annotate patch"))
            .unwrap_or_else(|| panic!("engine warning missing from: {text}"));
        assert!(line.contains("WARN"));
        assert!(line.contains("patch_engine::render"));
        assert!(!text.contains("host event"));

        let stamp = line.split_whitespace().next().unwrap();
        assert!(stamp.ends_with('Z'), "{stamp}");
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok(), "{stamp}");
    }
}
