use patch_engine::map::{locate_by_absolute_line, locate_by_text};
use patch_engine::publish::{CommentPlacement, PlacementStatus, validate_comments_inside_hunks};
use patch_engine::{EditKind, FileDiff, HunkRange, LineLocation, PatchConfig, prepare_file_patch};
use patch_engine::telemetry;
use pretty_assertions::assert_eq;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(telemetry::env_filter("debug"))
        .with(telemetry::layer_with_writer(tracing_subscriber::fmt::TestWriter::new()))
        .try_init();
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

const ORIGINAL: &str = "use std::fmt;

fn total(items: &[u32]) -> u32 {
    let mut sum = 0;
    for i in items {
        sum += i;
    }
    sum
}

fn unused() {}
";

const NEW: &str = "use std::fmt;

fn total(items: &[u32]) -> u32 {
    let mut sum = 0;
    for i in items {
        sum += *i;
    }
    sum
}
";

const PATCH: &str = "@@ -6,1 +6,1 @@ fn total(items: &[u32]) -> u32 {
-        sum += i;
+        sum += *i;
@@ -10,2 +9,0 @@
-
-fn unused() {}";

const EXTENDED: &str = "
@@ -3,5 +3,5 @@
 fn total(items: &[u32]) -> u32 {
     let mut sum = 0;
     for i in items {
-        sum += i;
+        sum += *i;
     }";

fn modified_file() -> FileDiff {
    FileDiff::new("src/total.rs", PATCH)
        .with_original(ORIGINAL)
        .with_new(NEW)
        .with_edit_kind(EditKind::Modified)
}

#[test]
fn prepares_extended_annotated_patch() {
    init_tracing();
    let out = prepare_file_patch(&modified_file(), &PatchConfig::default());

    let expected = [
        "",
        "",
        "## File: 'src/total.rs'",
        "",
        "@@ -3,5 +3,5 @@",
        "__new hunk__",
        "3  fn total(items: &[u32]) -> u32 {",
        "4      let mut sum = 0;",
        "5      for i in items {",
        "6 +        sum += *i;",
        "7      }",
        "__old hunk__",
        " fn total(items: &[u32]) -> u32 {",
        "     let mut sum = 0;",
        "     for i in items {",
        "-        sum += i;",
        "     }",
    ]
    .join("\n");
    assert_eq!(out, expected);
}

#[test]
fn extension_and_deletion_steps_compose() {
    init_tracing();
    let file = modified_file();
    let filtered = patch_engine::omit_deletion_hunks(file.patch());
    let extended = patch_engine::extend_patch(
        file.original_content.as_deref(),
        file.new_content.as_deref(),
        &filtered,
        &PatchConfig::default().extend_options(),
    );
    assert_eq!(extended, EXTENDED);
}

#[test]
fn deleted_file_renders_marker() {
    init_tracing();
    let file = FileDiff::new("src/old.rs", "@@ -1,2 +0,0 @@\n-a\n-b")
        .with_original("a\nb")
        .with_edit_kind(EditKind::Deleted);
    assert_eq!(
        prepare_file_patch(&file, &PatchConfig::default()),
        "\n\n## File 'src/old.rs' was deleted\n"
    );
}

#[test]
fn skipped_extension_still_renders() {
    init_tracing();
    let file = FileDiff::new("NOTES.md", "@@ -2,1 +2,1 @@\n-b\n+B")
        .with_original("a\nb\nc")
        .with_new("a\nB\nc")
        .with_edit_kind(EditKind::Modified);
    assert_eq!(
        prepare_file_patch(&file, &PatchConfig::default()),
        "\n\n## File: 'NOTES.md'\n\n@@ -2,1 +2,1 @@\n__new hunk__\n2 +B\n__old hunk__\n-b"
    );
}

#[test]
fn locator_and_validator_work_on_extended_patch() {
    init_tracing();
    let mut file = modified_file();
    file.set_patch(EXTENDED);
    assert_eq!(file.hunk_ranges(), &[HunkRange { start: 3, end: 7 }]);

    let by_line = locate_by_absolute_line(file.patch(), 6);
    assert_eq!(by_line, LineLocation::found(6, 6));
    assert_eq!(locate_by_text(file.patch(), "sum += *i;"), by_line);

    let mut comments = vec![
        CommentPlacement::new("src/total.rs", 6, 6, "Deref is fine.")
            .with_code("sum += i;", "sum += *i;"),
        CommentPlacement::new(
            "src/total.rs",
            8,
            9,
            "Return early.\n```suggestion\n    sum\n```",
        )
        .with_code("    sum\n}", "    return sum;\n}"),
        CommentPlacement::new("src/total.rs", 30, 31, "Far away.").with_code("a", "b"),
    ];
    let files = vec![file];
    let summary = validate_comments_inside_hunks(&files, &mut comments, &PatchConfig::default());
    assert_eq!((summary.inside, summary.clamped, summary.invalid), (1, 1, 1));

    assert_eq!((comments[1].start_line, comments[1].end_line), (Some(7), Some(7)));
    assert!(comments[1].body.contains("```diff\n-    sum\n+    return sum;\n }\n```"));
    assert_eq!(
        comments[2].status,
        PlacementStatus::Invalid {
            nearest: Some(HunkRange { start: 3, end: 7 }),
            distance: Some(24)
        }
    );
    assert_eq!((comments[2].start_line, comments[2].end_line), (Some(30), Some(31)));
}

#[test]
fn pipeline_logs_through_engine_layer() {
    let logs = LogBuffer::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::registry()
        .with(telemetry::layer_with_writer(move || sink.clone()));

    let file = FileDiff::new("src/old.rs", "@@ -1,2 +0,0 @@\n-a\n-b")
        .with_original("a\nb")
        .with_edit_kind(EditKind::Deleted);
    let out = tracing::subscriber::with_default(subscriber, || {
        prepare_file_patch(&file, &PatchConfig::default())
    });
    assert_eq!(out, "\n\n## File 'src/old.rs' was deleted\n");

    let text = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
    let line = text
        .lines()
        .find(|l| l.contains("deletions: file 'src/old.rs' was deleted"))
        .unwrap_or_else(|| panic!("deletion event missing from: {text}"));
    assert!(line.contains("INFO"));
    assert!(line.contains("patch_engine::deletions"));
}

#[test]
fn blank_context_lines_survive_rendering() {
    init_tracing();
    let file = FileDiff::new("src/a.rs", "@@ -2,1 +2,1 @@ fn a() {\n-    1\n+    2")
        .with_original("fn a() {\n    1\n}\n\nfn b() {}\n")
        .with_new("fn a() {\n    2\n}\n\nfn b() {}\n")
        .with_edit_kind(EditKind::Modified);
    let cfg = PatchConfig {
        extra_lines_after: 2,
        ..PatchConfig::default()
    };

    let expected = [
        "",
        "",
        "## File: 'src/a.rs'",
        "",
        "@@ -1,4 +1,4 @@",
        "__new hunk__",
        "1  fn a() {",
        "2 +    2",
        "3  }",
        "4  ",
        "__old hunk__",
        " fn a() {",
        "-    1",
        " }",
        " ",
    ]
    .join("\n");
    assert_eq!(prepare_file_patch(&file, &cfg), expected);
}
