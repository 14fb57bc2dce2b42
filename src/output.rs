//! CLI output formatting for both pipelines.
//!
//! # Information-First Display
//!
//! Output is **entry-centric, not file-centric**. Each manifest entry leads
//! with its identity (nominal size, scale, idiom) and shows the file it maps
//! to as secondary context after an arrow. Entries sharing a file each get a
//! line, so the listing reads like the manifest itself.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! AppIcon.appiconset (9 entries, 8 files)
//!     20x20 @2x iphone → Icon-40x40.png
//!     20x20 @3x iphone → Icon-60x60.png
//!     ...
//!     Manifest: AppIcon.appiconset/Contents.json
//! ```
//!
//! ## Mask
//!
//! ```text
//! AppIcon-Beta.appiconset (9 images badged)
//!     20x20 @2x iphone → Icon-40x40-Beta.png
//!     ...
//!     Manifest: AppIcon-Beta.appiconset/Contents.json
//! ```
//!
//! ## Progress
//!
//! ```text
//! [##########----------] 5/10
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>` or `String`) for
//! testability and a `print_*` wrapper that writes to the terminal. Format
//! functions are pure: no I/O, no side effects.

use crate::generate::GenerateOutcome;
use crate::manifest::{ImageDescriptor, Manifest};
use crate::mask::MaskOutcome;
use crate::progress::ProgressEvent;
use std::error::Error;
use std::io::Write;
use std::path::Path;

/// Width of the progress bar, in cells.
pub const PROGRESS_WIDTH: usize = 20;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `20x20 @2x iphone → Icon-40x40.png`, or `(no file)` for unrendered entries.
fn entry_line(descriptor: &ImageDescriptor) -> String {
    format!(
        "{}{} @{} {} \u{2192} {}",
        indent(1),
        descriptor.size,
        descriptor.scale,
        descriptor.idiom,
        descriptor.filename.as_deref().unwrap_or("(no file)")
    )
}

/// Path of the manifest relative to the set's parent directory.
fn manifest_line(iconset_dir: &Path, manifest_path: &Path) -> String {
    let shown = iconset_dir
        .parent()
        .and_then(|parent| manifest_path.strip_prefix(parent).ok())
        .unwrap_or(manifest_path);
    format!("{}Manifest: {}", indent(1), shown.display())
}

fn set_name(iconset_dir: &Path) -> String {
    iconset_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| iconset_dir.display().to_string())
}

fn entry_lines(manifest: &Manifest) -> impl Iterator<Item = String> + '_ {
    manifest.images.iter().map(entry_line)
}

// ============================================================================
// Progress
// ============================================================================

/// Render a progress bar: `[####------] 2/5`.
pub fn format_progress(completed: usize, total: usize, width: usize) -> String {
    let filled = if total == 0 {
        width
    } else {
        (completed.min(total) * width) / total
    };
    format!(
        "[{}{}] {}/{}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        completed,
        total
    )
}

/// Format a progress event as a bar line.
pub fn format_progress_event(event: &ProgressEvent) -> String {
    match *event {
        ProgressEvent::Started { total } => format_progress(0, total, PROGRESS_WIDTH),
        ProgressEvent::Advanced { completed, total } => {
            format_progress(completed, total, PROGRESS_WIDTH)
        }
    }
}

/// Redraw the progress bar in place on stderr.
pub fn print_progress_event(event: &ProgressEvent) {
    let mut stderr = std::io::stderr().lock();
    let _ = write!(stderr, "\r{}", format_progress_event(event));
    if matches!(*event, ProgressEvent::Advanced { completed, total } if completed >= total) {
        let _ = writeln!(stderr);
    }
    let _ = stderr.flush();
}

// ============================================================================
// Generate output
// ============================================================================

/// Format the result of a generation run.
pub fn format_generate_output(outcome: &GenerateOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({} entries, {} files)",
        set_name(&outcome.iconset_dir),
        outcome.manifest.images.len(),
        outcome.rendered
    )];
    lines.extend(entry_lines(&outcome.manifest));
    lines.push(manifest_line(&outcome.iconset_dir, &outcome.manifest_path));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(outcome: &GenerateOutcome) {
    for line in format_generate_output(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Mask output
// ============================================================================

/// Format the result of a masking run.
pub fn format_mask_output(outcome: &MaskOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({} images badged)",
        set_name(&outcome.iconset_dir),
        outcome.composited
    )];
    lines.extend(entry_lines(&outcome.manifest));
    lines.push(manifest_line(&outcome.iconset_dir, &outcome.manifest_path));
    lines
}

/// Print mask output to stdout.
pub fn print_mask_output(outcome: &MaskOutcome) {
    for line in format_mask_output(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Format an error for the terminal.
///
/// Without `trace` only the top-level message is shown. With it, every
/// underlying cause follows on its own indented line.
pub fn format_error(err: &dyn Error, trace: bool) -> Vec<String> {
    let mut lines = vec![format!("ERROR: {err}")];
    if trace {
        let mut cause = err.source();
        while let Some(e) = cause {
            lines.push(format!("{}caused by: {e}", indent(1)));
            cause = e.source();
        }
    }
    lines
}

/// Print an error to stderr.
pub fn print_error(err: &dyn Error, trace: bool) {
    for line in format_error(err, trace) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{GenerateError, GenerateFailure, GenerateStage};
    use crate::imaging::BackendError;
    use std::path::PathBuf;

    fn manifest() -> Manifest {
        let mut a = ImageDescriptor::new("20x20", "iphone", "2x");
        a.filename = Some("Icon-40x40.png".into());
        let mut b = ImageDescriptor::new("40x40", "ipad", "1x");
        b.filename = Some("Icon-40x40.png".into());
        let c = ImageDescriptor::new("1024x1024", "ios-marketing", "1x");
        Manifest::new(vec![a, b, c])
    }

    // =========================================================================
    // Progress
    // =========================================================================

    #[test]
    fn progress_bar_empty_and_full() {
        assert_eq!(format_progress(0, 4, 8), "[--------] 0/4");
        assert_eq!(format_progress(4, 4, 8), "[########] 4/4");
    }

    #[test]
    fn progress_bar_partial_rounds_down() {
        assert_eq!(format_progress(1, 3, 10), "[###-------] 1/3");
    }

    #[test]
    fn progress_bar_zero_total_is_full() {
        assert_eq!(format_progress(0, 0, 4), "[####] 0/0");
    }

    #[test]
    fn progress_event_formats() {
        assert_eq!(
            format_progress_event(&ProgressEvent::Started { total: 2 }),
            format!("[{}] 0/2", "-".repeat(PROGRESS_WIDTH))
        );
        assert_eq!(
            format_progress_event(&ProgressEvent::Advanced {
                completed: 1,
                total: 2
            }),
            format!("[{}{}] 1/2", "#".repeat(10), "-".repeat(10))
        );
    }

    // =========================================================================
    // Generate / mask
    // =========================================================================

    #[test]
    fn generate_output_lists_entries() {
        let outcome = GenerateOutcome {
            iconset_dir: PathBuf::from("/out/AppIcon.appiconset"),
            manifest_path: PathBuf::from("/out/AppIcon.appiconset/Contents.json"),
            manifest: manifest(),
            rendered: 1,
        };
        let lines = format_generate_output(&outcome);
        assert_eq!(
            lines,
            vec![
                "AppIcon.appiconset (3 entries, 1 files)",
                "    20x20 @2x iphone \u{2192} Icon-40x40.png",
                "    40x40 @1x ipad \u{2192} Icon-40x40.png",
                "    1024x1024 @1x ios-marketing \u{2192} (no file)",
                "    Manifest: AppIcon.appiconset/Contents.json",
            ]
        );
    }

    #[test]
    fn mask_output_header() {
        let outcome = MaskOutcome {
            iconset_dir: PathBuf::from("/out/AppIcon-Beta.appiconset"),
            manifest_path: PathBuf::from("/out/AppIcon-Beta.appiconset/Contents.json"),
            manifest: manifest(),
            composited: 2,
        };
        let lines = format_mask_output(&outcome);
        assert_eq!(lines[0], "AppIcon-Beta.appiconset (2 images badged)");
        assert_eq!(
            lines.last().unwrap(),
            "    Manifest: AppIcon-Beta.appiconset/Contents.json"
        );
    }

    // =========================================================================
    // Errors
    // =========================================================================

    fn rasterization_error() -> GenerateError {
        GenerateError {
            stage: GenerateStage::SmallFanOut,
            source: GenerateFailure::RasterizationFailed {
                target: PathBuf::from("Icon-40x40.png"),
                source: BackendError::ToolMissing("magick".into()),
            },
        }
    }

    #[test]
    fn error_without_trace_is_one_line() {
        let lines = format_error(&rasterization_error(), false);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ERROR: rendering small icons: rendering Icon-40x40.png failed"));
    }

    #[test]
    fn error_with_trace_shows_causes() {
        let lines = format_error(&rasterization_error(), true);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("    caused by: rendering Icon-40x40.png failed"));
        assert!(lines[2].starts_with("    caused by: `magick` was not found"));
    }
}
