//! Image tool backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the five operations the pipelines need
//! from an external image tool: probe, rasterize, downscale, render_label and
//! composite. Each call is one blocking subprocess invocation.
//!
//! The production implementation is
//! [`MagickBackend`](super::magick::MagickBackend), which shells out to
//! ImageMagick. Tests use the recording `MockBackend` in this module.

use super::params::{CompositeParams, DownscaleParams, LabelParams, RasterizeParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("`{0}` was not found; install ImageMagick (e.g. `brew install imagemagick`)")]
    ToolMissing(String),
    #[error("`{program}` exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Pixel dimensions of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Longer edge.
    pub fn max_side(self) -> u32 {
        self.width.max(self.height)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image tool backends.
///
/// `Sync` because the fan-out stages call the same backend from every worker
/// of the pool.
pub trait ImageBackend: Sync {
    /// Describe a file; the output contains its native `WIDTHxHEIGHT`.
    fn probe(&self, path: &Path) -> Result<String, BackendError>;

    /// Scale to a square of the longer edge, then center-crop to exact size.
    fn rasterize(&self, params: &RasterizeParams) -> Result<(), BackendError>;

    /// Produce a square downscaled copy with no cropping.
    fn downscale(&self, params: &DownscaleParams) -> Result<(), BackendError>;

    /// Render a text label onto a flat background.
    fn render_label(&self, params: &LabelParams) -> Result<(), BackendError>;

    /// Draw a badge outline and symbol onto a copy of the source.
    fn composite(&self, params: &CompositeParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Mock backend that records operations and writes small placeholder
    /// files instead of running a tool.
    ///
    /// Uses Mutex (not RefCell) so it is Sync and works from pool workers.
    /// Outputs are written so directory listings, determinism checks and
    /// cleanup checks see real files.
    #[derive(Default)]
    pub struct MockBackend {
        pub probe_output: Mutex<Option<String>>,
        pub failing_outputs: Mutex<Vec<PathBuf>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Probe(String),
        Rasterize {
            source: String,
            output: String,
            width: u32,
            height: u32,
        },
        Downscale {
            source: String,
            output: String,
            side: u32,
        },
        Label {
            output: String,
            width: u32,
            height: u32,
            text: String,
        },
        Composite(CompositeParams),
    }

    impl RecordedOp {
        /// Output path of a writing operation.
        pub fn output(&self) -> Option<&str> {
            match self {
                RecordedOp::Probe(_) => None,
                RecordedOp::Rasterize { output, .. }
                | RecordedOp::Downscale { output, .. }
                | RecordedOp::Label { output, .. } => Some(output),
                RecordedOp::Composite(params) => params.output.to_str(),
            }
        }
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// A backend whose probe reports `width × height` like `magick identify`.
        pub fn with_probe(width: u32, height: u32) -> Self {
            let backend = Self::new();
            *backend.probe_output.lock().unwrap() =
                Some(format!("master.pdf PDF {width}x{height} {width}x{height}+0+0 16-bit sRGB"));
            backend
        }

        /// Make every operation writing a file named `file_name` fail.
        pub fn fail_on(self, file_name: &str) -> Self {
            self.failing_outputs.lock().unwrap().push(file_name.into());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }

        fn write_output(&self, output: &Path, contents: String) -> Result<(), BackendError> {
            let failing = self.failing_outputs.lock().unwrap();
            if output
                .file_name()
                .is_some_and(|name| failing.iter().any(|f| f.as_os_str() == name))
            {
                return Err(BackendError::CommandFailed {
                    program: "mock".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: format!("refusing to write {}", output.display()),
                });
            }
            std::fs::write(output, contents)?;
            Ok(())
        }
    }

    impl ImageBackend for MockBackend {
        fn probe(&self, path: &Path) -> Result<String, BackendError> {
            self.record(RecordedOp::Probe(path.to_string_lossy().to_string()));
            Ok(self.probe_output.lock().unwrap().clone().unwrap_or_default())
        }

        fn rasterize(&self, params: &RasterizeParams) -> Result<(), BackendError> {
            self.record(RecordedOp::Rasterize {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
            });
            self.write_output(
                &params.output,
                format!("raster {}x{}", params.width, params.height),
            )
        }

        fn downscale(&self, params: &DownscaleParams) -> Result<(), BackendError> {
            self.record(RecordedOp::Downscale {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                side: params.side,
            });
            self.write_output(&params.output, format!("intermediate {}", params.side))
        }

        fn render_label(&self, params: &LabelParams) -> Result<(), BackendError> {
            self.record(RecordedOp::Label {
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                text: params.text.clone(),
            });
            self.write_output(
                &params.output,
                format!("label {} {}x{}", params.text, params.width, params.height),
            )
        }

        fn composite(&self, params: &CompositeParams) -> Result<(), BackendError> {
            self.record(RecordedOp::Composite(params.clone()));
            let base = std::fs::read_to_string(&params.source)?;
            self.write_output(&params.output, format!("{base}+badge"))
        }
    }

    #[test]
    fn mock_records_probe() {
        let backend = MockBackend::with_probe(2048, 2048);

        let output = backend.probe(Path::new("/test/master.pdf")).unwrap();
        assert!(output.contains("2048x2048"));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Probe(p) if p == "/test/master.pdf"));
    }

    #[test]
    fn mock_records_rasterize_and_writes_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("Icon-40x40.png");
        let backend = MockBackend::new();

        backend
            .rasterize(&RasterizeParams {
                source: "/master.pdf".into(),
                output: output.clone(),
                width: 40,
                height: 40,
            })
            .unwrap();

        assert!(output.exists());
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Rasterize {
                width: 40,
                height: 40,
                ..
            }
        ));
    }

    #[test]
    fn mock_fails_configured_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new().fail_on("Icon-58x58.png");

        let result = backend.rasterize(&RasterizeParams {
            source: "/master.pdf".into(),
            output: tmp.path().join("Icon-58x58.png"),
            width: 58,
            height: 58,
        });

        assert!(matches!(result, Err(BackendError::CommandFailed { .. })));
        assert!(!tmp.path().join("Icon-58x58.png").exists());
    }

    #[test]
    fn dimensions_display_and_max_side() {
        let dims = Dimensions::new(1024, 768);
        assert_eq!(dims.to_string(), "1024x768");
        assert_eq!(dims.max_side(), 1024);
    }
}
