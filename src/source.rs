//! Master image validation.
//!
//! The master must be an existing PDF whose native size, as reported by the
//! image tool, is at least [`MIN_SOURCE_EDGE`] pixels on both axes.

use crate::imaging::{BackendError, Dimensions, ImageBackend, parse_probe_output};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Smallest accepted master edge, in pixels.
pub const MIN_SOURCE_EDGE: u32 = 1024;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source image {0} does not exist")]
    NotFound(PathBuf),
    #[error("Source image {0} must be a PDF file")]
    InvalidFormat(PathBuf),
    #[error("Could not read the size of {path}; the image tool reported: {output}")]
    ProbeFailed { path: PathBuf, output: String },
    #[error(
        "Source image is {width}x{height}; it must be at least {min}x{min}",
        min = MIN_SOURCE_EDGE
    )]
    TooSmall { width: u32, height: u32 },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Check the master and return its native pixel size.
pub fn validate(backend: &impl ImageBackend, path: &Path) -> Result<Dimensions, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(SourceError::InvalidFormat(path.to_path_buf()));
    }

    let output = backend.probe(path)?;
    let dims = parse_probe_output(&output).ok_or_else(|| SourceError::ProbeFailed {
        path: path.to_path_buf(),
        output: output.trim().to_string(),
    })?;
    log::debug!("{} is {dims}", path.display());

    if dims.width < MIN_SOURCE_EDGE || dims.height < MIN_SOURCE_EDGE {
        return Err(SourceError::TooSmall {
            width: dims.width,
            height: dims.height,
        });
    }
    Ok(dims)
}
