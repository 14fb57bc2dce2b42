//! Producers of a single sized icon.
//!
//! The generation pipeline asks a [`Rasterizer`] for one file at one pixel
//! size at a time and never cares where the pixels come from:
//!
//! - [`VectorRasterizer`] scales a vector master (or a downscaled copy of it)
//!   and center-crops to the exact size.
//! - [`LabelRasterizer`] draws a text label on a flat background, for stub
//!   icon sets made before real artwork exists.

use crate::config::StubConfig;
use crate::imaging::{
    BackendError, Dimensions, DownscaleParams, ImageBackend, LabelParams, RasterizeParams, Stroke,
};
use std::path::{Path, PathBuf};

/// Produces one icon file at one pixel size.
pub trait Rasterizer: Sync {
    /// The master image large outputs are drawn from, if this rasterizer
    /// reads one. Without a master there is no shared intermediate.
    fn master(&self) -> Option<&Path>;

    /// Write `target` at exactly `size`, reading `source` when given and the
    /// master otherwise.
    fn rasterize(
        &self,
        source: Option<&Path>,
        target: &Path,
        size: Dimensions,
    ) -> Result<(), BackendError>;

    /// Write a `side × side` downscaled copy of the master to `target`.
    ///
    /// Returns `false` when there is no master to downscale.
    fn downscale_master(&self, target: &Path, side: u32) -> Result<bool, BackendError>;
}

/// Renders icons from a vector master.
pub struct VectorRasterizer<'a, B: ImageBackend> {
    backend: &'a B,
    master: PathBuf,
}

impl<'a, B: ImageBackend> VectorRasterizer<'a, B> {
    pub fn new(backend: &'a B, master: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            master: master.into(),
        }
    }
}

impl<B: ImageBackend> Rasterizer for VectorRasterizer<'_, B> {
    fn master(&self) -> Option<&Path> {
        Some(&self.master)
    }

    fn rasterize(
        &self,
        source: Option<&Path>,
        target: &Path,
        size: Dimensions,
    ) -> Result<(), BackendError> {
        self.backend.rasterize(&RasterizeParams {
            source: source.unwrap_or(&self.master).to_path_buf(),
            output: target.to_path_buf(),
            width: size.width,
            height: size.height,
        })
    }

    fn downscale_master(&self, target: &Path, side: u32) -> Result<bool, BackendError> {
        self.backend.downscale(&DownscaleParams {
            source: self.master.clone(),
            output: target.to_path_buf(),
            side,
        })?;
        Ok(true)
    }
}

/// Renders icons showing a text label.
pub struct LabelRasterizer<'a, B: ImageBackend> {
    backend: &'a B,
    text: String,
    style: StubConfig,
}

impl<'a, B: ImageBackend> LabelRasterizer<'a, B> {
    pub fn new(backend: &'a B, text: impl Into<String>, style: StubConfig) -> Self {
        Self {
            backend,
            text: text.into(),
            style,
        }
    }

    /// Label parameters for one output; every measure scales with its size.
    pub fn label_params(&self, target: &Path, size: Dimensions) -> LabelParams {
        let (w, h) = (size.width as f64, size.height as f64);
        let style = &self.style;
        LabelParams {
            output: target.to_path_buf(),
            width: size.width,
            height: size.height,
            text: self.text.clone(),
            background: style.background_color.clone(),
            fill: style.symbol_color.clone(),
            stroke: Stroke::from_ratio(style.stroke_width, &style.stroke_color, w.min(h)),
            font: style.font.clone(),
            pointsize: h * style.size_offset,
            offset: (w * style.x_offset, -h * style.y_offset),
        }
    }
}

impl<B: ImageBackend> Rasterizer for LabelRasterizer<'_, B> {
    fn master(&self) -> Option<&Path> {
        None
    }

    fn rasterize(
        &self,
        _source: Option<&Path>,
        target: &Path,
        size: Dimensions,
    ) -> Result<(), BackendError> {
        self.backend.render_label(&self.label_params(target, size))
    }

    fn downscale_master(&self, _target: &Path, _side: u32) -> Result<bool, BackendError> {
        Ok(false)
    }
}
