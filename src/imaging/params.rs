//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. The pipelines compute
//! them (sizes, geometry, colors) and hand them to an
//! [`ImageBackend`](super::backend::ImageBackend), which turns them into a tool
//! invocation. Keeping them plain data lets the pipelines be tested against a
//! recording mock without ImageMagick installed.
//!
//! ## Types
//!
//! - [`RasterizeParams`] — scale to a square, then center-crop to exact pixels.
//! - [`DownscaleParams`] — square downscale with no crop (the shared intermediate).
//! - [`LabelParams`] — render a text label onto a flat background.
//! - [`CompositeParams`] — draw a badge outline and symbol onto a copy of an icon.

use std::path::PathBuf;

/// Scale-then-center-crop a source into exactly `width × height` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl RasterizeParams {
    /// Side of the square the source is scaled to before cropping.
    pub fn working_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Downscale a source into a `side × side` square.
#[derive(Debug, Clone, PartialEq)]
pub struct DownscaleParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub side: u32,
}

/// Stroke applied to drawn shapes.
///
/// `color: None` means the outline is drawn with no stroke at all, which is
/// what a zero stroke ratio asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: Option<String>,
}

impl Stroke {
    /// Build a stroke whose width is `ratio` of `reference` pixels.
    pub fn from_ratio(ratio: f64, color: &str, reference: f64) -> Self {
        Self {
            width: ratio * reference,
            color: (ratio != 0.0).then(|| color.to_string()),
        }
    }

    /// No outline.
    pub fn none() -> Self {
        Self {
            width: 0.0,
            color: None,
        }
    }
}

/// Parameters for rendering a text label icon (stub mode).
#[derive(Debug, Clone, PartialEq)]
pub struct LabelParams {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub text: String,
    pub background: String,
    pub fill: String,
    pub stroke: Stroke,
    pub font: String,
    pub pointsize: f64,
    /// Offset from the center of the canvas, in pixels.
    pub offset: (f64, f64),
}

/// Badge outline, in the pixel coordinates of the target image.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Polygon(Vec<(f64, f64)>),
    Rectangle { from: (f64, f64), to: (f64, f64) },
}

/// What goes on top of the badge outline.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// A text glyph annotated at `position` (baseline origin, from top-left).
    Text {
        text: String,
        color: String,
        font: String,
        pointsize: f64,
        position: (f64, f64),
    },
    /// An image file resized into `width × height` and composited with its
    /// bottom-left corner offset by `position`.
    Image {
        file: PathBuf,
        width: f64,
        height: f64,
        position: (f64, f64),
    },
}

/// Parameters for compositing a badge onto a copy of an existing icon.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub fill: String,
    pub stroke: Stroke,
    pub outline: Outline,
    pub symbol: Symbol,
}
