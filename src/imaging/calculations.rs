//! Pure calculation functions for icon sizes, names and badge geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::Outline;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Outputs with either edge above this are rendered straight from the master.
pub const LARGE_EDGE_THRESHOLD: u32 = 512;

static SIZE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*x\s*(\d+(?:\.\d+)?)\s*$").unwrap());

static SCALE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*x\s*$").unwrap());

static PROBE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)x(\d+)").unwrap());

/// Parse a nominal size such as `"20x20"` or `"83.5x83.5"`.
pub fn parse_size(size: &str) -> Option<(f64, f64)> {
    let caps = SIZE_PATTERN.captures(size)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Parse a scale such as `"2x"`.
pub fn parse_scale(scale: &str) -> Option<f64> {
    SCALE_PATTERN.captures(scale)?[1].parse().ok()
}

/// Convert a nominal size and scale into rounded pixel dimensions.
///
/// Returns `None` when either edge is not finite or rounds below one pixel.
///
/// ```
/// # use icongen::imaging::{pixel_dimensions, Dimensions};
/// assert_eq!(pixel_dimensions((83.5, 83.5), 2.0), Some(Dimensions::new(167, 167)));
/// assert_eq!(pixel_dimensions((20.0, 20.0), 0.0), None);
/// ```
pub fn pixel_dimensions(nominal: (f64, f64), scale: f64) -> Option<Dimensions> {
    let to_pixels = |points: f64| {
        let px = (points * scale).round();
        (px.is_finite() && px >= 1.0 && px <= u32::MAX as f64).then_some(px as u32)
    };
    Some(Dimensions::new(to_pixels(nominal.0)?, to_pixels(nominal.1)?))
}

/// Extract the first `WIDTHxHEIGHT` from a probe's output.
pub fn parse_probe_output(output: &str) -> Option<Dimensions> {
    let caps = PROBE_PATTERN.captures(output)?;
    Some(Dimensions::new(caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Whether an output is rendered directly from the master source.
pub fn is_large(dims: Dimensions) -> bool {
    dims.width > LARGE_EDGE_THRESHOLD || dims.height > LARGE_EDGE_THRESHOLD
}

/// Deterministic output file name for a rendered size.
pub fn icon_filename(dims: Dimensions) -> String {
    format!("Icon-{}x{}.png", dims.width, dims.height)
}

/// Insert `-suffix` between a file name's stem and its extension.
///
/// ```
/// # use icongen::imaging::suffixed_name;
/// assert_eq!(suffixed_name("Icon-40x40.png", "Beta"), "Icon-40x40-Beta.png");
/// assert_eq!(suffixed_name("AppIcon.appiconset", "Beta"), "AppIcon-Beta.appiconset");
/// ```
pub fn suffixed_name(name: &str, suffix: &str) -> String {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem}-{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{suffix}"),
    }
}

/// Badge size in pixels for an image: each edge scaled by its ratio.
pub fn mask_size(dims: Dimensions, x_ratio: f64, y_ratio: f64) -> (f64, f64) {
    (dims.width as f64 * x_ratio, dims.height as f64 * y_ratio)
}

/// Right triangle in the bottom-left corner.
///
/// The legs run from `mask_h` down the left edge and from the left edge to
/// `width - mask_w` along the bottom, so larger ratios give smaller badges.
/// The outline is a closed polygon, so the stroke runs along the visible
/// hypotenuse as well as the two legs lying on the image edges.
pub fn triangle_outline(dims: Dimensions, mask: (f64, f64)) -> Outline {
    let (w, h) = (dims.width as f64, dims.height as f64);
    Outline::Polygon(vec![(0.0, mask.1), (0.0, h), (w - mask.0, h)])
}

/// Rectangle of `mask_w × mask_h` in the bottom-left corner.
///
/// The rectangle reaches past the left and bottom edges so only the two inner
/// edges carry a visible stroke.
pub fn square_outline(dims: Dimensions, mask: (f64, f64)) -> Outline {
    let (w, h) = (dims.width as f64, dims.height as f64);
    Outline::Rectangle {
        from: (-w, h - mask.1),
        to: (mask.0, h * 2.0),
    }
}

/// Baseline origin of a text symbol, measured from the top-left corner.
pub fn text_symbol_position(dims: Dimensions, x_offset: f64, y_offset: f64) -> (f64, f64) {
    let (w, h) = (dims.width as f64, dims.height as f64);
    (w * x_offset, h - h * y_offset)
}

/// Format a pixel quantity for a tool argument: at most two decimals, no
/// trailing zeros.
///
/// ```
/// # use icongen::imaging::format_px;
/// assert_eq!(format_px(552.9600000000001), "552.96");
/// assert_eq!(format_px(1024.0), "1024");
/// assert_eq!(format_px(-0.0), "0");
/// ```
pub fn format_px(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{:.2}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Format an offset pair as a signed geometry suffix (`+10-5`).
pub fn format_offset(offset: (f64, f64)) -> String {
    let sign = |v: f64| {
        let text = format_px(v);
        if text.starts_with('-') {
            text
        } else {
            format!("+{text}")
        }
    };
    format!("{}{}", sign(offset.0), sign(offset.1))
}
