//! Image operations, delegated to an external tool.
//!
//! | Operation | Used by |
//! |---|---|
//! | **Probe** | source validation (`WIDTHxHEIGHT` of the master) |
//! | **Rasterize** | every generated icon (scale, then center-crop) |
//! | **Downscale** | the shared intermediate of a generation run |
//! | **Render label** | stub icon sets generated from text |
//! | **Composite** | badge masking of an existing set |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for sizes, names and badge geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`MagickBackend`]

pub mod backend;
mod calculations;
pub mod magick;
mod params;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    LARGE_EDGE_THRESHOLD, format_offset, format_px, icon_filename, is_large, mask_size,
    parse_probe_output, parse_scale, parse_size, pixel_dimensions, square_outline,
    suffixed_name, text_symbol_position, triangle_outline,
};
pub use magick::MagickBackend;
pub use params::{
    CompositeParams, DownscaleParams, LabelParams, Outline, RasterizeParams, Stroke, Symbol,
};
