//! Badge masking of an existing icon set.
//!
//! Reads `<set>/Contents.json`, draws a badge in the bottom-left corner of a
//! copy of every image, and writes the copies plus a new manifest to a
//! sibling set named with the configured suffix:
//!
//! ```text
//! AppIcon.appiconset/Icon-40x40.png  ──▶  AppIcon-Beta.appiconset/Icon-40x40-Beta.png
//! ```
//!
//! Badge geometry is computed from each image's own pixel size, so one
//! [`MaskConfig`] fits every image in the set. The source set is only read.

use crate::config::{ConfigError, MaskConfig, MaskShape, Parallelism, ToolConfig};
use crate::imaging::{
    BackendError, CompositeParams, Dimensions, ImageBackend, MagickBackend, Outline, Stroke,
    Symbol, mask_size, square_outline, suffixed_name, text_symbol_position, triangle_outline,
};
use crate::manifest::{DescriptorError, Manifest, ManifestError};
use crate::pool;
use crate::progress::{Progress, ProgressEvent};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskStage {
    Loading,
    Compositing,
    ManifestWrite,
}

impl fmt::Display for MaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loading => "loading icon set",
            Self::Compositing => "drawing badges",
            Self::ManifestWrite => "writing manifest",
        })
    }
}

#[derive(Error, Debug)]
#[error("{stage}: {source}")]
pub struct MaskError {
    pub stage: MaskStage,
    pub source: MaskFailure,
}

#[derive(Error, Debug)]
pub enum MaskFailure {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("{0} is not an icon set directory")]
    InvalidIconSet(PathBuf),
    #[error("invalid entry {filename}: {source}")]
    InvalidDescriptor {
        filename: String,
        source: DescriptorError,
    },
    #[error("badging {} failed: {source}", target.display())]
    RasterizationFailed { target: PathBuf, source: BackendError },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn at<E: Into<MaskFailure>>(stage: MaskStage) -> impl FnOnce(E) -> MaskError {
    move |e| MaskError {
        stage,
        source: e.into(),
    }
}

#[derive(Debug, Clone)]
pub struct MaskRequest {
    /// The icon set directory to badge.
    pub iconset: PathBuf,
    /// Where the badged set is created; defaults to the source set's parent.
    pub output_dir: Option<PathBuf>,
    pub config: MaskConfig,
    pub parallelism: Parallelism,
}

#[derive(Debug, Clone)]
pub struct MaskOutcome {
    pub iconset_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    /// Distinct files badged.
    pub composited: usize,
}

/// One badged file. `covers` counts the manifest entries sharing it.
#[derive(Debug, Clone)]
struct BadgeUnit {
    params: CompositeParams,
    covers: usize,
}

/// Badge an icon set with ImageMagick.
pub fn mask(
    tool: &ToolConfig,
    request: &MaskRequest,
    progress: Option<Sender<ProgressEvent>>,
) -> Result<MaskOutcome, MaskError> {
    mask_with_backend(&MagickBackend::from_config(tool), request, progress)
}

/// Badge an icon set with any backend.
pub fn mask_with_backend<B: ImageBackend>(
    backend: &B,
    request: &MaskRequest,
    progress: Option<Sender<ProgressEvent>>,
) -> Result<MaskOutcome, MaskError> {
    let config = &request.config;
    config.validate().map_err(at(MaskStage::Loading))?;

    log::info!("loading {}", request.iconset.display());
    let mut manifest = Manifest::read_dir(&request.iconset).map_err(at(MaskStage::Loading))?;
    let iconset_dir = output_set_dir(request).map_err(at(MaskStage::Loading))?;

    let mut units: Vec<BadgeUnit> = Vec::new();
    for descriptor in manifest.images.iter_mut() {
        let Some(filename) = descriptor.filename.clone() else {
            continue;
        };
        let dims = descriptor
            .pixel_size()
            .map_err(|source| MaskFailure::InvalidDescriptor {
                filename: filename.clone(),
                source,
            })
            .map_err(at(MaskStage::Loading))?;
        let badged = suffixed_name(&filename, &config.suffix);
        let output = iconset_dir.join(&badged);
        match units.iter_mut().find(|u| u.params.output == output) {
            Some(unit) => unit.covers += 1,
            None => units.push(BadgeUnit {
                params: badge_params(config, request.iconset.join(&filename), output, dims)
                    .map_err(at(MaskStage::Loading))?,
                covers: 1,
            }),
        }
        descriptor.filename = Some(badged);
    }
    let entry_count: usize = units.iter().map(|u| u.covers).sum();

    std::fs::create_dir_all(&iconset_dir).map_err(at(MaskStage::Compositing))?;
    let mut progress = Progress::new(progress);
    progress.start(entry_count);

    log::info!(
        "drawing {} badges for {} entries into {}",
        units.len(),
        entry_count,
        iconset_dir.display()
    );
    pool::run_units(
        &units,
        request.parallelism,
        |unit| {
            backend
                .composite(&unit.params)
                .map_err(|source| MaskFailure::RasterizationFailed {
                    target: unit.params.output.clone(),
                    source,
                })
        },
        |index| progress.advance(units[index].covers),
    )
    .map_err(at(MaskStage::Compositing))?;

    let manifest_path = manifest
        .write(&iconset_dir)
        .map_err(at(MaskStage::ManifestWrite))?;
    log::info!("wrote {}", manifest_path.display());

    Ok(MaskOutcome {
        iconset_dir,
        manifest_path,
        manifest,
        composited: units.len(),
    })
}

/// `<output>/<set stem>-<suffix>.<set ext>`.
fn output_set_dir(request: &MaskRequest) -> Result<PathBuf, MaskFailure> {
    let invalid = || MaskFailure::InvalidIconSet(request.iconset.clone());
    let name = request
        .iconset
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(invalid)?;
    let parent = match &request.output_dir {
        Some(dir) => dir.clone(),
        None => request
            .iconset
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(invalid)?,
    };
    Ok(parent.join(suffixed_name(name, &request.config.suffix)))
}

/// Composite parameters for badging one image of `dims` pixels.
pub fn badge_params(
    config: &MaskConfig,
    source: PathBuf,
    output: PathBuf,
    dims: Dimensions,
) -> Result<CompositeParams, ConfigError> {
    let (w, h) = (dims.width as f64, dims.height as f64);
    let mask = mask_size(dims, config.x_size_ratio, config.y_size_ratio);
    let outline: Outline = match &config.shape {
        MaskShape::Triangle => triangle_outline(dims, mask),
        MaskShape::Square => square_outline(dims, mask),
        MaskShape::Other(name) => return Err(ConfigError::UnknownMaskShape(name.clone())),
    };
    let symbol = match &config.file {
        Some(file) => Symbol::Image {
            file: file.clone(),
            width: w * config.size_offset,
            height: h,
            position: (w * config.x_offset, h * config.y_offset),
        },
        None => Symbol::Text {
            text: config.symbol.clone(),
            color: config.symbol_color.clone(),
            font: config.font.clone(),
            pointsize: h * config.size_offset * 2.0,
            position: text_symbol_position(dims, config.x_offset, config.y_offset),
        },
    };
    Ok(CompositeParams {
        source,
        output,
        fill: config.background_color.clone(),
        stroke: Stroke::from_ratio(config.stroke_width, &config.stroke_color, w.min(h)),
        outline,
        symbol,
    })
}
