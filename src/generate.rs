//! Icon set generation.
//!
//! Turns one master image (or a text label) into every image a set of
//! targets needs, plus the `Contents.json` that declares them.
//!
//! ## Stages
//!
//! ```text
//! targets ──▶ validate master ──▶ resolve sizes ──▶ large icons (> 512 px)
//!                                                      │
//!                        manifest ◀── small icons ◀── intermediate
//!                                   (worker pool)
//! ```
//!
//! 1. **Resolving** checks the requested targets before any tool runs.
//! 2. **Validating** probes the master (skipped for labels).
//! 3. **Resolving** turns catalog entries into pixel sizes and file names,
//!    then creates the set directory.
//! 4. **Large generation** renders big icons straight from the master, one
//!    after another.
//! 5. **Intermediate downscale** renders the master once at the largest
//!    small size, into a temporary file.
//! 6. **Small fan-out** renders every small icon from that intermediate on
//!    the worker pool.
//! 7. **Manifest write** declares every entry, in catalog order.
//!
//! Entries sharing a file name are rendered once. A failed run writes no
//! manifest; the intermediate is removed on every path.
//!
//! ## Output Structure
//!
//! ```text
//! <output>/AppIcon.appiconset/             # or "iMessage App Icon.stickersiconset"
//! ├── Contents.json
//! ├── Icon-40x40.png
//! ├── Icon-60x60.png
//! └── ...
//! ```

use crate::catalog::{Catalog, CatalogError, Target, TargetSet};
use crate::config::{Parallelism, StubConfig, ToolConfig};
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, MagickBackend, icon_filename, is_large,
};
use crate::manifest::{DescriptorError, ImageDescriptor, Manifest, ManifestError};
use crate::pool;
use crate::progress::{Progress, ProgressEvent};
use crate::rasterize::{LabelRasterizer, Rasterizer, VectorRasterizer};
use crate::source::{self, SourceError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Pipeline stage, reported with every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateStage {
    Resolving,
    Validating,
    LargeGeneration,
    IntermediateDownscale,
    SmallFanOut,
    ManifestWrite,
}

impl fmt::Display for GenerateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolving => "resolving targets",
            Self::Validating => "validating source",
            Self::LargeGeneration => "rendering large icons",
            Self::IntermediateDownscale => "rendering intermediate",
            Self::SmallFanOut => "rendering small icons",
            Self::ManifestWrite => "writing manifest",
        })
    }
}

#[derive(Error, Debug)]
#[error("{stage}: {source}")]
pub struct GenerateError {
    pub stage: GenerateStage,
    pub source: GenerateFailure,
}

#[derive(Error, Debug)]
pub enum GenerateFailure {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("invalid entry {size} @ {scale} ({idiom}): {source}")]
    InvalidDescriptor {
        size: String,
        scale: String,
        idiom: String,
        source: DescriptorError,
    },
    #[error("rendering {} failed: {source}", target.display())]
    RasterizationFailed { target: PathBuf, source: BackendError },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tag a failure with the stage it happened in.
trait AtStage<T> {
    fn at(self, stage: GenerateStage) -> Result<T, GenerateError>;
}

impl<T, E: Into<GenerateFailure>> AtStage<T> for Result<T, E> {
    fn at(self, stage: GenerateStage) -> Result<T, GenerateError> {
        self.map_err(|e| GenerateError {
            stage,
            source: e.into(),
        })
    }
}

/// Where icon pixels come from.
#[derive(Debug, Clone, PartialEq)]
pub enum IconSource {
    /// A vector master, at least 1024×1024.
    Master(PathBuf),
    /// A text label drawn on a flat background.
    Label { text: String, style: StubConfig },
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub source: IconSource,
    /// Directory the icon set directory is created in.
    pub output_dir: PathBuf,
    pub targets: Vec<Target>,
    pub parallelism: Parallelism,
}

#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub iconset_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    /// Distinct files rendered.
    pub rendered: usize,
}

/// One file to render. `covers` counts the manifest entries sharing it.
#[derive(Debug, Clone)]
struct RenderUnit {
    path: PathBuf,
    size: Dimensions,
    covers: usize,
}

/// Generate an icon set with ImageMagick and the given catalog.
pub fn generate(
    tool: &ToolConfig,
    catalog: &Catalog,
    request: &GenerateRequest,
    progress: Option<Sender<ProgressEvent>>,
) -> Result<GenerateOutcome, GenerateError> {
    generate_with_backend(&MagickBackend::from_config(tool), catalog, request, progress)
}

/// Generate an icon set with any backend.
pub fn generate_with_backend<B: ImageBackend>(
    backend: &B,
    catalog: &Catalog,
    request: &GenerateRequest,
    progress: Option<Sender<ProgressEvent>>,
) -> Result<GenerateOutcome, GenerateError> {
    let set = TargetSet::new(request.targets.clone()).at(GenerateStage::Resolving)?;
    log::info!(
        "generating {} for {}",
        set.iconset_dirname(),
        set.targets()
            .iter()
            .map(Target::name)
            .collect::<Vec<_>>()
            .join(", ")
    );

    match &request.source {
        IconSource::Master(path) => {
            log::info!("validating {}", path.display());
            source::validate(backend, path).at(GenerateStage::Validating)?;
            let rasterizer = VectorRasterizer::new(backend, path);
            run(&rasterizer, catalog, &set, request, progress)
        }
        IconSource::Label { text, style } => {
            let rasterizer = LabelRasterizer::new(backend, text.as_str(), style.clone());
            run(&rasterizer, catalog, &set, request, progress)
        }
    }
}

fn run(
    rasterizer: &dyn Rasterizer,
    catalog: &Catalog,
    set: &TargetSet,
    request: &GenerateRequest,
    progress: Option<Sender<ProgressEvent>>,
) -> Result<GenerateOutcome, GenerateError> {
    let iconset_dir = request.output_dir.join(set.iconset_dirname());
    let mut descriptors = catalog.resolve(set).at(GenerateStage::Resolving)?;
    let (large, small) = plan_units(&mut descriptors, &iconset_dir).at(GenerateStage::Resolving)?;
    let small_count: usize = small.iter().map(|u| u.covers).sum();
    log::info!(
        "{} entries: {} large files, {} small files",
        descriptors.len(),
        large.len(),
        small.len()
    );

    std::fs::create_dir_all(&iconset_dir).at(GenerateStage::Resolving)?;

    let mut progress = Progress::new(progress);
    progress.start(small_count + 2);

    log::info!("rendering {} large icons", large.len());
    for unit in &large {
        render(rasterizer, None, unit).at(GenerateStage::LargeGeneration)?;
    }

    let intermediate = match small.iter().map(|u| u.size.max_side()).max() {
        Some(side) if rasterizer.master().is_some() => {
            log::info!("rendering {side}x{side} intermediate");
            let file = tempfile::Builder::new()
                .prefix(".icon-intermediate-")
                .suffix(".png")
                .tempfile_in(&iconset_dir)
                .at(GenerateStage::IntermediateDownscale)?;
            let produced = rasterizer
                .downscale_master(file.path(), side)
                .map_err(|source| GenerateFailure::RasterizationFailed {
                    target: file.path().to_path_buf(),
                    source,
                })
                .at(GenerateStage::IntermediateDownscale)?;
            produced.then_some(file)
        }
        _ => None,
    };
    progress.advance(1);

    log::info!("rendering {} small icons", small.len());
    let source = intermediate.as_ref().map(|file| file.path());
    pool::run_units(
        &small,
        request.parallelism,
        |unit| render(rasterizer, source, unit),
        |index| progress.advance(small[index].covers),
    )
    .at(GenerateStage::SmallFanOut)?;
    drop(intermediate);

    let manifest = Manifest::new(descriptors);
    let manifest_path = manifest
        .write(&iconset_dir)
        .at(GenerateStage::ManifestWrite)?;
    progress.advance(1);
    log::info!("wrote {}", manifest_path.display());

    Ok(GenerateOutcome {
        iconset_dir,
        manifest_path,
        manifest,
        rendered: large.len() + small.len(),
    })
}

fn render(
    rasterizer: &dyn Rasterizer,
    source: Option<&Path>,
    unit: &RenderUnit,
) -> Result<(), GenerateFailure> {
    rasterizer
        .rasterize(source, &unit.path, unit.size)
        .map_err(|source| GenerateFailure::RasterizationFailed {
            target: unit.path.clone(),
            source,
        })
}

/// Assign file names to every descriptor and split the distinct files into
/// large and small render units, each in first-appearance order.
fn plan_units(
    descriptors: &mut [ImageDescriptor],
    iconset_dir: &Path,
) -> Result<(Vec<RenderUnit>, Vec<RenderUnit>), GenerateFailure> {
    let mut units: Vec<RenderUnit> = Vec::new();
    for descriptor in descriptors.iter_mut() {
        let size = descriptor
            .pixel_size()
            .map_err(|source| GenerateFailure::InvalidDescriptor {
                size: descriptor.size.clone(),
                scale: descriptor.scale.clone(),
                idiom: descriptor.idiom.clone(),
                source,
            })?;
        let filename = icon_filename(size);
        let path = iconset_dir.join(&filename);
        match units.iter_mut().find(|u| u.path == path) {
            Some(unit) => unit.covers += 1,
            None => units.push(RenderUnit {
                path,
                size,
                covers: 1,
            }),
        }
        descriptor.filename = Some(filename);
    }
    Ok(units.into_iter().partition(|u| is_large(u.size)))
}
