//! # icongen
//!
//! Generates complete app icon sets from a single vector master, and badges
//! existing sets to make visually distinct variants (beta, QA, staging).
//!
//! # Architecture: Two Pipelines
//!
//! ```text
//! generate   master.pdf ──▶ AppIcon.appiconset/        (every size + Contents.json)
//! mask       AppIcon.appiconset/ ──▶ AppIcon-Beta.appiconset/
//! ```
//!
//! Both pipelines compute *what* to draw in pure code and hand plain
//! parameter structs to an [`imaging::ImageBackend`]. The production backend
//! shells out to ImageMagick; the test suite swaps in a recording mock, so
//! pipeline logic is covered without any image tool installed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Per-platform dimension tables, target parsing and compatibility |
//! | [`manifest`] | `Contents.json` model: descriptors, pixel sizes, read/write |
//! | [`source`] | Master validation (exists, is a PDF, at least 1024×1024) |
//! | [`rasterize`] | `Rasterizer` trait: icons from a vector master or a text label |
//! | [`generate`] | Generation pipeline: validate → large → intermediate → fan-out → manifest |
//! | [`mask`] | Masking pipeline: load manifest → badge every image → new manifest |
//! | [`pool`] | Bounded rayon fan-out with a result channel |
//! | [`progress`] | Monotonic progress counter and events |
//! | [`config`] | `icongen.toml` loading, merging and validation |
//! | [`imaging`] | Backend trait, ImageMagick argument grammar, pure geometry |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Intermediate Per Run
//!
//! Rasterizing a vector master is the slow step. Icons up to 512 px are all
//! rendered from one downscaled copy of the master, so the vector is read a
//! handful of times per run instead of once per icon. Larger icons still come
//! straight from the master to keep their edges sharp.
//!
//! ## Deterministic Manifests
//!
//! File names are derived from pixel sizes and the manifest lists entries in
//! catalog order, independent of which worker finished first. Two runs over
//! the same inputs write byte-identical `Contents.json` files.
//!
//! ## Closed Vocabularies
//!
//! Targets and mask shapes are enums with an `Other(String)` escape. Parsing
//! never fails; the unknown value is rejected once, at the pipeline boundary,
//! with an error that names it.

pub mod catalog;
pub mod config;
pub mod generate;
pub mod imaging;
pub mod manifest;
pub mod mask;
pub mod output;
pub mod pool;
pub mod progress;
pub mod rasterize;
pub mod source;

#[cfg(test)]
pub(crate) mod test_helpers;
