//! Shared test utilities for the icongen test suite.
//!
//! Fixture builders that put masters and icon sets on disk, plus small
//! lookup helpers for asserting on what a pipeline left behind.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let set = write_iconset(tmp.path(), &[("20x20", "2x"), ("60x60", "3x")]);
//! assert_eq!(file_names(&set), vec!["Contents.json", "Icon-180x180.png", "Icon-40x40.png"]);
//! ```

use std::path::{Path, PathBuf};

use crate::catalog::Target;
use crate::config::Parallelism;
use crate::generate::{GenerateRequest, IconSource};
use crate::imaging::icon_filename;
use crate::manifest::{ImageDescriptor, Manifest};

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a placeholder `master.pdf` into `dir`.
///
/// Only the mock backend reads it, so the contents do not matter.
pub fn master_pdf(dir: &Path) -> PathBuf {
    let path = dir.join("master.pdf");
    std::fs::write(&path, b"%PDF-1.4\n%%EOF\n").unwrap();
    path
}

/// Write `dir/AppIcon.appiconset` with one placeholder image per
/// `(size, scale)` pair and a matching manifest.
///
/// Images hold the same text the mock backend writes for a rasterize call.
pub fn write_iconset(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let set = dir.join("AppIcon.appiconset");
    std::fs::create_dir_all(&set).unwrap();

    let images = entries
        .iter()
        .map(|(size, scale)| {
            let mut descriptor = ImageDescriptor::new(size, "iphone", scale);
            let dims = descriptor.pixel_size().unwrap();
            let filename = icon_filename(dims);
            std::fs::write(set.join(&filename), format!("raster {dims}")).unwrap();
            descriptor.filename = Some(filename);
            descriptor
        })
        .collect();
    Manifest::new(images).write(&set).unwrap();
    set
}

/// A generation request that runs everything on the calling thread.
pub fn sequential_request(source: IconSource, output_dir: &Path, targets: &[&str]) -> GenerateRequest {
    GenerateRequest {
        source,
        output_dir: output_dir.to_path_buf(),
        targets: targets.iter().map(|t| Target::parse(t)).collect(),
        parallelism: Parallelism::Sequential,
    }
}

// =========================================================================
// Lookup helpers
// =========================================================================

/// Sorted names of the regular files directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().unwrap().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
