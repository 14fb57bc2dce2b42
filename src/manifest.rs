//! `Contents.json` manifest model.
//!
//! A manifest lists the images of an icon set. The same shape is used for the
//! embedded catalog tables (where `filename` is absent) and for the manifests
//! written next to generated or badged images.
//!
//! ```json
//! {
//!   "images": [
//!     { "size": "20x20", "idiom": "iphone", "filename": "Icon-40x40.png", "scale": "2x" }
//!   ],
//!   "info": { "version": 1, "author": "xcode" }
//! }
//! ```
//!
//! Fields this crate does not interpret (`role`, `subtype`, `platform`, ...)
//! are kept in `extra` and written back unchanged. They serialize after the
//! known fields in sorted key order, so identical input always produces
//! identical bytes.

use crate::imaging::{Dimensions, parse_scale, parse_size, pixel_dimensions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of a manifest inside an icon set directory.
pub const MANIFEST_FILENAME: &str = "Contents.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found: {0}")]
    NotFound(PathBuf),
    #[error("Manifest {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq)]
pub enum DescriptorError {
    #[error("invalid size `{0}`; expected WIDTHxHEIGHT")]
    InvalidSize(String),
    #[error("invalid scale `{0}`; expected a multiplier like 2x")]
    InvalidScale(String),
    #[error("size {size} at scale {scale} does not yield a positive pixel size")]
    ZeroSize { size: String, scale: String },
}

/// One image entry of a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Nominal size in points, `"WxH"`.
    pub size: String,
    pub idiom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Multiplier from points to pixels, `"Nx"`.
    pub scale: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageDescriptor {
    pub fn new(size: &str, idiom: &str, scale: &str) -> Self {
        Self {
            size: size.to_string(),
            idiom: idiom.to_string(),
            filename: None,
            scale: scale.to_string(),
            extra: Map::new(),
        }
    }

    pub fn nominal_size(&self) -> Result<(f64, f64), DescriptorError> {
        parse_size(&self.size).ok_or_else(|| DescriptorError::InvalidSize(self.size.clone()))
    }

    pub fn scale_factor(&self) -> Result<f64, DescriptorError> {
        parse_scale(&self.scale).ok_or_else(|| DescriptorError::InvalidScale(self.scale.clone()))
    }

    /// Pixel size: nominal size × scale, rounded.
    pub fn pixel_size(&self) -> Result<Dimensions, DescriptorError> {
        pixel_dimensions(self.nominal_size()?, self.scale_factor()?).ok_or_else(|| {
            DescriptorError::ZeroSize {
                size: self.size.clone(),
                scale: self.scale.clone(),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestInfo {
    pub version: u32,
    pub author: String,
}

impl Default for ManifestInfo {
    fn default() -> Self {
        Self {
            version: 1,
            author: "xcode".to_string(),
        }
    }
}

/// An icon set manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub images: Vec<ImageDescriptor>,
    #[serde(default)]
    pub info: ManifestInfo,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    pub fn new(images: Vec<ImageDescriptor>) -> Self {
        Self {
            images,
            ..Self::default()
        }
    }

    pub fn from_json(path: &Path, content: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(content).map_err(|source| ManifestError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a manifest file.
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        if !path.is_file() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json(path, &content)
    }

    /// Read `<dir>/Contents.json`.
    pub fn read_dir(dir: &Path) -> Result<Self, ManifestError> {
        Self::read(&dir.join(MANIFEST_FILENAME))
    }

    pub fn to_pretty_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `<dir>/Contents.json`, replacing any existing file.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ManifestError> {
        let path = dir.join(MANIFEST_FILENAME);
        fs::write(&path, self.to_pretty_json()?)?;
        Ok(path)
    }
}
