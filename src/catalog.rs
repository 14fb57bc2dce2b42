//! Platform dimension tables and target compatibility.
//!
//! Each target has a catalog file in manifest shape
//! (`catalog/Contents-<target>.json`) listing the images Xcode expects for
//! that platform. The tables are embedded in the binary; [`Catalog::from_dir`]
//! loads replacements from a directory of files with the same names.
//!
//! Targets are requested as a [`TargetSet`], which rejects unknown names and
//! incompatible combinations before anything touches the file system or the
//! image tool.

use crate::manifest::{ImageDescriptor, Manifest, ManifestError};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("No target given; expected one or more of: {known}", known = known_targets())]
    NoTargets,
    #[error("Unknown target `{0}`; expected one of: {known}", known = known_targets())]
    UnknownTarget(String),
    #[error("Targets `{0}` and `{1}` cannot be combined in one icon set")]
    IncompatibleTargets(String, String),
    #[error("Catalog for `{target}` is unavailable: {reason}")]
    CatalogUnavailable { target: String, reason: String },
}

/// A platform family with its own dimension table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Iphone,
    Ipad,
    Watch,
    Mac,
    Carplay,
    Imessage,
    /// Unrecognized name, rejected when a [`TargetSet`] is built.
    Other(String),
}

impl Target {
    pub const ALL: [Target; 6] = [
        Target::Iphone,
        Target::Ipad,
        Target::Watch,
        Target::Mac,
        Target::Carplay,
        Target::Imessage,
    ];

    /// Parse a target name (case-insensitive). Never fails.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "iphone" => Self::Iphone,
            "ipad" => Self::Ipad,
            "watch" => Self::Watch,
            "mac" => Self::Mac,
            "carplay" => Self::Carplay,
            "imessage" => Self::Imessage,
            _ => Self::Other(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Iphone => "iphone",
            Self::Ipad => "ipad",
            Self::Watch => "watch",
            Self::Mac => "mac",
            Self::Carplay => "carplay",
            Self::Imessage => "imessage",
            Self::Other(name) => name,
        }
    }

    pub fn catalog_filename(&self) -> String {
        format!("Contents-{}.json", self.name())
    }

    fn embedded_json(&self) -> Option<&'static str> {
        match self {
            Self::Iphone => Some(include_str!("../catalog/Contents-iphone.json")),
            Self::Ipad => Some(include_str!("../catalog/Contents-ipad.json")),
            Self::Watch => Some(include_str!("../catalog/Contents-watch.json")),
            Self::Mac => Some(include_str!("../catalog/Contents-mac.json")),
            Self::Carplay => Some(include_str!("../catalog/Contents-carplay.json")),
            Self::Imessage => Some(include_str!("../catalog/Contents-imessage.json")),
            Self::Other(_) => None,
        }
    }

    /// Sticker sets live in their own directory type and mix with nothing.
    pub fn incompatible_with(&self, other: &Target) -> bool {
        (*self == Target::Imessage) != (*other == Target::Imessage)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, validated list of requested targets.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSet {
    targets: Vec<Target>,
}

impl TargetSet {
    pub fn new(targets: Vec<Target>) -> Result<Self, CatalogError> {
        if targets.is_empty() {
            return Err(CatalogError::NoTargets);
        }
        if let Some(Target::Other(name)) = targets.iter().find(|t| matches!(t, Target::Other(_))) {
            return Err(CatalogError::UnknownTarget(name.clone()));
        }
        for (i, a) in targets.iter().enumerate() {
            if let Some(b) = targets[i + 1..].iter().find(|b| a.incompatible_with(b)) {
                return Err(CatalogError::IncompatibleTargets(
                    a.name().to_string(),
                    b.name().to_string(),
                ));
            }
        }
        Ok(Self { targets })
    }

    /// Parse a list of names such as `["iphone", "ipad"]`.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, CatalogError> {
        Self::new(names.iter().map(|n| Target::parse(n.as_ref())).collect())
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Whether the set produces an iMessage sticker icon set.
    pub fn is_sticker_set(&self) -> bool {
        self.targets.contains(&Target::Imessage)
    }

    /// Name of the icon set directory this set is written to.
    pub fn iconset_dirname(&self) -> &'static str {
        if self.is_sticker_set() {
            "iMessage App Icon.stickersiconset"
        } else {
            "AppIcon.appiconset"
        }
    }
}

/// Dimension tables for every known target.
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: BTreeMap<Target, Vec<ImageDescriptor>>,
}

impl Catalog {
    /// Tables compiled into the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        let mut tables = BTreeMap::new();
        for target in Target::ALL {
            let json = target
                .embedded_json()
                .ok_or_else(|| unavailable(&target, "no embedded table"))?;
            tables.insert(
                target.clone(),
                parse_table(&target, Path::new(&target.catalog_filename()), json)?,
            );
        }
        Ok(Self { tables })
    }

    /// Load `Contents-<target>.json` for every known target from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut tables = BTreeMap::new();
        for target in Target::ALL {
            let path: PathBuf = dir.join(target.catalog_filename());
            let json = std::fs::read_to_string(&path)
                .map_err(|e| unavailable(&target, format!("{}: {e}", path.display())))?;
            tables.insert(target.clone(), parse_table(&target, &path, &json)?);
        }
        Ok(Self { tables })
    }

    /// Descriptors for a target, in catalog order.
    pub fn descriptors(&self, target: &Target) -> Result<&[ImageDescriptor], CatalogError> {
        match target {
            Target::Other(name) => Err(CatalogError::UnknownTarget(name.clone())),
            known => self
                .tables
                .get(known)
                .map(Vec::as_slice)
                .ok_or_else(|| unavailable(known, "table not loaded")),
        }
    }

    /// Concatenate the descriptors of every target, in target order then
    /// catalog order. Duplicates across targets are kept.
    pub fn resolve(&self, set: &TargetSet) -> Result<Vec<ImageDescriptor>, CatalogError> {
        let mut resolved = Vec::new();
        for target in set.targets() {
            resolved.extend(self.descriptors(target)?.iter().cloned());
        }
        Ok(resolved)
    }
}

fn known_targets() -> String {
    Target::ALL
        .iter()
        .map(Target::name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn unavailable(target: &Target, reason: impl fmt::Display) -> CatalogError {
    CatalogError::CatalogUnavailable {
        target: target.name().to_string(),
        reason: reason.to_string(),
    }
}

fn parse_table(
    target: &Target,
    path: &Path,
    json: &str,
) -> Result<Vec<ImageDescriptor>, CatalogError> {
    match Manifest::from_json(path, json) {
        Ok(manifest) if manifest.images.is_empty() => Err(unavailable(target, "table is empty")),
        Ok(manifest) => Ok(manifest.images),
        Err(ManifestError::Corrupt { source, .. }) => Err(unavailable(target, source)),
        Err(e) => Err(unavailable(target, e)),
    }
}
