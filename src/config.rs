//! Tool configuration module.
//!
//! Handles loading, validating, and merging `icongen.toml`. Stock defaults
//! are overridden by a user config file, which is in turn overridden by
//! command-line flags.
//!
//! ## Config File Location
//!
//! `--config <path>` if given, otherwise `./icongen.toml` when it exists.
//! Run `icongen gen-config` to print a documented stock file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [tool]
//! program = "magick"        # ImageMagick 7 binary
//! density = 400             # DPI used to rasterize vector masters
//! symbol_density = 1536     # DPI used to rasterize badge symbol files
//!
//! [processing]
//! max_processes = 4         # 0 = sequential; omit for auto = CPU cores
//!
//! [mask]
//! suffix = "Beta"
//! background_color = "#FFFFFF"
//! stroke_color = "#000000"
//! stroke_width = 0.01       # fraction of the shorter edge; 0 = no stroke
//! symbol = "b"
//! symbol_color = "#7F0000"
//! font = "Helvetica"
//! x_size_ratio = 0.54
//! y_size_ratio = 0.54
//! size_offset = 0.12
//! x_offset = 0.11
//! y_offset = 0.11
//! shape = "triangle"        # or "square"
//!
//! [stub]
//! background_color = "#FFFFFF"
//! symbol_color = "#7F0000"
//! stroke_color = "#000000"
//! stroke_width = 0.1
//! font = "Helvetica"
//! size_offset = 0.5
//! x_offset = 0.0
//! y_offset = 0.0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "icongen.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Unknown mask shape `{0}`; expected `triangle` or `square`")]
    UnknownMaskShape(String),
}

/// Tool configuration loaded from `icongen.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconConfig {
    /// External image tool settings.
    pub tool: ToolConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Badge defaults for `icongen mask`.
    pub mask: MaskConfig,
    /// Label defaults for `icongen stub`.
    pub stub: StubConfig,
}

impl IconConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tool.validate()?;
        self.mask.validate()?;
        self.stub.validate()
    }
}

/// External image tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub program: String,
    pub density: u32,
    pub symbol_density: u32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "magick".to_string(),
            density: 400,
            symbol_density: 1536,
        }
    }
}

impl ToolConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tool.program must not be empty".into(),
            ));
        }
        if self.density == 0 || self.symbol_density == 0 {
            return Err(ConfigError::Validation(
                "tool.density and tool.symbol_density must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Number of parallel workers. `0` runs everything on the calling
    /// thread; absent means one worker per CPU core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

impl ProcessingConfig {
    pub fn parallelism(&self) -> Parallelism {
        match self.max_processes {
            None => Parallelism::Auto,
            Some(n) => Parallelism::from_count(n),
        }
    }
}

/// How many workers a fan-out stage may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parallelism {
    /// Run every unit on the orchestrating thread, in order.
    Sequential,
    /// One worker per available core.
    #[default]
    Auto,
    /// Exactly this many workers.
    Workers(NonZeroUsize),
}

impl Parallelism {
    pub fn from_count(count: usize) -> Self {
        NonZeroUsize::new(count).map_or(Self::Sequential, Self::Workers)
    }

    /// Worker count for a pool, or `None` for inline execution.
    pub fn worker_count(self) -> Option<usize> {
        match self {
            Self::Sequential => None,
            Self::Auto => Some(
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1),
            ),
            Self::Workers(n) => Some(n.get()),
        }
    }
}

impl FromStr for Parallelism {
    type Err = String;

    /// Accepts `auto`, `-1` (auto), `0` (sequential) or a worker count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" | "-1" => Ok(Self::Auto),
            other => other
                .parse::<usize>()
                .map(Self::from_count)
                .map_err(|_| format!("expected `auto`, -1, 0 or a worker count, got `{other}`")),
        }
    }
}

impl fmt::Display for Parallelism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Auto => write!(f, "auto"),
            Self::Workers(n) => write!(f, "{n} workers"),
        }
    }
}

/// Badge shape drawn in the bottom-left corner of each icon.
///
/// Parsing never fails; an unrecognized name is kept as [`MaskShape::Other`]
/// and rejected by [`MaskConfig::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MaskShape {
    #[default]
    Triangle,
    Square,
    Other(String),
}

impl MaskShape {
    pub fn name(&self) -> &str {
        match self {
            Self::Triangle => "triangle",
            Self::Square => "square",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for MaskShape {
    fn from(name: String) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "triangle" => Self::Triangle,
            "square" => Self::Square,
            _ => Self::Other(name),
        }
    }
}

impl From<MaskShape> for String {
    fn from(shape: MaskShape) -> Self {
        shape.name().to_string()
    }
}

impl FromStr for MaskShape {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

/// Badge settings for the masking pipeline.
///
/// Every size and offset is a fraction of the pixel size of the image being
/// badged, so one config applies to every image of a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaskConfig {
    /// Appended to the set directory and to every image file name.
    pub suffix: String,
    pub background_color: String,
    pub stroke_color: String,
    /// Stroke width as a fraction of the shorter edge. `0` draws no stroke.
    pub stroke_width: f64,
    /// Text drawn on the badge when no `file` is set.
    pub symbol: String,
    pub symbol_color: String,
    pub font: String,
    /// Image drawn on the badge instead of `symbol`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub x_size_ratio: f64,
    pub y_size_ratio: f64,
    /// Symbol size relative to the image.
    pub size_offset: f64,
    /// Symbol distance from the left edge.
    pub x_offset: f64,
    /// Symbol distance from the bottom edge.
    pub y_offset: f64,
    pub shape: MaskShape,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            suffix: "Beta".to_string(),
            background_color: "#FFFFFF".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 0.01,
            symbol: "b".to_string(),
            symbol_color: "#7F0000".to_string(),
            font: "Helvetica".to_string(),
            file: None,
            x_size_ratio: 0.54,
            y_size_ratio: 0.54,
            size_offset: 0.12,
            x_offset: 0.11,
            y_offset: 0.11,
            shape: MaskShape::Triangle,
        }
    }
}

impl MaskConfig {
    /// Validate once at the pipeline boundary.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let MaskShape::Other(name) = &self.shape {
            return Err(ConfigError::UnknownMaskShape(name.clone()));
        }
        if self.suffix.is_empty() || self.suffix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "mask.suffix must be a non-empty file name fragment, got `{}`",
                self.suffix
            )));
        }
        check_ratios(
            "mask",
            &[
                ("stroke_width", self.stroke_width),
                ("x_size_ratio", self.x_size_ratio),
                ("y_size_ratio", self.y_size_ratio),
                ("size_offset", self.size_offset),
                ("x_offset", self.x_offset),
                ("y_offset", self.y_offset),
            ],
        )
    }
}

/// Label settings for stub icon sets rendered from text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StubConfig {
    pub background_color: String,
    pub symbol_color: String,
    pub stroke_color: String,
    /// Stroke width as a fraction of the shorter edge. `0` draws no stroke.
    pub stroke_width: f64,
    pub font: String,
    /// Point size as a fraction of the image height.
    pub size_offset: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            background_color: "#FFFFFF".to_string(),
            symbol_color: "#7F0000".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 0.1,
            font: "Helvetica".to_string(),
            size_offset: 0.5,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }
}

impl StubConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(ConfigError::Validation(
                "stub.stroke_width must be a non-negative number".into(),
            ));
        }
        if !self.size_offset.is_finite() || self.size_offset <= 0.0 {
            return Err(ConfigError::Validation(
                "stub.size_offset must be positive".into(),
            ));
        }
        if !self.x_offset.is_finite() || !self.y_offset.is_finite() {
            return Err(ConfigError::Validation(
                "stub offsets must be finite".into(),
            ));
        }
        Ok(())
    }
}

fn check_ratios(section: &str, values: &[(&str, f64)]) -> Result<(), ConfigError> {
    match values
        .iter()
        .find(|(_, value)| !value.is_finite() || *value < 0.0)
    {
        Some((key, value)) => Err(ConfigError::Validation(format!(
            "{section}.{key} must be a non-negative number, got {value}"
        ))),
        None => Ok(()),
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(IconConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                let merged = match table.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                table.insert(key, merged);
            }
            toml::Value::Table(table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value, `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<IconConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: IconConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// An explicit path must exist; without one, `./icongen.toml` is used when
/// present and stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<IconConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(
            load_raw_config(path)?.ok_or_else(|| {
                ConfigError::Validation(format!("config file {} not found", path.display()))
            })?,
        ),
        None => load_raw_config(Path::new(CONFIG_FILENAME))?,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `icongen.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# icongen Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# External image tool
# ---------------------------------------------------------------------------
[tool]
# ImageMagick 7 binary, looked up on PATH unless absolute.
program = "magick"

# DPI used when rasterizing the vector master. Higher is sharper and slower.
density = 400

# DPI used when rasterizing a badge symbol file (`mask.file`).
symbol_density = 1536

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Parallel workers for the fan-out stages. 0 runs everything sequentially.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Badge mask (`icongen mask`)
# ---------------------------------------------------------------------------
# Sizes and offsets are fractions of each image's own pixel size.
[mask]
# Appended to the icon set directory and to every image name.
suffix = "Beta"

background_color = "#FFFFFF"
stroke_color = "#000000"

# Stroke width as a fraction of the shorter edge. 0 disables the stroke.
stroke_width = 0.01

# Text drawn on the badge, unless `file` points to an image.
symbol = "b"
symbol_color = "#7F0000"
font = "Helvetica"
# file = "badge.pdf"

# Badge extent along each axis.
x_size_ratio = 0.54
y_size_ratio = 0.54

# Symbol size, and its distance from the left and bottom edges.
size_offset = 0.12
x_offset = 0.11
y_offset = 0.11

# "triangle" or "square".
shape = "triangle"

# ---------------------------------------------------------------------------
# Text label icons (`icongen stub`)
# ---------------------------------------------------------------------------
[stub]
background_color = "#FFFFFF"
symbol_color = "#7F0000"
stroke_color = "#000000"

# Stroke width around the glyph as a fraction of the shorter edge.
stroke_width = 0.1
font = "Helvetica"

# Point size as a fraction of the image height. Values over 0.5 are not
# recommended.
size_offset = 0.5

# Offset of the glyph from the center, as fractions of width and height.
x_offset = 0.0
y_offset = 0.0
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = IconConfig::default();
        assert_eq!(config.tool.program, "magick");
        assert_eq!(config.tool.density, 400);
        assert_eq!(config.processing.max_processes, None);
        assert_eq!(config.mask.suffix, "Beta");
        assert_eq!(config.mask.shape, MaskShape::Triangle);
        assert_eq!(config.stub.size_offset, 0.5);
    }

    #[test]
    fn default_config_passes_validation() {
        assert!(IconConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let config: IconConfig = toml::from_str(
            r##"
[mask]
shape = "square"
stroke_width = 0.0
"##,
        )
        .unwrap();
        assert_eq!(config.mask.shape, MaskShape::Square);
        assert_eq!(config.mask.stroke_width, 0.0);
        assert_eq!(config.mask.suffix, "Beta");
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<IconConfig, _> = toml::from_str("[mask]\nsufix = \"Alpha\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<IconConfig, _> = toml::from_str("[masks]\nsuffix = \"Alpha\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Mask shape
    // =========================================================================

    #[test]
    fn mask_shape_parses_known_names() {
        assert_eq!("triangle".parse::<MaskShape>().unwrap(), MaskShape::Triangle);
        assert_eq!("Square".parse::<MaskShape>().unwrap(), MaskShape::Square);
    }

    #[test]
    fn unknown_mask_shape_is_constructible_but_invalid() {
        let shape: MaskShape = "circle".parse().unwrap();
        assert_eq!(shape, MaskShape::Other("circle".to_string()));

        let config = MaskConfig {
            shape,
            ..MaskConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownMaskShape(name)) if name == "circle"
        ));
    }

    #[test]
    fn mask_shape_roundtrips_through_toml() {
        let config = MaskConfig {
            shape: MaskShape::Square,
            ..MaskConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("shape = \"square\""));
        let parsed: MaskConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn negative_ratio_rejected() {
        let config = MaskConfig {
            x_size_ratio: -0.1,
            ..MaskConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn suffix_with_separator_rejected() {
        let config = MaskConfig {
            suffix: "a/b".to_string(),
            ..MaskConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stub_size_offset_must_be_positive() {
        let config = StubConfig {
            size_offset: 0.0,
            ..StubConfig::default()
        };
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Parallelism
    // =========================================================================

    #[test]
    fn parallelism_from_config() {
        assert_eq!(ProcessingConfig::default().parallelism(), Parallelism::Auto);
        let sequential = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(sequential.parallelism(), Parallelism::Sequential);
        let four = ProcessingConfig {
            max_processes: Some(4),
        };
        assert_eq!(four.parallelism().worker_count(), Some(4));
    }

    #[test]
    fn parallelism_from_str() {
        assert_eq!("auto".parse::<Parallelism>().unwrap(), Parallelism::Auto);
        assert_eq!("-1".parse::<Parallelism>().unwrap(), Parallelism::Auto);
        assert_eq!("0".parse::<Parallelism>().unwrap(), Parallelism::Sequential);
        assert_eq!("3".parse::<Parallelism>().unwrap().worker_count(), Some(3));
        assert!("many".parse::<Parallelism>().is_err());
        assert!("-2".parse::<Parallelism>().is_err());
    }

    #[test]
    fn auto_parallelism_uses_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(Parallelism::Auto.worker_count(), Some(cores));
        assert_eq!(Parallelism::Sequential.worker_count(), None);
    }

    // =========================================================================
    // Loading and merging
    // =========================================================================

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str("[mask]\nsuffix = \"Beta\"\nfont = \"Helvetica\"\n").unwrap();
        let overlay: toml::Value = toml::from_str("[mask]\nsuffix = \"Alpha\"\n").unwrap();
        let merged = merge_toml(base, overlay);
        let mask = merged.get("mask").unwrap();
        assert_eq!(mask.get("suffix").unwrap().as_str(), Some("Alpha"));
        assert_eq!(mask.get("font").unwrap().as_str(), Some("Helvetica"));
    }

    #[test]
    fn load_config_reads_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[processing]\nmax_processes = 0\n[tool]\ndensity = 300\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.processing.parallelism(), Parallelism::Sequential);
        assert_eq!(config.tool.density, 300);
        assert_eq!(config.tool.program, "magick");
    }

    #[test]
    fn load_config_missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_config_rejects_unknown_shape_in_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("icongen.toml");
        fs::write(&path, "[mask]\nshape = \"hexagon\"\n").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::UnknownMaskShape(_))));
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("icongen.toml");
        fs::write(&path, "[mask\n").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: IconConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, IconConfig::default());
    }
}
