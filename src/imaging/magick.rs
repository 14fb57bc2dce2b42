//! ImageMagick backend — every operation is one `magick` subprocess.
//!
//! ## Argument grammar
//!
//! | Operation | Arguments |
//! |---|---|
//! | Probe | `identify <src>` |
//! | Rasterize | `[-density D] -background none <src> -colorspace sRGB -type TrueColorAlpha -resize SxS -gravity center -crop WxH+0+0 +repage <out>` |
//! | Downscale | `[-density D] -background none <src> -colorspace sRGB -type TrueColorAlpha -scale SxS <out>` |
//! | Label | `-size WxH xc:<bg> -strokewidth .. -stroke .. -fill .. -gravity center -font .. -pointsize .. -annotate +X+Y <text> <out>` |
//! | Composite | `<src> -strokewidth .. -stroke .. -fill .. -draw "<outline>" <symbol ops> <out>` |
//!
//! `-density` is only given for vector sources (PDF, SVG, EPS, AI).
//!
//! Arguments are passed as a vector, never through a shell, so paths and
//! labels with spaces or quotes need no escaping. Argument builders are
//! public and pure so their shape can be tested without the tool installed.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{format_offset, format_px};
use super::params::{
    CompositeParams, DownscaleParams, LabelParams, Outline, RasterizeParams, Stroke, Symbol,
};
use crate::config::ToolConfig;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Output};

/// Backend driving an ImageMagick 7 `magick` binary.
#[derive(Debug, Clone)]
pub struct MagickBackend {
    program: String,
    density: u32,
    symbol_density: u32,
}

impl MagickBackend {
    pub fn new(program: impl Into<String>, density: u32, symbol_density: u32) -> Self {
        Self {
            program: program.into(),
            density,
            symbol_density,
        }
    }

    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(&config.program, config.density, config.symbol_density)
    }

    pub fn probe_args(&self, path: &Path) -> Vec<OsString> {
        vec!["identify".into(), path.into()]
    }

    pub fn rasterize_args(&self, params: &RasterizeParams) -> Vec<OsString> {
        let side = params.working_side();
        let mut args = self.source_input(&params.source);
        args.extend(strings([
            "-resize",
            &format!("{side}x{side}"),
            "-gravity",
            "center",
            "-crop",
            &format!("{}x{}+0+0", params.width, params.height),
            "+repage",
        ]));
        args.push(params.output.as_os_str().into());
        args
    }

    pub fn downscale_args(&self, params: &DownscaleParams) -> Vec<OsString> {
        let side = params.side;
        let mut args = self.source_input(&params.source);
        args.extend(strings(["-scale", &format!("{side}x{side}")]));
        args.push(params.output.as_os_str().into());
        args
    }

    pub fn label_args(&self, params: &LabelParams) -> Vec<OsString> {
        let mut args = strings([
            "-size",
            &format!("{}x{}", params.width, params.height),
            &format!("xc:{}", params.background),
        ]);
        args.extend(stroke_args(&params.stroke));
        args.extend(strings([
            "-fill",
            &params.fill,
            "-gravity",
            "center",
            "-font",
            &params.font,
            "-pointsize",
            &format_px(params.pointsize),
            "-annotate",
            &format_offset(params.offset),
            &params.text,
        ]));
        args.push(params.output.as_os_str().into());
        args
    }

    pub fn composite_args(&self, params: &CompositeParams) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![params.source.as_os_str().into()];
        args.extend(stroke_args(&params.stroke));
        args.extend(strings([
            "-fill",
            &params.fill,
            "-draw",
            &draw_primitive(&params.outline),
        ]));
        match &params.symbol {
            Symbol::Text {
                text,
                color,
                font,
                pointsize,
                position,
            } => {
                args.extend(stroke_args(&Stroke::none()));
                args.extend(strings([
                    "-fill",
                    color,
                    "-font",
                    font,
                    "-pointsize",
                    &format_px(*pointsize),
                    "-annotate",
                    &format_offset(*position),
                    text,
                ]));
            }
            Symbol::Image {
                file,
                width,
                height,
                position,
            } => {
                args.extend(strings([
                    "(",
                    "-background",
                    "none",
                    "-density",
                    &self.symbol_density.to_string(),
                ]));
                args.push(file.as_os_str().into());
                args.extend(strings([
                    "-resize",
                    &format!("{}x{}", format_px(*width), format_px(*height)),
                    ")",
                    "-gravity",
                    "southwest",
                    "-geometry",
                    &format_offset(*position),
                    "-composite",
                ]));
            }
        }
        args.push(params.output.as_os_str().into());
        args
    }

    /// Read a source into sRGB with an alpha channel. Vector sources are
    /// rasterized at the configured density; raster sources are read as-is
    /// so their density metadata is not rewritten.
    fn source_input(&self, source: &Path) -> Vec<OsString> {
        let mut args = Vec::new();
        if is_vector(source) {
            args.extend(strings(["-density", &self.density.to_string()]));
        }
        args.extend(strings(["-background", "none"]));
        args.push(source.into());
        args.extend(strings(["-colorspace", "sRGB", "-type", "TrueColorAlpha"]));
        args
    }

    fn run(&self, args: &[OsString]) -> Result<Output, BackendError> {
        log::debug!(
            "{} {}",
            self.program,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => BackendError::ToolMissing(self.program.clone()),
                _ => BackendError::Io(e),
            })?;
        if !output.status.success() {
            return Err(BackendError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl Default for MagickBackend {
    fn default() -> Self {
        Self::from_config(&ToolConfig::default())
    }
}

impl ImageBackend for MagickBackend {
    fn probe(&self, path: &Path) -> Result<String, BackendError> {
        let output = self.run(&self.probe_args(path))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn rasterize(&self, params: &RasterizeParams) -> Result<(), BackendError> {
        self.run(&self.rasterize_args(params)).map(drop)
    }

    fn downscale(&self, params: &DownscaleParams) -> Result<(), BackendError> {
        self.run(&self.downscale_args(params)).map(drop)
    }

    fn render_label(&self, params: &LabelParams) -> Result<(), BackendError> {
        self.run(&self.label_args(params)).map(drop)
    }

    fn composite(&self, params: &CompositeParams) -> Result<(), BackendError> {
        self.run(&self.composite_args(params)).map(drop)
    }
}

fn strings<const N: usize>(items: [&str; N]) -> Vec<OsString> {
    items.into_iter().map(OsString::from).collect()
}

fn stroke_args(stroke: &Stroke) -> Vec<OsString> {
    strings([
        "-strokewidth",
        &format_px(stroke.width),
        "-stroke",
        stroke.color.as_deref().unwrap_or("none"),
    ])
}

fn is_vector(source: &Path) -> bool {
    source
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ["pdf", "svg", "eps", "ai"].iter().any(|v| e.eq_ignore_ascii_case(v)))
}

fn draw_primitive(outline: &Outline) -> String {
    let point = |(x, y): (f64, f64)| format!("{},{}", format_px(x), format_px(y));
    match outline {
        Outline::Polygon(points) => {
            let points: Vec<String> = points.iter().copied().map(point).collect();
            format!("polygon {}", points.join(" "))
        }
        Outline::Rectangle { from, to } => format!("rectangle {} {}", point(*from), point(*to)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn backend() -> MagickBackend {
        MagickBackend::new("magick", 400, 1536)
    }

    fn as_strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn composite(stroke: Stroke, outline: Outline, symbol: Symbol) -> CompositeParams {
        CompositeParams {
            source: "/set/Icon-100x100.png".into(),
            output: "/out/Icon-100x100-Beta.png".into(),
            fill: "#A36AE9".to_string(),
            stroke,
            outline,
            symbol,
        }
    }

    fn text_symbol() -> Symbol {
        Symbol::Text {
            text: "b".to_string(),
            color: "#FFFFFF".to_string(),
            font: "Helvetica".to_string(),
            pointsize: 24.0,
            position: (10.0, 90.0),
        }
    }

    #[test]
    fn rasterize_scales_to_longer_edge_then_crops() {
        let args = as_strings(backend().rasterize_args(&RasterizeParams {
            source: "/master.pdf".into(),
            output: "/set/Icon-1024x768.png".into(),
            width: 1024,
            height: 768,
        }));

        assert_eq!(
            args,
            vec![
                "-density",
                "400",
                "-background",
                "none",
                "/master.pdf",
                "-colorspace",
                "sRGB",
                "-type",
                "TrueColorAlpha",
                "-resize",
                "1024x1024",
                "-gravity",
                "center",
                "-crop",
                "1024x768+0+0",
                "+repage",
                "/set/Icon-1024x768.png",
            ]
        );
    }

    #[test]
    fn raster_source_is_read_without_density() {
        let args = as_strings(backend().rasterize_args(&RasterizeParams {
            source: "/set/.icon-intermediate-x.png".into(),
            output: "/set/Icon-40x40.png".into(),
            width: 40,
            height: 40,
        }));

        assert!(!args.iter().any(|a| a == "-density"));
        assert_eq!(args[..3], ["-background", "none", "/set/.icon-intermediate-x.png"]);
    }

    #[test]
    fn downscale_has_no_crop() {
        let args = as_strings(backend().downscale_args(&DownscaleParams {
            source: "/master.pdf".into(),
            output: "/tmp/intermediate.png".into(),
            side: 180,
        }));

        assert!(args.windows(2).any(|w| w == ["-scale", "180x180"]));
        assert!(!args.iter().any(|a| a == "-crop"));
        assert_eq!(args.last().unwrap(), "/tmp/intermediate.png");
    }

    #[test]
    fn probe_uses_identify() {
        let args = as_strings(backend().probe_args(Path::new("/master.pdf")));
        assert_eq!(args, vec!["identify", "/master.pdf"]);
    }

    #[test]
    fn zero_stroke_composite_passes_stroke_none() {
        let params = composite(
            Stroke::from_ratio(0.0, "#000000", 100.0),
            Outline::Rectangle {
                from: (-100.0, 70.0),
                to: (30.0, 200.0),
            },
            text_symbol(),
        );
        let args = as_strings(backend().composite_args(&params));

        // Outline stroke comes right after the source.
        assert_eq!(&args[1..5], ["-strokewidth", "0", "-stroke", "none"]);
        assert!(
            args.windows(2)
                .any(|w| w == ["-draw", "rectangle -100,70 30,200"])
        );
    }

    #[test]
    fn stroked_triangle_composite() {
        let params = composite(
            Stroke::from_ratio(0.01, "#000000", 100.0),
            Outline::Polygon(vec![(0.0, 54.0), (0.0, 100.0), (46.0, 100.0)]),
            text_symbol(),
        );
        let args = as_strings(backend().composite_args(&params));

        assert_eq!(&args[1..5], ["-strokewidth", "1", "-stroke", "#000000"]);
        assert!(
            args.windows(2)
                .any(|w| w == ["-draw", "polygon 0,54 0,100 46,100"])
        );
        assert!(args.windows(2).any(|w| w == ["-annotate", "+10+90"]));
        assert_eq!(args.last().unwrap(), "/out/Icon-100x100-Beta.png");
    }

    #[test]
    fn image_symbol_is_composited_from_bottom_left() {
        let params = composite(
            Stroke::none(),
            Outline::Polygon(vec![(0.0, 54.0), (0.0, 100.0), (46.0, 100.0)]),
            Symbol::Image {
                file: PathBuf::from("/badge.pdf"),
                width: 12.0,
                height: 100.0,
                position: (11.0, 11.0),
            },
        );
        let args = as_strings(backend().composite_args(&params));

        let open = args.iter().position(|a| a == "(").unwrap();
        let close = args.iter().position(|a| a == ")").unwrap();
        assert!(args[open..close].contains(&"/badge.pdf".to_string()));
        assert!(args[open..close].contains(&"1536".to_string()));
        assert!(args.windows(2).any(|w| w == ["-resize", "12x100"]));
        assert!(args.windows(2).any(|w| w == ["-gravity", "southwest"]));
        assert!(args.windows(2).any(|w| w == ["-geometry", "+11+11"]));
        assert_eq!(args[args.len() - 2], "-composite");
    }

    #[test]
    fn label_centers_text() {
        let args = as_strings(backend().label_args(&LabelParams {
            output: "/set/Icon-120x120.png".into(),
            width: 120,
            height: 120,
            text: "A".to_string(),
            background: "#FFFFFF".to_string(),
            fill: "#7F0000".to_string(),
            stroke: Stroke::from_ratio(0.1, "#000000", 120.0),
            font: "Helvetica".to_string(),
            pointsize: 60.0,
            offset: (0.0, -0.0),
        }));

        assert_eq!(&args[..3], ["-size", "120x120", "xc:#FFFFFF"]);
        assert!(args.windows(2).any(|w| w == ["-stroke", "#000000"]));
        assert!(args.windows(2).any(|w| w == ["-strokewidth", "12"]));
        assert!(args.windows(2).any(|w| w == ["-annotate", "+0+0"]));
        assert!(args.windows(2).any(|w| w == ["-pointsize", "60"]));
        assert_eq!(&args[args.len() - 2..], ["A", "/set/Icon-120x120.png"]);
    }

    #[test]
    fn missing_program_is_tool_missing() {
        let backend = MagickBackend::new("icongen-no-such-tool-3f9a", 400, 1536);
        let result = backend.probe(Path::new("/master.pdf"));
        assert!(matches!(result, Err(BackendError::ToolMissing(p)) if p == "icongen-no-such-tool-3f9a"));
    }
}
