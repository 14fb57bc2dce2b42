use clap::{Parser, Subcommand};
use icongen::catalog::{Catalog, CatalogError, Target};
use icongen::config::{self, IconConfig, MaskConfig, MaskShape, Parallelism, StubConfig};
use icongen::generate::{self, GenerateRequest, IconSource};
use icongen::mask::{self, MaskRequest};
use icongen::output;
use icongen::progress::ProgressEvent;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, Sender};

fn version_string() -> &'static str {
    if env!("ICONGEN_TAGGED") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("ICONGEN_REVISION") {
        "" => "dev@unknown",
        // Leaked once at startup.
        revision => Box::leak(format!("dev@{revision}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "icongen")]
#[command(about = "Generate app icon sets from a vector master")]
#[command(long_about = "\
Generate app icon sets from a vector master

Every image Xcode expects for the chosen platforms is rendered from one
PDF master of at least 1024x1024 pixels, and declared in Contents.json.

Targets: iphone, ipad, watch, mac, carplay, imessage
  imessage produces a sticker icon set and cannot be combined with others.

Output layout:

  <output>/
  ├── AppIcon.appiconset/          # generate / stub
  │   ├── Contents.json
  │   ├── Icon-40x40.png
  │   └── ...
  └── AppIcon-Beta.appiconset/     # mask, with the default suffix

Requires ImageMagick 7 (`magick`) on PATH.
Run 'icongen gen-config' to generate a documented icongen.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Show the failing stage, every cause, and debug logs
    #[arg(long, global = true)]
    trace: bool,

    /// Config file (default: ./icongen.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Target selection shared by the generating commands.
#[derive(clap::Args, Clone)]
struct TargetArgs {
    /// Comma-separated targets
    #[arg(long = "type", short = 't', value_delimiter = ',', default_value = "iphone")]
    targets: Vec<String>,

    /// Directory of Contents-<target>.json tables replacing the built-in ones
    #[arg(long)]
    catalog: Option<PathBuf>,
}

/// Worker count shared by every command that renders images.
#[derive(clap::Args, Clone)]
struct ParallelArgs {
    /// Parallel workers: auto, -1 (auto), 0 (sequential) or a count
    #[arg(long, short = 'p', allow_hyphen_values = true)]
    parallel: Option<Parallelism>,
}

impl ParallelArgs {
    fn resolve(&self, config: &IconConfig) -> Parallelism {
        self.parallel
            .unwrap_or_else(|| config.processing.parallelism())
    }
}

/// Label options for `stub`; each overrides `[stub]` in the config.
#[derive(clap::Args, Clone, Default)]
struct LabelArgs {
    #[arg(long)]
    background_color: Option<String>,
    #[arg(long)]
    symbol_color: Option<String>,
    #[arg(long)]
    stroke_color: Option<String>,
    /// Stroke width as a fraction of the shorter edge
    #[arg(long)]
    stroke_width: Option<f64>,
    #[arg(long)]
    font: Option<String>,
    /// Point size as a fraction of the image height
    #[arg(long)]
    size_offset: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    x_offset: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    y_offset: Option<f64>,
}

impl LabelArgs {
    fn apply(&self, mut style: StubConfig) -> StubConfig {
        override_with(&mut style.background_color, &self.background_color);
        override_with(&mut style.symbol_color, &self.symbol_color);
        override_with(&mut style.stroke_color, &self.stroke_color);
        override_with(&mut style.stroke_width, &self.stroke_width);
        override_with(&mut style.font, &self.font);
        override_with(&mut style.size_offset, &self.size_offset);
        override_with(&mut style.x_offset, &self.x_offset);
        override_with(&mut style.y_offset, &self.y_offset);
        style
    }
}

/// Badge options for `mask`; each overrides `[mask]` in the config.
#[derive(clap::Args, Clone, Default)]
struct BadgeArgs {
    /// Appended to the set directory and every image name
    #[arg(long)]
    suffix: Option<String>,
    #[arg(long)]
    background_color: Option<String>,
    #[arg(long)]
    stroke_color: Option<String>,
    /// Stroke width as a fraction of the shorter edge; 0 disables it
    #[arg(long)]
    stroke_width: Option<f64>,
    /// Text drawn on the badge
    #[arg(long)]
    symbol: Option<String>,
    #[arg(long)]
    symbol_color: Option<String>,
    #[arg(long)]
    font: Option<String>,
    /// Image drawn on the badge instead of the symbol text
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long)]
    x_size_ratio: Option<f64>,
    #[arg(long)]
    y_size_ratio: Option<f64>,
    #[arg(long)]
    size_offset: Option<f64>,
    #[arg(long)]
    x_offset: Option<f64>,
    #[arg(long)]
    y_offset: Option<f64>,
    /// Badge shape: triangle or square
    #[arg(long = "mask-shape")]
    shape: Option<MaskShape>,
}

impl BadgeArgs {
    fn apply(&self, mut badge: MaskConfig) -> MaskConfig {
        override_with(&mut badge.suffix, &self.suffix);
        override_with(&mut badge.background_color, &self.background_color);
        override_with(&mut badge.stroke_color, &self.stroke_color);
        override_with(&mut badge.stroke_width, &self.stroke_width);
        override_with(&mut badge.symbol, &self.symbol);
        override_with(&mut badge.symbol_color, &self.symbol_color);
        override_with(&mut badge.font, &self.font);
        if self.file.is_some() {
            badge.file = self.file.clone();
        }
        override_with(&mut badge.x_size_ratio, &self.x_size_ratio);
        override_with(&mut badge.y_size_ratio, &self.y_size_ratio);
        override_with(&mut badge.size_offset, &self.size_offset);
        override_with(&mut badge.x_offset, &self.x_offset);
        override_with(&mut badge.y_offset, &self.y_offset);
        override_with(&mut badge.shape, &self.shape);
        badge
    }
}

fn override_with<T: Clone>(field: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

#[derive(Subcommand)]
enum Command {
    /// Render an icon set from a PDF master
    Generate {
        /// Vector master, at least 1024x1024
        source: PathBuf,
        /// Directory the icon set is created in
        #[arg(default_value = ".")]
        output: PathBuf,
        #[command(flatten)]
        targets: TargetArgs,
        #[command(flatten)]
        parallel: ParallelArgs,
    },
    /// Render a placeholder icon set showing a text label
    Stub {
        /// Text drawn on every icon
        text: String,
        /// Directory the icon set is created in
        #[arg(default_value = ".")]
        output: PathBuf,
        #[command(flatten)]
        targets: TargetArgs,
        #[command(flatten)]
        label: LabelArgs,
        #[command(flatten)]
        parallel: ParallelArgs,
    },
    /// Badge every image of an existing icon set into a new set
    Mask {
        /// Icon set directory containing Contents.json
        iconset: PathBuf,
        /// Directory the badged set is created in (default: next to the source)
        output: Option<PathBuf>,
        #[command(flatten)]
        badge: BadgeArgs,
        #[command(flatten)]
        parallel: ParallelArgs,
    },
    /// Print a stock icongen.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.trace);

    match run(cli.command, cli.config.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(err.as_ref(), cli.trace);
            ExitCode::FAILURE
        }
    }
}

/// `warn` by default, `debug` with `--trace`; `RUST_LOG` always wins.
fn init_logging(trace: bool) {
    let default = if trace { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn run(command: Command, config_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Generate {
            source,
            output,
            targets,
            parallel,
        } => {
            let config = config::load_config(config_path)?;
            println!("==> Generating icons from {}", source.display());
            let request = GenerateRequest {
                source: IconSource::Master(source),
                output_dir: output,
                targets: parse_targets(&targets),
                parallelism: parallel.resolve(&config),
            };
            let catalog = load_catalog(targets.catalog.as_deref())?;
            let outcome = with_progress(|tx| {
                generate::generate(&config.tool, &catalog, &request, Some(tx))
            })?;
            output::print_generate_output(&outcome);
        }
        Command::Stub {
            text,
            output,
            targets,
            label,
            parallel,
        } => {
            let config = config::load_config(config_path)?;
            let style = label.apply(config.stub.clone());
            style.validate()?;
            println!("==> Generating stub icons labelled \"{text}\"");
            let request = GenerateRequest {
                source: IconSource::Label { text, style },
                output_dir: output,
                targets: parse_targets(&targets),
                parallelism: parallel.resolve(&config),
            };
            let catalog = load_catalog(targets.catalog.as_deref())?;
            let outcome = with_progress(|tx| {
                generate::generate(&config.tool, &catalog, &request, Some(tx))
            })?;
            output::print_generate_output(&outcome);
        }
        Command::Mask {
            iconset,
            output,
            badge,
            parallel,
        } => {
            let config = config::load_config(config_path)?;
            println!("==> Badging {}", iconset.display());
            let request = MaskRequest {
                iconset,
                output_dir: output,
                config: badge.apply(config.mask.clone()),
                parallelism: parallel.resolve(&config),
            };
            let outcome = with_progress(|tx| mask::mask(&config.tool, &request, Some(tx)))?;
            output::print_mask_output(&outcome);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

fn parse_targets(args: &TargetArgs) -> Vec<Target> {
    args.targets.iter().map(|name| Target::parse(name)).collect()
}

fn load_catalog(dir: Option<&Path>) -> Result<Catalog, CatalogError> {
    match dir {
        Some(dir) => Catalog::from_dir(dir),
        None => Catalog::embedded(),
    }
}

/// Run `work` with a progress channel drained by a printer thread.
fn with_progress<T>(work: impl FnOnce(Sender<ProgressEvent>) -> T) -> T {
    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        let mut line_open = false;
        for event in rx {
            output::print_progress_event(&event);
            line_open =
                !matches!(event, ProgressEvent::Advanced { completed, total } if completed >= total);
        }
        // Finish a bar left mid-line by a failed run.
        if line_open {
            eprintln!();
        }
    });
    let result = work(tx);
    let _ = printer.join();
    result
}
