use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flipbook_core::headless::HeadlessFactory;
use flipbook_core::{
    detect_mode, fit_mobile_page, AssetError, AssetLoader, AssetPaths, BindingEdge, ContentRef,
    FitMargins, FittedSize, ImageSize, LoadCompleter, RenderConfig, ViewerConfig, ViewerController,
    ViewerDisplay, ViewerMode, ViewerSession, ViewportMetrics,
};
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "flipbook-cli")]
#[command(about = "Flipbook viewer CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the layout chosen for a viewport.
    Layout {
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        /// Page aspect ratio (width / height); defaults to the configured ratio.
        #[arg(long)]
        ratio: Option<f64>,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Read the first page asset and print its aspect ratio.
    Probe {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Directory relative asset paths are resolved against.
        #[arg(long, value_name = "DIR", default_value = ".")]
        root: PathBuf,
    },
    /// Run a headless viewer through a sequence of steps and print its final state.
    Simulate {
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "DIR", default_value = ".")]
        root: PathBuf,
        /// next, prev, zoom-in, zoom-out, goto:N, resize:WxH, wait:MS
        #[arg(value_name = "STEP")]
        steps: Vec<Step>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// One scripted viewer command for `simulate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Next,
    Previous,
    ZoomIn,
    ZoomOut,
    Goto(u32),
    Resize { width: f64, height: f64 },
    Wait(Duration),
}

impl FromStr for Step {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parse_error = || format!("invalid step `{value}`");

        match value {
            "next" => return Ok(Self::Next),
            "prev" | "previous" => return Ok(Self::Previous),
            "zoom-in" => return Ok(Self::ZoomIn),
            "zoom-out" => return Ok(Self::ZoomOut),
            _ => {}
        }

        let (name, argument) = value.split_once(':').ok_or_else(parse_error)?;
        match name {
            "goto" => argument.parse().map(Self::Goto).map_err(|_| parse_error()),
            "wait" => {
                argument.parse().map(|ms| Self::Wait(Duration::from_millis(ms))).map_err(|_| parse_error())
            }
            "resize" => {
                let (width, height) = argument.split_once('x').ok_or_else(parse_error)?;
                let width = width.parse().map_err(|_| parse_error())?;
                let height = height.parse().map_err(|_| parse_error())?;
                Ok(Self::Resize { width, height })
            }
            _ => Err(parse_error()),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => f.write_str("next"),
            Self::Previous => f.write_str("prev"),
            Self::ZoomIn => f.write_str("zoom-in"),
            Self::ZoomOut => f.write_str("zoom-out"),
            Self::Goto(page) => write!(f, "goto:{page}"),
            Self::Resize { width, height } => write!(f, "resize:{width}x{height}"),
            Self::Wait(duration) => write!(f, "wait:{}", duration.as_millis()),
        }
    }
}

#[derive(Debug, Serialize)]
struct LayoutOutput {
    mode: ViewerMode,
    viewport: ViewportMetrics,
    aspect_ratio: f64,
    fitted: Option<FittedSize>,
    render: RenderConfig,
}

#[derive(Debug, Serialize)]
struct ProbeOutput {
    asset: ContentRef,
    image: Option<ImageSize>,
    aspect_ratio: f64,
    fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SimulateOutput<'a> {
    session: &'a ViewerSession,
    display: &'a ViewerDisplay,
    render: Option<&'a RenderConfig>,
    instances_constructed: usize,
    instances_live: usize,
}

/// Reads page assets from disk, completing every load before returning.
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, asset: &ContentRef) -> PathBuf {
        self.root.join(asset.as_str())
    }

    /// Natural size of `asset` without decoding the pixel data.
    pub fn dimensions(&self, asset: &ContentRef) -> Result<ImageSize, AssetError> {
        let path = self.resolve(asset);

        match image::image_dimensions(&path) {
            Ok((0, _)) | Ok((_, 0)) => Err(AssetError::EmptyImage(path.display().to_string())),
            Ok((width, height)) => Ok(ImageSize::new(width, height)),
            Err(image::ImageError::IoError(error)) if error.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(path.display().to_string()))
            }
            Err(error) => Err(AssetError::Decode(format!("{}: {error}", path.display()))),
        }
    }
}

impl AssetLoader for FsAssetLoader {
    fn load(&mut self, asset: &ContentRef, done: LoadCompleter) {
        let outcome = self.dimensions(asset);
        if let Err(error) = &outcome {
            log::debug!("load of {asset} failed: {error}");
        }
        done.complete(outcome);
    }
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Layout { width, height, ratio, config, format } => {
            run_layout(width, height, ratio, config.as_deref(), format)
        }
        Commands::Probe { config, root } => run_probe(config.as_deref(), &root),
        Commands::Simulate { width, height, config, root, steps } => {
            run_simulate(width, height, config.as_deref(), &root, &steps)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Configuration from `path` (or defaults), with `FLIPBOOK_*` overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    let mut config = match path {
        Some(path) => {
            ensure_file_exists(path)?;
            ViewerConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
        None => ViewerConfig::default(),
    };

    config.apply_env().context("invalid FLIPBOOK_* override")?;

    Ok(config)
}

fn run_layout(
    width: f64,
    height: f64,
    ratio: Option<f64>,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(config_path)?;
    let viewport = checked_viewport(width, height)?;

    let aspect_ratio = ratio.unwrap_or(config.document.default_aspect_ratio);
    if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
        anyhow::bail!("--ratio must be a positive number");
    }

    let mode = detect_mode(viewport.width, config.layout.mobile_breakpoint_px);
    let (fitted, render) = match mode {
        ViewerMode::Desktop => (None, RenderConfig::desktop(&config.desktop, 0)),
        ViewerMode::Mobile => {
            let margins = FitMargins {
                horizontal: config.layout.mobile_margin_x,
                vertical: config.layout.mobile_margin_y,
            };
            let fitted = fit_mobile_page(viewport, margins, aspect_ratio);
            (Some(fitted), RenderConfig::mobile(&config.mobile, fitted, 0))
        }
    };

    match format {
        OutputFormat::Json => {
            let payload = LayoutOutput { mode, viewport, aspect_ratio, fitted, render };
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Text => match fitted {
            Some(fitted) => println!(
                "{mode} {:.1}x{:.1} binds={}",
                fitted.width,
                fitted.height,
                match fitted.binding {
                    BindingEdge::Width => "width",
                    BindingEdge::Height => "height",
                }
            ),
            None => println!("{mode} {:.1}x{:.1}", render.width, render.height),
        },
    }

    Ok(())
}

fn run_probe(config_path: Option<&Path>, root: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let loader = FsAssetLoader::new(root);
    let asset = AssetPaths::from_config(&config.document).page(1);

    let payload = match loader.dimensions(&asset) {
        Ok(image) => match image.aspect_ratio() {
            Some(aspect_ratio) => {
                ProbeOutput { asset, image: Some(image), aspect_ratio, fallback: false, error: None }
            }
            None => ProbeOutput {
                asset,
                image: Some(image),
                aspect_ratio: config.document.default_aspect_ratio,
                fallback: true,
                error: Some("image has no area".to_owned()),
            },
        },
        Err(error) => {
            log::warn!("probe failed, using default ratio: {error}");
            ProbeOutput {
                asset,
                image: None,
                aspect_ratio: config.document.default_aspect_ratio,
                fallback: true,
                error: Some(error.to_string()),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);

    Ok(())
}

fn run_simulate(
    width: f64,
    height: f64,
    config_path: Option<&Path>,
    root: &Path,
    steps: &[Step],
) -> Result<()> {
    let config = load_config(config_path)?;
    let viewport = checked_viewport(width, height)?;
    let quiet_period = config.layout.resize_debounce();

    let factory = HeadlessFactory::new();
    let ledger = factory.ledger();
    let mut viewer = ViewerController::new(config, factory, FsAssetLoader::new(root), viewport)?;

    // Virtual clock; `wait` steps advance it instead of sleeping.
    let mut now = Instant::now();

    viewer.start().context("viewer failed to start")?;

    for step in steps {
        log::debug!("step {step}");
        let result = match *step {
            Step::Next => viewer.navigate_next(),
            Step::Previous => viewer.navigate_previous(),
            Step::ZoomIn => {
                viewer.zoom_in();
                Ok(())
            }
            Step::ZoomOut => {
                viewer.zoom_out();
                Ok(())
            }
            Step::Goto(page) => viewer.jump_to_page(page),
            Step::Resize { width, height } => {
                viewer.on_resize(checked_viewport(width, height)?, now);
                Ok(())
            }
            Step::Wait(duration) => {
                now += duration;
                viewer.tick(now)
            }
        };
        result.with_context(|| format!("step `{step}` failed"))?;
    }

    // Let a trailing resize settle.
    if viewer.next_deadline().is_some() {
        now += quiet_period;
        viewer.tick(now).context("final resize evaluation failed")?;
    }

    let payload = SimulateOutput {
        session: viewer.session(),
        display: viewer.display(),
        render: viewer.render_config(),
        instances_constructed: ledger.constructed(),
        instances_live: ledger.live(),
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);

    Ok(())
}

fn checked_viewport(width: f64, height: f64) -> Result<ViewportMetrics> {
    if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
        anyhow::bail!("viewport must be positive, got {width}x{height}");
    }

    Ok(ViewportMetrics::new(width, height))
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
