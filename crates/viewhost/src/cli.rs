//! Command-line surface for viewhost.
//!
//! Run flags override values from `settings.toml`; subcommands inspect the
//! platform and the settings directory without opening a window.
//!
//! Types:
//!
//! - `Cli` is the root parser.
//! - `RunArgs` holds the presenter overrides and frame loop controls.
//! - `Command` lists utility subcommands.
//! - `SurfaceSize` is a parsed `WIDTHxHEIGHT` value.
//!
//! Functions:
//!
//! - `parse` wraps `Cli::parse`.
//! - `parse_backend`, `parse_xr_runtime` and `parse_size` back the value parsers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use presenter::{BackendKind, XrRuntimeKind};

#[derive(Parser, Debug)]
#[command(
    name = "viewhost",
    author,
    version,
    about = "Desktop and XR frame presenter host",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default, Clone)]
pub struct RunArgs {
    /// Graphics backend: `auto`, `d3d12`, `metal`, `vulkan`, `opengl`, `opengles`, `webgpu` or `null`.
    #[arg(long, value_name = "BACKEND", value_parser = parse_backend)]
    pub backend: Option<BackendKind>,

    /// MSAA sample count (1, 2, 4, 8 or 16).
    #[arg(long, value_name = "SAMPLES")]
    pub msaa: Option<u32>,

    /// Maximum sampler anisotropy (1-16).
    #[arg(long, value_name = "LEVEL")]
    pub anisotropy: Option<u16>,

    /// Start the window borderless fullscreen.
    #[arg(long)]
    pub fullscreen: bool,

    /// Start an XR session alongside the desktop window.
    #[arg(long)]
    pub xr: bool,

    /// XR runtime provider: `auto`, `openxr` or `simulated`.
    #[arg(long, value_name = "RUNTIME", value_parser = parse_xr_runtime)]
    pub xr_runtime: Option<XrRuntimeKind>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<SurfaceSize>,

    /// Settings directory; can also be supplied via the `VIEWHOST_CONFIG_DIR` env var.
    #[arg(long, value_name = "DIR")]
    pub config: Option<PathBuf>,

    /// Application name used for the window title.
    #[arg(long, value_name = "NAME")]
    pub app_name: Option<String>,

    /// Render offscreen without opening a window.
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many frames.
    #[arg(long, value_name = "COUNT")]
    pub frames: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the backends this build can try, in preference order.
    Backends,
    /// Print the resolved settings directory and file.
    Where,
    /// Write a default `settings.toml` into the settings directory.
    Init(InitArgs),
}

#[derive(Parser, Debug, Default)]
pub struct InitArgs {
    /// Overwrite an existing settings file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_backend(value: &str) -> Result<BackendKind, String> {
    value.parse()
}

pub fn parse_xr_runtime(value: &str) -> Result<XrRuntimeKind, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "auto" => Ok(XrRuntimeKind::Auto),
        "openxr" => Ok(XrRuntimeKind::OpenXr),
        "simulated" | "sim" => Ok(XrRuntimeKind::Simulated),
        other => Err(format!(
            "unknown XR runtime '{other}'; expected auto, openxr or simulated"
        )),
    }
}

pub fn parse_size(value: &str) -> Result<SurfaceSize, String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WIDTHxHEIGHT, e.g. 1280x720".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{width}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}'"))?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok(SurfaceSize { width, height })
}
