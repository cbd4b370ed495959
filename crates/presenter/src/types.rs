use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use frameconfig::{BackendSetting, FrameConfig};

use crate::xr::XrOptions;

/// Application name used when the caller does not supply one.
pub const DEFAULT_APP_NAME: &str = "Presenter";
/// MSAA sample count substituted for a zero request.
pub const DEFAULT_MSAA: u32 = 1;
/// Sampler anisotropy substituted for a zero request.
pub const DEFAULT_ANISOTROPY: u16 = 16;

/// Graphics backend requested by the application or chosen during initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// Let the presenter walk its preference order.
    #[default]
    Auto,
    D3D12,
    Metal,
    Vulkan,
    OpenGL,
    OpenGLES,
    WebGPU,
    /// In-process device that performs no GPU work.
    Null,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Auto => "auto",
            BackendKind::D3D12 => "d3d12",
            BackendKind::Metal => "metal",
            BackendKind::Vulkan => "vulkan",
            BackendKind::OpenGL => "opengl",
            BackendKind::OpenGLES => "opengles",
            BackendKind::WebGPU => "webgpu",
            BackendKind::Null => "null",
        }
    }

    /// The `wgpu` backend that services this kind, if any.
    pub fn wgpu_backend(self) -> Option<wgpu::Backend> {
        match self {
            BackendKind::D3D12 => Some(wgpu::Backend::Dx12),
            BackendKind::Metal => Some(wgpu::Backend::Metal),
            BackendKind::Vulkan => Some(wgpu::Backend::Vulkan),
            BackendKind::OpenGL | BackendKind::OpenGLES => Some(wgpu::Backend::Gl),
            BackendKind::WebGPU => Some(wgpu::Backend::BrowserWebGpu),
            BackendKind::Auto | BackendKind::Null => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "default" => Ok(BackendKind::Auto),
            "d3d12" | "dx12" => Ok(BackendKind::D3D12),
            "metal" => Ok(BackendKind::Metal),
            "vulkan" | "vk" => Ok(BackendKind::Vulkan),
            "opengl" | "gl" => Ok(BackendKind::OpenGL),
            "opengles" | "gles" => Ok(BackendKind::OpenGLES),
            "webgpu" => Ok(BackendKind::WebGPU),
            "null" | "none" => Ok(BackendKind::Null),
            other => Err(format!(
                "unknown backend '{other}'; expected auto, d3d12, metal, vulkan, opengl, opengles, webgpu or null"
            )),
        }
    }
}

impl From<BackendSetting> for BackendKind {
    fn from(setting: BackendSetting) -> Self {
        match setting {
            BackendSetting::Auto => BackendKind::Auto,
            BackendSetting::D3d12 => BackendKind::D3D12,
            BackendSetting::Metal => BackendKind::Metal,
            BackendSetting::Vulkan => BackendKind::Vulkan,
            BackendSetting::OpenGl => BackendKind::OpenGL,
            BackendSetting::OpenGlEs => BackendKind::OpenGLES,
            BackendSetting::WebGpu => BackendKind::WebGPU,
            BackendSetting::Null => BackendKind::Null,
        }
    }
}

/// Logical window size plus the framebuffer size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
    pub fb_width: u32,
    pub fb_height: u32,
    pub scale: f32,
}

impl WindowSize {
    pub fn new(fb_width: u32, fb_height: u32, scale: f32) -> Self {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        Self {
            width: (fb_width as f32 / scale).round() as u32,
            height: (fb_height as f32 / scale).round() as u32,
            fb_width,
            fb_height,
            scale,
        }
    }
}

/// Severity passed to the application log callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

pub type LogCallback = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;
pub type UiInitCallback = Box<dyn FnOnce(&WindowSize)>;

/// RGBA8 window icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowIcon {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Bootstrap parameters for [`crate::Presenter::initialize`].
pub struct PresenterConfig {
    pub app_name: Option<String>,
    /// Settings directory; defaults to the platform preferences directory.
    pub config_path: Option<PathBuf>,
    pub desired_backend: BackendKind,
    /// `0` selects [`DEFAULT_MSAA`].
    pub msaa: u32,
    /// `0` selects [`DEFAULT_ANISOTROPY`].
    pub max_texture_anisotropy: u16,
    pub start_fullscreen: bool,
    pub start_xr: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub icon: Option<WindowIcon>,
    pub xr: XrOptions,
    pub log_callback: Option<LogCallback>,
    pub ui_init_callback: Option<UiInitCallback>,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            app_name: None,
            config_path: None,
            desired_backend: BackendKind::Auto,
            msaa: 0,
            max_texture_anisotropy: 0,
            start_fullscreen: false,
            start_xr: false,
            window_width: 1280,
            window_height: 720,
            icon: None,
            xr: XrOptions::default(),
            log_callback: None,
            ui_init_callback: None,
        }
    }
}

impl fmt::Debug for PresenterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenterConfig")
            .field("app_name", &self.app_name)
            .field("config_path", &self.config_path)
            .field("desired_backend", &self.desired_backend)
            .field("msaa", &self.msaa)
            .field("max_texture_anisotropy", &self.max_texture_anisotropy)
            .field("start_fullscreen", &self.start_fullscreen)
            .field("start_xr", &self.start_xr)
            .field("window_width", &self.window_width)
            .field("window_height", &self.window_height)
            .field("icon", &self.icon.as_ref().map(|i| (i.width, i.height)))
            .field("xr", &self.xr)
            .field("log_callback", &self.log_callback.is_some())
            .field("ui_init_callback", &self.ui_init_callback.is_some())
            .finish()
    }
}

impl PresenterConfig {
    /// Builds a config from a parsed settings file.
    pub fn from_settings(settings: &FrameConfig) -> Self {
        Self {
            desired_backend: settings.graphics.backend.into(),
            msaa: settings.graphics.msaa,
            max_texture_anisotropy: settings.graphics.max_anisotropy,
            start_fullscreen: settings.graphics.fullscreen,
            start_xr: settings.xr.enabled,
            window_width: settings.graphics.width,
            window_height: settings.graphics.height,
            xr: XrOptions::from_settings(&settings.xr),
            ..Self::default()
        }
    }

    pub fn effective_msaa(&self) -> u32 {
        if self.msaa == 0 {
            DEFAULT_MSAA
        } else {
            self.msaa
        }
    }

    pub fn effective_anisotropy(&self) -> u16 {
        if self.max_texture_anisotropy == 0 {
            DEFAULT_ANISOTROPY
        } else {
            self.max_texture_anisotropy
        }
    }

    pub fn effective_app_name(&self) -> &str {
        self.app_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_APP_NAME)
    }
}

/// Result of a successful initialisation.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenterInfo {
    pub backend: BackendKind,
    pub config_path: PathBuf,
    pub window_size: WindowSize,
}
