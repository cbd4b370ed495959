use crate::error::GfxError;
use crate::gpu::{GpuDevice, TargetView};

use super::{NextTexture, SwapchainConfig, SwapchainImpl};

/// Frames the window surface keeps queued.
const FRAME_LATENCY: u32 = 2;

/// Presents to a window through a `wgpu` surface.
pub struct SurfaceSwapchain {
    // Dropped before the surface it came from.
    frame: Option<wgpu::SurfaceTexture>,
    surface: wgpu::Surface<'static>,
    caps: wgpu::SurfaceCapabilities,
    config: Option<wgpu::SurfaceConfiguration>,
    view_format: Option<wgpu::TextureFormat>,
    stale: bool,
}

impl SurfaceSwapchain {
    pub fn new(surface: wgpu::Surface<'static>, adapter: &wgpu::Adapter) -> Self {
        let caps = surface.get_capabilities(adapter);
        tracing::debug!(
            formats = ?caps.formats,
            present_modes = ?caps.present_modes,
            alpha_modes = ?caps.alpha_modes,
            "surface capabilities"
        );
        Self {
            frame: None,
            surface,
            caps,
            config: None,
            view_format: None,
            stale: false,
        }
    }

    /// Surface format to configure for a requested view format: the format
    /// itself, or its sRGB twin with the requested one as a view format.
    fn surface_format(&self, requested: wgpu::TextureFormat) -> Option<wgpu::TextureFormat> {
        if self.caps.formats.contains(&requested) {
            return Some(requested);
        }
        self.caps
            .formats
            .iter()
            .copied()
            .find(|format| format.remove_srgb_suffix() == requested)
    }
}

impl SwapchainImpl for SurfaceSwapchain {
    fn label(&self) -> &'static str {
        "surface"
    }

    fn configure(&mut self, device: &GpuDevice, config: &SwapchainConfig) -> Result<(), GfxError> {
        let gpu = device
            .as_wgpu()
            .ok_or_else(|| GfxError::Surface("surface needs a GPU device".into()))?;
        if self.frame.is_some() {
            return Err(GfxError::Swapchain(
                "surface reconfigured while a frame is held".into(),
            ));
        }

        let format = self.surface_format(config.format).ok_or_else(|| {
            GfxError::Surface(format!(
                "format {:?} not supported by surface (supports {:?})",
                config.format, self.caps.formats
            ))
        })?;
        let present_mode = if self.caps.present_modes.contains(&config.present_mode) {
            config.present_mode
        } else {
            wgpu::PresentMode::Fifo
        };
        let alpha_mode = self
            .caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let view_formats = if format == config.format {
            vec![]
        } else {
            vec![config.format]
        };

        let surface_config = wgpu::SurfaceConfiguration {
            usage: config.usage & self.caps.usages,
            format,
            width: config.width.max(1),
            height: config.height.max(1),
            present_mode,
            alpha_mode,
            view_formats,
            desired_maximum_frame_latency: FRAME_LATENCY,
        };
        self.surface.configure(&gpu.device, &surface_config);
        tracing::debug!(
            ?format,
            view_format = ?config.format,
            ?present_mode,
            width = surface_config.width,
            height = surface_config.height,
            "surface configured"
        );

        self.config = Some(surface_config);
        self.view_format = Some(config.format);
        self.stale = false;
        Ok(())
    }

    fn next_texture(&mut self) -> Result<NextTexture, GfxError> {
        if self.frame.is_some() {
            return Err(GfxError::Swapchain(
                "surface texture acquired twice without present".into(),
            ));
        }
        if self.config.is_none() || self.stale {
            return Ok(NextTexture::OutOfDate);
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated; reconfigure required");
                self.stale = true;
                return Ok(NextTexture::OutOfDate);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("timed out acquiring surface texture");
                return Ok(NextTexture::OutOfDate);
            }
            Err(err) => return Err(GfxError::Surface(err.to_string())),
        };

        if frame.suboptimal {
            tracing::debug!("surface texture suboptimal; reconfiguring after this frame");
            self.stale = true;
        }

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("surface view"),
            format: self.view_format,
            ..Default::default()
        });
        self.frame = Some(frame);
        Ok(NextTexture::Ready(TargetView::from_view(view)))
    }

    fn present(&mut self) -> Result<(), GfxError> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| GfxError::Swapchain("present without an acquired texture".into()))?;
        frame.present();
        Ok(())
    }

    fn preferred_format(&mut self) -> Result<wgpu::TextureFormat, GfxError> {
        self.caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| GfxError::Surface("surface reports no formats".into()))
    }

    fn invalidate(&mut self) {
        self.stale = true;
    }
}
