use crate::error::GfxError;
use crate::gpu::{GpuDevice, TargetView};

use super::{NextTexture, SwapchainConfig, SwapchainImpl};

/// Offscreen swapchain for runs without a window. On a real device it
/// renders into an ordinary texture; on the null device nothing is drawn.
#[derive(Debug, Default)]
pub struct HeadlessSwapchain {
    config: Option<SwapchainConfig>,
    image: Option<TargetView>,
    acquired: bool,
    stale: bool,
    frames_presented: u64,
}

impl HeadlessSwapchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn config(&self) -> Option<&SwapchainConfig> {
        self.config.as_ref()
    }
}

impl SwapchainImpl for HeadlessSwapchain {
    fn label(&self) -> &'static str {
        "headless"
    }

    fn configure(&mut self, device: &GpuDevice, config: &SwapchainConfig) -> Result<(), GfxError> {
        if self.acquired {
            return Err(GfxError::Swapchain(
                "headless swapchain reconfigured while an image is acquired".into(),
            ));
        }
        self.image = Some(TargetView::create(
            device,
            "headless image",
            config.format,
            config.width,
            config.height,
            1,
            config.usage | wgpu::TextureUsages::RENDER_ATTACHMENT,
        ));
        self.config = Some(*config);
        self.stale = false;
        Ok(())
    }

    fn next_texture(&mut self) -> Result<NextTexture, GfxError> {
        if self.acquired {
            return Err(GfxError::Swapchain(
                "headless image acquired twice without present".into(),
            ));
        }
        match (&self.image, self.stale) {
            (Some(image), false) => {
                self.acquired = true;
                Ok(NextTexture::Ready(image.clone()))
            }
            _ => Ok(NextTexture::OutOfDate),
        }
    }

    fn present(&mut self) -> Result<(), GfxError> {
        if !self.acquired {
            return Err(GfxError::Swapchain(
                "present without an acquired image".into(),
            ));
        }
        self.acquired = false;
        self.frames_presented += 1;
        Ok(())
    }

    fn preferred_format(&mut self) -> Result<wgpu::TextureFormat, GfxError> {
        Ok(wgpu::TextureFormat::Bgra8Unorm)
    }

    fn invalidate(&mut self) {
        self.stale = true;
    }
}
