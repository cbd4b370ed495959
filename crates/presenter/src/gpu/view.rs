use crate::binding::SwapchainHandle;
use crate::error::GfxError;

use super::copy::CopyPipeline;

/// Role of a render view. At most one view of each role exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderViewType {
    /// The desktop window when XR is off.
    Primary,
    /// The desktop window while an XR session drives the eyes.
    Mirror,
    XrLeft,
    XrRight,
}

impl RenderViewType {
    /// Whether the UI overlay is drawn on top of this view.
    pub fn renders_overlay(self) -> bool {
        matches!(self, RenderViewType::Primary | RenderViewType::Mirror)
    }

    pub fn xr_eye(self) -> Option<usize> {
        match self {
            RenderViewType::XrLeft => Some(0),
            RenderViewType::XrRight => Some(1),
            _ => None,
        }
    }

    pub fn from_eye(eye: usize) -> Option<Self> {
        match eye {
            0 => Some(RenderViewType::XrLeft),
            1 => Some(RenderViewType::XrRight),
            _ => None,
        }
    }
}

/// Graphics settings of one view, fixed at creation except for the size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsConfig {
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    pub width: u32,
    pub height: u32,
    pub present_mode: wgpu::PresentMode,
    pub depth_format: wgpu::TextureFormat,
    pub msaa_samples: u32,
    pub texture_anisotropy: u16,
}

pub struct RenderView {
    pub view_type: RenderViewType,
    pub swapchain: SwapchainHandle,
    pub config: GraphicsConfig,
    pub copy_pipeline: CopyPipeline,
}

impl std::fmt::Debug for RenderView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderView")
            .field("view_type", &self.view_type)
            .field("swapchain", &self.swapchain.borrow().label())
            .field("config", &self.config)
            .finish()
    }
}

/// Ordered collection of render views with unique roles. Views render in
/// insertion order.
#[derive(Debug, Default)]
pub struct RenderViews {
    views: Vec<RenderView>,
}

impl RenderViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `view`, or leaves the collection untouched if its role is taken.
    pub fn insert(&mut self, view: RenderView) -> Result<usize, GfxError> {
        if self.contains(view.view_type) {
            tracing::error!(view_type = ?view.view_type, "render view already exists");
            return Err(GfxError::DuplicateRenderView(view.view_type));
        }
        self.views.push(view);
        Ok(self.views.len() - 1)
    }

    pub fn contains(&self, view_type: RenderViewType) -> bool {
        self.views.iter().any(|view| view.view_type == view_type)
    }

    pub fn position(&self, view_type: RenderViewType) -> Option<usize> {
        self.views.iter().position(|view| view.view_type == view_type)
    }

    pub fn get(&self, index: usize) -> Result<&RenderView, GfxError> {
        let count = self.views.len();
        self.views
            .get(index)
            .ok_or(GfxError::InvalidView { index, count })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut RenderView, GfxError> {
        let count = self.views.len();
        self.views
            .get_mut(index)
            .ok_or(GfxError::InvalidView { index, count })
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderView> {
        self.views.iter()
    }

    pub fn types(&self) -> Vec<RenderViewType> {
        self.views.iter().map(|view| view.view_type).collect()
    }

    pub(crate) fn clear(&mut self) {
        self.views.clear();
    }
}
