//! Callbacks through which the application draws into each render view.

use crate::gpu::{GpuDevice, GraphicsConfig, RenderViewType, SharedTargets, TargetView};
use crate::types::WindowSize;
use crate::xr::XrView;

/// Colour the frame buffer is cleared to before content is drawn.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Content and UI hooks. Every method has a no-op default.
pub trait FrameHooks {
    /// Once per `Presenter::update`, before any view is drawn.
    fn ui_new_frame(&mut self, _size: &WindowSize) {}

    /// A view acquired its image and will be drawn.
    fn begin_view(&mut self, _view_type: RenderViewType) {}

    /// A view could not acquire an image; nothing is drawn for it this frame.
    fn abort_view(&mut self, _view_type: RenderViewType) {}

    /// Draws scene content into the shared frame buffer.
    fn render_content(&mut self, _ctx: &mut RenderContext<'_>) {}

    /// Draws the UI on top of the finished view image (Primary/Mirror only).
    fn render_overlay(&mut self, _ctx: &mut OverlayContext<'_>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl FrameHooks for NoopHooks {}

pub struct RenderContext<'a> {
    pub view_type: RenderViewType,
    pub config: &'a GraphicsConfig,
    pub targets: &'a SharedTargets,
    /// Pose and field of view of the eye for XR views.
    pub eye: Option<XrView>,
    pub device: &'a GpuDevice,
    /// `None` on the null device.
    pub encoder: Option<&'a mut wgpu::CommandEncoder>,
}

impl RenderContext<'_> {
    /// Opens a pass over the frame buffer and depth buffer, resolving into the
    /// single-sampled copy when MSAA is on. Contents are loaded, not cleared.
    pub fn begin_main_pass(&mut self) -> Option<wgpu::RenderPass<'_>> {
        let encoder = self.encoder.as_deref_mut()?;
        main_pass(encoder, self.targets, wgpu::LoadOp::Load, wgpu::LoadOp::Load)
    }

    pub fn push_debug_group(&mut self, label: &str) {
        push_debug_group(self.encoder.as_deref_mut(), label);
    }

    pub fn pop_debug_group(&mut self) {
        pop_debug_group(self.encoder.as_deref_mut());
    }
}

pub struct OverlayContext<'a> {
    pub view_type: RenderViewType,
    pub config: &'a GraphicsConfig,
    pub size: WindowSize,
    /// The swapchain image of the view, already holding the copied frame.
    pub target: &'a TargetView,
    pub device: &'a GpuDevice,
    pub encoder: Option<&'a mut wgpu::CommandEncoder>,
}

impl OverlayContext<'_> {
    pub fn push_debug_group(&mut self, label: &str) {
        push_debug_group(self.encoder.as_deref_mut(), label);
    }

    pub fn pop_debug_group(&mut self) {
        pop_debug_group(self.encoder.as_deref_mut());
    }
}

pub(crate) fn main_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    targets: &SharedTargets,
    color_load: wgpu::LoadOp<wgpu::Color>,
    depth_load: wgpu::LoadOp<f32>,
) -> Option<wgpu::RenderPass<'e>> {
    let view = targets.frame_buffer.target.wgpu_view()?;
    let resolve_target = targets
        .frame_buffer_resolved
        .as_ref()
        .and_then(|resolved| resolved.target.wgpu_view());
    let depth_view = targets.depth_buffer.target.wgpu_view()?;

    Some(encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("main pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target,
            ops: wgpu::Operations {
                load: color_load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
            depth_ops: Some(wgpu::Operations {
                load: depth_load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
    }))
}

#[cfg(debug_assertions)]
pub(crate) fn push_debug_group(encoder: Option<&mut wgpu::CommandEncoder>, label: &str) {
    if let Some(encoder) = encoder {
        encoder.push_debug_group(label);
    }
}

#[cfg(not(debug_assertions))]
pub(crate) fn push_debug_group(_encoder: Option<&mut wgpu::CommandEncoder>, _label: &str) {}

#[cfg(debug_assertions)]
pub(crate) fn pop_debug_group(encoder: Option<&mut wgpu::CommandEncoder>) {
    if let Some(encoder) = encoder {
        encoder.pop_debug_group();
    }
}

#[cfg(not(debug_assertions))]
pub(crate) fn pop_debug_group(_encoder: Option<&mut wgpu::CommandEncoder>) {}
