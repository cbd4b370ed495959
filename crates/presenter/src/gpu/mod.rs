//! GPU device, render views and the per-view render/copy/present cycle.
//!
//! Types:
//!
//! - [`Gpu`] owns the device, the backend bindings, the render views and the
//!   offscreen targets they share.
//! - [`RenderView`] pairs a swapchain with its [`GraphicsConfig`] and copy
//!   pipeline.
//!
//! Each frame walks the views in order:
//!
//! ```text
//! begin_frame ─▶ ( begin_render_view ─▶ end_render_view )* ─▶ end_frame
//! ```
//!
//! `end_render_view` clears the shared frame buffer, lets the application
//! draw into it, copies the (resolved) result into the view's swapchain
//! image with a full-screen triangle, draws the overlay on desktop views,
//! then submits and presents.

mod copy;
mod device;
mod frame;
mod targets;
mod view;

pub use copy::{CopyBindGroup, CopyLayout, CopyPipeline, COPY_SHADER};
pub use device::{select_adapter, AdapterType, GpuDevice, WgpuDevice};
pub use frame::{FrameCursor, ViewPhase, NO_VIEW};
pub use targets::{
    RenderTexture, SharedTargets, TargetView, DEPTH_FORMAT, RENDER_TEXTURE_USAGE,
};
pub use view::{GraphicsConfig, RenderView, RenderViewType, RenderViews};

use std::rc::Rc;

use crate::binding::{
    create_binding, create_xr_binding, BackendBinding, NextTexture, SwapchainConfig,
};
use crate::error::GfxError;
use crate::hooks::{self, FrameHooks, OverlayContext, RenderContext, CLEAR_COLOR};
use crate::types::{BackendKind, WindowSize};
use crate::window::RawHandles;
use crate::xr::{SharedXrSession, XrError, STEREO_VIEW_COUNT};

/// Rendering options that apply to every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuSettings {
    pub msaa: u32,
    pub texture_anisotropy: u16,
}

impl Default for GpuSettings {
    fn default() -> Self {
        Self {
            msaa: crate::types::DEFAULT_MSAA,
            texture_anisotropy: crate::types::DEFAULT_ANISOTROPY,
        }
    }
}

pub struct Gpu {
    views: RenderViews,
    targets: SharedTargets,
    copy_bind_group: CopyBindGroup,
    copy_layout: CopyLayout,
    bindings: Vec<BackendBinding>,
    xr: Option<SharedXrSession>,
    device: GpuDevice,
    primary_config: GraphicsConfig,
    window_view: usize,
    cursor: FrameCursor,
}

impl Gpu {
    /// Creates the device and every render view for `kind`.
    ///
    /// With an XR session the eye views come first, sized from the runtime's
    /// recommended view sizes, followed by a Mirror view of the window.
    /// Without one there is a single Primary view.
    pub fn initialize(
        kind: BackendKind,
        handles: Option<RawHandles>,
        window_size: WindowSize,
        settings: &GpuSettings,
        xr: Option<SharedXrSession>,
    ) -> Result<Self, GfxError> {
        let device = GpuDevice::create(kind)?;
        let copy_layout = CopyLayout::new(&device, settings.texture_anisotropy);
        let mut views = RenderViews::new();
        let mut bindings = Vec::new();

        if let Some(session) = &xr {
            let mut binding = create_xr_binding(kind, &device, Rc::clone(session))?;
            session
                .borrow_mut()
                .initialize_session(binding.graphics_binding()?)?;

            let config_views = session.borrow().config_views().to_vec();
            if config_views.len() < STEREO_VIEW_COUNT {
                return Err(XrError::ViewCountMismatch {
                    expected: STEREO_VIEW_COUNT,
                    actual: config_views.len(),
                }
                .into());
            }

            let swapchain = binding.swapchain_implementation()?;
            let format = binding.preferred_swapchain_format()?;
            for (eye, config_view) in config_views.iter().take(STEREO_VIEW_COUNT).enumerate() {
                let Some(view_type) = RenderViewType::from_eye(eye) else {
                    continue;
                };
                let config = GraphicsConfig {
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    width: config_view.recommended_width,
                    height: config_view.recommended_height,
                    present_mode: wgpu::PresentMode::Fifo,
                    depth_format: DEPTH_FORMAT,
                    msaa_samples: device.supported_sample_count(format, settings.msaa),
                    texture_anisotropy: settings.texture_anisotropy,
                };
                views.insert(RenderView {
                    view_type,
                    swapchain: Rc::clone(&swapchain),
                    config,
                    copy_pipeline: copy_layout.create_pipeline(&device, format),
                })?;
            }
            bindings.push(binding);
        }

        let mut binding = create_binding(kind, &device, handles)?;
        let swapchain = binding.swapchain_implementation()?;
        let format = binding.preferred_swapchain_format()?.remove_srgb_suffix();
        let view_type = if xr.is_some() {
            RenderViewType::Mirror
        } else {
            RenderViewType::Primary
        };
        let config = GraphicsConfig {
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            width: window_size.fb_width,
            height: window_size.fb_height,
            present_mode: wgpu::PresentMode::Fifo,
            depth_format: DEPTH_FORMAT,
            msaa_samples: device.supported_sample_count(format, settings.msaa),
            texture_anisotropy: settings.texture_anisotropy,
        };
        let window_view = views.insert(RenderView {
            view_type,
            swapchain,
            config,
            copy_pipeline: copy_layout.create_pipeline(&device, format),
        })?;
        bindings.push(binding);

        let primary_config = views.get(0)?.config;
        let targets = SharedTargets::new(
            &device,
            primary_config.format,
            1,
            1,
            primary_config.msaa_samples,
            0,
        );
        let copy_bind_group = copy_layout.create_bind_group(&device, targets.copy_source());

        let mut gpu = Self {
            views,
            targets,
            copy_bind_group,
            copy_layout,
            bindings,
            xr,
            device,
            primary_config,
            window_view,
            cursor: FrameCursor::default(),
        };

        // A minimised window still needs a configured surface.
        for index in 0..gpu.views.len() {
            let config = gpu.views.get(index)?.config;
            gpu.resize_swapchain(index, config.width.max(1), config.height.max(1), true)?;
        }

        tracing::info!(
            backend = %kind,
            views = ?gpu.views.types(),
            format = ?gpu.primary_config.format,
            msaa = gpu.primary_config.msaa_samples,
            "GPU initialized"
        );
        Ok(gpu)
    }

    pub fn backend(&self) -> BackendKind {
        self.device.backend()
    }

    pub fn device(&self) -> &GpuDevice {
        &self.device
    }

    pub fn views(&self) -> &RenderViews {
        &self.views
    }

    pub fn targets(&self) -> &SharedTargets {
        &self.targets
    }

    pub fn target_generation(&self) -> u64 {
        self.targets.generation
    }

    pub fn primary_config(&self) -> &GraphicsConfig {
        &self.primary_config
    }

    /// Index of the Primary or Mirror view.
    pub fn window_view_index(&self) -> usize {
        self.window_view
    }

    pub fn bindings(&self) -> &[BackendBinding] {
        &self.bindings
    }

    pub fn begin_frame(&mut self) -> Result<(), GfxError> {
        if self.cursor.in_frame() {
            return Err(GfxError::FrameOrder("begin_frame twice without end_frame"));
        }
        self.cursor.begin_frame();
        Ok(())
    }

    pub fn end_frame(&mut self) -> Result<(), GfxError> {
        self.cursor.end_frame()
    }

    pub fn has_render_view(&self) -> bool {
        self.cursor.has_next(self.views.len())
    }

    /// Prepares the next view for drawing. Returns `Ok(false)` when the view
    /// cannot be drawn this frame; the caller may retry or end it.
    pub fn begin_render_view(&mut self, hooks: &mut dyn FrameHooks) -> Result<bool, GfxError> {
        let index = self.cursor.begin_view(self.views.len())?;
        let view = self.views.get(index)?;
        let view_type = view.view_type;
        let config = view.config;
        let swapchain = Rc::clone(&view.swapchain);

        if let Some(eye) = view_type.xr_eye() {
            match self.prepare_eye(eye) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::trace!(?view_type, "XR session not rendering; view skipped");
                    self.cursor.skipped();
                    hooks.abort_view(view_type);
                    return Ok(false);
                }
                Err(err) => {
                    self.cursor.skipped();
                    hooks.abort_view(view_type);
                    return Err(err);
                }
            }
        }

        let next = swapchain.borrow_mut().next_texture();
        match next {
            Ok(NextTexture::Ready(image)) => {
                self.cursor.acquired(image);
                hooks.begin_view(view_type);
                Ok(true)
            }
            Ok(NextTexture::OutOfDate) => {
                tracing::debug!(?view_type, "swapchain out of date; forcing resize");
                self.cursor.skipped();
                self.resize_swapchain(index, config.width, config.height, true)?;
                hooks.abort_view(view_type);
                Ok(false)
            }
            Err(err) => {
                self.cursor.skipped();
                Err(err)
            }
        }
    }

    fn prepare_eye(&mut self, eye: usize) -> Result<bool, GfxError> {
        let Some(session) = &self.xr else {
            return Ok(false);
        };
        let mut session = session.borrow_mut();
        if !session.should_render() {
            return Ok(false);
        }
        session.set_active_view(eye);
        if !session.views_located() {
            session.locate_views()?;
        }
        Ok(true)
    }

    /// Draws, copies and presents the current view; a skipped view only advances.
    pub fn end_render_view(&mut self, hooks: &mut dyn FrameHooks) -> Result<(), GfxError> {
        let (index, image) = self.cursor.end_view()?;
        let Some(image) = image else {
            return Ok(());
        };

        let view = self.views.get(index)?;
        let eye = view
            .view_type
            .xr_eye()
            .zip(self.xr.as_ref())
            .and_then(|(eye, session)| session.borrow().view(eye));
        let size = WindowSize::new(view.config.width, view.config.height, 1.0);

        match self.device.as_wgpu() {
            None => {
                hooks.render_content(&mut RenderContext {
                    view_type: view.view_type,
                    config: &view.config,
                    targets: &self.targets,
                    eye,
                    device: &self.device,
                    encoder: None,
                });
                if view.view_type.renders_overlay() {
                    hooks.render_overlay(&mut OverlayContext {
                        view_type: view.view_type,
                        config: &view.config,
                        size,
                        target: &image,
                        device: &self.device,
                        encoder: None,
                    });
                }
            }
            Some(gpu) => {
                let mut encoder = gpu
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("render view encoder"),
                    });
                hooks::push_debug_group(Some(&mut encoder), &format!("{:?}", view.view_type));

                drop(hooks::main_pass(
                    &mut encoder,
                    &self.targets,
                    wgpu::LoadOp::Clear(CLEAR_COLOR),
                    wgpu::LoadOp::Clear(1.0),
                ));

                hooks.render_content(&mut RenderContext {
                    view_type: view.view_type,
                    config: &view.config,
                    targets: &self.targets,
                    eye,
                    device: &self.device,
                    encoder: Some(&mut encoder),
                });

                hooks::push_debug_group(Some(&mut encoder), "copy");
                if let (Some(target), CopyPipeline::Wgpu(pipeline), CopyBindGroup::Wgpu(bind_group)) =
                    (image.wgpu_view(), &view.copy_pipeline, &self.copy_bind_group)
                {
                    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("copy pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: target,
                            depth_slice: None,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        occlusion_query_set: None,
                        timestamp_writes: None,
                    });
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(0, bind_group, &[]);
                    pass.draw(0..3, 0..1);
                }
                hooks::pop_debug_group(Some(&mut encoder));

                if view.view_type.renders_overlay() {
                    hooks.render_overlay(&mut OverlayContext {
                        view_type: view.view_type,
                        config: &view.config,
                        size,
                        target: &image,
                        device: &self.device,
                        encoder: Some(&mut encoder),
                    });
                }

                hooks::pop_debug_group(Some(&mut encoder));
                gpu.queue.submit(Some(encoder.finish()));
            }
        }

        view.swapchain.borrow_mut().present()
    }

    /// Reconfigures view `index` to `width`×`height` and rebuilds the shared
    /// targets. Returns whether anything was rebuilt.
    pub fn resize_swapchain(
        &mut self,
        index: usize,
        width: u32,
        height: u32,
        force: bool,
    ) -> Result<bool, GfxError> {
        if width == 0 || height == 0 {
            tracing::debug!(index, width, height, "ignoring zero-sized resize");
            return Ok(false);
        }
        let view = self.views.get(index)?;
        if !force && view.config.width == width && view.config.height == height {
            return Ok(false);
        }

        let view_type = view.view_type;
        let mut config = view.config;
        let swapchain = Rc::clone(&view.swapchain);
        if let (Some(eye), Some(session)) = (view_type.xr_eye(), &self.xr) {
            session.borrow_mut().set_active_view(eye);
        }

        swapchain.borrow_mut().configure(
            &self.device,
            &SwapchainConfig {
                format: config.format,
                usage: config.usage,
                width,
                height,
                present_mode: config.present_mode,
            },
        )?;
        config.width = width;
        config.height = height;
        self.views.get_mut(index)?.config = config;
        if index == 0 {
            self.primary_config.width = width;
            self.primary_config.height = height;
        }

        self.rebuild_targets(width, height);
        tracing::debug!(
            ?view_type,
            width,
            height,
            generation = self.targets.generation,
            "render view resized"
        );
        Ok(true)
    }

    /// Resizes the Primary/Mirror view to a new window size.
    pub fn resize_window(&mut self, size: &WindowSize) -> Result<bool, GfxError> {
        self.resize_swapchain(self.window_view, size.fb_width, size.fb_height, false)
    }

    fn rebuild_targets(&mut self, width: u32, height: u32) {
        self.targets = SharedTargets::new(
            &self.device,
            self.primary_config.format,
            width,
            height,
            self.primary_config.msaa_samples,
            self.targets.generation + 1,
        );
        self.copy_bind_group = self
            .copy_layout
            .create_bind_group(&self.device, self.targets.copy_source());
    }

    /// Marks every window swapchain stale; each view resizes on its next acquire.
    pub fn invalidate_swapchains(&mut self) {
        for view in self.views.iter().filter(|view| view.view_type.xr_eye().is_none()) {
            view.swapchain.borrow_mut().invalidate();
        }
    }

    /// Releases GPU objects views first, device last.
    pub fn shutdown(self) {
        let Gpu {
            mut views,
            targets,
            copy_bind_group,
            copy_layout,
            bindings,
            xr,
            device,
            ..
        } = self;
        let backend = device.backend();

        views.clear();
        drop(targets);
        drop(copy_bind_group);
        drop(copy_layout);
        drop(bindings);
        if let Some(session) = xr {
            session.borrow_mut().release_session();
        }
        if let GpuDevice::Wgpu(gpu) = &device {
            if let Err(err) = gpu.device.poll(wgpu::PollType::Wait) {
                tracing::warn!(%err, "failed to drain GPU queue at shutdown");
            }
        }
        drop(device);
        tracing::info!(%backend, "GPU shut down");
    }
}

impl std::fmt::Debug for Gpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gpu")
            .field("device", &self.device)
            .field("views", &self.views)
            .field("generation", &self.targets.generation)
            .field("cursor", &self.cursor)
            .finish()
    }
}
