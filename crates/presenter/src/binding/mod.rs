//! Per-backend glue between the GPU device and whatever presents its images:
//! a window surface, an offscreen ring, or an XR runtime's swapchains.
//!
//! A [`BackendBinding`] creates its swapchain lazily and exactly once; every
//! later request hands out the same shared instance.

mod headless;
mod surface;

pub use headless::HeadlessSwapchain;
pub use surface::SurfaceSwapchain;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::GfxError;
use crate::gpu::{GpuDevice, TargetView};
use crate::types::BackendKind;
use crate::window::RawHandles;
use crate::xr::{SharedXrSession, XrSwapchainBridge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainConfig {
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    pub width: u32,
    pub height: u32,
    pub present_mode: wgpu::PresentMode,
}

#[derive(Debug)]
pub enum NextTexture {
    Ready(TargetView),
    /// The swapchain must be reconfigured before it can hand out images.
    OutOfDate,
}

/// The swapchain contract every binding implements.
pub trait SwapchainImpl {
    fn label(&self) -> &'static str;

    fn configure(&mut self, device: &GpuDevice, config: &SwapchainConfig) -> Result<(), GfxError>;

    /// Acquires the next image. Every `Ready` must be followed by exactly one
    /// `present` before the next acquire.
    fn next_texture(&mut self) -> Result<NextTexture, GfxError>;

    fn present(&mut self) -> Result<(), GfxError>;

    fn preferred_format(&mut self) -> Result<wgpu::TextureFormat, GfxError>;

    /// Marks the current configuration stale; the next acquire reports `OutOfDate`.
    fn invalidate(&mut self) {}
}

pub type SwapchainHandle = Rc<RefCell<dyn SwapchainImpl>>;

/// Vulkan objects an XR runtime needs to share the presenter's device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VulkanHandles {
    pub instance: u64,
    pub physical_device: u64,
    pub device: u64,
    pub queue_family_index: u32,
    pub queue_index: u32,
}

/// Graphics-API description handed to the XR runtime at session creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsBinding {
    Vulkan(VulkanHandles),
    /// No native handles are exposed; only runtimes that do not render
    /// through the device (the simulated one) accept this.
    Opaque(BackendKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingFlavor {
    Surface,
    Headless,
    Xr,
}

type SwapchainFactory = Box<dyn FnOnce() -> Result<SwapchainHandle, GfxError>>;

pub struct BackendBinding {
    kind: BackendKind,
    flavor: BindingFlavor,
    factory: Option<SwapchainFactory>,
    swapchain: Option<SwapchainHandle>,
    graphics_binding: Option<GraphicsBinding>,
}

impl BackendBinding {
    fn new(kind: BackendKind, flavor: BindingFlavor, factory: SwapchainFactory) -> Self {
        Self {
            kind,
            flavor,
            factory: Some(factory),
            swapchain: None,
            graphics_binding: None,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn flavor(&self) -> BindingFlavor {
        self.flavor
    }

    /// Creates the swapchain on first use and returns the same instance afterwards.
    pub fn swapchain_implementation(&mut self) -> Result<SwapchainHandle, GfxError> {
        if let Some(swapchain) = &self.swapchain {
            return Ok(Rc::clone(swapchain));
        }
        let factory = self.factory.take().ok_or_else(|| {
            GfxError::Swapchain(format!("{} swapchain factory already consumed", self.kind))
        })?;
        let swapchain = factory()?;
        tracing::debug!(
            backend = %self.kind,
            flavor = ?self.flavor,
            swapchain = swapchain.borrow().label(),
            "swapchain created"
        );
        self.swapchain = Some(Rc::clone(&swapchain));
        Ok(swapchain)
    }

    pub fn preferred_swapchain_format(&mut self) -> Result<wgpu::TextureFormat, GfxError> {
        let swapchain = self.swapchain_implementation()?;
        let format = swapchain.borrow_mut().preferred_format()?;
        Ok(format)
    }

    /// Description of the device for XR session creation; only XR bindings have one.
    pub fn graphics_binding(&self) -> Result<&GraphicsBinding, GfxError> {
        self.graphics_binding
            .as_ref()
            .ok_or(GfxError::XrUnsupported(self.kind))
    }
}

impl std::fmt::Debug for BackendBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendBinding")
            .field("kind", &self.kind)
            .field("flavor", &self.flavor)
            .field("swapchain_created", &self.swapchain.is_some())
            .field("graphics_binding", &self.graphics_binding)
            .finish()
    }
}

/// Binding for a window (when `handles` is given) or for offscreen rendering.
pub fn create_binding(
    kind: BackendKind,
    device: &GpuDevice,
    handles: Option<RawHandles>,
) -> Result<BackendBinding, GfxError> {
    let (gpu, handles) = match (device.as_wgpu(), handles) {
        (Some(gpu), Some(handles)) => (gpu, handles),
        _ => {
            return Ok(BackendBinding::new(
                kind,
                BindingFlavor::Headless,
                Box::new(|| Ok(Rc::new(RefCell::new(HeadlessSwapchain::new())) as SwapchainHandle)),
            ));
        }
    };

    let surface = unsafe {
        gpu.instance
            .create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: handles.display,
                raw_window_handle: handles.window,
            })
    }
    .map_err(|err| GfxError::Surface(format!("failed to create {kind} surface: {err}")))?;

    if !gpu.adapter.is_surface_supported(&surface) {
        return Err(GfxError::Surface(format!(
            "adapter {} cannot present to this window",
            gpu.adapter_name
        )));
    }

    let adapter = gpu.adapter.clone();
    Ok(BackendBinding::new(
        kind,
        BindingFlavor::Surface,
        Box::new(move || {
            Ok(Rc::new(RefCell::new(SurfaceSwapchain::new(surface, &adapter))) as SwapchainHandle)
        }),
    ))
}

/// Binding whose swapchains come from the XR runtime.
pub fn create_xr_binding(
    kind: BackendKind,
    device: &GpuDevice,
    session: SharedXrSession,
) -> Result<BackendBinding, GfxError> {
    let graphics_binding = match kind {
        BackendKind::Vulkan => vulkan_binding(device),
        BackendKind::Null => GraphicsBinding::Opaque(BackendKind::Null),
        other => return Err(GfxError::XrUnsupported(other)),
    };

    let mut binding = BackendBinding::new(
        kind,
        BindingFlavor::Xr,
        Box::new(move || Ok(Rc::new(RefCell::new(XrSwapchainBridge::new(session))) as SwapchainHandle)),
    );
    binding.graphics_binding = Some(graphics_binding);
    Ok(binding)
}

#[cfg(feature = "openxr")]
fn vulkan_binding(device: &GpuDevice) -> GraphicsBinding {
    match device.vulkan_handles() {
        Some(handles) => GraphicsBinding::Vulkan(handles),
        None => {
            tracing::warn!("Vulkan handles unavailable; XR binding is opaque");
            GraphicsBinding::Opaque(BackendKind::Vulkan)
        }
    }
}

#[cfg(not(feature = "openxr"))]
fn vulkan_binding(_device: &GpuDevice) -> GraphicsBinding {
    GraphicsBinding::Opaque(BackendKind::Vulkan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xr::{SimulatedRuntime, XrOptions, XrSessionManager};

    #[test]
    fn swapchain_is_created_once() {
        let mut binding = create_binding(BackendKind::Null, &GpuDevice::Null, None).unwrap();
        assert_eq!(binding.flavor(), BindingFlavor::Headless);
        let first = binding.swapchain_implementation().unwrap();
        let second = binding.swapchain_implementation().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(
            binding.preferred_swapchain_format().unwrap(),
            wgpu::TextureFormat::Bgra8Unorm
        );
    }

    #[test]
    fn window_bindings_have_no_graphics_binding() {
        let binding = create_binding(BackendKind::Null, &GpuDevice::Null, None).unwrap();
        assert!(matches!(
            binding.graphics_binding(),
            Err(GfxError::XrUnsupported(BackendKind::Null))
        ));
    }

    #[test]
    fn xr_binding_exposes_graphics_binding() {
        let session =
            XrSessionManager::new(XrOptions::default(), Box::new(SimulatedRuntime::new()))
                .into_shared();
        let binding = create_xr_binding(BackendKind::Null, &GpuDevice::Null, session).unwrap();
        assert_eq!(binding.flavor(), BindingFlavor::Xr);
        assert_eq!(
            binding.graphics_binding().unwrap(),
            &GraphicsBinding::Opaque(BackendKind::Null)
        );
    }

    #[test]
    fn xr_binding_rejects_backends_without_interop() {
        let session =
            XrSessionManager::new(XrOptions::default(), Box::new(SimulatedRuntime::new()))
                .into_shared();
        let err = create_xr_binding(BackendKind::Metal, &GpuDevice::Null, session).unwrap_err();
        assert!(matches!(err, GfxError::XrUnsupported(BackendKind::Metal)));
    }
}
