use std::time::Duration;

use crate::binding::GraphicsBinding;
use crate::gpu::{GpuDevice, TargetView};

use super::options::{BlendMode, FormFactor, Pose, ReferenceSpace, ViewConfiguration};
use super::XrError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiLayer {
    pub name: String,
    pub description: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeExtension {
    pub name: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceProperties {
    pub runtime_name: String,
    pub runtime_version: String,
}

/// Per-eye sizing hints published by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigView {
    pub recommended_width: u32,
    pub recommended_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub recommended_samples: u32,
    pub max_samples: u32,
}

/// One view configuration the runtime supports, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfigurationReport {
    pub name: String,
    /// Set when this report describes a configuration the presenter can select.
    pub configuration: Option<ViewConfiguration>,
    pub fov_mutable: bool,
    pub views: Vec<ConfigView>,
}

/// Field of view half-angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fov {
    pub angle_left: f32,
    pub angle_right: f32,
    pub angle_up: f32,
    pub angle_down: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct XrView {
    pub pose: Pose,
    pub fov: Fov,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocatedViews {
    pub position_valid: bool,
    pub orientation_valid: bool,
    pub views: Vec<XrView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Idle,
    Ready,
    Synchronized,
    Visible,
    Focused,
    Stopping,
    LossPending,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEvent {
    StateChanged(SessionState),
    InstanceLossPending,
    EventsLost(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    /// Predicted display time in runtime nanoseconds.
    pub predicted_display_time: i64,
    pub should_render: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XrSwapchainId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrSwapchainDesc {
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
}

/// One eye's contribution to the projection layer submitted at frame end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionView {
    pub swapchain: XrSwapchainId,
    pub width: u32,
    pub height: u32,
    pub view: XrView,
}

/// Calls the session manager makes into an XR runtime.
pub trait XrRuntime {
    fn name(&self) -> &'static str;

    fn api_layers(&self) -> Result<Vec<ApiLayer>, XrError>;
    fn extensions(&self) -> Result<Vec<RuntimeExtension>, XrError>;
    fn create_instance(
        &mut self,
        app_name: &str,
        extensions: &[&str],
    ) -> Result<InstanceProperties, XrError>;

    /// Returns the runtime's system id for the form factor.
    fn create_system(&mut self, form_factor: FormFactor) -> Result<u64, XrError>;
    fn view_configurations(&self) -> Result<Vec<ViewConfigurationReport>, XrError>;
    fn blend_modes(&self, configuration: ViewConfiguration) -> Result<Vec<BlendMode>, XrError>;
    fn config_views(&self, configuration: ViewConfiguration) -> Result<Vec<ConfigView>, XrError>;

    fn create_session(&mut self, binding: &GraphicsBinding) -> Result<(), XrError>;
    /// Drops the session and everything created from it. Must run before the
    /// graphics device it was bound to is destroyed.
    fn destroy_session(&mut self) {}
    fn create_reference_space(&mut self, space: &ReferenceSpace) -> Result<(), XrError>;

    fn poll_event(&mut self) -> Result<Option<RuntimeEvent>, XrError>;
    fn begin_session(&mut self, configuration: ViewConfiguration) -> Result<(), XrError>;
    fn end_session(&mut self) -> Result<(), XrError>;

    fn wait_frame(&mut self) -> Result<FrameTiming, XrError>;
    fn begin_frame(&mut self) -> Result<(), XrError>;
    /// `layer` is `None` when nothing was rendered this frame.
    fn end_frame(
        &mut self,
        timing: &FrameTiming,
        blend_mode: BlendMode,
        layer: Option<&[ProjectionView]>,
    ) -> Result<(), XrError>;

    fn locate_views(
        &mut self,
        configuration: ViewConfiguration,
        display_time: i64,
    ) -> Result<LocatedViews, XrError>;

    /// Swapchain formats the runtime accepts, in runtime order; formats with
    /// no `wgpu` equivalent are omitted.
    fn swapchain_formats(&self) -> Result<Vec<wgpu::TextureFormat>, XrError>;
    fn create_swapchain(
        &mut self,
        device: &GpuDevice,
        desc: &XrSwapchainDesc,
    ) -> Result<Box<dyn XrSwapchain>, XrError>;
}

/// Image ring owned by the runtime.
pub trait XrSwapchain {
    fn id(&self) -> XrSwapchainId;
    fn images(&self) -> &[TargetView];
    fn acquire_image(&mut self) -> Result<u32, XrError>;
    /// `None` waits without a timeout.
    fn wait_image(&mut self, timeout: Option<Duration>) -> Result<(), XrError>;
    fn release_image(&mut self) -> Result<(), XrError>;
}
