//! Headless XR runtime.
//!
//! Fabricates a stereo head-mounted system with fixed eye poses and a small
//! image ring per swapchain. On a real GPU device the images are ordinary
//! `wgpu` textures, so the stereo path renders even without a headset.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec3;

use crate::binding::GraphicsBinding;
use crate::gpu::{GpuDevice, TargetView};

use super::options::{BlendMode, FormFactor, Pose, ReferenceSpace, ViewConfiguration};
use super::runtime::{
    ApiLayer, ConfigView, Fov, FrameTiming, InstanceProperties, LocatedViews, ProjectionView,
    RuntimeEvent, RuntimeExtension, SessionState, ViewConfigurationReport, XrRuntime,
    XrSwapchain, XrSwapchainDesc, XrSwapchainId, XrView,
};
use super::XrError;

const FRAME_PERIOD_NS: i64 = 11_111_111;
const IMAGE_COUNT: usize = 3;
const HALF_FOV: f32 = std::f32::consts::FRAC_PI_4;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedConfig {
    pub eye_width: u32,
    pub eye_height: u32,
    pub recommended_samples: u32,
    pub swapchain_formats: Vec<wgpu::TextureFormat>,
    pub blend_modes: Vec<BlendMode>,
    /// Distance between the eyes in metres.
    pub ipd: f32,
    pub fail_instance: bool,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            eye_width: 1440,
            eye_height: 1584,
            recommended_samples: 1,
            swapchain_formats: vec![
                wgpu::TextureFormat::Rgba8UnormSrgb,
                wgpu::TextureFormat::Bgra8UnormSrgb,
                wgpu::TextureFormat::Rgba8Unorm,
            ],
            blend_modes: vec![BlendMode::Opaque, BlendMode::Additive],
            ipd: 0.064,
            fail_instance: false,
        }
    }
}

#[derive(Debug)]
struct Shared {
    position_valid: bool,
    orientation_valid: bool,
    view_count: usize,
    events: VecDeque<RuntimeEvent>,
    acquires: u64,
    waits: u64,
    releases: u64,
    frames_ended: u64,
    layers_submitted: u64,
    swapchains_created: u64,
    last_swapchain: Option<XrSwapchainDesc>,
    last_layer: Vec<ProjectionView>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            position_valid: true,
            orientation_valid: true,
            view_count: 2,
            events: VecDeque::new(),
            acquires: 0,
            waits: 0,
            releases: 0,
            frames_ended: 0,
            layers_submitted: 0,
            swapchains_created: 0,
            last_swapchain: None,
            last_layer: Vec::new(),
        }
    }
}

/// Handle for steering a [`SimulatedRuntime`] and inspecting what it saw,
/// valid after the runtime has been moved into a session manager.
#[derive(Debug, Clone)]
pub struct SimulatedControl {
    shared: Rc<RefCell<Shared>>,
}

impl SimulatedControl {
    pub fn set_tracking(&self, position_valid: bool, orientation_valid: bool) {
        let mut shared = self.shared.borrow_mut();
        shared.position_valid = position_valid;
        shared.orientation_valid = orientation_valid;
    }

    pub fn set_view_count(&self, count: usize) {
        self.shared.borrow_mut().view_count = count;
    }

    /// Queues the stopping/exiting sequence a runtime sends when the user quits.
    pub fn request_exit(&self) {
        let mut shared = self.shared.borrow_mut();
        shared
            .events
            .push_back(RuntimeEvent::StateChanged(SessionState::Stopping));
        shared
            .events
            .push_back(RuntimeEvent::StateChanged(SessionState::Exiting));
    }

    pub fn acquires(&self) -> u64 {
        self.shared.borrow().acquires
    }

    pub fn waits(&self) -> u64 {
        self.shared.borrow().waits
    }

    pub fn releases(&self) -> u64 {
        self.shared.borrow().releases
    }

    pub fn frames_ended(&self) -> u64 {
        self.shared.borrow().frames_ended
    }

    pub fn layers_submitted(&self) -> u64 {
        self.shared.borrow().layers_submitted
    }

    pub fn swapchains_created(&self) -> u64 {
        self.shared.borrow().swapchains_created
    }

    pub fn last_swapchain(&self) -> Option<XrSwapchainDesc> {
        self.shared.borrow().last_swapchain
    }

    pub fn last_layer(&self) -> Vec<ProjectionView> {
        self.shared.borrow().last_layer.clone()
    }
}

pub struct SimulatedRuntime {
    config: SimulatedConfig,
    shared: Rc<RefCell<Shared>>,
    instance_created: bool,
    system: Option<FormFactor>,
    session_created: bool,
    session_running: bool,
    frame_open: bool,
    frame_index: i64,
    next_swapchain_id: u64,
}

impl SimulatedRuntime {
    pub fn new() -> Self {
        Self::with_config(SimulatedConfig::default())
    }

    pub fn with_config(config: SimulatedConfig) -> Self {
        Self {
            config,
            shared: Rc::new(RefCell::new(Shared::default())),
            instance_created: false,
            system: None,
            session_created: false,
            session_running: false,
            frame_open: false,
            frame_index: 0,
            next_swapchain_id: 1,
        }
    }

    pub fn control(&self) -> SimulatedControl {
        SimulatedControl {
            shared: Rc::clone(&self.shared),
        }
    }

    fn config_view(&self) -> ConfigView {
        ConfigView {
            recommended_width: self.config.eye_width,
            recommended_height: self.config.eye_height,
            max_width: self.config.eye_width * 2,
            max_height: self.config.eye_height * 2,
            recommended_samples: self.config.recommended_samples,
            max_samples: 4,
        }
    }

    fn require_session(&self, call: &'static str) -> Result<(), XrError> {
        if self.session_created {
            Ok(())
        } else {
            Err(XrError::call(call, "XR_ERROR_HANDLE_INVALID"))
        }
    }

    fn require_running(&self, call: &'static str) -> Result<(), XrError> {
        if self.session_running {
            Ok(())
        } else {
            Err(XrError::call(call, "XR_ERROR_SESSION_NOT_RUNNING"))
        }
    }
}

impl Default for SimulatedRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl XrRuntime for SimulatedRuntime {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn api_layers(&self) -> Result<Vec<ApiLayer>, XrError> {
        Ok(Vec::new())
    }

    fn extensions(&self) -> Result<Vec<RuntimeExtension>, XrError> {
        Ok(vec![RuntimeExtension {
            name: "XR_KHR_vulkan_enable2".into(),
            version: 2,
        }])
    }

    fn create_instance(
        &mut self,
        _app_name: &str,
        _extensions: &[&str],
    ) -> Result<InstanceProperties, XrError> {
        if self.config.fail_instance {
            return Err(XrError::call(
                "xrCreateInstance",
                "XR_ERROR_RUNTIME_UNAVAILABLE",
            ));
        }
        self.instance_created = true;
        Ok(InstanceProperties {
            runtime_name: "Simulated Runtime".into(),
            runtime_version: env!("CARGO_PKG_VERSION").into(),
        })
    }

    fn create_system(&mut self, form_factor: FormFactor) -> Result<u64, XrError> {
        if !self.instance_created {
            return Err(XrError::call("xrGetSystem", "XR_ERROR_HANDLE_INVALID"));
        }
        if form_factor != FormFactor::HeadMounted {
            return Err(XrError::call("xrGetSystem", "XR_ERROR_FORM_FACTOR_UNSUPPORTED"));
        }
        self.system = Some(form_factor);
        Ok(1)
    }

    fn view_configurations(&self) -> Result<Vec<ViewConfigurationReport>, XrError> {
        Ok(vec![ViewConfigurationReport {
            name: "PRIMARY_STEREO".into(),
            configuration: Some(ViewConfiguration::Stereo),
            fov_mutable: false,
            views: vec![self.config_view(); 2],
        }])
    }

    fn blend_modes(&self, _configuration: ViewConfiguration) -> Result<Vec<BlendMode>, XrError> {
        Ok(self.config.blend_modes.clone())
    }

    fn config_views(&self, configuration: ViewConfiguration) -> Result<Vec<ConfigView>, XrError> {
        Ok(vec![self.config_view(); configuration.view_count()])
    }

    fn create_session(&mut self, _binding: &GraphicsBinding) -> Result<(), XrError> {
        if self.system.is_none() {
            return Err(XrError::call("xrCreateSession", "XR_ERROR_SYSTEM_INVALID"));
        }
        self.session_created = true;
        self.shared
            .borrow_mut()
            .events
            .push_back(RuntimeEvent::StateChanged(SessionState::Ready));
        Ok(())
    }

    fn destroy_session(&mut self) {
        self.session_created = false;
        self.session_running = false;
        self.frame_open = false;
    }

    fn create_reference_space(&mut self, _space: &ReferenceSpace) -> Result<(), XrError> {
        self.require_session("xrCreateReferenceSpace")
    }

    fn poll_event(&mut self) -> Result<Option<RuntimeEvent>, XrError> {
        Ok(self.shared.borrow_mut().events.pop_front())
    }

    fn begin_session(&mut self, _configuration: ViewConfiguration) -> Result<(), XrError> {
        self.require_session("xrBeginSession")?;
        self.session_running = true;
        let mut shared = self.shared.borrow_mut();
        for state in [
            SessionState::Synchronized,
            SessionState::Visible,
            SessionState::Focused,
        ] {
            shared.events.push_back(RuntimeEvent::StateChanged(state));
        }
        Ok(())
    }

    fn end_session(&mut self) -> Result<(), XrError> {
        self.require_running("xrEndSession")?;
        self.session_running = false;
        Ok(())
    }

    fn wait_frame(&mut self) -> Result<FrameTiming, XrError> {
        self.require_running("xrWaitFrame")?;
        self.frame_index += 1;
        Ok(FrameTiming {
            predicted_display_time: self.frame_index * FRAME_PERIOD_NS,
            should_render: true,
        })
    }

    fn begin_frame(&mut self) -> Result<(), XrError> {
        self.require_running("xrBeginFrame")?;
        self.frame_open = true;
        Ok(())
    }

    fn end_frame(
        &mut self,
        _timing: &FrameTiming,
        _blend_mode: BlendMode,
        layer: Option<&[ProjectionView]>,
    ) -> Result<(), XrError> {
        if !self.frame_open {
            return Err(XrError::call("xrEndFrame", "XR_ERROR_CALL_ORDER_INVALID"));
        }
        self.frame_open = false;
        let mut shared = self.shared.borrow_mut();
        shared.frames_ended += 1;
        if let Some(layer) = layer {
            shared.layers_submitted += 1;
            shared.last_layer = layer.to_vec();
        }
        Ok(())
    }

    fn locate_views(
        &mut self,
        _configuration: ViewConfiguration,
        _display_time: i64,
    ) -> Result<LocatedViews, XrError> {
        self.require_session("xrLocateViews")?;
        let shared = self.shared.borrow();
        let half_ipd = self.config.ipd * 0.5;
        let fov = Fov {
            angle_left: -HALF_FOV,
            angle_right: HALF_FOV,
            angle_up: HALF_FOV,
            angle_down: -HALF_FOV,
        };
        let views = (0..shared.view_count)
            .map(|eye| {
                let x = if eye == 0 { -half_ipd } else { half_ipd };
                XrView {
                    pose: Pose::translation(x, 0.0, 0.0),
                    fov,
                }
            })
            .collect();
        Ok(LocatedViews {
            position_valid: shared.position_valid,
            orientation_valid: shared.orientation_valid,
            views,
        })
    }

    fn swapchain_formats(&self) -> Result<Vec<wgpu::TextureFormat>, XrError> {
        self.require_session("xrEnumerateSwapchainFormats")?;
        Ok(self.config.swapchain_formats.clone())
    }

    fn create_swapchain(
        &mut self,
        device: &GpuDevice,
        desc: &XrSwapchainDesc,
    ) -> Result<Box<dyn XrSwapchain>, XrError> {
        self.require_session("xrCreateSwapchain")?;
        if !self.config.swapchain_formats.contains(&desc.format) {
            return Err(XrError::call(
                "xrCreateSwapchain",
                "XR_ERROR_SWAPCHAIN_FORMAT_UNSUPPORTED",
            ));
        }

        let id = XrSwapchainId(self.next_swapchain_id);
        self.next_swapchain_id += 1;
        {
            let mut shared = self.shared.borrow_mut();
            shared.swapchains_created += 1;
            shared.last_swapchain = Some(*desc);
        }

        let images = (0..IMAGE_COUNT)
            .map(|_| {
                TargetView::create_color(
                    device,
                    "simulated xr image",
                    desc.format,
                    desc.width,
                    desc.height,
                )
            })
            .collect();
        Ok(Box::new(SimulatedSwapchain {
            id,
            images,
            next_image: 0,
            acquired: None,
            waited: false,
            shared: Rc::clone(&self.shared),
        }))
    }
}

struct SimulatedSwapchain {
    id: XrSwapchainId,
    images: Vec<TargetView>,
    next_image: u32,
    acquired: Option<u32>,
    waited: bool,
    shared: Rc<RefCell<Shared>>,
}

impl XrSwapchain for SimulatedSwapchain {
    fn id(&self) -> XrSwapchainId {
        self.id
    }

    fn images(&self) -> &[TargetView] {
        &self.images
    }

    fn acquire_image(&mut self) -> Result<u32, XrError> {
        if self.acquired.is_some() {
            return Err(XrError::call(
                "xrAcquireSwapchainImage",
                "XR_ERROR_CALL_ORDER_INVALID",
            ));
        }
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.images.len() as u32;
        self.acquired = Some(index);
        self.waited = false;
        self.shared.borrow_mut().acquires += 1;
        Ok(index)
    }

    fn wait_image(&mut self, _timeout: Option<Duration>) -> Result<(), XrError> {
        if self.acquired.is_none() || self.waited {
            return Err(XrError::call(
                "xrWaitSwapchainImage",
                "XR_ERROR_CALL_ORDER_INVALID",
            ));
        }
        self.waited = true;
        self.shared.borrow_mut().waits += 1;
        Ok(())
    }

    fn release_image(&mut self) -> Result<(), XrError> {
        if self.acquired.is_none() || !self.waited {
            return Err(XrError::call(
                "xrReleaseSwapchainImage",
                "XR_ERROR_CALL_ORDER_INVALID",
            ));
        }
        self.acquired = None;
        self.waited = false;
        self.shared.borrow_mut().releases += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> XrSwapchainDesc {
        XrSwapchainDesc {
            format: wgpu::TextureFormat::Rgba8Unorm,
            width: 64,
            height: 64,
            sample_count: 1,
        }
    }

    fn session_runtime() -> SimulatedRuntime {
        let mut runtime = SimulatedRuntime::new();
        runtime.create_instance("test", &[]).unwrap();
        runtime.create_system(FormFactor::HeadMounted).unwrap();
        runtime
            .create_session(&GraphicsBinding::Opaque(crate::BackendKind::Null))
            .unwrap();
        runtime
    }

    #[test]
    fn image_protocol_requires_acquire_wait_release() {
        let mut runtime = session_runtime();
        let mut swapchain = runtime.create_swapchain(&GpuDevice::Null, &desc()).unwrap();
        assert_eq!(swapchain.images().len(), IMAGE_COUNT);

        assert!(swapchain.release_image().is_err());
        assert_eq!(swapchain.acquire_image().unwrap(), 0);
        assert!(swapchain.acquire_image().is_err());
        assert!(swapchain.release_image().is_err());
        swapchain.wait_image(None).unwrap();
        swapchain.release_image().unwrap();
        assert_eq!(swapchain.acquire_image().unwrap(), 1);
    }

    #[test]
    fn rejects_unadvertised_formats() {
        let mut runtime = session_runtime();
        let err = runtime
            .create_swapchain(
                &GpuDevice::Null,
                &XrSwapchainDesc {
                    format: wgpu::TextureFormat::Rgba16Float,
                    ..desc()
                },
            )
            .err()
            .unwrap();
        assert!(matches!(err, XrError::Call { call: "xrCreateSwapchain", .. }));
    }

    #[test]
    fn frames_need_a_running_session() {
        let mut runtime = session_runtime();
        assert!(runtime.wait_frame().is_err());
        runtime.begin_session(ViewConfiguration::Stereo).unwrap();
        let first = runtime.wait_frame().unwrap();
        let second = runtime.wait_frame().unwrap();
        assert!(second.predicted_display_time > first.predicted_display_time);
    }

    #[test]
    fn eyes_are_separated_by_ipd() {
        let mut runtime = session_runtime();
        let located = runtime.locate_views(ViewConfiguration::Stereo, 0).unwrap();
        let distance = located.views[1].pose.position - located.views[0].pose.position;
        assert!((distance - Vec3::new(0.064, 0.0, 0.0)).length() < 1e-6);
    }
}
