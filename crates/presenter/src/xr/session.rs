//! Staged XR session manager.
//!
//! Setup happens in three calls that must run in order:
//!
//! ```text
//!   Uninitialized ──create_instance──▶ InstanceReady ──initialize_system──▶ SystemReady
//!                                                                              │
//!                                          SessionReady ◀──initialize_session──┘
//! ```
//!
//! Once the session exists the manager locates views each frame, tracks which
//! eye is being rendered, follows runtime session-state events, and paces XR
//! frames (wait/begin/end with a stereo projection layer).

use std::cell::RefCell;
use std::rc::Rc;

use crate::binding::GraphicsBinding;
use crate::gpu::GpuDevice;

use super::options::{ParsedXrOptions, ViewConfiguration, XrOptions};
use super::runtime::{
    ConfigView, FrameTiming, InstanceProperties, ProjectionView, RuntimeEvent, RuntimeExtension,
    SessionState, XrRuntime, XrSwapchain, XrSwapchainDesc, XrSwapchainId, XrView,
};
use super::XrError;

/// Located views must always describe exactly two eyes.
pub const STEREO_VIEW_COUNT: usize = 2;

pub type SharedXrSession = Rc<RefCell<XrSessionManager>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum XrStage {
    Uninitialized,
    InstanceReady,
    SystemReady,
    SessionReady,
}

/// Session-level notifications surfaced to the frame driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrEvent {
    StateChanged(SessionState),
    /// The runtime asked the application to stop; the session is no longer running.
    Exiting,
    LossPending,
}

#[derive(Debug, Clone, Copy)]
struct EyeSwapchain {
    id: XrSwapchainId,
    width: u32,
    height: u32,
}

pub struct XrSessionManager {
    options: XrOptions,
    runtime: Box<dyn XrRuntime>,
    stage: XrStage,
    parsed: Option<ParsedXrOptions>,
    instance: Option<InstanceProperties>,
    system_id: Option<u64>,
    config_views: Vec<ConfigView>,
    views: Vec<XrView>,
    active_view: usize,
    session_state: SessionState,
    running: bool,
    frame: Option<FrameTiming>,
    views_located: bool,
    eye_swapchains: [Option<EyeSwapchain>; STEREO_VIEW_COUNT],
    rendered_eyes: [bool; STEREO_VIEW_COUNT],
}

impl XrSessionManager {
    pub fn new(options: XrOptions, runtime: Box<dyn XrRuntime>) -> Self {
        Self {
            options,
            runtime,
            stage: XrStage::Uninitialized,
            parsed: None,
            instance: None,
            system_id: None,
            config_views: Vec::new(),
            views: Vec::new(),
            active_view: 0,
            session_state: SessionState::Unknown,
            running: false,
            frame: None,
            views_located: false,
            eye_swapchains: [None; STEREO_VIEW_COUNT],
            rendered_eyes: [false; STEREO_VIEW_COUNT],
        }
    }

    pub fn into_shared(self) -> SharedXrSession {
        Rc::new(RefCell::new(self))
    }

    pub fn stage(&self) -> XrStage {
        self.stage
    }

    pub fn runtime_name(&self) -> &'static str {
        self.runtime.name()
    }

    pub fn instance_properties(&self) -> Option<&InstanceProperties> {
        self.instance.as_ref()
    }

    pub fn system_id(&self) -> Option<u64> {
        self.system_id
    }

    pub fn options(&self) -> &XrOptions {
        &self.options
    }

    pub fn runtime_extensions(&self) -> Result<Vec<RuntimeExtension>, XrError> {
        self.runtime.extensions()
    }

    fn require(&self, call: &'static str, expected: XrStage) -> Result<(), XrError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(XrError::Stage {
                call,
                expected,
                actual: self.stage,
            })
        }
    }

    fn parsed(&self, call: &'static str) -> Result<ParsedXrOptions, XrError> {
        self.parsed.ok_or(XrError::Stage {
            call,
            expected: XrStage::SystemReady,
            actual: self.stage,
        })
    }

    /// Creates the runtime instance with the given extensions. A failure here
    /// leaves the manager uninitialised; the caller may carry on without XR.
    pub fn create_instance(&mut self, extensions: &[&str]) -> Result<(), XrError> {
        self.require("create_instance", XrStage::Uninitialized)?;
        self.log_layers_and_extensions();

        let properties = self
            .runtime
            .create_instance(&self.options.app_name, extensions)?;
        tracing::debug!(?extensions, "XR instance created");
        self.instance = Some(properties);
        self.log_instance_info();
        self.stage = XrStage::InstanceReady;
        Ok(())
    }

    pub fn initialize_system(&mut self) -> Result<(), XrError> {
        self.require("initialize_system", XrStage::InstanceReady)?;
        let parsed = ParsedXrOptions::parse(&self.options)?;

        let system_id = self.runtime.create_system(parsed.form_factor)?;
        tracing::info!(
            system_id,
            form_factor = ?parsed.form_factor,
            "XR system ready"
        );
        self.system_id = Some(system_id);

        self.log_view_configurations(parsed.view_configuration);

        let blend_modes = self.runtime.blend_modes(parsed.view_configuration)?;
        for mode in &blend_modes {
            let selected = *mode == parsed.blend_mode;
            tracing::info!(
                blend_mode = ?mode,
                "environment blend mode{}",
                if selected { " (selected)" } else { "" }
            );
        }
        if !blend_modes.contains(&parsed.blend_mode) {
            tracing::warn!(
                blend_mode = ?parsed.blend_mode,
                "selected environment blend mode not listed by the runtime"
            );
        }

        self.config_views = self.runtime.config_views(parsed.view_configuration)?;
        self.parsed = Some(parsed);
        self.stage = XrStage::SystemReady;
        Ok(())
    }

    pub fn initialize_session(&mut self, binding: &GraphicsBinding) -> Result<(), XrError> {
        self.require("initialize_session", XrStage::SystemReady)?;
        let parsed = self.parsed("initialize_session")?;

        self.runtime.create_session(binding)?;
        tracing::info!(binding = ?binding, "XR session created");
        self.runtime.create_reference_space(&parsed.app_space)?;
        tracing::debug!(
            space = ?parsed.app_space.kind,
            position = ?parsed.app_space.pose.position,
            "XR application space created"
        );

        self.session_state = SessionState::Idle;
        self.stage = XrStage::SessionReady;
        Ok(())
    }

    /// Tears the session down, returning the manager to `SystemReady`.
    pub fn release_session(&mut self) {
        if self.stage != XrStage::SessionReady {
            return;
        }
        self.runtime.destroy_session();
        self.running = false;
        self.frame = None;
        self.views_located = false;
        self.eye_swapchains = [None; STEREO_VIEW_COUNT];
        self.session_state = SessionState::Unknown;
        self.stage = XrStage::SystemReady;
        tracing::info!("XR session released");
    }

    pub fn config_views(&self) -> &[ConfigView] {
        &self.config_views
    }

    pub fn view_configuration(&self) -> Option<ViewConfiguration> {
        self.parsed.map(|parsed| parsed.view_configuration)
    }

    pub fn active_view(&self) -> usize {
        self.active_view
    }

    pub fn set_active_view(&mut self, eye: usize) {
        self.active_view = eye;
    }

    /// Locates both eyes at the current frame's predicted display time.
    pub fn locate_views(&mut self) -> Result<&[XrView], XrError> {
        self.require("locate_views", XrStage::SessionReady)?;
        let parsed = self.parsed("locate_views")?;
        let display_time = self
            .frame
            .map(|frame| frame.predicted_display_time)
            .unwrap_or_default();

        let located = self
            .runtime
            .locate_views(parsed.view_configuration, display_time)?;
        if !located.position_valid || !located.orientation_valid {
            tracing::error!(
                position_valid = located.position_valid,
                orientation_valid = located.orientation_valid,
                "XR view tracking invalid"
            );
            return Err(XrError::TrackingLost {
                position: located.position_valid,
                orientation: located.orientation_valid,
            });
        }
        if located.views.len() != STEREO_VIEW_COUNT {
            return Err(XrError::ViewCountMismatch {
                expected: STEREO_VIEW_COUNT,
                actual: located.views.len(),
            });
        }

        self.views = located.views;
        self.views_located = true;
        Ok(&self.views)
    }

    pub fn views(&self) -> &[XrView] {
        &self.views
    }

    pub fn view(&self, eye: usize) -> Option<XrView> {
        self.views.get(eye).copied()
    }

    pub fn views_located(&self) -> bool {
        self.views_located
    }

    pub fn session_state(&self) -> SessionState {
        self.session_state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Drains runtime events, beginning or ending the session as the runtime requests.
    pub fn poll_events(&mut self) -> Result<Vec<XrEvent>, XrError> {
        let mut events = Vec::new();
        if self.stage != XrStage::SessionReady {
            return Ok(events);
        }
        let parsed = self.parsed("poll_events")?;

        while let Some(event) = self.runtime.poll_event()? {
            match event {
                RuntimeEvent::StateChanged(state) => {
                    tracing::info!(from = ?self.session_state, to = ?state, "XR session state changed");
                    self.session_state = state;
                    events.push(XrEvent::StateChanged(state));
                    match state {
                        SessionState::Ready => {
                            self.runtime.begin_session(parsed.view_configuration)?;
                            self.running = true;
                        }
                        SessionState::Stopping => {
                            self.runtime.end_session()?;
                            self.running = false;
                        }
                        SessionState::Exiting => {
                            self.running = false;
                            events.push(XrEvent::Exiting);
                        }
                        SessionState::LossPending => {
                            self.running = false;
                            events.push(XrEvent::LossPending);
                        }
                        _ => {}
                    }
                }
                RuntimeEvent::InstanceLossPending => {
                    tracing::warn!("XR instance loss pending");
                    self.running = false;
                    events.push(XrEvent::LossPending);
                }
                RuntimeEvent::EventsLost(count) => {
                    tracing::warn!(count, "XR runtime dropped events");
                }
            }
        }
        Ok(events)
    }

    /// Waits for and begins the next XR frame. Returns whether the runtime
    /// wants content this frame; `false` without a call when not running.
    pub fn begin_frame(&mut self) -> Result<bool, XrError> {
        self.views_located = false;
        self.rendered_eyes = [false; STEREO_VIEW_COUNT];
        if !self.running {
            self.frame = None;
            return Ok(false);
        }

        let timing = self.runtime.wait_frame()?;
        self.runtime.begin_frame()?;
        self.frame = Some(timing);
        Ok(timing.should_render)
    }

    pub fn should_render(&self) -> bool {
        self.running && self.frame.is_some_and(|frame| frame.should_render)
    }

    pub fn mark_eye_rendered(&mut self, eye: usize) {
        if let Some(slot) = self.rendered_eyes.get_mut(eye) {
            *slot = true;
        }
    }

    /// Ends the frame begun by [`Self::begin_frame`], submitting the projection
    /// layer when both eyes were rendered.
    pub fn end_frame(&mut self) -> Result<(), XrError> {
        let Some(timing) = self.frame.take() else {
            return Ok(());
        };
        let parsed = self.parsed("end_frame")?;

        let layer = self.projection_layer(&timing);
        self.runtime
            .end_frame(&timing, parsed.blend_mode, layer.as_deref())?;
        self.views_located = false;
        Ok(())
    }

    /// Ends an open frame without submitting a layer. Used when rendering
    /// failed after [`Self::begin_frame`].
    pub fn discard_frame(&mut self) -> Result<(), XrError> {
        self.views_located = false;
        let Some(timing) = self.frame.take() else {
            return Ok(());
        };
        let parsed = self.parsed("discard_frame")?;
        tracing::debug!(
            display_time = timing.predicted_display_time,
            "XR frame discarded"
        );
        self.runtime.end_frame(&timing, parsed.blend_mode, None)
    }

    fn projection_layer(&self, timing: &FrameTiming) -> Option<Vec<ProjectionView>> {
        if !timing.should_render || !self.views_located {
            return None;
        }
        let mut layer = Vec::with_capacity(STEREO_VIEW_COUNT);
        for eye in 0..STEREO_VIEW_COUNT {
            if !self.rendered_eyes[eye] {
                return None;
            }
            let swapchain = self.eye_swapchains[eye]?;
            layer.push(ProjectionView {
                swapchain: swapchain.id,
                width: swapchain.width,
                height: swapchain.height,
                view: *self.views.get(eye)?,
            });
        }
        Some(layer)
    }

    pub fn swapchain_formats(&self) -> Result<Vec<wgpu::TextureFormat>, XrError> {
        self.require("swapchain_formats", XrStage::SessionReady)?;
        self.runtime.swapchain_formats()
    }

    pub fn create_swapchain(
        &mut self,
        device: &GpuDevice,
        desc: &XrSwapchainDesc,
    ) -> Result<Box<dyn XrSwapchain>, XrError> {
        self.require("create_swapchain", XrStage::SessionReady)?;
        let swapchain = self.runtime.create_swapchain(device, desc)?;
        tracing::debug!(
            id = swapchain.id().0,
            format = ?desc.format,
            width = desc.width,
            height = desc.height,
            samples = desc.sample_count,
            images = swapchain.images().len(),
            "XR swapchain created"
        );
        Ok(swapchain)
    }

    pub fn register_eye_swapchain(
        &mut self,
        eye: usize,
        id: XrSwapchainId,
        width: u32,
        height: u32,
    ) {
        if let Some(slot) = self.eye_swapchains.get_mut(eye) {
            *slot = Some(EyeSwapchain { id, width, height });
        }
    }

    pub fn log_layers_and_extensions(&self) {
        match self.runtime.api_layers() {
            Ok(layers) => {
                tracing::info!(count = layers.len(), "available XR API layers");
                for layer in layers {
                    tracing::debug!(
                        name = %layer.name,
                        version = layer.version,
                        description = %layer.description,
                        "XR API layer"
                    );
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to enumerate XR API layers"),
        }

        match self.runtime.extensions() {
            Ok(extensions) => {
                tracing::info!(count = extensions.len(), "available XR extensions");
                for extension in extensions {
                    tracing::debug!(
                        name = %extension.name,
                        version = extension.version,
                        "XR extension"
                    );
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to enumerate XR extensions"),
        }
    }

    pub fn log_instance_info(&self) {
        if let Some(properties) = &self.instance {
            tracing::info!(
                runtime = %properties.runtime_name,
                version = %properties.runtime_version,
                "XR instance"
            );
        }
    }

    pub fn log_view_configurations(&self, selected: ViewConfiguration) {
        let reports = match self.runtime.view_configurations() {
            Ok(reports) => reports,
            Err(err) => {
                tracing::warn!(error = %err, "failed to enumerate XR view configurations");
                return;
            }
        };

        for report in reports {
            let is_selected = report.configuration == Some(selected);
            tracing::info!(
                configuration = %report.name,
                fov_mutable = report.fov_mutable,
                views = report.views.len(),
                "XR view configuration{}",
                if is_selected { " (selected)" } else { "" }
            );
            for (index, view) in report.views.iter().enumerate() {
                tracing::debug!(
                    index,
                    recommended_width = view.recommended_width,
                    recommended_height = view.recommended_height,
                    max_width = view.max_width,
                    max_height = view.max_height,
                    recommended_samples = view.recommended_samples,
                    max_samples = view.max_samples,
                    "XR view"
                );
            }
        }
    }
}

impl std::fmt::Debug for XrSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XrSessionManager")
            .field("runtime", &self.runtime.name())
            .field("stage", &self.stage)
            .field("session_state", &self.session_state)
            .field("running", &self.running)
            .field("active_view", &self.active_view)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BackendKind;
    use crate::xr::{SimulatedConfig, SimulatedRuntime};

    fn manager(options: XrOptions) -> (XrSessionManager, crate::xr::SimulatedControl) {
        let runtime = SimulatedRuntime::new();
        let control = runtime.control();
        (XrSessionManager::new(options, Box::new(runtime)), control)
    }

    fn ready_manager() -> (XrSessionManager, crate::xr::SimulatedControl) {
        let (mut manager, control) = manager(XrOptions::default());
        manager.create_instance(&[]).unwrap();
        manager.initialize_system().unwrap();
        manager
            .initialize_session(&GraphicsBinding::Opaque(BackendKind::Null))
            .unwrap();
        (manager, control)
    }

    #[test]
    fn stages_advance_in_order() {
        let (mut manager, _) = manager(XrOptions::default());
        assert_eq!(manager.stage(), XrStage::Uninitialized);
        manager.create_instance(&[]).unwrap();
        assert_eq!(manager.stage(), XrStage::InstanceReady);
        assert!(manager.instance_properties().is_some());
        manager.initialize_system().unwrap();
        assert_eq!(manager.stage(), XrStage::SystemReady);
        assert_eq!(manager.config_views().len(), 2);
        manager
            .initialize_session(&GraphicsBinding::Opaque(BackendKind::Null))
            .unwrap();
        assert_eq!(manager.stage(), XrStage::SessionReady);
        assert_eq!(manager.session_state(), SessionState::Idle);
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let (mut manager, _) = manager(XrOptions::default());
        let err = manager.initialize_system().unwrap_err();
        assert!(matches!(
            err,
            XrError::Stage {
                expected: XrStage::InstanceReady,
                actual: XrStage::Uninitialized,
                ..
            }
        ));
        assert!(manager.locate_views().is_err());

        manager.create_instance(&[]).unwrap();
        assert!(manager.create_instance(&[]).is_err());
        assert!(manager
            .initialize_session(&GraphicsBinding::Opaque(BackendKind::Null))
            .is_err());
    }

    #[test]
    fn instance_failure_is_reported_and_leaves_manager_uninitialized() {
        let runtime = SimulatedRuntime::with_config(SimulatedConfig {
            fail_instance: true,
            ..SimulatedConfig::default()
        });
        let mut manager = XrSessionManager::new(XrOptions::default(), Box::new(runtime));
        assert!(manager.create_instance(&[]).is_err());
        assert_eq!(manager.stage(), XrStage::Uninitialized);
    }

    #[test]
    fn unknown_option_fails_system_initialisation() {
        let (mut manager, _) = manager(XrOptions {
            form_factor: "Wristwatch".into(),
            ..XrOptions::default()
        });
        manager.create_instance(&[]).unwrap();
        let err = manager.initialize_system().unwrap_err();
        assert!(matches!(err, XrError::Config { option: "form_factor", .. }));
        assert_eq!(manager.stage(), XrStage::InstanceReady);
    }

    #[test]
    fn unlisted_blend_mode_still_reaches_system_ready() {
        let (mut manager, _) = manager(XrOptions {
            environment_blend_mode: "AlphaBlend".into(),
            ..XrOptions::default()
        });
        manager.create_instance(&[]).unwrap();
        manager.initialize_system().unwrap();
        assert_eq!(manager.stage(), XrStage::SystemReady);
    }

    #[test]
    fn unknown_blend_mode_string_is_a_config_error() {
        let (mut manager, _) = manager(XrOptions {
            environment_blend_mode: "Translucent".into(),
            ..XrOptions::default()
        });
        manager.create_instance(&[]).unwrap();
        let err = manager.initialize_system().unwrap_err();
        assert!(matches!(
            err,
            XrError::Config {
                option: "environment_blend_mode",
                ..
            }
        ));
        assert_eq!(manager.stage(), XrStage::InstanceReady);
    }

    #[test]
    fn locate_views_returns_two_eyes() {
        let (mut manager, _) = ready_manager();
        let views = manager.locate_views().unwrap();
        assert_eq!(views.len(), STEREO_VIEW_COUNT);
        assert!(views[0].pose.position.x < views[1].pose.position.x);
        assert!(manager.views_located());
    }

    #[test]
    fn lost_tracking_is_fatal() {
        let (mut manager, control) = ready_manager();
        control.set_tracking(true, false);
        let err = manager.locate_views().unwrap_err();
        assert_eq!(
            err,
            XrError::TrackingLost {
                position: true,
                orientation: false
            }
        );
    }

    #[test]
    fn wrong_view_count_is_fatal() {
        let (mut manager, control) = ready_manager();
        control.set_view_count(1);
        let err = manager.locate_views().unwrap_err();
        assert_eq!(
            err,
            XrError::ViewCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn ready_event_starts_session_and_frames() {
        let (mut manager, control) = ready_manager();
        assert!(!manager.is_running());
        assert!(!manager.begin_frame().unwrap());

        let events = manager.poll_events().unwrap();
        assert!(events.contains(&XrEvent::StateChanged(SessionState::Ready)));
        assert!(manager.is_running());

        assert!(manager.begin_frame().unwrap());
        assert!(manager.should_render());
        manager.end_frame().unwrap();
        assert_eq!(control.frames_ended(), 1);
        assert_eq!(control.layers_submitted(), 0);
    }

    #[test]
    fn exit_request_stops_session() {
        let (mut manager, control) = ready_manager();
        manager.poll_events().unwrap();
        control.request_exit();
        let events = manager.poll_events().unwrap();
        assert!(events.contains(&XrEvent::Exiting));
        assert!(!manager.is_running());
    }

    #[test]
    fn active_view_is_tracked() {
        let (mut manager, _) = ready_manager();
        assert_eq!(manager.active_view(), 0);
        manager.set_active_view(1);
        assert_eq!(manager.active_view(), 1);
    }
}
