//! [`XrRuntime`] backed by the system OpenXR loader.
//!
//! Only the Vulkan graphics binding is wired up: the session shares the
//! presenter's `wgpu` Vulkan device, and runtime swapchain images are wrapped
//! as `wgpu` textures through `wgpu-hal`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use ash::vk::{self, Handle};
use openxr as xr;
use wgpu::hal::api::Vulkan;

use crate::backend::XR_VULKAN_EXTENSION;
use crate::binding::{GraphicsBinding, VulkanHandles};
use crate::gpu::{GpuDevice, TargetView};

use super::options::{
    BlendMode, FormFactor, Pose, ReferenceSpace, ReferenceSpaceKind, ViewConfiguration,
};
use super::runtime::{
    ApiLayer, ConfigView, Fov, FrameTiming, InstanceProperties, LocatedViews, ProjectionView,
    RuntimeEvent, RuntimeExtension, SessionState, ViewConfigurationReport, XrRuntime,
    XrSwapchain, XrSwapchainDesc, XrSwapchainId, XrView,
};
use super::XrError;

const ENGINE_NAME: &str = "presenter";

type SharedSwapchain = Rc<RefCell<xr::Swapchain<xr::Vulkan>>>;
type SwapchainRef = Weak<RefCell<xr::Swapchain<xr::Vulkan>>>;

struct VulkanSession {
    // Owned by the swapchain objects handed out; dropped before the session.
    swapchains: HashMap<XrSwapchainId, SwapchainRef>,
    space: Option<xr::Space>,
    stream: xr::FrameStream<xr::Vulkan>,
    waiter: xr::FrameWaiter,
    session: xr::Session<xr::Vulkan>,
}

pub struct OpenXrRuntime {
    session: Option<VulkanSession>,
    system: Option<xr::SystemId>,
    instance: Option<xr::Instance>,
    event_storage: xr::EventDataBuffer,
    next_swapchain_id: u64,
    entry: xr::Entry,
}

impl OpenXrRuntime {
    /// Loads the OpenXR loader library.
    pub fn load() -> Result<Self, XrError> {
        let entry = unsafe { xr::Entry::load() }
            .map_err(|err| XrError::Unavailable(format!("OpenXR loader: {err}")))?;
        Ok(Self {
            session: None,
            system: None,
            instance: None,
            event_storage: xr::EventDataBuffer::new(),
            next_swapchain_id: 1,
            entry,
        })
    }

    fn instance(&self, call: &'static str) -> Result<&xr::Instance, XrError> {
        self.instance
            .as_ref()
            .ok_or_else(|| XrError::call(call, "XR_ERROR_HANDLE_INVALID"))
    }

    fn system(&self, call: &'static str) -> Result<(&xr::Instance, xr::SystemId), XrError> {
        let instance = self.instance(call)?;
        let system = self
            .system
            .ok_or_else(|| XrError::call(call, "XR_ERROR_SYSTEM_INVALID"))?;
        Ok((instance, system))
    }

    fn session(&self, call: &'static str) -> Result<&VulkanSession, XrError> {
        self.session
            .as_ref()
            .ok_or_else(|| XrError::call(call, "XR_ERROR_SESSION_NOT_READY"))
    }

    fn session_mut(&mut self, call: &'static str) -> Result<&mut VulkanSession, XrError> {
        self.session
            .as_mut()
            .ok_or_else(|| XrError::call(call, "XR_ERROR_SESSION_NOT_READY"))
    }
}

impl XrRuntime for OpenXrRuntime {
    fn name(&self) -> &'static str {
        "openxr"
    }

    fn api_layers(&self) -> Result<Vec<ApiLayer>, XrError> {
        let layers = self
            .entry
            .enumerate_layers()
            .map_err(|err| XrError::call("xrEnumerateApiLayerProperties", err))?;
        Ok(layers
            .into_iter()
            .map(|layer| ApiLayer {
                name: layer.layer_name,
                description: layer.description,
                version: layer.layer_version,
            })
            .collect())
    }

    /// Extension versions are not surfaced by the loader bindings and are
    /// reported as `0`.
    fn extensions(&self) -> Result<Vec<RuntimeExtension>, XrError> {
        let set = self
            .entry
            .enumerate_extensions()
            .map_err(|err| XrError::call("xrEnumerateInstanceExtensionProperties", err))?;
        Ok(extension_names(&set)
            .into_iter()
            .map(|name| RuntimeExtension { name, version: 0 })
            .collect())
    }

    fn create_instance(
        &mut self,
        app_name: &str,
        extensions: &[&str],
    ) -> Result<InstanceProperties, XrError> {
        let enabled = extension_set(extensions);
        let instance = self
            .entry
            .create_instance(
                &xr::ApplicationInfo {
                    application_name: app_name,
                    application_version: 0,
                    engine_name: ENGINE_NAME,
                    engine_version: 0,
                    api_version: xr::Version::new(1, 0, 0),
                },
                &enabled,
                &[],
            )
            .map_err(|err| XrError::call("xrCreateInstance", err))?;
        let properties = instance
            .properties()
            .map_err(|err| XrError::call("xrGetInstanceProperties", err))?;
        self.instance = Some(instance);
        Ok(InstanceProperties {
            runtime_name: properties.runtime_name,
            runtime_version: properties.runtime_version.to_string(),
        })
    }

    fn create_system(&mut self, form_factor: FormFactor) -> Result<u64, XrError> {
        let system = self
            .instance("xrGetSystem")?
            .system(xr_form_factor(form_factor))
            .map_err(|err| XrError::call("xrGetSystem", err))?;
        self.system = Some(system);
        Ok(system.into_raw())
    }

    fn view_configurations(&self) -> Result<Vec<ViewConfigurationReport>, XrError> {
        let (instance, system) = self.system("xrEnumerateViewConfigurations")?;
        let types = instance
            .enumerate_view_configurations(system)
            .map_err(|err| XrError::call("xrEnumerateViewConfigurations", err))?;

        let mut reports = Vec::with_capacity(types.len());
        for ty in types {
            let properties = instance
                .view_configuration_properties(system, ty)
                .map_err(|err| XrError::call("xrGetViewConfigurationProperties", err))?;
            let views = instance
                .enumerate_view_configuration_views(system, ty)
                .map_err(|err| XrError::call("xrEnumerateViewConfigurationViews", err))?;
            reports.push(ViewConfigurationReport {
                name: format!("{ty:?}"),
                configuration: view_configuration_from(ty),
                fov_mutable: properties.fov_mutable,
                views: views.iter().map(config_view).collect(),
            });
        }
        Ok(reports)
    }

    fn blend_modes(&self, configuration: ViewConfiguration) -> Result<Vec<BlendMode>, XrError> {
        let (instance, system) = self.system("xrEnumerateEnvironmentBlendModes")?;
        let modes = instance
            .enumerate_environment_blend_modes(system, xr_view_configuration(configuration))
            .map_err(|err| XrError::call("xrEnumerateEnvironmentBlendModes", err))?;
        Ok(modes.into_iter().filter_map(blend_mode_from).collect())
    }

    fn config_views(&self, configuration: ViewConfiguration) -> Result<Vec<ConfigView>, XrError> {
        let (instance, system) = self.system("xrEnumerateViewConfigurationViews")?;
        let views = instance
            .enumerate_view_configuration_views(system, xr_view_configuration(configuration))
            .map_err(|err| XrError::call("xrEnumerateViewConfigurationViews", err))?;
        Ok(views.iter().map(config_view).collect())
    }

    fn create_session(&mut self, binding: &GraphicsBinding) -> Result<(), XrError> {
        let GraphicsBinding::Vulkan(handles) = binding else {
            return Err(XrError::Binding(format!(
                "OpenXR sessions need a Vulkan device, got {binding:?}"
            )));
        };
        let (instance, system) = self.system("xrCreateSession")?;

        let requirements = instance
            .graphics_requirements::<xr::Vulkan>(system)
            .map_err(|err| XrError::call("xrGetVulkanGraphicsRequirements2KHR", err))?;
        tracing::debug!(
            min = %requirements.min_api_version_supported,
            max = %requirements.max_api_version_supported,
            "OpenXR Vulkan requirements"
        );

        let info = session_create_info(handles);
        let (session, waiter, stream) = unsafe {
            instance
                .create_session::<xr::Vulkan>(system, &info)
                .map_err(|err| XrError::call("xrCreateSession", err))?
        };
        self.session = Some(VulkanSession {
            swapchains: HashMap::new(),
            space: None,
            stream,
            waiter,
            session,
        });
        Ok(())
    }

    fn destroy_session(&mut self) {
        self.session = None;
    }

    fn create_reference_space(&mut self, space: &ReferenceSpace) -> Result<(), XrError> {
        let session = self.session_mut("xrCreateReferenceSpace")?;
        let created = session
            .session
            .create_reference_space(xr_reference_space(space.kind), xr_pose(&space.pose))
            .map_err(|err| XrError::call("xrCreateReferenceSpace", err))?;
        session.space = Some(created);
        Ok(())
    }

    fn poll_event(&mut self) -> Result<Option<RuntimeEvent>, XrError> {
        let Some(instance) = self.instance.as_ref() else {
            return Ok(None);
        };
        loop {
            let event = instance
                .poll_event(&mut self.event_storage)
                .map_err(|err| XrError::call("xrPollEvent", err))?;
            let mapped = match event {
                None => return Ok(None),
                Some(xr::Event::SessionStateChanged(changed)) => {
                    RuntimeEvent::StateChanged(session_state_from(changed.state()))
                }
                Some(xr::Event::InstanceLossPending(_)) => RuntimeEvent::InstanceLossPending,
                Some(xr::Event::EventsLost(lost)) => {
                    RuntimeEvent::EventsLost(lost.lost_event_count())
                }
                Some(_) => continue,
            };
            return Ok(Some(mapped));
        }
    }

    fn begin_session(&mut self, configuration: ViewConfiguration) -> Result<(), XrError> {
        self.session("xrBeginSession")?
            .session
            .begin(xr_view_configuration(configuration))
            .map_err(|err| XrError::call("xrBeginSession", err))?;
        Ok(())
    }

    fn end_session(&mut self) -> Result<(), XrError> {
        self.session("xrEndSession")?
            .session
            .end()
            .map_err(|err| XrError::call("xrEndSession", err))?;
        Ok(())
    }

    fn wait_frame(&mut self) -> Result<FrameTiming, XrError> {
        let state = self
            .session_mut("xrWaitFrame")?
            .waiter
            .wait()
            .map_err(|err| XrError::call("xrWaitFrame", err))?;
        Ok(FrameTiming {
            predicted_display_time: state.predicted_display_time.as_nanos(),
            should_render: state.should_render,
        })
    }

    fn begin_frame(&mut self) -> Result<(), XrError> {
        self.session_mut("xrBeginFrame")?
            .stream
            .begin()
            .map_err(|err| XrError::call("xrBeginFrame", err))?;
        Ok(())
    }

    fn end_frame(
        &mut self,
        timing: &FrameTiming,
        blend_mode: BlendMode,
        layer: Option<&[ProjectionView]>,
    ) -> Result<(), XrError> {
        let session = self.session_mut("xrEndFrame")?;
        let display_time = xr::Time::from_nanos(timing.predicted_display_time);
        let blend_mode = xr_blend_mode(blend_mode);

        let (Some(layer), Some(space)) = (layer, session.space.as_ref()) else {
            return session
                .stream
                .end(display_time, blend_mode, &[])
                .map_err(|err| XrError::call("xrEndFrame", err));
        };

        let handles = layer
            .iter()
            .map(|view| {
                session
                    .swapchains
                    .get(&view.swapchain)
                    .and_then(Weak::upgrade)
                    .ok_or_else(|| XrError::call("xrEndFrame", "XR_ERROR_HANDLE_INVALID"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let borrowed = handles.iter().map(|handle| handle.borrow()).collect::<Vec<_>>();

        let views = layer
            .iter()
            .zip(&borrowed)
            .map(|(view, swapchain)| {
                xr::CompositionLayerProjectionView::new()
                    .pose(xr_pose(&view.view.pose))
                    .fov(xr_fov(&view.view.fov))
                    .sub_image(
                        xr::SwapchainSubImage::new()
                            .swapchain(&**swapchain)
                            .image_rect(xr::Rect2Di {
                                offset: xr::Offset2Di { x: 0, y: 0 },
                                extent: xr::Extent2Di {
                                    width: view.width as i32,
                                    height: view.height as i32,
                                },
                            }),
                    )
            })
            .collect::<Vec<_>>();
        let projection = xr::CompositionLayerProjection::new()
            .space(space)
            .views(&views);

        session
            .stream
            .end(display_time, blend_mode, &[&projection])
            .map_err(|err| XrError::call("xrEndFrame", err))
    }

    fn locate_views(
        &mut self,
        configuration: ViewConfiguration,
        display_time: i64,
    ) -> Result<LocatedViews, XrError> {
        let session = self.session("xrLocateViews")?;
        let space = session
            .space
            .as_ref()
            .ok_or_else(|| XrError::call("xrLocateViews", "XR_ERROR_HANDLE_INVALID"))?;
        let (flags, views) = session
            .session
            .locate_views(
                xr_view_configuration(configuration),
                xr::Time::from_nanos(display_time),
                space,
            )
            .map_err(|err| XrError::call("xrLocateViews", err))?;
        Ok(LocatedViews {
            position_valid: flags.contains(xr::ViewStateFlags::POSITION_VALID),
            orientation_valid: flags.contains(xr::ViewStateFlags::ORIENTATION_VALID),
            views: views
                .iter()
                .map(|view| XrView {
                    pose: pose_from(&view.pose),
                    fov: Fov {
                        angle_left: view.fov.angle_left,
                        angle_right: view.fov.angle_right,
                        angle_up: view.fov.angle_up,
                        angle_down: view.fov.angle_down,
                    },
                })
                .collect(),
        })
    }

    fn swapchain_formats(&self) -> Result<Vec<wgpu::TextureFormat>, XrError> {
        let formats = self
            .session("xrEnumerateSwapchainFormats")?
            .session
            .enumerate_swapchain_formats()
            .map_err(|err| XrError::call("xrEnumerateSwapchainFormats", err))?;
        Ok(formats
            .into_iter()
            .filter_map(|raw| texture_format_from_vk(vk::Format::from_raw(raw as i32)))
            .collect())
    }

    fn create_swapchain(
        &mut self,
        device: &GpuDevice,
        desc: &XrSwapchainDesc,
    ) -> Result<Box<dyn XrSwapchain>, XrError> {
        let vk_format = vk_format_from(desc.format).ok_or_else(|| XrError::Unsupported {
            what: "swapchain format",
            value: format!("{:?}", desc.format),
        })?;
        let id = XrSwapchainId(self.next_swapchain_id);
        let session = self.session_mut("xrCreateSwapchain")?;

        let swapchain = session
            .session
            .create_swapchain(&xr::SwapchainCreateInfo {
                create_flags: xr::SwapchainCreateFlags::EMPTY,
                usage_flags: xr::SwapchainUsageFlags::COLOR_ATTACHMENT
                    | xr::SwapchainUsageFlags::TRANSFER_DST,
                format: vk_format.as_raw() as u32,
                sample_count: desc.sample_count.max(1),
                width: desc.width,
                height: desc.height,
                face_count: 1,
                array_size: 1,
                mip_count: 1,
            })
            .map_err(|err| XrError::call("xrCreateSwapchain", err))?;
        let raw_images = swapchain
            .enumerate_images()
            .map_err(|err| XrError::call("xrEnumerateSwapchainImages", err))?;
        let images = raw_images
            .into_iter()
            .map(|raw| wrap_image(device, vk::Image::from_raw(raw), desc))
            .collect::<Result<Vec<_>, _>>()?;

        let handle = Rc::new(RefCell::new(swapchain));
        session
            .swapchains
            .retain(|_, existing| existing.strong_count() > 0);
        session.swapchains.insert(id, Rc::downgrade(&handle));
        self.next_swapchain_id += 1;
        Ok(Box::new(OpenXrSwapchain { id, handle, images }))
    }
}

struct OpenXrSwapchain {
    // Textures alias runtime-owned images; drop them before the handle.
    images: Vec<TargetView>,
    id: XrSwapchainId,
    handle: SharedSwapchain,
}

impl XrSwapchain for OpenXrSwapchain {
    fn id(&self) -> XrSwapchainId {
        self.id
    }

    fn images(&self) -> &[TargetView] {
        &self.images
    }

    fn acquire_image(&mut self) -> Result<u32, XrError> {
        self.handle
            .borrow_mut()
            .acquire_image()
            .map_err(|err| XrError::call("xrAcquireSwapchainImage", err))
    }

    fn wait_image(&mut self, timeout: Option<Duration>) -> Result<(), XrError> {
        let timeout = match timeout {
            Some(timeout) => {
                xr::Duration::from_nanos(i64::try_from(timeout.as_nanos()).unwrap_or(i64::MAX))
            }
            None => xr::Duration::INFINITE,
        };
        self.handle
            .borrow_mut()
            .wait_image(timeout)
            .map_err(|err| XrError::call("xrWaitSwapchainImage", err))
    }

    fn release_image(&mut self) -> Result<(), XrError> {
        self.handle
            .borrow_mut()
            .release_image()
            .map_err(|err| XrError::call("xrReleaseSwapchainImage", err))
    }
}

/// Wraps one runtime-owned Vulkan image as a render target on `device`.
fn wrap_image(
    device: &GpuDevice,
    image: vk::Image,
    desc: &XrSwapchainDesc,
) -> Result<TargetView, XrError> {
    let Some(gpu) = device.as_wgpu() else {
        return Ok(TargetView::Null {
            width: desc.width,
            height: desc.height,
            format: desc.format,
        });
    };

    let size = wgpu::Extent3d {
        width: desc.width,
        height: desc.height,
        depth_or_array_layers: 1,
    };
    let sample_count = desc.sample_count.max(1);
    let hal_texture = {
        let hal_device = unsafe { gpu.device.as_hal::<Vulkan>() }.ok_or_else(|| {
            XrError::Binding("XR swapchains need the Vulkan backend".into())
        })?;
        let hal_desc = wgpu::hal::TextureDescriptor {
            label: Some("xr swapchain image"),
            size,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: wgpu::TextureUses::COLOR_TARGET | wgpu::TextureUses::COPY_DST,
            memory_flags: wgpu::hal::MemoryFlags::empty(),
            view_formats: Vec::new(),
        };
        unsafe { hal_device.texture_from_raw(image, &hal_desc, None) }
    };

    let texture = unsafe {
        gpu.device.create_texture_from_hal::<Vulkan>(
            hal_texture,
            &wgpu::TextureDescriptor {
                label: Some("xr swapchain image"),
                size,
                mip_level_count: 1,
                sample_count,
                dimension: wgpu::TextureDimension::D2,
                format: desc.format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
        )
    };
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    Ok(TargetView::Wgpu {
        view,
        texture: Some(texture),
    })
}

fn session_create_info(handles: &VulkanHandles) -> xr::vulkan::SessionCreateInfo {
    xr::vulkan::SessionCreateInfo {
        instance: handles.instance as _,
        physical_device: handles.physical_device as _,
        device: handles.device as _,
        queue_family_index: handles.queue_family_index,
        queue_index: handles.queue_index,
    }
}

/// Names of the advertised extensions this runtime cares about. Only the
/// Vulkan binding has a typed flag; the rest arrive through `other`.
fn extension_names(set: &xr::ExtensionSet) -> Vec<String> {
    let mut names = Vec::new();
    if set.khr_vulkan_enable2 {
        names.push(XR_VULKAN_EXTENSION.to_string());
    }
    names.extend(set.other.iter().cloned());
    names
}

fn extension_set(names: &[&str]) -> xr::ExtensionSet {
    let mut set = xr::ExtensionSet::default();
    for name in names {
        if *name == XR_VULKAN_EXTENSION {
            set.khr_vulkan_enable2 = true;
        } else {
            set.other.push(name.to_string());
        }
    }
    set
}

fn config_view(view: &xr::ViewConfigurationView) -> ConfigView {
    ConfigView {
        recommended_width: view.recommended_image_rect_width,
        recommended_height: view.recommended_image_rect_height,
        max_width: view.max_image_rect_width,
        max_height: view.max_image_rect_height,
        recommended_samples: view.recommended_swapchain_sample_count,
        max_samples: view.max_swapchain_sample_count,
    }
}

fn xr_form_factor(form_factor: FormFactor) -> xr::FormFactor {
    match form_factor {
        FormFactor::HeadMounted => xr::FormFactor::HEAD_MOUNTED_DISPLAY,
        FormFactor::Handheld => xr::FormFactor::HANDHELD_DISPLAY,
    }
}

fn xr_view_configuration(configuration: ViewConfiguration) -> xr::ViewConfigurationType {
    match configuration {
        ViewConfiguration::Mono => xr::ViewConfigurationType::PRIMARY_MONO,
        ViewConfiguration::Stereo => xr::ViewConfigurationType::PRIMARY_STEREO,
    }
}

fn view_configuration_from(ty: xr::ViewConfigurationType) -> Option<ViewConfiguration> {
    match ty {
        xr::ViewConfigurationType::PRIMARY_MONO => Some(ViewConfiguration::Mono),
        xr::ViewConfigurationType::PRIMARY_STEREO => Some(ViewConfiguration::Stereo),
        _ => None,
    }
}

fn xr_blend_mode(mode: BlendMode) -> xr::EnvironmentBlendMode {
    match mode {
        BlendMode::Opaque => xr::EnvironmentBlendMode::OPAQUE,
        BlendMode::Additive => xr::EnvironmentBlendMode::ADDITIVE,
        BlendMode::AlphaBlend => xr::EnvironmentBlendMode::ALPHA_BLEND,
    }
}

fn blend_mode_from(mode: xr::EnvironmentBlendMode) -> Option<BlendMode> {
    match mode {
        xr::EnvironmentBlendMode::OPAQUE => Some(BlendMode::Opaque),
        xr::EnvironmentBlendMode::ADDITIVE => Some(BlendMode::Additive),
        xr::EnvironmentBlendMode::ALPHA_BLEND => Some(BlendMode::AlphaBlend),
        _ => None,
    }
}

fn xr_reference_space(kind: ReferenceSpaceKind) -> xr::ReferenceSpaceType {
    match kind {
        ReferenceSpaceKind::View => xr::ReferenceSpaceType::VIEW,
        ReferenceSpaceKind::Local => xr::ReferenceSpaceType::LOCAL,
        ReferenceSpaceKind::Stage => xr::ReferenceSpaceType::STAGE,
    }
}

fn session_state_from(state: xr::SessionState) -> SessionState {
    match state {
        xr::SessionState::IDLE => SessionState::Idle,
        xr::SessionState::READY => SessionState::Ready,
        xr::SessionState::SYNCHRONIZED => SessionState::Synchronized,
        xr::SessionState::VISIBLE => SessionState::Visible,
        xr::SessionState::FOCUSED => SessionState::Focused,
        xr::SessionState::STOPPING => SessionState::Stopping,
        xr::SessionState::LOSS_PENDING => SessionState::LossPending,
        xr::SessionState::EXITING => SessionState::Exiting,
        _ => SessionState::Unknown,
    }
}

fn xr_pose(pose: &Pose) -> xr::Posef {
    xr::Posef {
        orientation: xr::Quaternionf {
            x: pose.orientation.x,
            y: pose.orientation.y,
            z: pose.orientation.z,
            w: pose.orientation.w,
        },
        position: xr::Vector3f {
            x: pose.position.x,
            y: pose.position.y,
            z: pose.position.z,
        },
    }
}

fn pose_from(pose: &xr::Posef) -> Pose {
    Pose {
        orientation: glam::Quat::from_xyzw(
            pose.orientation.x,
            pose.orientation.y,
            pose.orientation.z,
            pose.orientation.w,
        ),
        position: glam::Vec3::new(pose.position.x, pose.position.y, pose.position.z),
    }
}

fn xr_fov(fov: &Fov) -> xr::Fovf {
    xr::Fovf {
        angle_left: fov.angle_left,
        angle_right: fov.angle_right,
        angle_up: fov.angle_up,
        angle_down: fov.angle_down,
    }
}

fn vk_format_from(format: wgpu::TextureFormat) -> Option<vk::Format> {
    match format {
        wgpu::TextureFormat::Bgra8Unorm => Some(vk::Format::B8G8R8A8_UNORM),
        wgpu::TextureFormat::Rgba8Unorm => Some(vk::Format::R8G8B8A8_UNORM),
        wgpu::TextureFormat::Bgra8UnormSrgb => Some(vk::Format::B8G8R8A8_SRGB),
        wgpu::TextureFormat::Rgba8UnormSrgb => Some(vk::Format::R8G8B8A8_SRGB),
        wgpu::TextureFormat::Rgba16Float => Some(vk::Format::R16G16B16A16_SFLOAT),
        _ => None,
    }
}

fn texture_format_from_vk(format: vk::Format) -> Option<wgpu::TextureFormat> {
    match format {
        vk::Format::B8G8R8A8_UNORM => Some(wgpu::TextureFormat::Bgra8Unorm),
        vk::Format::R8G8B8A8_UNORM => Some(wgpu::TextureFormat::Rgba8Unorm),
        vk::Format::B8G8R8A8_SRGB => Some(wgpu::TextureFormat::Bgra8UnormSrgb),
        vk::Format::R8G8B8A8_SRGB => Some(wgpu::TextureFormat::Rgba8UnormSrgb),
        vk::Format::R16G16B16A16_SFLOAT => Some(wgpu::TextureFormat::Rgba16Float),
        _ => None,
    }
}
