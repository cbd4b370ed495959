use wgpu::TextureFormatFeatureFlags;

use crate::error::GfxError;
use crate::types::BackendKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterType {
    DiscreteGpu,
    IntegratedGpu,
    Cpu,
    Other,
}

impl AdapterType {
    fn rank(self) -> u8 {
        match self {
            AdapterType::DiscreteGpu => 0,
            AdapterType::IntegratedGpu => 1,
            AdapterType::Cpu => 2,
            AdapterType::Other => 3,
        }
    }
}

impl From<wgpu::DeviceType> for AdapterType {
    fn from(device_type: wgpu::DeviceType) -> Self {
        match device_type {
            wgpu::DeviceType::DiscreteGpu => AdapterType::DiscreteGpu,
            wgpu::DeviceType::IntegratedGpu => AdapterType::IntegratedGpu,
            wgpu::DeviceType::Cpu => AdapterType::Cpu,
            _ => AdapterType::Other,
        }
    }
}

/// Picks the adapter for `backend`: discrete before integrated before CPU,
/// enumeration order breaking ties.
pub fn select_adapter(
    candidates: &[(wgpu::Backend, AdapterType)],
    backend: wgpu::Backend,
) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, (candidate, _))| *candidate == backend)
        .min_by_key(|(index, (_, adapter_type))| (adapter_type.rank(), *index))
        .map(|(index, _)| index)
}

pub struct WgpuDevice {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub backend: BackendKind,
    pub adapter_name: String,
    pub adapter_type: AdapterType,
}

impl WgpuDevice {
    pub fn create(kind: BackendKind) -> Result<Self, GfxError> {
        let backend = kind
            .wgpu_backend()
            .ok_or(GfxError::UnsupportedBackend(kind))?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::from(backend),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let adapter = pick_adapter(&instance, kind, backend)?;
        let info = adapter.get_info();
        let adapter_type = AdapterType::from(info.device_type);
        tracing::info!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            driver = %info.driver,
            "selected GPU adapter"
        );

        let mut required_features = wgpu::Features::empty();
        if adapter
            .features()
            .contains(wgpu::Features::TEXTURE_COMPRESSION_BC)
        {
            required_features |= wgpu::Features::TEXTURE_COMPRESSION_BC;
        } else {
            tracing::debug!("adapter lacks BC texture compression; feature omitted");
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("presenter device"),
            required_features,
            required_limits: adapter.limits(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        }))
        .map_err(|source| GfxError::RequestDevice {
            backend: kind,
            source,
        })?;

        device.on_uncaptured_error(Box::new(move |error| {
            tracing::error!(backend = %kind, %error, "uncaptured GPU error");
        }));
        device.set_device_lost_callback(move |reason, message| {
            tracing::error!(backend = %kind, ?reason, %message, "GPU device lost");
        });

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            backend: kind,
            adapter_name: info.name,
            adapter_type,
        })
    }

    /// Largest supported MSAA count not above `requested` for `format`.
    pub fn supported_sample_count(&self, format: wgpu::TextureFormat, requested: u32) -> u32 {
        let format_features = self.adapter.get_texture_format_features(format);
        let adapter_specific = self
            .device
            .features()
            .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);

        let mut supported_samples: Vec<u32> = format_features
            .flags
            .supported_sample_counts()
            .into_iter()
            .filter(|count| adapter_specific || *count == 1 || *count == 4)
            .collect();
        if !supported_samples.contains(&1) {
            supported_samples.push(1);
        }
        supported_samples.sort_unstable();
        supported_samples.dedup();

        let mut sample_count = supported_samples
            .iter()
            .copied()
            .filter(|&count| count <= requested.max(1))
            .max()
            .unwrap_or(1);
        if sample_count != requested.max(1) {
            tracing::warn!(
                requested,
                fallback = sample_count,
                ?supported_samples,
                "requested MSAA sample count not supported; falling back"
            );
        }

        if sample_count > 1
            && !format_features
                .flags
                .contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE)
        {
            tracing::warn!(?format, "format does not support MSAA resolve; disabling MSAA");
            sample_count = 1;
        }
        sample_count
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn pick_adapter(
    instance: &wgpu::Instance,
    kind: BackendKind,
    backend: wgpu::Backend,
) -> Result<wgpu::Adapter, GfxError> {
    let adapters = instance.enumerate_adapters(wgpu::Backends::from(backend));
    let candidates: Vec<(wgpu::Backend, AdapterType)> = adapters
        .iter()
        .map(|adapter| {
            let info = adapter.get_info();
            tracing::debug!(
                name = %info.name,
                backend = ?info.backend,
                device_type = ?info.device_type,
                "found GPU adapter"
            );
            (info.backend, AdapterType::from(info.device_type))
        })
        .collect();

    let index = select_adapter(&candidates, backend).ok_or(GfxError::NoAdapter { backend: kind })?;
    adapters
        .into_iter()
        .nth(index)
        .ok_or(GfxError::NoAdapter { backend: kind })
}

#[cfg(target_arch = "wasm32")]
fn pick_adapter(
    instance: &wgpu::Instance,
    kind: BackendKind,
    _backend: wgpu::Backend,
) -> Result<wgpu::Adapter, GfxError> {
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .map_err(|_| GfxError::NoAdapter { backend: kind })
}

/// The device behind every view: either a real `wgpu` device or the null
/// device, which accepts all calls and renders nothing.
pub enum GpuDevice {
    Null,
    Wgpu(WgpuDevice),
}

impl GpuDevice {
    pub fn create(kind: BackendKind) -> Result<Self, GfxError> {
        match kind {
            BackendKind::Null => {
                tracing::info!("using null GPU device");
                Ok(GpuDevice::Null)
            }
            BackendKind::Auto => Err(GfxError::UnsupportedBackend(kind)),
            _ => WgpuDevice::create(kind).map(GpuDevice::Wgpu),
        }
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            GpuDevice::Null => BackendKind::Null,
            GpuDevice::Wgpu(device) => device.backend,
        }
    }

    pub fn as_wgpu(&self) -> Option<&WgpuDevice> {
        match self {
            GpuDevice::Null => None,
            GpuDevice::Wgpu(device) => Some(device),
        }
    }

    pub fn supported_sample_count(&self, format: wgpu::TextureFormat, requested: u32) -> u32 {
        match self {
            GpuDevice::Null => requested.max(1),
            GpuDevice::Wgpu(device) => device.supported_sample_count(format, requested),
        }
    }

    /// Raw Vulkan handles for sharing this device with an XR runtime.
    #[cfg(feature = "openxr")]
    pub fn vulkan_handles(&self) -> Option<crate::binding::VulkanHandles> {
        use ash::vk::Handle;
        use wgpu::hal::api::Vulkan;

        let GpuDevice::Wgpu(device) = self else {
            return None;
        };
        if device.backend != BackendKind::Vulkan {
            return None;
        }

        let hal_instance = unsafe { device.instance.as_hal::<Vulkan>() }?;
        let instance = hal_instance.shared_instance().raw_instance().handle().as_raw();
        let hal_device = unsafe { device.device.as_hal::<Vulkan>() }?;
        Some(crate::binding::VulkanHandles {
            instance,
            physical_device: hal_device.raw_physical_device().as_raw(),
            device: hal_device.raw_device().handle().as_raw(),
            queue_family_index: hal_device.queue_family_index(),
            queue_index: 0,
        })
    }
}

impl std::fmt::Debug for GpuDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuDevice::Null => f.write_str("GpuDevice::Null"),
            GpuDevice::Wgpu(device) => f
                .debug_struct("GpuDevice::Wgpu")
                .field("backend", &device.backend)
                .field("adapter", &device.adapter_name)
                .field("adapter_type", &device.adapter_type)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::Backend;

    #[test]
    fn discrete_beats_integrated_beats_cpu() {
        let candidates = [
            (Backend::Vulkan, AdapterType::Cpu),
            (Backend::Vulkan, AdapterType::IntegratedGpu),
            (Backend::Vulkan, AdapterType::DiscreteGpu),
        ];
        assert_eq!(select_adapter(&candidates, Backend::Vulkan), Some(2));
    }

    #[test]
    fn only_matching_backend_is_considered() {
        let candidates = [
            (Backend::Gl, AdapterType::DiscreteGpu),
            (Backend::Vulkan, AdapterType::Cpu),
        ];
        assert_eq!(select_adapter(&candidates, Backend::Vulkan), Some(1));
        assert_eq!(select_adapter(&candidates, Backend::Metal), None);
    }

    #[test]
    fn ties_keep_enumeration_order() {
        let candidates = [
            (Backend::Vulkan, AdapterType::IntegratedGpu),
            (Backend::Vulkan, AdapterType::IntegratedGpu),
            (Backend::Vulkan, AdapterType::Other),
        ];
        assert_eq!(select_adapter(&candidates, Backend::Vulkan), Some(0));
    }

    #[test]
    fn null_device_accepts_requested_samples() {
        let device = GpuDevice::create(BackendKind::Null).unwrap();
        assert_eq!(device.backend(), BackendKind::Null);
        assert_eq!(
            device.supported_sample_count(wgpu::TextureFormat::Bgra8Unorm, 4),
            4
        );
        assert_eq!(
            device.supported_sample_count(wgpu::TextureFormat::Bgra8Unorm, 0),
            1
        );
        assert!(device.as_wgpu().is_none());
    }

    #[test]
    fn auto_is_not_a_device() {
        assert!(matches!(
            GpuDevice::create(BackendKind::Auto),
            Err(GfxError::UnsupportedBackend(BackendKind::Auto))
        ));
    }
}
