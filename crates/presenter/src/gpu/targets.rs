/// Usage of every offscreen colour target: rendered to, sampled by the copy
/// pass, and copyable in both directions for capture and upload.
pub const RENDER_TEXTURE_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING)
    .union(wgpu::TextureUsages::COPY_SRC)
    .union(wgpu::TextureUsages::COPY_DST);

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A colour or depth image a view can render into. On the null device the
/// view only remembers its shape.
#[derive(Debug, Clone)]
pub enum TargetView {
    Null {
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },
    Wgpu {
        view: wgpu::TextureView,
        texture: Option<wgpu::Texture>,
    },
}

impl TargetView {
    pub fn create_color(
        device: &super::GpuDevice,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self::create(device, label, format, width, height, 1, RENDER_TEXTURE_USAGE)
    }

    pub fn create(
        device: &super::GpuDevice,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let Some(gpu) = device.as_wgpu() else {
            return TargetView::Null {
                width,
                height,
                format,
            };
        };

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        TargetView::Wgpu {
            view,
            texture: Some(texture),
        }
    }

    /// Wraps a view whose texture is owned elsewhere (surface or XR image).
    pub fn from_view(view: wgpu::TextureView) -> Self {
        TargetView::Wgpu {
            view,
            texture: None,
        }
    }

    pub fn wgpu_view(&self) -> Option<&wgpu::TextureView> {
        match self {
            TargetView::Null { .. } => None,
            TargetView::Wgpu { view, .. } => Some(view),
        }
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        match self {
            TargetView::Null { width, height, .. } => Some((*width, *height)),
            TargetView::Wgpu {
                texture: Some(texture),
                ..
            } => Some((texture.width(), texture.height())),
            TargetView::Wgpu { texture: None, .. } => None,
        }
    }
}

/// Shape and storage of one offscreen render texture.
#[derive(Debug, Clone)]
pub struct RenderTexture {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub target: TargetView,
}

impl RenderTexture {
    pub fn new(
        device: &super::GpuDevice,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let usage = if sample_count > 1 {
            wgpu::TextureUsages::RENDER_ATTACHMENT
        } else if format.is_depth_stencil_format() {
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING
        } else {
            RENDER_TEXTURE_USAGE
        };
        Self {
            width,
            height,
            format,
            sample_count,
            target: TargetView::create(device, label, format, width, height, sample_count, usage),
        }
    }
}

/// Offscreen targets shared by every render view. All views render at the
/// size of the most recent resize; `generation` moves whenever they are
/// rebuilt so hooks can drop size-dependent resources.
#[derive(Debug, Clone)]
pub struct SharedTargets {
    pub frame_buffer: RenderTexture,
    pub frame_buffer_resolved: Option<RenderTexture>,
    pub depth_buffer: RenderTexture,
    pub generation: u64,
}

impl SharedTargets {
    pub fn new(
        device: &super::GpuDevice,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
        generation: u64,
    ) -> Self {
        let frame_buffer =
            RenderTexture::new(device, "frame buffer", format, width, height, sample_count);
        let frame_buffer_resolved = (sample_count > 1)
            .then(|| RenderTexture::new(device, "frame buffer resolved", format, width, height, 1));
        let depth_buffer =
            RenderTexture::new(device, "depth buffer", DEPTH_FORMAT, width, height, sample_count);
        Self {
            frame_buffer,
            frame_buffer_resolved,
            depth_buffer,
            generation,
        }
    }

    /// The single-sampled texture the copy pass reads from.
    pub fn copy_source(&self) -> &RenderTexture {
        self.frame_buffer_resolved
            .as_ref()
            .unwrap_or(&self.frame_buffer)
    }

    pub fn sample_count(&self) -> u32 {
        self.frame_buffer.sample_count
    }
}
