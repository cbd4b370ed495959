//! Full-screen copy of the offscreen frame buffer into a view's swapchain image.
//!
//! A single oversized triangle covers the viewport; no vertex buffers are used.

use super::device::GpuDevice;
use super::targets::RenderTexture;

pub const COPY_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var copy_sampler: sampler;
@group(0) @binding(1) var copy_texture: texture_2d<f32>;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, -3.0),
        vec2<f32>(3.0, 1.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(0.0, 2.0),
        vec2<f32>(2.0, 0.0),
    );

    var out: VertexOutput;
    out.position = vec4<f32>(positions[vertex_index], 0.0, 1.0);
    out.uv = uvs[vertex_index];
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(copy_texture, copy_sampler, in.uv);
}
"#;

/// Device-wide objects shared by every view's copy pipeline.
pub enum CopyLayout {
    Null,
    Wgpu {
        bind_group_layout: wgpu::BindGroupLayout,
        pipeline_layout: wgpu::PipelineLayout,
        shader: wgpu::ShaderModule,
        sampler: wgpu::Sampler,
    },
}

pub enum CopyPipeline {
    Null,
    Wgpu(wgpu::RenderPipeline),
}

pub enum CopyBindGroup {
    Null,
    Wgpu(wgpu::BindGroup),
}

impl CopyLayout {
    pub fn new(device: &GpuDevice, anisotropy: u16) -> Self {
        let Some(gpu) = device.as_wgpu() else {
            return CopyLayout::Null;
        };
        let device = &gpu.device;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("copy layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("copy pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("copy shader"),
            source: wgpu::ShaderSource::Wgsl(COPY_SHADER.into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("copy sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: anisotropy.clamp(1, 16),
            ..Default::default()
        });

        CopyLayout::Wgpu {
            bind_group_layout,
            pipeline_layout,
            shader,
            sampler,
        }
    }

    /// Pipeline writing into a single-sampled target of `format`.
    pub fn create_pipeline(&self, device: &GpuDevice, format: wgpu::TextureFormat) -> CopyPipeline {
        let (
            CopyLayout::Wgpu {
                pipeline_layout,
                shader,
                ..
            },
            Some(gpu),
        ) = (self, device.as_wgpu())
        else {
            return CopyPipeline::Null;
        };

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("copy pipeline"),
                layout: Some(pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview: None,
                cache: None,
            });
        CopyPipeline::Wgpu(pipeline)
    }

    /// Binds `source` (the resolved frame buffer) for sampling.
    pub fn create_bind_group(&self, device: &GpuDevice, source: &RenderTexture) -> CopyBindGroup {
        let (
            CopyLayout::Wgpu {
                bind_group_layout,
                sampler,
                ..
            },
            Some(gpu),
            Some(view),
        ) = (self, device.as_wgpu(), source.target.wgpu_view())
        else {
            return CopyBindGroup::Null;
        };

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("copy bind group"),
            layout: bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
            ],
        });
        CopyBindGroup::Wgpu(bind_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::targets::SharedTargets;

    #[test]
    fn shader_draws_one_covering_triangle() {
        assert!(COPY_SHADER.contains("fn vs_main"));
        assert!(COPY_SHADER.contains("fn fs_main"));
        assert!(COPY_SHADER.contains("vec2<f32>(3.0, 1.0)"));
        assert!(COPY_SHADER.contains("@group(0) @binding(1) var copy_texture"));
    }

    #[test]
    fn null_device_builds_null_objects() {
        let layout = CopyLayout::new(&GpuDevice::Null, 16);
        assert!(matches!(layout, CopyLayout::Null));
        assert!(matches!(
            layout.create_pipeline(&GpuDevice::Null, wgpu::TextureFormat::Bgra8Unorm),
            CopyPipeline::Null
        ));
        let targets = SharedTargets::new(
            &GpuDevice::Null,
            wgpu::TextureFormat::Bgra8Unorm,
            8,
            8,
            1,
            0,
        );
        assert!(matches!(
            layout.create_bind_group(&GpuDevice::Null, targets.copy_source()),
            CopyBindGroup::Null
        ));
    }
}
