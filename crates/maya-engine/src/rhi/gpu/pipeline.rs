use std::num::NonZeroU64;

use super::context::DEPTH_FORMAT;
use super::resources::{GpuResources, UniformRange};
use crate::rhi::shader::{FRAGMENT_ENTRY, ShaderInfo, VERTEX_ENTRY};
use crate::rhi::{Bindings, Vertex};

/// A render pipeline plus the bind group layouts derived from its shader.
pub(crate) struct GpuPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub info: ShaderInfo,
    /// Group 0. Present whenever any group is used so group 1 stays at index 1.
    uniform_layout: Option<wgpu::BindGroupLayout>,
    /// Group 1.
    texture_layout: Option<wgpu::BindGroupLayout>,
}

impl GpuPipeline {
    /// Builds the pipeline for an already validated WGSL program.
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        source: &str,
        info: ShaderInfo,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("maya shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let uniform_layout = info.uses_bind_groups().then(|| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = info
                .uniforms
                .iter()
                .map(|u| wgpu::BindGroupLayoutEntry {
                    binding: u.slot,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(u.size as u64),
                    },
                    count: None,
                })
                .collect();

            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("maya uniforms bgl"),
                entries: &entries,
            })
        });

        let texture_layout = (!info.textures.is_empty()).then(|| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = info
                .textures
                .iter()
                .flat_map(|&slot| {
                    [
                        wgpu::BindGroupLayoutEntry {
                            binding: slot * 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: slot * 2 + 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ]
                })
                .collect();

            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("maya textures bgl"),
                entries: &entries,
            })
        });

        let layouts: Vec<&wgpu::BindGroupLayout> = uniform_layout
            .iter()
            .chain(texture_layout.iter())
            .collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("maya pipeline layout"),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("maya pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            info,
            uniform_layout,
            texture_layout,
        }
    }

    /// Creates the bind groups for one draw: `(group 0, group 1)`.
    pub fn bind_groups(
        &self,
        device: &wgpu::Device,
        resources: &GpuResources,
        bindings: &Bindings,
        uniforms: &[UniformRange],
    ) -> (Option<wgpu::BindGroup>, Option<wgpu::BindGroup>) {
        let group0 = self.uniform_layout.as_ref().map(|layout| {
            let entries: Vec<wgpu::BindGroupEntry> = match resources.uniform_ring() {
                Some(ring) => uniforms
                    .iter()
                    .map(|r| wgpu::BindGroupEntry {
                        binding: r.slot,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: ring,
                            offset: r.offset,
                            size: NonZeroU64::new(r.size),
                        }),
                    })
                    .collect(),
                None => Vec::new(),
            };

            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("maya uniforms bind group"),
                layout,
                entries: &entries,
            })
        });

        let group1 = self.texture_layout.as_ref().map(|layout| {
            let entries: Vec<wgpu::BindGroupEntry> = self
                .info
                .textures
                .iter()
                .flat_map(|&slot| {
                    let handle = bindings.texture(slot).map(|t| t.raw());
                    [
                        wgpu::BindGroupEntry {
                            binding: slot * 2,
                            resource: wgpu::BindingResource::TextureView(
                                resources.texture_view(handle),
                            ),
                        },
                        wgpu::BindGroupEntry {
                            binding: slot * 2 + 1,
                            resource: wgpu::BindingResource::Sampler(&resources.sampler),
                        },
                    ]
                })
                .collect();

            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("maya textures bind group"),
                layout,
                entries: &entries,
            })
        });

        (group0, group1)
    }
}
