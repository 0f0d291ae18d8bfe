//! GPU-resident draw path for a loaded [`ModelEntry`]: per-primitive
//! vertex/index buffers and the flat-shaded mesh pipeline, driven by a
//! single model-transform uniform shared across the whole mesh (the
//! scene holder only ever parents one loaded model under its root node
//! at a time).

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::gpu::render_context::RenderContext;
use crate::model::entry::ModelEntry;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuVertex {
    position: [f32; 3],
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRS,
    }
}

/// Uniform buffer mirroring `render.wgsl`'s `Model` struct.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ModelUniform {
    transform: [[f32; 4]; 4],
    fog_color: [f32; 3],
    _pad: f32,
}

impl ModelUniform {
    fn new(transform: Mat4, fog_color: [f32; 3]) -> Self {
        Self {
            transform: transform.to_cols_array_2d(),
            fog_color,
            _pad: 0.0,
        }
    }
}

struct GpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// GPU format used for the orchestrator's depth attachment; the mesh
/// pipeline is built against this format.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Owns the mesh pipeline and the currently loaded model's GPU buffers.
pub struct ModelRenderer {
    pipeline: wgpu::RenderPipeline,
    transform_layout: wgpu::BindGroupLayout,
    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    fog_color: [f32; 3],
    primitives: Vec<GpuPrimitive>,
}

impl ModelRenderer {
    /// Build the mesh pipeline with no model loaded yet.
    pub fn new(context: &RenderContext, camera_layout: &wgpu::BindGroupLayout) -> Self {
        let device = &context.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Wreck Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("render.wgsl").into()),
        });

        let transform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Transform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let fog_color = [0.01, 0.05, 0.08];
        let uniform = ModelUniform::new(Mat4::IDENTITY, fog_color);
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Transform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Transform Bind Group"),
            layout: &transform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model Pipeline Layout"),
            bind_group_layouts: &[camera_layout, &transform_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Model Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: context.format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            transform_layout,
            transform_buffer,
            transform_bind_group,
            fog_color,
            primitives: Vec::new(),
        }
    }

    /// Upload `entry`'s primitives as GPU vertex/index buffers, replacing
    /// whatever model was previously loaded.
    pub fn load(&mut self, context: &RenderContext, entry: &ModelEntry) {
        let device = &context.device;
        self.primitives = entry
            .primitives
            .iter()
            .map(|primitive| {
                let vertices: Vec<GpuVertex> = primitive
                    .vertices
                    .iter()
                    .map(|v| GpuVertex {
                        position: v.position.to_array(),
                    })
                    .collect();

                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Model Vertex Buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Model Index Buffer"),
                    contents: bytemuck::cast_slice(&primitive.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                GpuPrimitive {
                    vertex_buffer,
                    index_buffer,
                    index_count: primitive.indices.len() as u32,
                }
            })
            .collect();
    }

    /// Drop the currently loaded model's GPU buffers without replacing
    /// the pipeline.
    pub fn clear(&mut self) {
        self.primitives.clear();
    }

    /// Whether a model is currently loaded (has at least one primitive).
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !self.primitives.is_empty()
    }

    /// Update the shared model-transform uniform.
    pub fn set_transform(&mut self, queue: &wgpu::Queue, transform: Mat4) {
        let uniform = ModelUniform::new(transform, self.fog_color);
        queue.write_buffer(&self.transform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Update the fog tint blended in at depth, matching the scene's
    /// background color. Takes effect on the next [`Self::set_transform`]
    /// call.
    pub fn set_fog_color(&mut self, fog_color: [f32; 3]) {
        self.fog_color = fog_color;
    }

    /// Bind group layout for the `model` group, exposed for tests.
    #[must_use]
    pub fn transform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.transform_layout
    }

    /// Record the draw calls for every loaded primitive.
    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, camera_bind_group: &'a wgpu::BindGroup) {
        if self.primitives.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera_bind_group, &[]);
        pass.set_bind_group(1, &self.transform_bind_group, &[]);
        for primitive in &self.primitives {
            pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
            pass.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..primitive.index_count, 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_vertex_matches_wgsl_float32x3_size() {
        assert_eq!(std::mem::size_of::<GpuVertex>(), 12);
    }

    #[test]
    fn model_uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<ModelUniform>() % 16, 0);
    }
}
