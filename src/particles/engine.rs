//! Adaptive marine-snow particle field GPU engine.
//!
//! Owns its point-sprite pipeline, instance buffer, and material
//! (procedural soft-circle texture + sampler) independently of the
//! scene holder — the particle field is never raycast against and
//! participates in fog entirely in-shader, so the scene graph only
//! needs to know whether it is enabled (spec §4.3's "no participation
//! in the scene's declarative fog" clause).

use rand::Rng;
use wgpu::util::DeviceExt;

use crate::gpu::pipeline_helpers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture::SoftCircleTexture;
use crate::model::render::DEPTH_FORMAT;
use crate::model::BoundingBox;
use crate::particles::population;

/// Factor the model's bounding box is expanded by before the particle
/// field's own bounds and population are computed (spec §4.3).
const BOUNDS_EXPANSION: f32 = 2.5;

/// Per-particle GPU instance attributes, matching `particle.wgsl`'s
/// `Instance` struct.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ParticleInstance {
    position: [f32; 3],
    velocity: [f32; 3],
    size: f32,
    index: f32,
}

/// Uniform buffer mirroring `particle.wgsl`'s `Globals` struct,
/// byte-for-byte including the implicit `vec3` alignment padding WGSL's
/// uniform address-space layout rules require.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ParticleGlobals {
    bounds_min: [f32; 3],
    time: f32,
    bounds_max: [f32; 3],
    global_size: f32,
    global_opacity: f32,
    _gap: [f32; 3],
    _pad: [f32; 3],
    _tail: f32,
}

impl ParticleGlobals {
    fn new(bounds: &BoundingBox, time: f32, global_size: f32, global_opacity: f32) -> Self {
        Self {
            bounds_min: bounds.min.to_array(),
            time,
            bounds_max: bounds.max.to_array(),
            global_size,
            global_opacity,
            _gap: [0.0; 3],
            _pad: [0.0; 3],
            _tail: 0.0,
        }
    }
}

fn particle_instance_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // velocity
        2 => Float32,   // size
        3 => Float32,   // index
    ];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<ParticleInstance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &ATTRS,
    }
}

/// Maximum particle count the instance buffer is preallocated for
/// (spec §4.3's population clamp upper bound).
const MAX_PARTICLE_COUNT: u32 = 8000;

/// GPU-resident adaptive marine-snow particle field.
pub struct ParticleEngine {
    pipeline: wgpu::RenderPipeline,
    globals_layout: wgpu::BindGroupLayout,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    #[allow(dead_code)]
    texture: SoftCircleTexture,

    instance_buffer: wgpu::Buffer,
    instances: Vec<ParticleInstance>,
    bounds: BoundingBox,

    time: f32,
    /// Whether the field is currently enabled for rendering (the
    /// "dive system" feature flag and survey/dive mode toggle).
    pub enabled: bool,
    /// Global point-size multiplier.
    pub global_size: f32,
    /// Global opacity multiplier.
    pub global_opacity: f32,
}

impl ParticleEngine {
    /// Build the pipeline, material, and an initial particle population
    /// fit to `bbox` (the first loaded model's bounding box).
    pub fn new(
        context: &RenderContext,
        camera_layout: &wgpu::BindGroupLayout,
        bbox: &BoundingBox,
    ) -> Self {
        let device = &context.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Marine Snow Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("particle.wgsl").into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Globals Layout"),
            entries: &[
                // Read in both stages: bounds/time drive the vertex-stage
                // wobble/wrap, size/opacity drive the fragment-stage blend.
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                pipeline_helpers::texture_2d(1),
                pipeline_helpers::filtering_sampler(2),
            ],
        });

        let texture = SoftCircleTexture::create(device, &context.queue);

        let bounds = bbox.expanded(BOUNDS_EXPANSION);
        let globals = ParticleGlobals::new(&bounds, 0.0, 1.0, 1.0);
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Globals Buffer"),
            contents: bytemuck::cast_slice(&[globals]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Globals Bind Group"),
            layout: &globals_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[camera_layout, &globals_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[particle_instance_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: context.format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..wgpu::PrimitiveState::default()
            },
            // Depth-tested against the mesh so particles behind the wreck
            // are hidden, but never depth-written — the field itself never
            // occludes anything (spec §4.3).
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Instance Buffer"),
            size: (MAX_PARTICLE_COUNT as usize * std::mem::size_of::<ParticleInstance>())
                as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut engine = Self {
            pipeline,
            globals_layout,
            globals_buffer,
            globals_bind_group,
            texture,
            instance_buffer,
            instances: Vec::new(),
            bounds,
            time: 0.0,
            enabled: true,
            global_size: 1.0,
            global_opacity: 1.0,
        };
        engine.rebuild(&context.queue, bounds);
        engine
    }

    /// Fully regenerate the instance population within `bounds`.
    fn rebuild(&mut self, queue: &wgpu::Queue, bounds: BoundingBox) {
        let count = population::target_particle_count(bounds.volume());
        let mut rng = rand::rng();
        self.instances = (0..count)
            .map(|i| ParticleInstance {
                position: population::sample_particle_position(&bounds, &mut rng).to_array(),
                velocity: population::sample_particle_velocity(&mut rng).to_array(),
                size: population::sample_particle_size(&mut rng),
                index: i as f32,
            })
            .collect();
        self.bounds = bounds;
        self.write_instances(queue);
        self.write_bounds(queue);
    }

    /// Redistribute the existing population within new `bounds` without
    /// reallocating the instance buffer.
    fn redistribute(&mut self, queue: &wgpu::Queue, bounds: BoundingBox) {
        let mut rng = rand::rng();
        for instance in &mut self.instances {
            instance.position = population::sample_particle_position(&bounds, &mut rng).to_array();
        }
        self.bounds = bounds;
        self.write_instances(queue);
        self.write_bounds(queue);
    }

    fn write_instances(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.instances));
    }

    fn write_bounds(&self, queue: &wgpu::Queue) {
        let globals = ParticleGlobals::new(
            &self.bounds,
            self.time,
            self.global_size,
            self.global_opacity,
        );
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::cast_slice(&[globals]));
    }

    /// Respond to a model change: expand its bounding box, compute the
    /// new target count, and rebuild or redistribute per the `|new -
    /// current| > 0.2 * current` policy (spec §4.3).
    pub fn update_for_model(&mut self, queue: &wgpu::Queue, model_bbox: &BoundingBox) {
        let new_bounds = model_bbox.expanded(BOUNDS_EXPANSION);
        let new_count = population::target_particle_count(new_bounds.volume());
        let current_count = self.instances.len() as u32;

        if population::needs_rebuild(current_count, new_count) {
            self.rebuild(queue, new_bounds);
        } else {
            self.redistribute(queue, new_bounds);
        }
    }

    /// Advance animation time. The actual per-particle motion and
    /// bounds-wrapping happen entirely in the vertex shader; this only
    /// needs to push the updated `time` uniform each tick.
    pub fn tick(&mut self, dt: f32, queue: &wgpu::Queue) {
        self.time += dt * 1_000_000.0; // shader's wobble/drift constants are tuned in microseconds-equivalent units
        self.write_bounds(queue);
    }

    /// Current particle count (for the orchestrator's debug stats).
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.instances.len()
    }

    /// Record the render pass draw calls for the particle field. A
    /// no-op when `enabled` is false (survey mode).
    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, camera_bind_group: &'a wgpu::BindGroup) {
        if !self.enabled || self.instances.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera_bind_group, &[]);
        pass.set_bind_group(1, &self.globals_bind_group, &[]);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.draw(0..4, 0..self.instances.len() as u32);
    }

    /// Bind group layout for the `globals` group, exposed so tests (and
    /// any future pipeline variant) can validate against it without
    /// poking at pipeline internals.
    #[must_use]
    pub fn globals_layout(&self) -> &wgpu::BindGroupLayout {
        &self.globals_layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn particle_instance_is_32_bytes() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 32);
    }

    #[test]
    fn particle_globals_matches_wgsl_std140_layout() {
        // bounds_min(12)+time(4) + bounds_max(12)+size(4)+opacity(4)
        // rounded up to the next vec3-alignment boundary (16), plus the
        // trailing vec3 pad rounded to the struct's 16-byte alignment.
        assert_eq!(std::mem::size_of::<ParticleGlobals>(), 64);
    }

    #[test]
    fn bounds_expansion_factor_matches_spec() {
        assert_eq!(BOUNDS_EXPANSION, 2.5);
    }

    #[test]
    fn expanded_bounds_preserve_center_for_population_rule() {
        let bbox = BoundingBox {
            min: Vec3::new(-2.0, -2.0, -2.0),
            max: Vec3::new(2.0, 2.0, 2.0),
        };
        let expanded = bbox.expanded(BOUNDS_EXPANSION);
        assert_eq!(expanded.center(), Vec3::ZERO);
    }
}
