use bytemuck::Zeroable;
use glint_assets::{ImageData, MeshData, ModelData, ShaderLibrary, Vertex};
use glint_common::Rgba;
use glint_scene::{Scene, SceneObject};
use wgpu::util::DeviceExt;

use crate::RenderError;
use crate::camera::FreeCamera;
use crate::shaders;
use crate::shadow::{SHADOW_BIAS, ShadowMap};
use crate::texture::{DEPTH_FORMAT, GpuTexture, create_depth_texture};
use crate::uniforms::{FrameInputs, FrameUniforms, InstanceData, LightsUniform};

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
];

const INITIAL_INSTANCES: usize = 64;

/// Work submitted for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub triangles: u64,
    pub pipeline_binds: u32,
    pub texture_binds: u32,
    pub upload_bytes: u64,
}

impl FrameStats {
    fn draw(&mut self, triangles: u64) {
        self.draw_calls += 1;
        self.triangles += triangles;
    }
}

/// Index/vertex buffers of one uploaded mesh.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// Index into the owning model's materials.
    material: Option<usize>,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &MeshData, label: &str) -> (Self, u64) {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let bytes = vertex_buffer.size() + index_buffer.size();
        let gpu = Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            material: mesh.diffuse.map(|t| t.0),
        };
        (gpu, bytes)
    }

    fn triangles(&self) -> u64 {
        u64::from(self.index_count / 3)
    }

    fn bind<'p>(&self, pass: &mut wgpu::RenderPass<'p>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }
}

/// An imported model: its meshes plus one material per distinct texture.
/// A material whose image failed to load is `None` and draws white.
struct GpuModel {
    meshes: Vec<GpuMesh>,
    materials: Vec<Option<(GpuTexture, wgpu::BindGroup)>>,
}

/// Instance ranges for one frame, in instance-buffer order:
/// cubes, then walls, then model instances.
struct DrawPlan {
    cubes: u32,
    walls: Vec<bool>,
    models: Vec<usize>,
}

impl DrawPlan {
    fn wall_base(&self) -> u32 {
        self.cubes
    }

    fn model_base(&self) -> u32 {
        self.cubes + self.walls.len() as u32
    }
}

/// Lit forward renderer with a single shadow map.
pub struct WgpuRenderer {
    lit_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    shadow: ShadowMap,
    cube: GpuMesh,
    wall: GpuMesh,
    white_material: wgpu::BindGroup,
    wall_material: wgpu::BindGroup,
    models: Vec<GpuModel>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    depth_view: wgpu::TextureView,
    depth_bytes: u64,
    shadows_enabled: bool,
    pub clear_color: wgpu::Color,
    allocated_bytes: u64,
}

impl WgpuRenderer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        shader_library: &ShaderLibrary,
        wall_image: &ImageData,
        shadow_map_size: u32,
    ) -> Result<Self, RenderError> {
        let lit_source = shader_library.source("lit", shaders::LIT_SHADER)?;
        let shadow_source = shader_library.source("shadow", shaders::SHADOW_SHADER)?;

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniform_buffer"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lights_uniform_buffer"),
            contents: bytemuck::bytes_of(&LightsUniform::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shadow = ShadowMap::new(device, &shadow_source, &frame_buffer, shadow_map_size);

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(shadow.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(shadow.sampler()),
                },
            ],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lit_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let lit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lit_shader"),
            source: wgpu::ShaderSource::Wgsl(lit_source.as_ref().into()),
        });
        let lit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lit_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &lit_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    },
                    InstanceData::layout(),
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &lit_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let mut allocated = frame_buffer.size() + lights_buffer.size() + shadow.byte_size();

        let (cube, bytes) = GpuMesh::upload(device, &glint_assets::cube(), "cube_mesh");
        allocated += bytes;
        let (wall, bytes) = GpuMesh::upload(device, &glint_assets::wall(), "wall_mesh");
        allocated += bytes;

        let white = GpuTexture::white(device, queue);
        let white_material = material_bind_group(device, &material_layout, &white, "white_material");
        let wall_texture = GpuTexture::from_image(device, queue, wall_image, "wall_texture");
        let wall_material =
            material_bind_group(device, &material_layout, &wall_texture, "wall_material");
        allocated += white.byte_size() + wall_texture.byte_size();

        let instance_buffer = create_instance_buffer(device, INITIAL_INSTANCES);
        allocated += instance_buffer.size();

        let depth_view = create_depth_texture(device, width, height);
        let depth_bytes = depth_byte_size(width, height);
        allocated += depth_bytes;

        tracing::info!(
            shadow_map = shadow.size(),
            allocated_kb = allocated / 1024,
            "lit renderer ready"
        );

        Ok(Self {
            lit_pipeline,
            frame_buffer,
            lights_buffer,
            frame_bind_group,
            material_layout,
            shadow,
            cube,
            wall,
            white_material,
            wall_material,
            models: Vec::new(),
            instance_buffer,
            instance_capacity: INITIAL_INSTANCES,
            depth_view,
            depth_bytes,
            shadows_enabled: true,
            clear_color: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.15,
                a: 1.0,
            },
            allocated_bytes: allocated,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_view = create_depth_texture(device, width, height);
        let bytes = depth_byte_size(width, height);
        self.allocated_bytes = self.allocated_bytes.saturating_sub(self.depth_bytes) + bytes;
        self.depth_bytes = bytes;
    }

    pub fn shadows_enabled(&self) -> bool {
        self.shadows_enabled
    }

    pub fn set_shadows(&mut self, enabled: bool) {
        self.shadows_enabled = enabled;
    }

    pub fn shadow_map_size(&self) -> u32 {
        self.shadow.size()
    }

    /// Bytes of GPU memory owned by this renderer.
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes
    }

    /// Upload an imported model once. Returns the index scene model
    /// instances refer to. Textures that fail to load draw white.
    pub fn upload_model(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, model: &ModelData) -> usize {
        let mut materials = Vec::with_capacity(model.textures.len());
        for path in &model.textures {
            match ImageData::load(path) {
                Ok(image) => {
                    let label = path.display().to_string();
                    let texture = GpuTexture::from_image(device, queue, &image, &label);
                    let bind_group =
                        material_bind_group(device, &self.material_layout, &texture, &label);
                    self.allocated_bytes += texture.byte_size();
                    materials.push(Some((texture, bind_group)));
                }
                Err(e) => {
                    tracing::warn!("model texture unavailable, drawing untextured: {e}");
                    materials.push(None);
                }
            }
        }

        let mut meshes = Vec::with_capacity(model.meshes.len());
        for mesh in &model.meshes {
            let (gpu, bytes) = GpuMesh::upload(device, mesh, &mesh.name);
            self.allocated_bytes += bytes;
            meshes.push(gpu);
        }

        tracing::info!(
            path = %model.path.display(),
            meshes = meshes.len(),
            textures = materials.len(),
            "model uploaded"
        );
        self.models.push(GpuModel { meshes, materials });
        self.models.len() - 1
    }

    /// Draw one frame of `scene` into `target`: the shadow pass (when
    /// enabled) followed by the lit pass.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        scene: &Scene,
        camera: &FreeCamera,
    ) -> Result<FrameStats, RenderError> {
        let _span = tracing::info_span!("lit_frame").entered();
        let mut stats = FrameStats::default();

        let table = scene.bind_lights()?;
        let (instances, plan) = self.build_instances(scene)?;

        let capacity = grown_capacity(instances.len(), self.instance_capacity);
        if capacity != self.instance_capacity {
            self.allocated_bytes = self.allocated_bytes.saturating_sub(self.instance_buffer.size());
            self.instance_buffer = create_instance_buffer(device, capacity);
            self.allocated_bytes += self.instance_buffer.size();
            self.instance_capacity = capacity;
            tracing::debug!(capacity, "instance buffer grown");
        }

        let frame = FrameUniforms::from(FrameInputs {
            view_proj: camera.view_projection(),
            light_space: scene.light_space_matrix(),
            camera_pos: camera.position,
            shadows: self.shadows_enabled,
            bias: SHADOW_BIAS,
            caster: scene.shadow_caster_index(),
        });
        let lights = LightsUniform::from(&table);
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));
        queue.write_buffer(&self.lights_buffer, 0, bytemuck::bytes_of(&lights));
        stats.upload_bytes += (std::mem::size_of::<FrameUniforms>() + std::mem::size_of::<LightsUniform>()) as u64;
        if !instances.is_empty() {
            let bytes: &[u8] = bytemuck::cast_slice(&instances);
            queue.write_buffer(&self.instance_buffer, 0, bytes);
            stats.upload_bytes += bytes.len() as u64;
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lit_encoder"),
        });

        if self.shadows_enabled {
            let mut pass = self.shadow.begin_pass(&mut encoder);
            stats.pipeline_binds += 1;
            self.draw_scene(&mut pass, &plan, false, &mut stats);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_pipeline(&self.lit_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            stats.pipeline_binds += 1;
            self.draw_scene(&mut pass, &plan, true, &mut stats);
        }

        queue.submit(std::iter::once(encoder.finish()));
        Ok(stats)
    }

    fn build_instances(&self, scene: &Scene) -> Result<(Vec<InstanceData>, DrawPlan), RenderError> {
        let mut instances = Vec::with_capacity(scene.object_count());
        for cube in &scene.cubes {
            instances.push(InstanceData::new(cube.model_matrix(), cube.color));
        }
        for wall in &scene.walls {
            instances.push(InstanceData::new(wall.model_matrix(), wall.color));
        }
        for model in &scene.models {
            if model.model >= self.models.len() {
                return Err(RenderError::NoSuchModel(model.model));
            }
            instances.push(InstanceData::new(model.model_matrix(), Rgba::WHITE));
        }
        let plan = DrawPlan {
            cubes: scene.cubes.len() as u32,
            walls: scene.walls.iter().map(|w| w.textured).collect(),
            models: scene.models.iter().map(|m| m.model).collect(),
        };
        Ok((instances, plan))
    }

    /// Issue every draw of the frame. Material bind groups are only set
    /// for the lit pass.
    fn draw_scene(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        plan: &DrawPlan,
        materials: bool,
        stats: &mut FrameStats,
    ) {
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

        if plan.cubes > 0 {
            if materials {
                pass.set_bind_group(1, &self.white_material, &[]);
                stats.texture_binds += 1;
            }
            self.cube.bind(pass);
            pass.draw_indexed(0..self.cube.index_count, 0, 0..plan.cubes);
            stats.draw(self.cube.triangles() * u64::from(plan.cubes));
        }

        if !plan.walls.is_empty() {
            self.wall.bind(pass);
            for (i, textured) in plan.walls.iter().enumerate() {
                if materials {
                    let material = if *textured {
                        &self.wall_material
                    } else {
                        &self.white_material
                    };
                    pass.set_bind_group(1, material, &[]);
                    stats.texture_binds += 1;
                }
                let instance = plan.wall_base() + i as u32;
                pass.draw_indexed(0..self.wall.index_count, 0, instance..instance + 1);
                stats.draw(self.wall.triangles());
            }
        }

        for (i, model_index) in plan.models.iter().enumerate() {
            let Some(model) = self.models.get(*model_index) else {
                continue;
            };
            let instance = plan.model_base() + i as u32;
            for mesh in &model.meshes {
                if materials {
                    let material = mesh
                        .material
                        .and_then(|m| model.materials.get(m))
                        .and_then(|m| m.as_ref())
                        .map_or(&self.white_material, |(_, bind_group)| bind_group);
                    pass.set_bind_group(1, material, &[]);
                    stats.texture_binds += 1;
                }
                mesh.bind(pass);
                pass.draw_indexed(0..mesh.index_count, 0, instance..instance + 1);
                stats.draw(mesh.triangles());
            }
        }
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &GpuTexture,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Instance slots to hold `needed` entries: `current` while it fits, else
/// the next power of two.
fn grown_capacity(needed: usize, current: usize) -> usize {
    if needed <= current {
        current
    } else {
        needed.next_power_of_two()
    }
}

fn depth_byte_size(width: u32, height: u32) -> u64 {
    u64::from(width.max(1)) * u64::from(height.max(1)) * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_orders_instances() {
        let plan = DrawPlan {
            cubes: 5,
            walls: vec![true, false],
            models: vec![0],
        };
        assert_eq!(plan.wall_base(), 5);
        assert_eq!(plan.model_base(), 7);
    }

    #[test]
    fn stats_accumulate_draws() {
        let mut stats = FrameStats::default();
        stats.draw(12 * 16);
        stats.draw(2);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.triangles, 194);
    }

    #[test]
    fn instance_capacity_grows_to_powers_of_two() {
        assert_eq!(grown_capacity(64, INITIAL_INSTANCES), 64);
        assert_eq!(grown_capacity(10, INITIAL_INSTANCES), 64);
        assert_eq!(grown_capacity(65, INITIAL_INSTANCES), 128);
        assert_eq!(grown_capacity(1000, INITIAL_INSTANCES), 1024);
        assert_eq!(grown_capacity(1000, 1024), 1024);
    }

    #[test]
    fn depth_bytes_never_zero() {
        assert_eq!(depth_byte_size(0, 0), 4);
        assert_eq!(depth_byte_size(800, 600), 800 * 600 * 4);
    }
}
