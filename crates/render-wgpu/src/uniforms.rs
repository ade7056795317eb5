use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use glint_common::Rgba;
use glint_scene::{LightTable, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS};

/// Per-frame camera and shadow data (`group(0) binding(0)`).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    /// xyz = camera position.
    pub camera_pos: [f32; 4],
    /// x = shadows enabled (0/1), y = depth bias, z = index of the spot
    /// light casting shadows, -1 for the directional light.
    pub params: [f32; 4],
}

/// Frame state the lit pass needs besides the light block.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs {
    pub view_proj: Mat4,
    pub light_space: Mat4,
    pub camera_pos: Vec3,
    pub shadows: bool,
    pub bias: f32,
    pub caster: Option<usize>,
}

impl From<FrameInputs> for FrameUniforms {
    fn from(f: FrameInputs) -> Self {
        Self {
            view_proj: f.view_proj.to_cols_array_2d(),
            light_space: f.light_space.to_cols_array_2d(),
            camera_pos: f.camera_pos.extend(1.0).to_array(),
            params: [
                if f.shadows { 1.0 } else { 0.0 },
                f.bias,
                f.caster.map_or(-1.0, |i| i as f32),
                0.0,
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct DirectionalGpu {
    /// w = 1 when bound.
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct PointGpu {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct SpotGpu {
    /// w = cos(inner cutoff).
    pub position: [f32; 4],
    /// w = cos(outer cutoff).
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

/// Light block (`group(0) binding(1)`), the GPU image of a [`LightTable`].
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LightsUniform {
    pub directional: DirectionalGpu,
    /// x = point count, y = spot count.
    pub counts: [u32; 4],
    pub points: [PointGpu; MAX_POINT_LIGHTS],
    pub spots: [SpotGpu; MAX_SPOT_LIGHTS],
}

impl Default for LightsUniform {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl From<&LightTable> for LightsUniform {
    fn from(table: &LightTable) -> Self {
        let mut out = Self::default();
        if let Some(d) = &table.directional {
            let mut direction = d.direction.normalize_or_zero();
            if direction == Vec3::ZERO {
                direction = Vec3::NEG_Y;
            }
            out.directional = DirectionalGpu {
                direction: direction.extend(1.0).to_array(),
                ambient: d.ambient.to_array(),
                diffuse: d.diffuse.to_array(),
                specular: d.specular.to_array(),
            };
        }
        for (dst, src) in out.points.iter_mut().zip(table.points()) {
            *dst = PointGpu {
                position: src.position.extend(1.0).to_array(),
                color: src.color.to_array(),
            };
        }
        for (dst, src) in out.spots.iter_mut().zip(table.spots()) {
            *dst = SpotGpu {
                position: src.position.extend(src.inner_cos).to_array(),
                direction: src.direction.normalize_or_zero().extend(src.outer_cos).to_array(),
                color: src.color.to_array(),
            };
        }
        out.counts = [table.points().len() as u32, table.spots().len() as u32, 0, 0];
        out
    }
}

/// Per-instance vertex data: model matrix, normal matrix and colour.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model's upper 3x3, one column per row.
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
}

impl InstanceData {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
    ];

    pub fn new(model: Mat4, color: Rgba) -> Self {
        let normal = normal_matrix(model);
        Self {
            model: model.to_cols_array_2d(),
            normal: [
                normal.x_axis.extend(0.0).to_array(),
                normal.y_axis.extend(0.0).to_array(),
                normal.z_axis.extend(0.0).to_array(),
            ],
            color: color.to_array(),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Inverse-transpose of the upper 3x3. Singular matrices (zero scale)
/// fall back to the plain 3x3 so the shader never sees NaN.
fn normal_matrix(model: Mat4) -> Mat3 {
    let m = Mat3::from_mat4(model);
    if m.determinant().abs() < f32::EPSILON {
        return m;
    }
    m.inverse().transpose()
}

/// Uniforms for the sponge compute pass.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SpongeUniforms {
    /// x = time in seconds, y/z = resolution.
    pub params: [f32; 4],
}

impl SpongeUniforms {
    pub fn new(time: f32, width: u32, height: u32) -> Self {
        Self {
            params: [time, width as f32, height as f32, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use glint_common::{AxisAngle, Transform};
    use glint_scene::{DirectionalLight, Light, PointLight, Scene, SpotLight};

    fn vec4(v: [f32; 4]) -> Vec4 {
        Vec4::from_array(v)
    }

    #[test]
    fn uniform_sizes_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<LightsUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<InstanceData>(), 128);
        assert_eq!(
            std::mem::size_of::<LightsUniform>(),
            64 + 16 + MAX_POINT_LIGHTS * 32 + MAX_SPOT_LIGHTS * 48
        );
    }

    #[test]
    fn lights_pack_counts_and_slots() {
        let scene = Scene::demo(0);
        let table = scene.bind_lights().unwrap();
        let block = LightsUniform::from(&table);

        assert_eq!(block.counts[0], 2);
        assert_eq!(block.counts[1], 1);
        assert_eq!(block.directional.direction[3], 1.0);
        assert_eq!(
            vec4(block.points[1].position).truncate(),
            scene.points[1].position()
        );
        assert_eq!(block.points[2].color, [0.0; 4]);
    }

    #[test]
    fn spot_cutoffs_travel_in_w() {
        let mut table = LightTable::new();
        SpotLight::default().bind(&mut table).unwrap();
        let block = LightsUniform::from(&table);
        let spot = block.spots[0];
        assert!((spot.position[3] - 17.5_f32.to_radians().cos()).abs() < 1e-6);
        assert!((spot.direction[3] - 22.5_f32.to_radians().cos()).abs() < 1e-6);
        assert_eq!(vec4(spot.direction).truncate(), Vec3::NEG_Z);
    }

    #[test]
    fn empty_table_disables_directional() {
        let block = LightsUniform::from(&LightTable::new());
        assert_eq!(block.directional.direction[3], 0.0);
        assert_eq!(block.counts, [0; 4]);
    }

    #[test]
    fn zero_directional_direction_points_down() {
        let mut table = LightTable::new();
        DirectionalLight {
            direction: Vec3::ZERO,
            ..Default::default()
        }
        .bind(&mut table)
        .unwrap();
        let block = LightsUniform::from(&table);
        assert_eq!(block.directional.direction, [0.0, -1.0, 0.0, 1.0]);
    }

    #[test]
    fn point_light_intensity_is_kept() {
        let mut table = LightTable::new();
        PointLight::new(Vec3::ONE, Rgba::new(1.0, 0.5, 0.25, 3.0), Vec3::ZERO)
            .bind(&mut table)
            .unwrap();
        let block = LightsUniform::from(&table);
        assert_eq!(block.points[0].color, [1.0, 0.5, 0.25, 3.0]);
    }

    #[test]
    fn instance_normal_matrix_undoes_nonuniform_scale() {
        let model = Transform::default()
            .with_scale(Vec3::new(4.0, 1.0, 1.0))
            .with_rotation(AxisAngle::new(Vec3::Z, 45.0))
            .model_matrix();
        let inst = InstanceData::new(model, Rgba::WHITE);
        let n = Mat3::from_cols(
            vec4(inst.normal[0]).truncate(),
            vec4(inst.normal[1]).truncate(),
            vec4(inst.normal[2]).truncate(),
        );
        // A surface tangent stays perpendicular to the transformed normal.
        let tangent = Vec3::new(1.0, -1.0, 0.0).normalize();
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let t = Mat3::from_mat4(model) * tangent;
        let nn = n * normal;
        assert!(t.dot(nn).abs() < 1e-5);
    }

    #[test]
    fn singular_model_does_not_produce_nan() {
        let model = Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
        let inst = InstanceData::new(model, Rgba::WHITE);
        assert!(inst.normal.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn frame_uniform_flags() {
        let inputs = FrameInputs {
            view_proj: Mat4::IDENTITY,
            light_space: Mat4::IDENTITY,
            camera_pos: Vec3::ONE,
            shadows: true,
            bias: 0.005,
            caster: Some(2),
        };
        let u = FrameUniforms::from(inputs);
        assert_eq!(u.params, [1.0, 0.005, 2.0, 0.0]);
        assert_eq!(u.camera_pos, [1.0, 1.0, 1.0, 1.0]);

        let u = FrameUniforms::from(FrameInputs {
            shadows: false,
            caster: None,
            ..inputs
        });
        assert_eq!(u.params[0], 0.0);
        assert_eq!(u.params[2], -1.0);
    }
}
