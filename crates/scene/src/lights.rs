use glam::{Mat4, Vec3, Vec4};
use glint_common::Rgba;

use crate::SceneError;

/// Size of the point light array in the lit shader.
pub const MAX_POINT_LIGHTS: usize = 8;
/// Size of the spot light array in the lit shader.
pub const MAX_SPOT_LIGHTS: usize = 4;

/// State every light carries. `color.w` is the intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBase {
    pub position: Vec3,
    pub color: Rgba,
    pub velocity: Vec3,
}

impl LightBase {
    pub fn new(position: Vec3, color: Rgba, velocity: Vec3) -> Self {
        Self {
            position,
            color,
            velocity,
        }
    }

    fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

impl Default for LightBase {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Rgba::WHITE,
            velocity: Vec3::ZERO,
        }
    }
}

/// A light source that moves over time and writes itself into a
/// [`LightTable`].
pub trait Light {
    fn base(&self) -> &LightBase;
    fn base_mut(&mut self) -> &mut LightBase;

    /// Advance by `dt` seconds.
    fn update(&mut self, dt: f32);

    /// Write this light into the next free slot of `table`.
    fn bind(&self, table: &mut LightTable) -> Result<(), SceneError>;

    fn position(&self) -> Vec3 {
        self.base().position
    }

    fn color(&self) -> Rgba {
        self.base().color
    }

    fn velocity(&self) -> Vec3 {
        self.base().velocity
    }
}

/// Scene-wide directional light. Its colour doubles as the ambient term;
/// diffuse and specular reuse the rgb with their own factor in `w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub base: LightBase,
    pub direction: Vec3,
    pub diffuse_factor: f32,
    pub specular_factor: f32,
}

impl DirectionalLight {
    pub fn new(base: LightBase, direction: Vec3, diffuse_factor: f32, specular_factor: f32) -> Self {
        Self {
            base,
            direction,
            diffuse_factor,
            specular_factor,
        }
    }

    pub fn ambient(&self) -> Vec4 {
        self.base.color.to_vec4()
    }

    pub fn diffuse(&self) -> Vec4 {
        self.base.color.with_w(self.diffuse_factor).to_vec4()
    }

    pub fn specular(&self) -> Vec4 {
        self.base.color.with_w(self.specular_factor).to_vec4()
    }

    /// Orthographic light-space transform covering a sphere of `radius`
    /// around `center`.
    pub fn light_space(&self, center: Vec3, radius: f32) -> Mat4 {
        let mut dir = self.direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            dir = Vec3::NEG_Y;
        }
        let eye = center - dir * radius * 2.0;
        let up = if dir.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
        let view = Mat4::look_at_rh(eye, center, up);
        let proj = Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.1, radius * 4.0);
        proj * view
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            base: LightBase::default(),
            direction: Vec3::new(1.0, -1.0, 0.0),
            diffuse_factor: 0.5,
            specular_factor: 2.0,
        }
    }
}

impl Light for DirectionalLight {
    fn base(&self) -> &LightBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LightBase {
        &mut self.base
    }

    fn update(&mut self, dt: f32) {
        self.base.advance(dt);
    }

    fn bind(&self, table: &mut LightTable) -> Result<(), SceneError> {
        table.directional = Some(DirectionalSlot {
            direction: self.direction,
            ambient: self.ambient(),
            diffuse: self.diffuse(),
            specular: self.specular(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointLight {
    pub base: LightBase,
}

impl PointLight {
    pub fn new(position: Vec3, color: Rgba, velocity: Vec3) -> Self {
        Self {
            base: LightBase::new(position, color, velocity),
        }
    }
}

impl Light for PointLight {
    fn base(&self) -> &LightBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LightBase {
        &mut self.base
    }

    fn update(&mut self, dt: f32) {
        self.base.advance(dt);
    }

    fn bind(&self, table: &mut LightTable) -> Result<(), SceneError> {
        table.push_point(PointSlot {
            position: self.base.position,
            color: self.base.color.to_vec4(),
        })
        .map(|_| ())
    }
}

/// Cone light. Also the shadow caster of the lit demo, so it keeps its
/// look-at matrix current.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub base: LightBase,
    direction: Vec3,
    up: Vec3,
    /// Degrees.
    pub inner_cutoff: f32,
    /// Degrees.
    pub outer_cutoff: f32,
    view: Mat4,
}

impl SpotLight {
    pub fn new(base: LightBase, direction: Vec3, inner_cutoff: f32, outer_cutoff: f32) -> Self {
        let mut light = Self {
            base,
            direction,
            up: Vec3::Y,
            inner_cutoff,
            outer_cutoff,
            view: Mat4::IDENTITY,
        };
        light.refresh_view();
        light
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Place and orient the light in one step.
    pub fn align(&mut self, position: Vec3, direction: Vec3, up: Vec3) {
        self.base.position = position;
        self.direction = direction;
        self.up = up;
        self.refresh_view();
    }

    pub fn look_at(&self) -> Mat4 {
        self.view
    }

    /// Perspective light-space transform whose frustum matches the outer
    /// cone.
    pub fn light_space(&self, near: f32, far: f32) -> Mat4 {
        let fov = (2.0 * self.outer_cutoff).clamp(1.0, 179.0).to_radians();
        Mat4::perspective_rh(fov, 1.0, near, far) * self.view
    }

    fn refresh_view(&mut self) {
        let p = self.base.position;
        let mut dir = self.direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            dir = Vec3::NEG_Z;
        }
        self.view = Mat4::look_at_rh(p, p + dir, view_up(dir, self.up));
    }
}

/// `up` unless it is (nearly) parallel to `dir`, in which case an axis
/// orthogonal enough to keep the look-at basis finite.
fn view_up(dir: Vec3, up: Vec3) -> Vec3 {
    let up = up.normalize_or_zero();
    if up != Vec3::ZERO && dir.dot(up).abs() < 0.99 {
        up
    } else if dir.z.abs() > 0.99 {
        Vec3::X
    } else {
        Vec3::Z
    }
}

impl Default for SpotLight {
    fn default() -> Self {
        Self::new(LightBase::default(), Vec3::NEG_Z, 17.5, 22.5)
    }
}

impl Light for SpotLight {
    fn base(&self) -> &LightBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LightBase {
        &mut self.base
    }

    fn update(&mut self, dt: f32) {
        self.base.advance(dt);
        self.refresh_view();
    }

    fn bind(&self, table: &mut LightTable) -> Result<(), SceneError> {
        table
            .push_spot(SpotSlot {
                position: self.base.position,
                direction: self.direction,
                inner_cos: self.inner_cutoff.to_radians().cos(),
                outer_cos: self.outer_cutoff.to_radians().cos(),
                color: self.base.color.to_vec4(),
            })
            .map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalSlot {
    pub direction: Vec3,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSlot {
    pub position: Vec3,
    pub color: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotSlot {
    pub position: Vec3,
    pub direction: Vec3,
    pub inner_cos: f32,
    pub outer_cos: f32,
    pub color: Vec4,
}

/// CPU image of the shader's light block. Slots are assigned in binding
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightTable {
    pub directional: Option<DirectionalSlot>,
    points: Vec<PointSlot>,
    spots: Vec<SpotSlot>,
}

impl LightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point light, returning its slot index.
    pub fn push_point(&mut self, slot: PointSlot) -> Result<usize, SceneError> {
        if self.points.len() >= MAX_POINT_LIGHTS {
            return Err(SceneError::TooManyLights {
                kind: "point",
                max: MAX_POINT_LIGHTS,
            });
        }
        self.points.push(slot);
        Ok(self.points.len() - 1)
    }

    /// Append a spot light, returning its slot index.
    pub fn push_spot(&mut self, slot: SpotSlot) -> Result<usize, SceneError> {
        if self.spots.len() >= MAX_SPOT_LIGHTS {
            return Err(SceneError::TooManyLights {
                kind: "spot",
                max: MAX_SPOT_LIGHTS,
            });
        }
        self.spots.push(slot);
        Ok(self.spots.len() - 1)
    }

    pub fn points(&self) -> &[PointSlot] {
        &self.points
    }

    pub fn spots(&self) -> &[SpotSlot] {
        &self.spots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lights_move_by_velocity() {
        let mut p = PointLight::new(Vec3::ZERO, Rgba::WHITE, Vec3::new(1.0, 0.0, -2.0));
        p.update(0.5);
        assert_eq!(p.position(), Vec3::new(0.5, 0.0, -1.0));
    }

    #[test]
    fn directional_defaults() {
        let d = DirectionalLight::default();
        assert_eq!(d.direction, Vec3::new(1.0, -1.0, 0.0));
        assert_eq!(d.diffuse().w, 0.5);
        assert_eq!(d.specular().w, 2.0);
        assert_eq!(d.ambient(), Vec4::ONE);
    }

    #[test]
    fn directional_factors_keep_rgb() {
        let d = DirectionalLight {
            base: LightBase::new(Vec3::ZERO, Rgba::new(0.1, 0.2, 0.3, 0.9), Vec3::ZERO),
            ..Default::default()
        };
        assert_eq!(d.diffuse().truncate(), Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(d.ambient().w, 0.9);
    }

    #[test]
    fn spot_defaults() {
        let s = SpotLight::default();
        assert_eq!(s.inner_cutoff, 17.5);
        assert_eq!(s.outer_cutoff, 22.5);
        assert_eq!(s.direction(), Vec3::NEG_Z);
    }

    #[test]
    fn spot_constructor_keeps_direction() {
        let s = SpotLight::new(LightBase::default(), Vec3::X, 10.0, 20.0);
        assert_eq!(s.direction(), Vec3::X);
    }

    #[test]
    fn spot_look_at_follows_movement() {
        let mut s = SpotLight::new(
            LightBase::new(Vec3::ZERO, Rgba::WHITE, Vec3::new(0.0, 1.0, 0.0)),
            Vec3::NEG_Z,
            10.0,
            20.0,
        );
        let before = s.look_at();
        s.update(1.0);
        assert_ne!(before, s.look_at());
        // The light itself sits at the view-space origin.
        let eye = s.look_at().transform_point3(s.position());
        assert!(eye.length() < 1e-5);
    }

    #[test]
    fn spot_light_space_projects_axis_to_center() {
        let mut s = SpotLight::default();
        s.align(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, Vec3::Z);
        let clip = s.light_space(0.1, 50.0) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn spot_bind_uses_its_own_cutoffs() {
        let s = SpotLight::new(LightBase::default(), Vec3::NEG_Z, 60.0, 90.0);
        let mut table = LightTable::new();
        s.bind(&mut table).unwrap();
        let slot = table.spots()[0];
        assert!((slot.inner_cos - 0.5).abs() < 1e-6);
        assert!(slot.outer_cos.abs() < 1e-6);
    }

    #[test]
    fn point_slots_are_assigned_in_order() {
        let mut table = LightTable::new();
        for i in 0..3 {
            PointLight::new(Vec3::splat(i as f32), Rgba::WHITE, Vec3::ZERO)
                .bind(&mut table)
                .unwrap();
        }
        let xs: Vec<f32> = table.points().iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn point_overflow_is_an_error() {
        let mut table = LightTable::new();
        let light = PointLight::default();
        for _ in 0..MAX_POINT_LIGHTS {
            light.bind(&mut table).unwrap();
        }
        assert_eq!(
            light.bind(&mut table),
            Err(SceneError::TooManyLights {
                kind: "point",
                max: MAX_POINT_LIGHTS
            })
        );
        assert_eq!(table.points().len(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn spot_overflow_is_an_error() {
        let mut table = LightTable::new();
        let light = SpotLight::default();
        for _ in 0..MAX_SPOT_LIGHTS {
            light.bind(&mut table).unwrap();
        }
        assert!(light.bind(&mut table).is_err());
    }

    #[test]
    fn directional_light_space_is_finite() {
        let d = DirectionalLight {
            direction: Vec3::NEG_Y,
            ..Default::default()
        };
        assert!(!d.light_space(Vec3::ZERO, 10.0).is_nan());
    }

    #[test]
    fn spot_pointing_along_up_stays_finite() {
        let mut s = SpotLight::new(LightBase::default(), Vec3::NEG_Y, 10.0, 20.0);
        assert!(!s.look_at().is_nan());
        assert!(!s.light_space(0.1, 50.0).is_nan());

        s.align(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Z, Vec3::NEG_Z);
        assert!(!s.look_at().is_nan());
        assert!(!s.light_space(0.1, 50.0).is_nan());
        // Stored up is left as given; only the view basis substitutes.
        assert_eq!(s.up(), Vec3::NEG_Z);

        let eye = s.look_at().transform_point3(s.position());
        assert!(eye.length() < 1e-5);
        let ahead = s.look_at().transform_point3(s.position() + Vec3::NEG_Z);
        assert!((ahead - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn spot_with_zero_direction_stays_finite() {
        let mut s = SpotLight::default();
        s.align(Vec3::ONE, Vec3::ZERO, Vec3::Y);
        assert!(!s.look_at().is_nan());
    }
}
