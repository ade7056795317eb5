use glam::{Mat4, Vec3};
use glint_common::{AxisAngle, Rgba, Transform};

use crate::lights::{DirectionalLight, Light, LightBase, LightTable, PointLight, SpotLight};
use crate::object::{Cube, ModelInstance, SceneObject, Wall};
use crate::SceneError;

/// Near/far planes of the spot light shadow frustum.
const SHADOW_NEAR: f32 = 0.5;
const SHADOW_FAR: f32 = 60.0;
/// Radius covered by the directional fallback shadow projection.
const SCENE_RADIUS: f32 = 15.0;

const CUBE_SPACING: f32 = 2.0;

const PALETTE: [Rgba; 6] = [
    Rgba { rgb: Vec3::new(0.9, 0.3, 0.3), w: 1.0 },
    Rgba { rgb: Vec3::new(0.3, 0.8, 0.4), w: 1.0 },
    Rgba { rgb: Vec3::new(0.3, 0.5, 0.9), w: 1.0 },
    Rgba { rgb: Vec3::new(0.9, 0.8, 0.3), w: 1.0 },
    Rgba { rgb: Vec3::new(0.7, 0.4, 0.9), w: 1.0 },
    Rgba { rgb: Vec3::new(0.3, 0.8, 0.8), w: 1.0 },
];

/// Everything the lit demo draws and lights.
#[derive(Debug, Clone)]
pub struct Scene {
    pub directional: DirectionalLight,
    pub points: Vec<PointLight>,
    pub spots: Vec<SpotLight>,
    pub walls: Vec<Wall>,
    pub cubes: Vec<Cube>,
    pub models: Vec<ModelInstance>,
    /// Degrees per second applied to dynamic cubes.
    pub spin_degrees_per_sec: f32,
    shadow_caster: Option<usize>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene lit by the default directional light.
    pub fn new() -> Self {
        Self {
            directional: DirectionalLight::default(),
            points: Vec::new(),
            spots: Vec::new(),
            walls: Vec::new(),
            cubes: Vec::new(),
            models: Vec::new(),
            spin_degrees_per_sec: 0.0,
            shadow_caster: None,
        }
    }

    /// Shadow-mapping demo: a floor and back wall, `num_cubes` spinning cubes
    /// on a square lattice, a dim directional light, two point lights and a
    /// spot light overhead casting the shadows.
    pub fn demo(num_cubes: usize) -> Self {
        let mut scene = Self::new();
        scene.spin_degrees_per_sec = 45.0;

        scene.directional = DirectionalLight::new(
            LightBase::new(Vec3::ZERO, Rgba::new(1.0, 1.0, 1.0, 0.15), Vec3::ZERO),
            Vec3::new(1.0, -1.0, 0.0),
            0.5,
            2.0,
        );

        scene.walls.push(
            Wall::new(
                Transform::at(Vec3::new(0.0, -0.5, 0.0))
                    .with_scale(Vec3::new(10.0, 1.0, 10.0))
                    .with_rotation(AxisAngle::new(Vec3::X, -90.0)),
                true,
            )
            .textured(),
        );
        scene.walls.push(Wall::new(
            Transform::at(Vec3::new(0.0, 4.5, -10.0)).with_scale(Vec3::new(10.0, 5.0, 1.0)),
            true,
        ));

        for (i, position) in cube_layout(num_cubes, CUBE_SPACING).into_iter().enumerate() {
            let transform = Transform::at(position)
                .with_rotation(AxisAngle::new(Vec3::Y, (i as f32 * 17.0) % 360.0));
            scene
                .cubes
                .push(Cube::new(transform, false, PALETTE[i % PALETTE.len()]));
        }

        scene.points.push(PointLight::new(
            Vec3::new(-4.0, 2.0, 3.0),
            Rgba::new(1.0, 0.6, 0.4, 1.0),
            Vec3::ZERO,
        ));
        scene.points.push(PointLight::new(
            Vec3::new(4.0, 2.0, 3.0),
            Rgba::new(0.4, 0.6, 1.0, 1.0),
            Vec3::ZERO,
        ));

        let mut spot = SpotLight::new(
            LightBase::new(Vec3::ZERO, Rgba::new(1.0, 1.0, 0.9, 1.5), Vec3::ZERO),
            Vec3::NEG_Y,
            30.0,
            40.0,
        );
        spot.align(
            Vec3::new(0.0, 9.0, 4.0),
            Vec3::new(0.0, -1.0, -0.45).normalize(),
            Vec3::NEG_Z,
        );
        scene.spots.push(spot);
        scene.shadow_caster = Some(0);

        tracing::debug!(
            cubes = scene.cubes.len(),
            points = scene.points.len(),
            spots = scene.spots.len(),
            "demo scene built"
        );
        scene
    }

    pub fn shadow_caster(&self) -> Option<&SpotLight> {
        self.shadow_caster.and_then(|i| self.spots.get(i))
    }

    pub fn shadow_caster_index(&self) -> Option<usize> {
        self.shadow_caster
    }

    /// Pick which spot light renders the shadow map. `None` falls back to
    /// the directional light.
    pub fn set_shadow_caster(&mut self, index: Option<usize>) -> Result<(), SceneError> {
        if let Some(i) = index {
            if i >= self.spots.len() {
                return Err(SceneError::NoSuchLight(i));
            }
        }
        self.shadow_caster = index;
        Ok(())
    }

    pub fn add_model(&mut self, instance: ModelInstance) {
        self.models.push(instance);
    }

    /// Advance lights and spin dynamic cubes.
    pub fn update(&mut self, dt: f32) {
        self.directional.update(dt);
        for light in &mut self.points {
            light.update(dt);
        }
        for light in &mut self.spots {
            light.update(dt);
        }

        let step = self.spin_degrees_per_sec * dt;
        if step == 0.0 {
            return;
        }
        for cube in self.cubes.iter_mut().filter(|c| !c.is_static()) {
            let mut t = *cube.transform();
            t.rotation.degrees = (t.rotation.degrees + step) % 360.0;
            if let Err(e) = cube.set_transform(t) {
                tracing::warn!("{e}");
            }
        }
    }

    /// Bind every light in a fixed order: directional, points, spots.
    pub fn bind_lights(&self) -> Result<LightTable, SceneError> {
        let mut table = LightTable::new();
        self.directional.bind(&mut table)?;
        for light in &self.points {
            light.bind(&mut table)?;
        }
        for light in &self.spots {
            light.bind(&mut table)?;
        }
        Ok(table)
    }

    /// World to light clip space for the shadow pass.
    pub fn light_space_matrix(&self) -> Mat4 {
        match self.shadow_caster() {
            Some(spot) => spot.light_space(SHADOW_NEAR, SHADOW_FAR),
            None => self.directional.light_space(Vec3::ZERO, SCENE_RADIUS),
        }
    }

    pub fn triangle_count(&self) -> u32 {
        let walls: u32 = self.walls.iter().map(SceneObject::triangle_count).sum();
        let cubes: u32 = self.cubes.iter().map(SceneObject::triangle_count).sum();
        let models: u32 = self.models.iter().map(SceneObject::triangle_count).sum();
        walls + cubes + models
    }

    pub fn object_count(&self) -> usize {
        self.walls.len() + self.cubes.len() + self.models.len()
    }
}

/// `count` positions on a square lattice in the XZ plane, centred on the
/// origin, filled row by row.
pub fn cube_layout(count: usize, spacing: f32) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let side = (count as f32).sqrt().ceil() as usize;
    let offset = (side - 1) as f32 * spacing * 0.5;
    (0..count)
        .map(|i| {
            let (row, col) = (i / side, i % side);
            Vec3::new(
                col as f32 * spacing - offset,
                0.0,
                row as f32 * spacing - offset,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::{MAX_POINT_LIGHTS, PointLight};

    #[test]
    fn demo_scene_contents() {
        let scene = Scene::demo(9);
        assert_eq!(scene.cubes.len(), 9);
        assert_eq!(scene.walls.len(), 2);
        assert!(scene.shadow_caster().is_some());
        assert_eq!(scene.triangle_count(), 9 * 12 + 2 * 2);
    }

    #[test]
    fn demo_walls_are_static_and_cubes_dynamic() {
        let scene = Scene::demo(4);
        assert!(scene.walls.iter().all(|w| w.is_static()));
        assert!(scene.cubes.iter().all(|c| !c.is_static()));
    }

    #[test]
    fn floor_faces_up() {
        let scene = Scene::demo(0);
        let floor = &scene.walls[0];
        let normal = floor.model_matrix().transform_vector3(Vec3::Z).normalize();
        assert!(normal.y > 0.99);
    }

    #[test]
    fn layout_is_centred() {
        let positions = cube_layout(9, 2.0);
        assert_eq!(positions.len(), 9);
        let sum: Vec3 = positions.iter().copied().sum();
        assert!(sum.length() < 1e-5);
        assert_eq!(positions[0], Vec3::new(-2.0, 0.0, -2.0));
    }

    #[test]
    fn layout_handles_non_square_counts() {
        let positions = cube_layout(5, 1.0);
        assert_eq!(positions.len(), 5);
        // 3x3 lattice, partially filled.
        assert_eq!(positions[4], Vec3::new(0.0, 0.0, 0.0));
        assert!(cube_layout(0, 1.0).is_empty());
    }

    #[test]
    fn update_spins_cubes() {
        let mut scene = Scene::demo(1);
        let before = scene.cubes[0].transform().rotation.degrees;
        scene.update(1.0);
        let after = scene.cubes[0].transform().rotation.degrees;
        assert!((after - (before + 45.0)).abs() < 1e-4);
    }

    #[test]
    fn update_moves_lights() {
        let mut scene = Scene::new();
        scene
            .points
            .push(PointLight::new(Vec3::ZERO, Rgba::WHITE, Vec3::X));
        scene.update(2.0);
        assert_eq!(scene.points[0].position(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn bind_lights_orders_slots() {
        let scene = Scene::demo(0);
        let table = scene.bind_lights().unwrap();
        assert!(table.directional.is_some());
        assert_eq!(table.points().len(), 2);
        assert_eq!(table.spots().len(), 1);
        assert_eq!(table.points()[0].position, scene.points[0].position());
    }

    #[test]
    fn bind_lights_reports_overflow() {
        let mut scene = Scene::new();
        scene.points = vec![PointLight::default(); MAX_POINT_LIGHTS + 1];
        assert!(scene.bind_lights().is_err());
    }

    #[test]
    fn shadow_caster_must_exist() {
        let mut scene = Scene::new();
        assert_eq!(
            scene.set_shadow_caster(Some(0)),
            Err(SceneError::NoSuchLight(0))
        );
        scene.set_shadow_caster(None).unwrap();
        assert!(!scene.light_space_matrix().is_nan());
    }

    #[test]
    fn demo_light_space_sees_the_origin() {
        let scene = Scene::demo(1);
        let clip = scene.light_space_matrix() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
