use glam::Mat4;
use glint_common::{Rgba, Transform};

use crate::SceneError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Wall,
    Cube,
    Model,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Wall => "wall",
            Self::Cube => "cube",
            Self::Model => "model",
        })
    }
}

/// Transform plus its cached model matrix.
///
/// Static placements compute the matrix once and refuse to move afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    transform: Transform,
    matrix: Mat4,
    is_static: bool,
}

impl Placement {
    pub fn new(transform: Transform, is_static: bool) -> Self {
        Self {
            transform,
            matrix: transform.model_matrix(),
            is_static,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    fn set(&mut self, kind: ObjectKind, transform: Transform) -> Result<(), SceneError> {
        if self.is_static {
            return Err(SceneError::StaticObject(kind));
        }
        self.transform = transform;
        self.matrix = transform.model_matrix();
        Ok(())
    }
}

/// Anything the lit renderer draws.
pub trait SceneObject {
    fn kind(&self) -> ObjectKind;
    fn placement(&self) -> &Placement;
    fn placement_mut(&mut self) -> &mut Placement;
    fn triangle_count(&self) -> u32;

    fn transform(&self) -> &Transform {
        self.placement().transform()
    }

    fn model_matrix(&self) -> Mat4 {
        self.placement().matrix()
    }

    fn is_static(&self) -> bool {
        self.placement().is_static()
    }

    /// Move the object. Static objects return [`SceneError::StaticObject`]
    /// and stay where they are.
    fn set_transform(&mut self, transform: Transform) -> Result<(), SceneError> {
        let kind = self.kind();
        self.placement_mut().set(kind, transform)
    }
}

/// Flat quad, optionally carrying the wall texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub placement: Placement,
    pub color: Rgba,
    pub textured: bool,
}

impl Wall {
    pub fn new(transform: Transform, is_static: bool) -> Self {
        Self {
            placement: Placement::new(transform, is_static),
            color: Rgba::new(0.5, 0.5, 0.5, 1.0),
            textured: false,
        }
    }

    pub fn textured(mut self) -> Self {
        self.textured = true;
        self
    }
}

impl SceneObject for Wall {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Wall
    }

    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn triangle_count(&self) -> u32 {
        2
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube {
    pub placement: Placement,
    pub color: Rgba,
}

impl Cube {
    pub fn new(transform: Transform, is_static: bool, color: Rgba) -> Self {
        Self {
            placement: Placement::new(transform, is_static),
            color,
        }
    }
}

impl SceneObject for Cube {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Cube
    }

    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn triangle_count(&self) -> u32 {
        12
    }
}

/// Placed copy of an imported model. `model` indexes the renderer's
/// uploaded model list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInstance {
    pub placement: Placement,
    pub model: usize,
    pub triangles: u32,
}

impl ModelInstance {
    pub fn new(model: usize, triangles: u32, transform: Transform, is_static: bool) -> Self {
        Self {
            placement: Placement::new(transform, is_static),
            model,
            triangles,
        }
    }
}

impl SceneObject for ModelInstance {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Model
    }

    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn triangle_count(&self) -> u32 {
        self.triangles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn static_wall_rejects_updates() {
        let mut wall = Wall::new(Transform::default(), true);
        let before = wall.model_matrix();
        let err = wall
            .set_transform(Transform::at(Vec3::X))
            .unwrap_err();
        assert_eq!(err, SceneError::StaticObject(ObjectKind::Wall));
        assert_eq!(wall.model_matrix(), before);
    }

    #[test]
    fn dynamic_cube_recomputes_matrix() {
        let mut cube = Cube::new(Transform::default(), false, Rgba::WHITE);
        cube.set_transform(Transform::at(Vec3::new(0.0, 3.0, 0.0)))
            .unwrap();
        let origin = cube.model_matrix().transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn static_matrix_is_computed_at_construction() {
        let t = Transform::at(Vec3::new(1.0, 2.0, 3.0));
        let wall = Wall::new(t, true);
        assert_eq!(wall.model_matrix(), t.model_matrix());
    }

    #[test]
    fn triangle_counts() {
        assert_eq!(Wall::new(Transform::default(), true).triangle_count(), 2);
        assert_eq!(
            Cube::new(Transform::default(), true, Rgba::WHITE).triangle_count(),
            12
        );
        assert_eq!(
            ModelInstance::new(0, 500, Transform::default(), true).triangle_count(),
            500
        );
    }

    #[test]
    fn kind_display() {
        assert_eq!(ObjectKind::Model.to_string(), "model");
    }
}
