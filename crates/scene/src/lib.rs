//! Scene model: lights, drawable objects and the light binding table.
//!
//! # Invariants
//! - Light counts never exceed the shader's fixed array sizes; binding
//!   reports overflow instead of writing past the end.
//! - Static objects keep the model matrix computed at construction.
//! - Nothing in this crate touches the GPU.

mod lights;
mod object;
mod scene;

pub use lights::{
    DirectionalLight, DirectionalSlot, Light, LightBase, LightTable, MAX_POINT_LIGHTS,
    MAX_SPOT_LIGHTS, PointLight, PointSlot, SpotLight, SpotSlot,
};
pub use object::{Cube, ModelInstance, ObjectKind, Placement, SceneObject, Wall};
pub use scene::{Scene, cube_layout};

/// Errors from scene operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("too many {kind} lights: at most {max} can be bound")]
    TooManyLights { kind: &'static str, max: usize },
    #[error("tried to move a static {0} object")]
    StaticObject(ObjectKind),
    #[error("no spot light at index {0}")]
    NoSuchLight(usize),
}
