//! wgpu render backend.
//!
//! Draws the lit scene (walls, instanced cubes, imported models) with a
//! single shadow-mapped spot or directional light plus point and spot
//! lights, and the Menger sponge compute demo.
//!
//! # Invariants
//! - Renderers read the scene; animation happens in `Scene::update`.
//! - The light block mirrors `LightTable`; array sizes match
//!   `MAX_POINT_LIGHTS` / `MAX_SPOT_LIGHTS`.
//! - All uniform structs are built from `vec4` fields so host and WGSL
//!   layouts agree without padding rules.

mod camera;
mod gpu;
mod shaders;
mod shadow;
mod sponge;
mod texture;
mod uniforms;

pub use camera::FreeCamera;
pub use gpu::{FrameStats, WgpuRenderer};
pub use shaders::{BLIT_SHADER, LIT_SHADER, SHADOW_SHADER, SPONGE_SHADER};
pub use shadow::{DEFAULT_SHADOW_MAP_SIZE, SHADOW_BIAS, ShadowMap};
pub use sponge::SpongeRenderer;
pub use texture::{DEPTH_FORMAT, GpuTexture, create_depth_texture};
pub use uniforms::{FrameInputs, FrameUniforms, InstanceData, LightsUniform};

use glint_assets::AssetError;
use glint_scene::SceneError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("model index {0} was never uploaded")]
    NoSuchModel(usize),
}
