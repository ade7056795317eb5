//! Asset loading: mesh data, built-in primitives, OBJ models, textures and
//! shader sources.
//!
//! Everything here is CPU-side. GPU upload lives in `glint-render-wgpu`,
//! which consumes these types by value.

mod image_data;
mod mesh;
mod obj;
mod shader;

pub use image_data::ImageData;
pub use mesh::{MeshData, Vertex, cube, wall};
pub use obj::{ModelData, TextureRef};
pub use shader::ShaderLibrary;

use std::path::PathBuf;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("OBJ load error on {path}: {source}")]
    ObjLoad {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("model {0} contains no meshes")]
    EmptyModel(PathBuf),
}
