use std::path::{Path, PathBuf};

use crate::AssetError;
use crate::mesh::{MeshData, Vertex};

/// Index into [`ModelData::textures`]. Meshes that share a texture file
/// share the same reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRef(pub usize);

/// An imported model: its meshes flattened into a list, plus the distinct
/// texture files they reference.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub path: PathBuf,
    pub meshes: Vec<MeshData>,
    pub textures: Vec<PathBuf>,
}

impl ModelData {
    /// Import an OBJ file (and its MTL, if any).
    ///
    /// Polygons are triangulated and indices unified. Meshes without normals
    /// get computed ones; meshes without texture coordinates get zeros.
    /// Diffuse texture paths are resolved relative to the OBJ directory.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let _span = tracing::info_span!("load_obj", path = %path.display()).entered();

        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| AssetError::ObjLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let materials = materials.unwrap_or_else(|e| {
            tracing::warn!("materials for {} not loaded: {e}", path.display());
            Vec::new()
        });

        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut data = ModelData {
            path: path.to_path_buf(),
            ..Default::default()
        };

        for model in models {
            let diffuse = model
                .mesh
                .material_id
                .and_then(|id| materials.get(id))
                .and_then(|m| m.diffuse_texture.as_deref())
                .filter(|t| !t.is_empty())
                .map(|t| data.texture_ref(directory.join(t)));
            let mesh = convert_mesh(model.name, &model.mesh, diffuse);
            data.meshes.push(mesh);
        }

        if data.meshes.is_empty() {
            return Err(AssetError::EmptyModel(path.to_path_buf()));
        }

        tracing::info!(
            "loaded {}: {} meshes, {} triangles, {} textures",
            path.display(),
            data.meshes.len(),
            data.triangle_count(),
            data.textures.len()
        );
        Ok(data)
    }

    pub fn triangle_count(&self) -> u32 {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }

    /// Reference for `path`, registering it on first use.
    pub fn texture_ref(&mut self, path: PathBuf) -> TextureRef {
        if let Some(i) = self.textures.iter().position(|p| *p == path) {
            return TextureRef(i);
        }
        self.textures.push(path);
        TextureRef(self.textures.len() - 1)
    }
}

fn convert_mesh(name: String, mesh: &tobj::Mesh, diffuse: Option<TextureRef>) -> MeshData {
    let count = mesh.positions.len() / 3;
    let has_normals = mesh.normals.len() == mesh.positions.len();
    let has_uvs = mesh.texcoords.len() / 2 == count;

    let vertices = (0..count)
        .map(|i| {
            let position = [
                mesh.positions[3 * i],
                mesh.positions[3 * i + 1],
                mesh.positions[3 * i + 2],
            ];
            let normal = if has_normals {
                [
                    mesh.normals[3 * i],
                    mesh.normals[3 * i + 1],
                    mesh.normals[3 * i + 2],
                ]
            } else {
                [0.0; 3]
            };
            // OBJ puts v = 0 at the bottom of the image.
            let uv = if has_uvs {
                [mesh.texcoords[2 * i], 1.0 - mesh.texcoords[2 * i + 1]]
            } else {
                [0.0; 2]
            };
            Vertex::new(position, normal, uv)
        })
        .collect();

    let mut data = MeshData {
        name,
        vertices,
        indices: mesh.indices.clone(),
        diffuse,
    };
    if !has_normals {
        data.recompute_normals();
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const QUAD_OBJ: &str = "\
mtllib quad.mtl
o quad
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl brick
f 1/1 2/2 3/3 4/4
o tri
v 0 0 1
v 1 0 1
v 0 1 1
usemtl brick
f 5 6 7
";

    const QUAD_MTL: &str = "\
newmtl brick
map_Kd brick.png
";

    #[test]
    fn load_obj_flattens_and_triangulates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();
        fs::write(dir.path().join("quad.mtl"), QUAD_MTL).unwrap();

        let model = ModelData::load_obj(dir.path().join("quad.obj")).unwrap();
        assert_eq!(model.meshes.len(), 2);
        // Quad is split into two triangles, plus one triangle.
        assert_eq!(model.triangle_count(), 3);
    }

    #[test]
    fn shared_texture_is_registered_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();
        fs::write(dir.path().join("quad.mtl"), QUAD_MTL).unwrap();

        let model = ModelData::load_obj(dir.path().join("quad.obj")).unwrap();
        assert_eq!(model.textures, vec![dir.path().join("brick.png")]);
        assert!(
            model
                .meshes
                .iter()
                .all(|m| m.diffuse == Some(TextureRef(0)))
        );
    }

    #[test]
    fn missing_normals_are_computed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();
        fs::write(dir.path().join("quad.mtl"), QUAD_MTL).unwrap();

        let model = ModelData::load_obj(dir.path().join("quad.obj")).unwrap();
        for mesh in &model.meshes {
            for v in &mesh.vertices {
                assert_eq!(v.normal, [0.0, 0.0, 1.0]);
            }
        }
    }

    #[test]
    fn texcoords_are_flipped_to_top_left_origin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();
        fs::write(dir.path().join("quad.mtl"), QUAD_MTL).unwrap();

        let model = ModelData::load_obj(dir.path().join("quad.obj")).unwrap();
        let quad = &model.meshes[0];
        let bottom_left = quad
            .vertices
            .iter()
            .find(|v| v.position == [-1.0, -1.0, 0.0])
            .unwrap();
        assert_eq!(bottom_left.uv, [0.0, 1.0]);
    }

    #[test]
    fn missing_mtl_loads_untextured() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();

        let model = ModelData::load_obj(dir.path().join("quad.obj")).unwrap();
        assert_eq!(model.meshes.len(), 2);
        assert!(model.textures.is_empty());
        assert!(model.meshes.iter().all(|m| m.diffuse.is_none()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelData::load_obj(dir.path().join("nope.obj")).unwrap_err();
        assert!(matches!(err, AssetError::ObjLoad { .. }));
    }

    #[test]
    fn texture_ref_deduplicates_paths() {
        let mut model = ModelData::default();
        let a = model.texture_ref("a.png".into());
        let b = model.texture_ref("b.png".into());
        let a2 = model.texture_ref("a.png".into());
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(model.textures.len(), 2);
    }
}
