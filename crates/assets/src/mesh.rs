use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::obj::TextureRef;

/// Interleaved vertex shared by every mesh the renderer draws.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle mesh with an optional diffuse texture.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub diffuse: Option<TextureRef>,
}

impl MeshData {
    pub fn triangle_count(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    /// Replace every normal with the area-weighted average of the faces
    /// touching the vertex.
    pub fn recompute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= accum.len() || b >= accum.len() || c >= accum.len() {
                continue;
            }
            let pa = Vec3::from(self.vertices[a].position);
            let pb = Vec3::from(self.vertices[b].position);
            let pc = Vec3::from(self.vertices[c].position);
            let n = (pb - pa).cross(pc - pa);
            accum[a] += n;
            accum[b] += n;
            accum[c] += n;
        }
        for (v, n) in self.vertices.iter_mut().zip(accum) {
            v.normal = n.normalize_or_zero().to_array();
        }
    }
}

/// Unit cube centred on the origin: 24 vertices so every face gets its own
/// normal, 36 indices, counter-clockwise front faces.
pub fn cube() -> MeshData {
    let p = 0.5_f32;
    let uv = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
    #[rustfmt::skip]
    let faces: [([[f32; 3]; 4], [f32; 3]); 6] = [
        ([[-p, -p,  p], [ p, -p,  p], [ p,  p,  p], [-p,  p,  p]], [0.0, 0.0, 1.0]),
        ([[ p, -p, -p], [-p, -p, -p], [-p,  p, -p], [ p,  p, -p]], [0.0, 0.0, -1.0]),
        ([[ p, -p,  p], [ p, -p, -p], [ p,  p, -p], [ p,  p,  p]], [1.0, 0.0, 0.0]),
        ([[-p, -p, -p], [-p, -p,  p], [-p,  p,  p], [-p,  p, -p]], [-1.0, 0.0, 0.0]),
        ([[-p,  p,  p], [ p,  p,  p], [ p,  p, -p], [-p,  p, -p]], [0.0, 1.0, 0.0]),
        ([[-p, -p, -p], [ p, -p, -p], [ p, -p,  p], [-p, -p,  p]], [0.0, -1.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (corners, normal) in faces {
        let base = vertices.len() as u32;
        for (corner, uv) in corners.into_iter().zip(uv) {
            vertices.push(Vertex::new(corner, normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    MeshData {
        name: "cube".into(),
        vertices,
        indices,
        diffuse: None,
    }
}

/// Two-triangle quad spanning [-1, 1] on X and Y, facing +Z.
pub fn wall() -> MeshData {
    let n = [0.0, 0.0, 1.0];
    MeshData {
        name: "wall".into(),
        vertices: vec![
            Vertex::new([1.0, 1.0, 0.0], n, [1.0, 0.0]),
            Vertex::new([-1.0, 1.0, 0.0], n, [0.0, 0.0]),
            Vertex::new([-1.0, -1.0, 0.0], n, [0.0, 1.0]),
            Vertex::new([1.0, -1.0, 0.0], n, [1.0, 1.0]),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
        diffuse: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(mesh: &MeshData, tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from(mesh.vertices[i as usize].position);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0])).normalize()
    }

    #[test]
    fn cube_counts() {
        let c = cube();
        assert_eq!(c.vertices.len(), 24);
        assert_eq!(c.indices.len(), 36);
        assert_eq!(c.triangle_count(), 12);
    }

    #[test]
    fn cube_winding_matches_normals() {
        let c = cube();
        for tri in c.indices.chunks_exact(3) {
            let geometric = face_normal(&c, tri);
            let stored = Vec3::from(c.vertices[tri[0] as usize].normal);
            assert!(geometric.dot(stored) > 0.99, "triangle {tri:?} faces inward");
        }
    }

    #[test]
    fn wall_faces_positive_z() {
        let w = wall();
        assert_eq!(w.triangle_count(), 2);
        for tri in w.indices.chunks_exact(3) {
            assert!(face_normal(&w, tri).z > 0.99);
        }
    }

    #[test]
    fn recompute_normals_matches_wall() {
        let mut w = wall();
        for v in &mut w.vertices {
            v.normal = [0.0; 3];
        }
        w.recompute_normals();
        for v in &w.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn recompute_normals_skips_out_of_range_indices() {
        let mut w = wall();
        w.indices.extend_from_slice(&[0, 1, 99]);
        w.recompute_normals();
        assert!(w.vertices.iter().all(|v| !Vec3::from(v.normal).is_nan()));
    }
}
