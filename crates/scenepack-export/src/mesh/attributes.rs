//! Per-corner normals and tangents for a triangulated mesh

use std::collections::HashMap;

use scenepack_core::Vec3;

use super::triangulate::ScratchMesh;

/// Attributes for every triangle corner, indexed `triangle * 3 + corner`
#[derive(Debug, Clone)]
pub struct CornerAttributes {
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
}

impl CornerAttributes {
    pub fn compute(mesh: &ScratchMesh, uvs: &[[f32; 2]]) -> Self {
        let normals = corner_normals(mesh);
        let tangents = corner_tangents(mesh, uvs, &normals);
        Self { normals, tangents }
    }
}

/// Twice-area-weighted triangle normal
fn weighted_normal(mesh: &ScratchMesh, loops: [u32; 3]) -> Vec3 {
    let [p0, p1, p2] = loops.map(|l| mesh.loop_position(l));
    (p1 - p0).cross(&(p2 - p0))
}

/// Smooth faces take the area-weighted vertex normal, flat faces the face normal
pub fn corner_normals(mesh: &ScratchMesh) -> Vec<Vec3> {
    let mut face = vec![Vec3::ZERO; mesh.polygon_smooth.len()];
    let mut vertex = vec![Vec3::ZERO; mesh.positions.len()];

    for tri in &mesh.triangles {
        let n = weighted_normal(mesh, tri.loops);
        face[tri.polygon as usize] += n;
        for &l in &tri.loops {
            vertex[mesh.loop_vertex[l as usize] as usize] += n;
        }
    }

    let mut out = Vec::with_capacity(mesh.triangles.len() * 3);
    for tri in &mesh.triangles {
        let smooth = mesh.polygon_smooth[tri.polygon as usize];
        for &l in &tri.loops {
            let n = if smooth {
                vertex[mesh.loop_vertex[l as usize] as usize]
            } else {
                face[tri.polygon as usize]
            };
            let n = n.normalize();
            out.push(if n == Vec3::ZERO { Vec3::UP } else { n });
        }
    }
    out
}

type CornerKey = (u32, [u32; 2], [u32; 3]);

fn corner_key(vertex: u32, uv: [f32; 2], normal: Vec3) -> CornerKey {
    (
        vertex,
        uv.map(f32::to_bits),
        normal.to_array().map(f32::to_bits),
    )
}

/// UV-derived tangents, orthogonalized against the corner normal.
///
/// Corners that share a vertex, UV and normal share one accumulated tangent,
/// so seams in either UV or shading keep separate tangents.
pub fn corner_tangents(mesh: &ScratchMesh, uvs: &[[f32; 2]], normals: &[Vec3]) -> Vec<Vec3> {
    let mut accum: HashMap<CornerKey, Vec3> = HashMap::new();
    let mut keys = Vec::with_capacity(normals.len());

    for (t, tri) in mesh.triangles.iter().enumerate() {
        let [p0, p1, p2] = tri.loops.map(|l| mesh.loop_position(l));
        let [uv0, uv1, uv2] = tri.loops.map(|l| uvs[l as usize]);

        let (e1, e2) = (p1 - p0, p2 - p0);
        let (du1, dv1) = (uv1[0] - uv0[0], uv1[1] - uv0[1]);
        let (du2, dv2) = (uv2[0] - uv0[0], uv2[1] - uv0[1]);
        let det = du1 * dv2 - du2 * dv1;

        let tangent = if det.abs() > f32::EPSILON {
            (e1 * dv2 - e2 * dv1) * (1.0 / det)
        } else {
            Vec3::ZERO
        };

        for (corner, &l) in tri.loops.iter().enumerate() {
            let key = corner_key(mesh.loop_vertex[l as usize], uvs[l as usize], normals[t * 3 + corner]);
            *accum.entry(key).or_insert(Vec3::ZERO) += tangent;
            keys.push(key);
        }
    }

    keys.iter()
        .zip(normals)
        .map(|(key, &n)| {
            let t = accum.get(key).copied().unwrap_or(Vec3::ZERO);
            let t = (t - n * n.dot(&t)).normalize();
            if t == Vec3::ZERO {
                n.any_orthogonal()
            } else {
                t
            }
        })
        .collect()
}
