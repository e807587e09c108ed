//! Polygon triangulation on a scratch copy of the host mesh
//!
//! Faces are projected onto their best-fit plane and ear-clipped, always
//! clipping the best-shaped valid ear. Interior diagonals are then flipped
//! while a flip raises the worse of the two adjacent triangles' quality, which
//! removes most slivers. Quads go through the same path, so they end up split
//! along the better of their two diagonals.

use scenepack_core::{Result, Vec2, Vec3};
use scenepack_scene::MeshData;

/// A triangle of loop indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub loops: [u32; 3],
    /// Source polygon
    pub polygon: u32,
}

/// Owned, triangulated copy of a host mesh
#[derive(Debug, Clone)]
pub struct ScratchMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Vertex index of each loop
    pub loop_vertex: Vec<u32>,
    /// Active UV layer, one entry per loop
    pub uvs: Option<Vec<[f32; 2]>>,
    pub polygon_smooth: Vec<bool>,
    pub triangles: Vec<Triangle>,
}

impl ScratchMesh {
    /// Copy `mesh` and triangulate the copy. The host mesh is not touched.
    pub fn from_mesh(mesh: &MeshData) -> Result<Self> {
        mesh.validate()?;

        let positions: Vec<Vec3> = mesh.vertices.iter().copied().map(Vec3::from_array).collect();
        let loop_vertex: Vec<u32> = mesh.loops.iter().map(|l| l.vertex_index).collect();

        let mut triangles = Vec::with_capacity(mesh.triangle_count());
        for (poly_index, polygon) in mesh.polygons.iter().enumerate() {
            let range = polygon.loop_range();
            let corners: Vec<Vec3> = range
                .clone()
                .map(|l| positions[loop_vertex[l] as usize])
                .collect();

            for [a, b, c] in triangulate_polygon(&corners) {
                triangles.push(Triangle {
                    loops: [
                        (range.start + a) as u32,
                        (range.start + b) as u32,
                        (range.start + c) as u32,
                    ],
                    polygon: poly_index as u32,
                });
            }
        }

        Ok(Self {
            name: mesh.name.clone(),
            positions,
            loop_vertex,
            uvs: mesh.active_uv().map(|layer| layer.uvs.clone()),
            polygon_smooth: mesh.polygons.iter().map(|p| p.smooth).collect(),
            triangles,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Position of the vertex a loop points at
    pub fn loop_position(&self, loop_index: u32) -> Vec3 {
        self.positions[self.loop_vertex[loop_index as usize] as usize]
    }
}

/// Triangulate one face given its corner positions in winding order.
///
/// Returns corner-index triples with the face's winding.
pub fn triangulate_polygon(corners: &[Vec3]) -> Vec<[usize; 3]> {
    let n = corners.len();
    if n < 3 {
        return Vec::new();
    }
    if n == 3 {
        return vec![[0, 1, 2]];
    }

    let normal = newell_normal(corners);
    if normal.length_squared() == 0.0 {
        // Collinear or collapsed face: any fan is as good as another
        return (1..n - 1).map(|i| [0, i, i + 1]).collect();
    }

    let points = project(corners, normal.normalize());
    let mut tris = ear_clip(&points);
    beautify(&points, &mut tris);
    tris
}

/// Face normal robust to non-planar and concave faces
fn newell_normal(corners: &[Vec3]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, cur) in corners.iter().enumerate() {
        let next = corners[(i + 1) % corners.len()];
        normal.x += (cur.y - next.y) * (cur.z + next.z);
        normal.y += (cur.z - next.z) * (cur.x + next.x);
        normal.z += (cur.x - next.x) * (cur.y + next.y);
    }
    normal
}

/// Project onto the plane of `normal`; the face winds counter-clockwise in 2D
fn project(corners: &[Vec3], normal: Vec3) -> Vec<Vec2> {
    let u = normal.any_orthogonal();
    let v = normal.cross(&u);
    corners.iter().map(|p| Vec2::new(p.dot(&u), p.dot(&v))).collect()
}

fn signed_area2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).cross(&(c - a))
}

/// 1.0 for an equilateral triangle, 0.0 for a degenerate one
fn quality(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    let area2 = signed_area2(a, b, c);
    if area2 <= 0.0 {
        return 0.0;
    }
    let len2 = |p: Vec2, q: Vec2| {
        let d = q - p;
        d.x * d.x + d.y * d.y
    };
    let sum = len2(a, b) + len2(b, c) + len2(c, a);
    if sum == 0.0 {
        0.0
    } else {
        // 4 * sqrt(3) * area / sum, with area = area2 / 2
        2.0 * 3.0f32.sqrt() * area2 / sum
    }
}

fn inside_or_on(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = signed_area2(a, b, p);
    let d2 = signed_area2(b, c, p);
    let d3 = signed_area2(c, a, p);
    d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
}

fn ear_clip(points: &[Vec2]) -> Vec<[usize; 3]> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut tris = Vec::with_capacity(points.len() - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let mut best: Option<(usize, f32)> = None;

        for i in 0..m {
            let (prev, cur, next) = (remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]);
            let (a, b, c) = (points[prev], points[cur], points[next]);
            if signed_area2(a, b, c) <= 0.0 {
                continue;
            }

            let blocked = remaining.iter().any(|&other| {
                other != prev
                    && other != cur
                    && other != next
                    && points[other] != a
                    && points[other] != b
                    && points[other] != c
                    && inside_or_on(points[other], a, b, c)
            });
            if blocked {
                continue;
            }

            let q = quality(a, b, c);
            if best.map_or(true, |(_, best_q)| q > best_q) {
                best = Some((i, q));
            }
        }

        // Self-intersecting input has no valid ear; clip anyway so we terminate
        let i = best.map(|(i, _)| i).unwrap_or(0);
        tris.push([remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]]);
        remaining.remove(i);
    }

    tris.push([remaining[0], remaining[1], remaining[2]]);
    tris
}

/// Find the directed edge `a -> b` of `tri`, returning the opposite corner
fn opposite(tri: &[usize; 3], a: usize, b: usize) -> Option<usize> {
    (0..3).find_map(|k| (tri[k] == a && tri[(k + 1) % 3] == b).then(|| tri[(k + 2) % 3]))
}

fn beautify(points: &[Vec2], tris: &mut [[usize; 3]]) {
    const EPSILON: f32 = 1e-5;
    let max_passes = points.len() * points.len();

    for _ in 0..max_passes {
        let mut flipped = false;

        for i in 0..tris.len() {
            for j in (i + 1)..tris.len() {
                let t1 = tris[i];
                for k in 0..3 {
                    let (a, b, c) = (t1[k], t1[(k + 1) % 3], t1[(k + 2) % 3]);
                    let Some(d) = opposite(&tris[j], b, a) else {
                        continue;
                    };

                    let (pa, pb, pc, pd) = (points[a], points[b], points[c], points[d]);
                    let before = quality(pa, pb, pc).min(quality(pb, pa, pd));
                    let after = quality(pa, pd, pc).min(quality(pd, pb, pc));

                    // Both new triangles must keep the face's winding
                    if signed_area2(pa, pd, pc) > 0.0
                        && signed_area2(pd, pb, pc) > 0.0
                        && after > before + EPSILON
                    {
                        tris[i] = [a, d, c];
                        tris[j] = [d, b, c];
                        flipped = true;
                        break;
                    }
                }
            }
        }

        if !flipped {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    fn area(corners: &[Vec3], tris: &[[usize; 3]]) -> f32 {
        tris.iter()
            .map(|t| {
                let e1 = corners[t[1]] - corners[t[0]];
                let e2 = corners[t[2]] - corners[t[0]];
                e1.cross(&e2).z * 0.5
            })
            .sum()
    }

    #[test]
    fn test_triangle_passthrough() {
        assert_eq!(triangulate_polygon(&[v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)]), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_quad_picks_short_diagonal() {
        // Long thin rhombus: the short diagonal (1-3) gives fatter triangles
        let quad = [v(0.0, 0.0), v(2.0, -0.5), v(4.0, 0.0), v(2.0, 0.5)];
        let tris = triangulate_polygon(&quad);

        assert_eq!(tris.len(), 2);
        for t in &tris {
            assert!(t.contains(&1) && t.contains(&3), "expected diagonal 1-3, got {tris:?}");
        }
    }

    #[test]
    fn test_concave_quad_uses_inner_diagonal() {
        // Dart shape, corner 3 is reflex
        let quad = [v(0.0, 0.0), v(2.0, 1.0), v(0.0, 2.0), v(0.5, 1.0)];
        let tris = triangulate_polygon(&quad);

        assert!((area(&quad, &tris) - 1.5).abs() < 1e-5);
        for t in &tris {
            let e1 = quad[t[1]] - quad[t[0]];
            let e2 = quad[t[2]] - quad[t[0]];
            assert!(e1.cross(&e2).z > 0.0, "triangle {t:?} is flipped");
        }
    }

    #[test]
    fn test_ngon_preserves_area_and_winding() {
        let hexagon: Vec<Vec3> = (0..6)
            .map(|i| {
                let a = i as f32 * std::f32::consts::TAU / 6.0;
                v(a.cos(), a.sin())
            })
            .collect();
        let tris = triangulate_polygon(&hexagon);

        assert_eq!(tris.len(), 4);
        let expected = 3.0 * 3.0f32.sqrt() / 2.0;
        assert!((area(&hexagon, &tris) - expected).abs() < 1e-4);
    }

    #[test]
    fn test_clockwise_face_keeps_its_winding() {
        let quad = [v(0.0, 0.0), v(0.0, 1.0), v(1.0, 1.0), v(1.0, 0.0)];
        let tris = triangulate_polygon(&quad);
        assert!((area(&quad, &tris) + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_scratch_copy_leaves_host_untouched() {
        let mut mesh = MeshData::new("quad");
        mesh.vertices = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        mesh.add_polygon(&[0, 1, 2, 3], true);
        let before = mesh.clone();

        let scratch = ScratchMesh::from_mesh(&mesh).unwrap();
        assert_eq!(scratch.triangle_count(), 2);
        assert!(scratch.uvs.is_none());
        assert_eq!(mesh, before);
        assert_eq!(mesh.polygon_count(), 1);
    }
}
