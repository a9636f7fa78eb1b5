//! Icosphere mesh by recursive midpoint subdivision.
//!
//! The unit sphere is oriented with `y` up; longitude is measured from the
//! `+x` axis towards `+z`. The antimeridian vertices of the base
//! icosahedron sit exactly on `z = 0`, so every vertex generated on the
//! seam stays exactly on it.

use std::collections::HashMap;
use std::f64::consts::PI;

/// Triangle mesh approximating the unit sphere.
#[derive(Debug, Clone)]
pub struct Icosphere {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<[usize; 3]>,
}

impl Icosphere {
    /// Icosahedron subdivided `subdivisions` times.
    ///
    /// Each pass splits every triangle into four, so the mesh has
    /// `10 * 4^n + 2` vertices.
    pub fn new(subdivisions: u32) -> Self {
        let mut sphere = Self::icosahedron();
        for _ in 0..subdivisions {
            sphere = sphere.subdivide();
        }
        sphere
    }

    /// Poles on the `y` axis, two rings of five at `±atan(1/2)` latitude;
    /// the upper ring starts on the antimeridian, the lower one is rotated
    /// by 36°.
    fn icosahedron() -> Self {
        let ring_lat = 0.5f64.atan();
        let (y, r) = (ring_lat.sin(), ring_lat.cos());

        let mut vertices = Vec::with_capacity(12);
        vertices.push([0.0, 1.0, 0.0]);
        for k in 0..5 {
            vertices.push(ring_vertex(-180.0 + 72.0 * k as f64, y, r));
        }
        for k in 0..5 {
            vertices.push(ring_vertex(-144.0 + 72.0 * k as f64, -y, r));
        }
        vertices.push([0.0, -1.0, 0.0]);

        let (north, south) = (0, 11);
        let upper = |k: usize| 1 + k % 5;
        let lower = |k: usize| 6 + k % 5;

        let mut faces = Vec::with_capacity(20);
        for k in 0..5 {
            faces.push([north, upper(k), upper(k + 1)]);
            faces.push([upper(k), lower(k), upper(k + 1)]);
            faces.push([upper(k + 1), lower(k), lower(k + 1)]);
            faces.push([south, lower(k + 1), lower(k)]);
        }

        Self { vertices, faces }
    }

    /// Split every face into four through its normalized edge midpoints.
    /// Midpoints of shared edges are created once.
    fn subdivide(&self) -> Self {
        let mut vertices = self.vertices.clone();
        let mut faces = Vec::with_capacity(self.faces.len() * 4);
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();

        for face in &self.faces {
            let mut mid = [0usize; 3];
            for j in 0..3 {
                let a = face[j];
                let b = face[(j + 1) % 3];
                let edge = if a < b { (a, b) } else { (b, a) };

                mid[j] = *midpoints.entry(edge).or_insert_with(|| {
                    let idx = vertices.len();
                    vertices.push(normalize([
                        (self.vertices[a][0] + self.vertices[b][0]) / 2.0,
                        (self.vertices[a][1] + self.vertices[b][1]) / 2.0,
                        (self.vertices[a][2] + self.vertices[b][2]) / 2.0,
                    ]));
                    idx
                });
            }

            faces.push([face[0], mid[0], mid[2]]);
            faces.push([mid[0], face[1], mid[1]]);
            faces.push([mid[2], mid[1], face[2]]);
            faces.push([mid[0], mid[1], mid[2]]);
        }

        Self { vertices, faces }
    }

    /// Texture coordinates of the mesh as a textured sphere sees them.
    ///
    /// `u = 0.5 + atan2(z, x) / 2π`, `v = acos(y) / π`. Seam vertices
    /// appear twice, at `u = 0` and `u = 1`; the poles have `v = 0` and
    /// `v = 1`.
    pub fn texture_coords(&self) -> Vec<[f64; 2]> {
        let mut uvs = Vec::with_capacity(self.vertices.len() + 16);
        for &[x, y, z] in &self.vertices {
            let u = 0.5 + z.atan2(x) / (2.0 * PI);
            let v = y.clamp(-1.0, 1.0).acos() / PI;
            if u == 1.0 {
                uvs.push([0.0, v]);
            }
            uvs.push([u, v]);
        }
        uvs
    }
}

fn ring_vertex(lng_deg: f64, y: f64, r: f64) -> [f64; 3] {
    if lng_deg == -180.0 {
        // exactly on the seam
        return [-r, y, 0.0];
    }
    let (sin, cos) = lng_deg.to_radians().sin_cos();
    [r * cos, y, r * sin]
}

fn normalize(p: [f64; 3]) -> [f64; 3] {
    let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
    [p[0] / len, p[1] / len, p[2] / len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_and_face_counts() {
        for n in 0..4 {
            let sphere = Icosphere::new(n);
            assert_eq!(sphere.vertices.len(), 10 * 4usize.pow(n) + 2);
            assert_eq!(sphere.faces.len(), 20 * 4usize.pow(n));
        }
    }

    #[test]
    fn test_vertices_on_unit_sphere() {
        for v in Icosphere::new(3).vertices {
            let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_base_edges_equal() {
        let sphere = Icosphere::new(0);
        let edge = |a: usize, b: usize| {
            let (p, q) = (sphere.vertices[a], sphere.vertices[b]);
            ((p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2) + (p[2] - q[2]).powi(2)).sqrt()
        };
        let first = edge(sphere.faces[0][0], sphere.faces[0][1]);
        for f in &sphere.faces {
            assert!((edge(f[0], f[1]) - first).abs() < 1e-12);
            assert!((edge(f[1], f[2]) - first).abs() < 1e-12);
            assert!((edge(f[2], f[0]) - first).abs() < 1e-12);
        }
    }

    #[test]
    fn test_seam_vertices_duplicated() {
        let sphere = Icosphere::new(2);
        let uvs = sphere.texture_coords();
        let left: Vec<f64> = uvs.iter().filter(|uv| uv[0] == 0.0).map(|uv| uv[1]).collect();
        let right: Vec<f64> = uvs.iter().filter(|uv| uv[0] == 1.0).map(|uv| uv[1]).collect();
        assert!(!left.is_empty());
        assert_eq!(left, right);
        assert_eq!(uvs.len(), sphere.vertices.len() + left.len());
    }

    #[test]
    fn test_poles_at_v_edges() {
        let uvs = Icosphere::new(1).texture_coords();
        assert_eq!(uvs.iter().filter(|uv| uv[1] == 0.0).count(), 1);
        assert_eq!(uvs.iter().filter(|uv| uv[1] == 1.0).count(), 1);
    }
}
