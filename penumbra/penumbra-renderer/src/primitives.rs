//! Built-in meshes. All use the position/normal/uv layout with counter-clockwise front faces.

use std::f32::consts::PI;

use glam::Vec3;

use crate::registry::{SubmeshData, VertexBufferLayout};

pub const SPHERE_SEGMENTS_H: u32 = 32;
pub const SPHERE_SEGMENTS_V: u32 = 16;

/// Unit sphere. Used for entities and as the point-light volume.
pub fn sphere() -> SubmeshData {
    let (h_count, v_count) = (SPHERE_SEGMENTS_H, SPHERE_SEGMENTS_V);
    let mut vertices = Vec::with_capacity((h_count * (v_count + 1) * 8) as usize);
    for h in 0..h_count {
        for v in 0..=v_count {
            let nh = h as f32 / h_count as f32;
            let nv = v as f32 / v_count as f32 - 0.5;
            let angle_h = 2.0 * PI * nh;
            let angle_v = -PI * nv;
            let p = Vec3::new(angle_h.sin() * angle_v.cos(), -angle_v.sin(), angle_h.cos() * angle_v.cos());
            vertices.extend_from_slice(&[p.x, p.y, p.z, p.x, p.y, p.z, nh, 1.0 - v as f32 / v_count as f32]);
        }
    }

    let ring = v_count + 1;
    let mut indices = Vec::with_capacity((h_count * v_count * 6) as usize);
    for h in 0..h_count {
        let next = (h + 1) % h_count;
        for v in 0..v_count {
            indices.extend_from_slice(&[
                h * ring + v,
                next * ring + v,
                next * ring + v + 1,
                h * ring + v,
                next * ring + v + 1,
                h * ring + v + 1,
            ]);
        }
    }

    SubmeshData {
        layout: VertexBufferLayout::position_normal_uv(),
        vertices,
        indices,
    }
}

/// Quad spanning [-1, 1]² in the XY plane, facing +Z. Doubles as the full-screen quad.
pub fn quad() -> SubmeshData {
    #[rustfmt::skip]
    let vertices = vec![
        -1.0, -1.0, 0.0,  0.0, 0.0, 1.0,  0.0, 1.0,
         1.0, -1.0, 0.0,  0.0, 0.0, 1.0,  1.0, 1.0,
         1.0,  1.0, 0.0,  0.0, 0.0, 1.0,  1.0, 0.0,
        -1.0,  1.0, 0.0,  0.0, 0.0, 1.0,  0.0, 0.0,
    ];
    SubmeshData {
        layout: VertexBufferLayout::position_normal_uv(),
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Cube spanning [-1, 1]³ with per-face normals.
pub fn cube() -> SubmeshData {
    // (normal, u, v) with u × v = normal.
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let corners = [(-1.0, -1.0, 0.0, 1.0), (1.0, -1.0, 1.0, 1.0), (1.0, 1.0, 1.0, 0.0), (-1.0, 1.0, 0.0, 0.0)];

    let mut vertices = Vec::with_capacity(6 * 4 * 8);
    let mut indices = Vec::with_capacity(6 * 6);
    for (face, (normal, u, v)) in faces.into_iter().enumerate() {
        for (su, sv, tu, tv) in corners {
            let p = normal + u * su + v * sv;
            vertices.extend_from_slice(&[p.x, p.y, p.z, normal.x, normal.y, normal.z, tu, tv]);
        }
        let base = face as u32 * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    SubmeshData {
        layout: VertexBufferLayout::position_normal_uv(),
        vertices,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(data: &SubmeshData) -> Vec<Vec3> {
        data.vertices.chunks(8).map(|v| Vec3::new(v[0], v[1], v[2])).collect()
    }

    /// Every triangle's geometric normal points away from the origin.
    fn assert_outward_ccw(data: &SubmeshData) {
        let p = positions(data);
        for tri in data.indices.chunks(3) {
            let (a, b, c) = (p[tri[0] as usize], p[tri[1] as usize], p[tri[2] as usize]);
            let n = (b - a).cross(c - a);
            if n.length_squared() < 1e-10 {
                continue; // degenerate triangles at the sphere poles
            }
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid) > 0.0, "inward-facing triangle {tri:?}");
        }
    }

    #[test]
    fn sphere_counts_and_radius() {
        let s = sphere();
        assert_eq!(s.vertices.len(), (32 * 17 * 8) as usize);
        assert_eq!(s.indices.len(), (32 * 16 * 6) as usize);
        for p in positions(&s) {
            assert!((p.length() - 1.0).abs() < 1e-5);
        }
        let max = *s.indices.iter().max().unwrap();
        assert!((max as usize) < s.vertices.len() / 8);
    }

    #[test]
    fn primitives_face_outward() {
        assert_outward_ccw(&sphere());
        assert_outward_ccw(&cube());
    }

    #[test]
    fn quad_faces_positive_z() {
        let q = quad();
        let p = positions(&q);
        for tri in q.indices.chunks(3) {
            let n = (p[tri[1] as usize] - p[tri[0] as usize]).cross(p[tri[2] as usize] - p[tri[0] as usize]);
            assert!(n.z > 0.0);
        }
    }
}
