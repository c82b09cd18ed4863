// src/engine_lib/geometry.rs

use std::collections::BTreeSet;
use glam::{Mat4, Vec3};

/// Axis-aligned bounds in the geometry's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            let v = Vec3::from_array(*p);
            min = min.min(v);
            max = max.max(v);
        }
        if points.is_empty() {
            return Self { min: Vec3::ZERO, max: Vec3::ZERO };
        }
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z), Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z), Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z), Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z), Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of the eight transformed corners. Loose for rotated boxes, which is fine for picking.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for corner in self.corners() {
            let p = matrix.transform_point3(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    /// Slab test. Returns the distance along `dir` to the first hit in front of `origin`.
    pub fn intersect_ray(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            if d.abs() < 1e-8 {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (self.min[axis] - o) * inv;
            let mut t1 = (self.max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        if t_max < 0.0 {
            return None;
        }
        Some(if t_min >= 0.0 { t_min } else { t_max })
    }
}

/// Indexed triangle geometry plus the deduplicated triangle edges used for wireframe drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates with v = 0 at the top row of the image.
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub line_indices: Vec<u32>,
    pub bounds: Aabb,
}

impl Geometry {
    fn from_triangles(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>, uvs: Vec<[f32; 2]>, indices: Vec<u32>) -> Self {
        let mut edges = BTreeSet::new();
        for tri in indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                edges.insert((a.min(b), a.max(b)));
            }
        }
        let line_indices = edges.into_iter().flat_map(|(a, b)| [a, b]).collect();
        let bounds = Aabb::from_points(&positions);
        Self { positions, normals, uvs, indices, line_indices, bounds }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Default)]
struct FaceBuffers {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl FaceBuffers {
    fn finish(self) -> Geometry {
        Geometry::from_triangles(self.positions, self.normals, self.uvs, self.indices)
    }
}

// One face of a segmented box. `u`, `v`, `w` are axis indices; the face lies at w = depth / 2.
#[allow(clippy::too_many_arguments)]
fn build_face(
    buffers: &mut FaceBuffers,
    (u, v, w): (usize, usize, usize),
    u_dir: f32,
    v_dir: f32,
    width: f32,
    height: f32,
    depth: f32,
    grid_x: u32,
    grid_y: u32,
) {
    let segment_width = width / grid_x as f32;
    let segment_height = height / grid_y as f32;
    let width_half = width / 2.0;
    let height_half = height / 2.0;
    let depth_half = depth / 2.0;
    let start = buffers.positions.len() as u32;
    let row = grid_x + 1;

    for iy in 0..=grid_y {
        let y = iy as f32 * segment_height - height_half;
        for ix in 0..=grid_x {
            let x = ix as f32 * segment_width - width_half;
            let mut position = [0.0f32; 3];
            position[u] = x * u_dir;
            position[v] = y * v_dir;
            position[w] = depth_half;
            buffers.positions.push(position);

            let mut normal = [0.0f32; 3];
            normal[w] = if depth > 0.0 { 1.0 } else { -1.0 };
            buffers.normals.push(normal);
            buffers.uvs.push([ix as f32 / grid_x as f32, iy as f32 / grid_y as f32]);
        }
    }

    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = start + ix + row * iy;
            let b = start + ix + row * (iy + 1);
            let c = start + (ix + 1) + row * (iy + 1);
            let d = start + (ix + 1) + row * iy;
            buffers.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
}

/// Box centred on the origin, faces wound counter-clockwise when seen from outside.
pub fn box_geometry(
    width: f32,
    height: f32,
    depth: f32,
    width_segments: u32,
    height_segments: u32,
    depth_segments: u32,
) -> Geometry {
    let ws = width_segments.max(1);
    let hs = height_segments.max(1);
    let ds = depth_segments.max(1);

    let mut buffers = FaceBuffers::default();
    let (x, y, z) = (0, 1, 2);

    build_face(&mut buffers, (z, y, x), -1.0, -1.0, depth, height, width, ds, hs);
    build_face(&mut buffers, (z, y, x), 1.0, -1.0, depth, height, -width, ds, hs);
    build_face(&mut buffers, (x, z, y), 1.0, 1.0, width, depth, height, ws, ds);
    build_face(&mut buffers, (x, z, y), 1.0, -1.0, width, depth, -height, ws, ds);
    build_face(&mut buffers, (x, y, z), 1.0, -1.0, width, height, depth, ws, hs);
    build_face(&mut buffers, (x, y, z), -1.0, -1.0, width, height, -depth, ws, hs);

    buffers.finish()
}

/// Unit-facing quad in the XY plane, normal +Z.
pub fn plane_geometry(width: f32, height: f32) -> Geometry {
    let mut buffers = FaceBuffers::default();
    build_face(&mut buffers, (0, 1, 2), 1.0, -1.0, width, height, 0.0, 1, 1);
    for n in &mut buffers.normals {
        *n = [0.0, 0.0, 1.0];
    }
    buffers.finish()
}
