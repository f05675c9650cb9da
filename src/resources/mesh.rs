//! Mesh data structures and generation
//!
//! All generators produce meshes centered on the origin with counter-clockwise
//! winding when viewed from outside.

use crate::backend::types::Vertex;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// A mesh with vertex and index data
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub name: String,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: name.to_string(),
        }
    }

    /// Calculate vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Calculate index count
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Calculate triangle count
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get vertex data as bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Get index data as bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Axis-aligned bounds as (min, max); both zero for an empty mesh
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut iter = self.vertices.iter().map(|v| v.position);
        let Some(first) = iter.next() else {
            return (Vec3::ZERO, Vec3::ZERO);
        };
        iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)))
    }

    fn push_vertex(&mut self, position: Vec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex::new(position));
        index
    }

    /// Create a box with the given width (X), height (Y) and depth (Z)
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let mut mesh = Mesh::new("box");
        let half = Vec3::new(width, height, depth) * 0.5;

        let corners = [
            // Front face
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            // Back face
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            // Right face
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            // Left face
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            // Top face
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            // Bottom face
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
        ];

        for corner in corners {
            mesh.push_vertex(corner * half);
        }

        // Two triangles per face
        for face in 0..6 {
            let base = face * 4;
            mesh.indices.extend_from_slice(&[
                base,
                base + 1,
                base + 2,
                base,
                base + 2,
                base + 3,
            ]);
        }

        mesh
    }

    /// Create a UV sphere
    ///
    /// `width_segments` runs around the equator, `height_segments` from pole
    /// to pole. Degenerate triangles at the poles are skipped.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let mut mesh = Mesh::new("sphere");
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut grid = Vec::with_capacity(height_segments as usize + 1);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = v * PI;

            let mut row = Vec::with_capacity(width_segments as usize + 1);
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * TAU;

                let position = Vec3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                );
                row.push(mesh.push_vertex(position));
            }
            grid.push(row);
        }

        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];

                if iy != 0 {
                    mesh.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments as usize - 1 {
                    mesh.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        mesh
    }

    /// Create a flat plane in the XY axis, facing +Z
    pub fn plane(width: f32, height: f32, segments: u32) -> Self {
        let mut mesh = Mesh::new("plane");
        let segments = segments.max(1);

        let half_width = width / 2.0;
        let half_height = height / 2.0;
        let step_x = width / segments as f32;
        let step_y = height / segments as f32;

        // Rows run top to bottom
        for iy in 0..=segments {
            let y = half_height - iy as f32 * step_y;
            for ix in 0..=segments {
                let x = -half_width + ix as f32 * step_x;
                mesh.push_vertex(Vec3::new(x, y, 0.0));
            }
        }

        for iy in 0..segments {
            for ix in 0..segments {
                let a = iy * (segments + 1) + ix;
                let b = a + segments + 1;
                let c = b + 1;
                let d = a + 1;

                mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        mesh
    }

    /// Create a capped cylinder along Y
    ///
    /// A zero top radius produces a cone; the top cap is then omitted.
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Self {
        let mut mesh = Mesh::new("cylinder");
        let radial_segments = radial_segments.max(3);
        let half_height = height / 2.0;

        let ring = |radius: f32, i: u32| {
            let theta = i as f32 / radial_segments as f32 * TAU;
            (radius * theta.sin(), radius * theta.cos())
        };

        // Side: top row then bottom row
        let mut rows = [Vec::new(), Vec::new()];
        for (row, (radius, y)) in rows
            .iter_mut()
            .zip([(radius_top, half_height), (radius_bottom, -half_height)])
        {
            for i in 0..=radial_segments {
                let (x, z) = ring(radius, i);
                row.push(mesh.push_vertex(Vec3::new(x, y, z)));
            }
        }

        for i in 0..radial_segments as usize {
            let a = rows[0][i];
            let b = rows[1][i];
            let c = rows[1][i + 1];
            let d = rows[0][i + 1];
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }

        if radius_top > 0.0 {
            mesh.push_cap(radius_top, half_height, radial_segments, true);
        }
        if radius_bottom > 0.0 {
            mesh.push_cap(radius_bottom, -half_height, radial_segments, false);
        }

        mesh
    }

    /// Create a cone with its base at -height/2 and apex at +height/2
    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        let mut mesh = Self::cylinder(0.0, radius, height, radial_segments);
        mesh.name = "cone".to_string();
        mesh
    }

    fn push_cap(&mut self, radius: f32, y: f32, radial_segments: u32, top: bool) {
        let center = self.push_vertex(Vec3::new(0.0, y, 0.0));
        let first = self.vertices.len() as u32;

        for i in 0..=radial_segments {
            let theta = i as f32 / radial_segments as f32 * TAU;
            self.push_vertex(Vec3::new(radius * theta.sin(), y, radius * theta.cos()));
        }

        for i in 0..radial_segments {
            let current = first + i;
            let next = current + 1;
            if top {
                self.indices.extend_from_slice(&[center, current, next]);
            } else {
                self.indices.extend_from_slice(&[center, next, current]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_valid(mesh: &Mesh) {
        assert_eq!(mesh.index_count() % 3, 0, "{} has a partial triangle", mesh.name);
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count), "{} index out of range", mesh.name);
    }

    fn assert_vec_near(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    /// Signed area direction of a triangle relative to an outward direction
    fn faces_outward(mesh: &Mesh, tri: usize, outward: Vec3) -> bool {
        let [a, b, c] = [0, 1, 2].map(|k| mesh.vertices[mesh.indices[tri * 3 + k] as usize].position);
        (b - a).cross(c - a).dot(outward) > 0.0
    }

    #[test]
    fn cuboid_dimensions() {
        let mesh = Mesh::cuboid(1.0, 2.0, 0.5);
        assert_indices_valid(&mesh);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);

        let (min, max) = mesh.bounds();
        assert_vec_near(min, Vec3::new(-0.5, -1.0, -0.25));
        assert_vec_near(max, Vec3::new(0.5, 1.0, 0.25));
    }

    #[test]
    fn cuboid_winding_is_outward() {
        let mesh = Mesh::cuboid(1.0, 1.0, 1.0);
        let outward = [Vec3::Z, -Vec3::Z, Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y];
        for (face, dir) in outward.into_iter().enumerate() {
            assert!(faces_outward(&mesh, face * 2, dir));
            assert!(faces_outward(&mesh, face * 2 + 1, dir));
        }
    }

    #[test]
    fn sphere_vertices_on_radius() {
        let mesh = Mesh::sphere(0.1, 32, 32);
        assert_indices_valid(&mesh);
        assert_eq!(mesh.vertex_count(), 33 * 33);
        // Pole rows contribute one triangle per segment instead of two
        assert_eq!(mesh.triangle_count(), 32 * 32 * 2 - 2 * 32);
        for v in &mesh.vertices {
            assert!((v.position.length() - 0.1).abs() < 1e-5);
        }
    }

    #[test]
    fn sphere_winding_is_outward() {
        let mesh = Mesh::sphere(1.0, 8, 6);
        for tri in 0..mesh.triangle_count() {
            let [a, b, c] =
                [0, 1, 2].map(|k| mesh.vertices[mesh.indices[tri * 3 + k] as usize].position);
            let centroid = (a + b + c) / 3.0;
            assert!(faces_outward(&mesh, tri, centroid), "triangle {tri} faces inward");
        }
    }

    #[test]
    fn plane_lies_in_xy() {
        let mesh = Mesh::plane(100.0, 100.0, 1);
        assert_indices_valid(&mesh);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);

        let (min, max) = mesh.bounds();
        assert_vec_near(min, Vec3::new(-50.0, -50.0, 0.0));
        assert_vec_near(max, Vec3::new(50.0, 50.0, 0.0));
        assert!(faces_outward(&mesh, 0, Vec3::Z));
        assert!(faces_outward(&mesh, 1, Vec3::Z));
    }

    #[test]
    fn cylinder_has_both_caps() {
        let mesh = Mesh::cylinder(0.1, 0.1, 2.0, 32);
        assert_indices_valid(&mesh);
        // Sides plus two caps
        assert_eq!(mesh.triangle_count(), 32 * 2 + 32 * 2);

        let (min, max) = mesh.bounds();
        assert!((min.y + 1.0).abs() < 1e-5);
        assert!((max.y - 1.0).abs() < 1e-5);
        assert!(max.x <= 0.1 + 1e-5);
    }

    #[test]
    fn cone_has_apex_and_single_cap() {
        let mesh = Mesh::cone(0.1, 0.3, 32);
        assert_indices_valid(&mesh);
        assert_eq!(mesh.name, "cone");
        assert_eq!(mesh.triangle_count(), 32 * 2 + 32);

        let apex = mesh
            .vertices
            .iter()
            .filter(|v| (v.position.y - 0.15).abs() < 1e-5)
            .all(|v| v.position.x.abs() < 1e-5 && v.position.z.abs() < 1e-5);
        assert!(apex);
    }

    #[test]
    fn byte_views_match_counts() {
        let mesh = Mesh::cuboid(1.0, 1.0, 1.0);
        assert_eq!(mesh.vertex_bytes().len(), mesh.vertex_count() * 12);
        assert_eq!(mesh.index_bytes().len(), mesh.index_count() * 4);
        assert_eq!(Mesh::new("empty").bounds(), (Vec3::ZERO, Vec3::ZERO));
    }
}
