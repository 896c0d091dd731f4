//! Triangle meshes placed in the world by a pivot
//!
//! Vertices are stored in the mesh's local frame and cached in world space;
//! every transform refreshes the cache so the per-frame triangle extraction
//! only has to go world -> camera.

use std::sync::Arc;

use crate::rasterizer::{Axis, Camera, MeshId, Pivot, Poly, Shader, Vec3, Vertex};

/// What a mesh transform did. Hand it to whoever tracks scene changes.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshChange {
    Moved(Vec3),
    Rotated { angle: f32, axis: Axis },
    Scaled(f32),
}

/// Indexed triangle mesh with optional per-corner normals and a shader chain
#[derive(Clone)]
pub struct Mesh {
    pivot: Pivot,
    local_vertices: Vec<Vec3>,
    global_vertices: Vec<Vec3>,
    /// Normals in the mesh's local frame
    normals: Vec<Vec3>,
    /// Three entries per triangle
    indices: Vec<usize>,
    /// Empty, or parallel to `indices`
    normal_indices: Vec<usize>,
    shaders: Vec<Arc<dyn Shader>>,
}

impl Mesh {
    pub fn new(pivot: Pivot, local_vertices: Vec<Vec3>, indices: Vec<usize>) -> Self {
        let global_vertices = local_vertices.iter().map(|&v| pivot.to_global(v)).collect();
        Self {
            pivot,
            local_vertices,
            global_vertices,
            normals: Vec::new(),
            indices,
            normal_indices: Vec::new(),
            shaders: Vec::new(),
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>, normal_indices: Vec<usize>) -> Self {
        self.normals = normals;
        self.normal_indices = normal_indices;
        self
    }

    /// Append a shader to the end of the chain
    pub fn with_shader(mut self, shader: Arc<dyn Shader>) -> Self {
        self.shaders.push(shader);
        self
    }

    pub fn set_shaders(&mut self, shaders: Vec<Arc<dyn Shader>>) {
        self.shaders = shaders;
    }

    /// Axis-aligned cube of edge `size` centered on `center`, one normal per face
    pub fn cube(center: Vec3, size: f32) -> Self {
        let h = size / 2.0;
        let corners = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        // (two triangles, face normal)
        let faces: [([usize; 6], Vec3); 6] = [
            ([0, 1, 2, 0, 2, 3], -Vec3::Z),
            ([5, 4, 7, 5, 7, 6], Vec3::Z),
            ([4, 0, 3, 4, 3, 7], -Vec3::X),
            ([1, 5, 6, 1, 6, 2], Vec3::X),
            ([4, 5, 1, 4, 1, 0], -Vec3::Y),
            ([3, 2, 6, 3, 6, 7], Vec3::Y),
        ];

        let mut indices = Vec::with_capacity(36);
        let mut normals = Vec::with_capacity(6);
        let mut normal_indices = Vec::with_capacity(36);
        for (face, (tris, normal)) in faces.iter().enumerate() {
            indices.extend_from_slice(tris);
            normals.push(*normal);
            normal_indices.extend(std::iter::repeat(face).take(6));
        }

        Self::new(Pivot::at(center), corners, indices).with_normals(normals, normal_indices)
    }

    pub fn pivot(&self) -> &Pivot {
        &self.pivot
    }

    pub fn local_vertices(&self) -> &[Vec3] {
        &self.local_vertices
    }

    pub fn global_vertices(&self) -> &[Vec3] {
        &self.global_vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn normal_indices(&self) -> &[usize] {
        &self.normal_indices
    }

    pub fn shaders(&self) -> &[Arc<dyn Shader>] {
        &self.shaders
    }

    /// Whole triangles only; a trailing partial triple is ignored
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn move_by(&mut self, v: Vec3) -> MeshChange {
        self.pivot.move_by(v);
        for g in &mut self.global_vertices {
            *g += v;
        }
        MeshChange::Moved(v)
    }

    pub fn rotate(&mut self, angle: f32, axis: Axis) -> MeshChange {
        self.pivot.rotate(angle, axis);
        self.refresh_global();
        MeshChange::Rotated { angle, axis }
    }

    /// Scale about the pivot center
    pub fn scale(&mut self, k: f32) -> MeshChange {
        for v in &mut self.local_vertices {
            *v = *v * k;
        }
        self.refresh_global();
        MeshChange::Scaled(k)
    }

    fn refresh_global(&mut self) {
        let pivot = self.pivot;
        self.global_vertices = self.local_vertices.iter().map(|&v| pivot.to_global(v)).collect();
    }

    /// Triangle starting at index slot `i`, in `camera`'s local frame.
    ///
    /// `i` must be a multiple of 3 below `indices().len()`. Normals are
    /// carried into camera space; without normal data they are zero.
    pub fn local_poly(&self, camera: &Camera, i: usize, id: MeshId) -> Poly {
        let eye = camera.pivot();
        let corner = |k: usize| {
            let position = eye.to_local(self.global_vertices[self.indices[i + k]]);
            let normal = if self.normals.is_empty() {
                Vec3::ZERO
            } else {
                let n = self.normals[self.normal_indices[i + k]];
                eye.direction_to_local(self.pivot.direction_to_global(n))
            };
            Vertex::new(position, normal, id)
        };
        Poly::new(corner(0), corner(1), corner(2))
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("pivot", &self.pivot)
            .field("vertices", &self.local_vertices.len())
            .field("triangles", &self.triangle_count())
            .field("shaders", &self.shaders.len())
            .finish()
    }
}
