//! Per-pixel shading stage
//!
//! Each mesh carries an ordered list of shaders. For every pixel the mesh
//! wins in the depth buffer, the rasterizer starts from the base color and
//! runs that list front to back; each shader rewrites `vertex.color`.

use serde::{Serialize, Deserialize};
use super::camera::Camera;
use super::math::Vec3;
use super::types::{Color, Vertex};

/// Pluggable shading step.
///
/// Implementations must only depend on the vertex and camera (plus their
/// own immutable state) so the same input always yields the same color.
pub trait Shader: Send + Sync {
    fn compute_shader(&self, vertex: &mut Vertex, camera: &Camera);
}

/// Point light in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub intensity: f32,
}

impl Light {
    pub fn new(position: Vec3, intensity: f32) -> Self {
        Self { position, intensity }
    }
}

/// Replaces the color outright
#[derive(Debug, Clone, Copy)]
pub struct FlatShader {
    pub color: Color,
}

impl FlatShader {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Shader for FlatShader {
    fn compute_shader(&self, vertex: &mut Vertex, _camera: &Camera) {
        vertex.color = self.color;
    }
}

/// Lambert falloff from a single point light plus an ambient floor
#[derive(Debug, Clone, Copy)]
pub struct DiffuseShader {
    pub light: Light,
    pub albedo: Color,
    pub ambient: f32,
}

impl DiffuseShader {
    pub fn new(light: Light, albedo: Color, ambient: f32) -> Self {
        Self { light, albedo, ambient }
    }

    fn intensity(&self, vertex: &Vertex, camera: &Camera) -> f32 {
        let light_pos = camera.pivot().to_local(self.light.position);
        let to_light = (light_pos - vertex.position).normalize();
        // Meshes without normal data fall back to facing the light head-on
        let normal = vertex.normal.normalize();
        let diffuse = if normal == Vec3::ZERO {
            1.0
        } else {
            normal.dot(to_light).abs()
        };
        let ambient = self.ambient.clamp(0.0, 1.0);
        (ambient + (1.0 - ambient) * diffuse * self.light.intensity).clamp(0.0, 1.0)
    }
}

impl Shader for DiffuseShader {
    fn compute_shader(&self, vertex: &mut Vertex, camera: &Camera) {
        vertex.color = self.albedo.shade(self.intensity(vertex, camera));
    }
}

/// Blends the incoming color toward a fog color by camera depth
#[derive(Debug, Clone, Copy)]
pub struct DepthFogShader {
    pub near: f32,
    pub far: f32,
    pub color: Color,
}

impl DepthFogShader {
    pub fn new(near: f32, far: f32, color: Color) -> Self {
        Self { near, far, color }
    }
}

impl Shader for DepthFogShader {
    fn compute_shader(&self, vertex: &mut Vertex, _camera: &Camera) {
        let span = self.far - self.near;
        let t = if span > 0.0 {
            (vertex.position.z - self.near) / span
        } else if vertex.position.z >= self.far {
            1.0
        } else {
            0.0
        };
        vertex.color = vertex.color.lerp(self.color, t);
    }
}
