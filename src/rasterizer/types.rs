//! Core types for the rasterizer

use serde::{Serialize, Deserialize};
use super::math::Vec3;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const GREY: Color = Color { r: 128, g: 128, b: 128, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Apply shading (multiply by intensity 0.0-1.0)
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * i) as u8,
            g: (self.g as f32 * i) as u8,
            b: (self.b as f32 * i) as u8,
            a: self.a,
        }
    }

    /// Linear blend toward `other`; t = 0 keeps self, t = 1 gives other
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Pack as 0xAARRGGBB
    pub fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    pub fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Convert to [u8; 4] in RGBA order
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Index of a mesh in the slice handed to the rasterizer for one frame
pub type MeshId = usize;

/// Per-pixel record produced by the fill pass and consumed by shaders.
/// Position and normal are in camera-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Color,
    /// Owning mesh, used to look up its shaders
    pub mesh: MeshId,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, mesh: MeshId) -> Self {
        Self {
            position,
            normal,
            color: Color::default(),
            mesh,
        }
    }
}

/// One camera-local triangle, consumed once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Poly {
    pub v1: Vertex,
    pub v2: Vertex,
    pub v3: Vertex,
}

impl Poly {
    pub fn new(v1: Vertex, v2: Vertex, v3: Vertex) -> Self {
        Self { v1, v2, v3 }
    }

    pub fn vertices(&self) -> [Vertex; 3] {
        [self.v1, self.v2, self.v3]
    }
}

/// Rasterizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Color every touched pixel starts from before its shaders run
    pub base_color: Color,
    /// Shade touched pixels on the rayon pool, then merge into the buffer
    pub parallel_shading: bool,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            base_color: Color::with_alpha(30, 30, 30, 255),
            parallel_shading: false,
        }
    }
}
