//! CPU scanline rasterizer
//!
//! Features:
//! - Perspective camera with a coarse per-vertex view test
//! - Column-major scanline fill in two half-triangles
//! - Depth buffer holding camera-local position and normal per pixel
//! - Deferred per-pixel shader chains, optionally on the rayon pool

mod math;
mod pivot;
mod camera;
mod types;
mod shader;
mod render;

pub use math::*;
pub use pivot::*;
pub use camera::*;
pub use types::*;
pub use shader::*;
pub use render::*;

