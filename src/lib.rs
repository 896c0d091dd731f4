//! Scanline Renderer: a CPU triangle rasterizer
//!
//! Meshes are scan-converted column by column into a depth buffer that keeps
//! the nearest camera-space point per pixel; shader chains then color every
//! touched pixel once.
//! - `rasterizer`: math, camera, the fill and shade passes
//! - `scene`: meshes, change tracking and RON scene files
//! - `frame`: per-camera frame production with a short output queue
//! - `controller`: keyboard fly camera

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod rasterizer;
pub mod scene;
pub mod frame;
pub mod controller;
pub mod logging;
