//! Perspective camera: projection to screen pixels and the coarse view test

use super::math::{Axis, Vec3};
use super::pivot::Pivot;

/// Depths closer to the camera plane than this are nudged before dividing
pub const NEAR_EPSILON: f32 = 0.001;

/// Camera looking down its local +Z axis, local +Y up.
///
/// Screen origin is the top-left pixel, y grows downward.
#[derive(Debug, Clone)]
pub struct Camera {
    pivot: Pivot,
    /// Zoom factor applied on top of the field of view
    pub scale: f32,
    /// Vertical field of view in radians
    pub fov: f32,
    pub screen_width: usize,
    pub screen_height: usize,
}

impl Camera {
    pub fn new(position: Vec3, scale: f32, fov: f32, screen_width: usize, screen_height: usize) -> Self {
        Self::with_pivot(Pivot::at(position), scale, fov, screen_width, screen_height)
    }

    pub fn with_pivot(pivot: Pivot, scale: f32, fov: f32, screen_width: usize, screen_height: usize) -> Self {
        debug_assert!(screen_width > 0 && screen_height > 0);
        Self {
            pivot,
            scale,
            fov,
            screen_width,
            screen_height,
        }
    }

    pub fn pivot(&self) -> &Pivot {
        &self.pivot
    }

    pub fn position(&self) -> Vec3 {
        self.pivot.center
    }

    pub fn move_by(&mut self, v: Vec3) {
        self.pivot.move_by(v);
    }

    pub fn rotate(&mut self, angle: f32, axis: Axis) {
        self.pivot.rotate(angle, axis);
    }

    /// Change the output size, e.g. when the window is resized
    pub fn resize(&mut self, screen_width: usize, screen_height: usize) {
        self.screen_width = screen_width.max(1);
        self.screen_height = screen_height.max(1);
    }

    /// Distance in pixels from the eye to the projection plane
    pub fn focal_length(&self) -> f32 {
        self.scale * (self.screen_height as f32 / 2.0) / (self.fov / 2.0).tan()
    }

    /// Project a camera-local point. Returns screen x, y and the untouched local depth in z.
    pub fn screen_projection(&self, local: Vec3) -> Vec3 {
        let z = if local.z.abs() < NEAR_EPSILON {
            NEAR_EPSILON.copysign(local.z)
        } else {
            local.z
        };
        let f = self.focal_length() / z;
        Vec3 {
            x: self.screen_width as f32 / 2.0 + local.x * f,
            y: self.screen_height as f32 / 2.0 - local.y * f,
            z: local.z,
        }
    }

    /// Coarse view-volume test on a camera-local point: in front of the
    /// camera and projecting inside the screen rectangle.
    pub fn in_observe_local(&self, local: Vec3) -> bool {
        if local.z <= 0.0 {
            return false;
        }
        let p = self.screen_projection(local);
        p.x >= 0.0
            && p.x < self.screen_width as f32
            && p.y >= 0.0
            && p.y < self.screen_height as f32
    }

    /// `in_observe_local` for a world-space point
    pub fn in_observe(&self, world: Vec3) -> bool {
        self.in_observe_local(self.pivot.to_local(world))
    }
}
