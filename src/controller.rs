//! Keyboard fly camera
//!
//! Keys are collected as a held set while events arrive and applied once
//! between frames, so a frame never sees a half-moved camera.

use std::collections::BTreeSet;

use crate::rasterizer::{Axis, Camera};

/// World units per frame for a held movement key
pub const DEFAULT_SPEED: f32 = 40.0;
/// Radians per frame for a held rotation key
pub const ROTATION_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CameraKey {
    /// W
    Forward,
    /// S
    Back,
    /// A
    Left,
    /// D
    Right,
    /// Q
    TurnLeft,
    /// E
    TurnRight,
    /// R
    TiltUp,
    /// F
    TiltDown,
}

#[derive(Debug, Clone)]
pub struct CameraController {
    held: BTreeSet<CameraKey>,
    pub speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            held: BTreeSet::new(),
            speed: DEFAULT_SPEED,
        }
    }
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: CameraKey) {
        self.held.insert(key);
    }

    pub fn key_up(&mut self, key: CameraKey) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: CameraKey) -> bool {
        self.held.contains(&key)
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    /// Apply every held key once. Returns true if the camera changed.
    pub fn apply(&self, camera: &mut Camera) -> bool {
        for &key in &self.held {
            let axes = *camera.pivot();
            match key {
                CameraKey::Forward => camera.move_by(axes.z_axis * self.speed),
                CameraKey::Back => camera.move_by(-axes.z_axis * self.speed),
                CameraKey::Right => camera.move_by(axes.x_axis * self.speed),
                CameraKey::Left => camera.move_by(-axes.x_axis * self.speed),
                CameraKey::TurnLeft => camera.rotate(-ROTATION_STEP, Axis::Y),
                CameraKey::TurnRight => camera.rotate(ROTATION_STEP, Axis::Y),
                CameraKey::TiltUp => camera.rotate(-ROTATION_STEP, Axis::X),
                CameraKey::TiltDown => camera.rotate(ROTATION_STEP, Axis::X),
            }
        }
        !self.held.is_empty()
    }
}
