//! Local coordinate frame shared by meshes and cameras

use super::math::{Axis, Mat3, Vec3};

/// Origin plus orthonormal basis, expressed in world coordinates.
///
/// The world-to-local transform is the transpose of the local-to-world
/// basis, which only holds while the axes stay orthonormal. Rotations are
/// applied in world axes and accumulate float drift; nothing re-orthonormalizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub center: Vec3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub z_axis: Vec3,
}

impl Pivot {
    pub fn new(center: Vec3, x_axis: Vec3, y_axis: Vec3, z_axis: Vec3) -> Self {
        Self { center, x_axis, y_axis, z_axis }
    }

    /// Axis-aligned pivot at `center`
    pub fn at(center: Vec3) -> Self {
        Self::new(center, Vec3::X, Vec3::Y, Vec3::Z)
    }

    /// Basis as columns: maps local directions to world directions
    pub fn local_to_world(&self) -> Mat3 {
        Mat3::from_columns(self.x_axis, self.y_axis, self.z_axis)
    }

    /// Basis as rows: maps world directions to local directions
    pub fn world_to_local(&self) -> Mat3 {
        Mat3::from_rows(self.x_axis, self.y_axis, self.z_axis)
    }

    pub fn move_by(&mut self, v: Vec3) {
        self.center += v;
    }

    /// Rotate all three axes about a world axis. The center stays put.
    pub fn rotate(&mut self, angle: f32, axis: Axis) {
        self.x_axis = self.x_axis.rotate(angle, axis);
        self.y_axis = self.y_axis.rotate(angle, axis);
        self.z_axis = self.z_axis.rotate(angle, axis);
    }

    pub fn to_global(&self, local: Vec3) -> Vec3 {
        self.local_to_world().mul_vec(local) + self.center
    }

    pub fn to_local(&self, global: Vec3) -> Vec3 {
        self.world_to_local().mul_vec(global - self.center)
    }

    /// Like `to_global` but ignores the translation (for normals)
    pub fn direction_to_global(&self, local: Vec3) -> Vec3 {
        self.local_to_world().mul_vec(local)
    }

    pub fn direction_to_local(&self, global: Vec3) -> Vec3 {
        self.world_to_local().mul_vec(global)
    }
}

impl Default for Pivot {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}
