//! Scene: the set of meshes a frame is rendered from
//!
//! Meshes are addressed by their position in the scene (`MeshId`), which is
//! also the id the rasterizer stamps into every vertex. Transforms go through
//! the scene so each one is recorded as an event and bumps the revision.
//! Callers that cache anything derived from the meshes can compare
//! revisions to see whether the scene moved since they last looked.

mod mesh;
mod config;

pub use mesh::*;
pub use config::*;

use log::debug;

use crate::rasterizer::{Axis, MeshId, Vec3};

/// Something that happened to the scene since the last drain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEvent {
    Added(MeshId),
    Changed { mesh: MeshId, change: MeshChange },
}

#[derive(Debug, Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
    events: Vec<SceneEvent>,
    revision: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene holding `meshes` at revision 0 with no pending events
    pub fn from_meshes(meshes: Vec<Mesh>) -> Self {
        Self {
            meshes,
            ..Self::default()
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = self.meshes.len();
        debug!("scene: added mesh {} ({} triangles)", id, mesh.triangle_count());
        self.meshes.push(mesh);
        self.record(SceneEvent::Added(id));
        id
    }

    /// Current mesh list in id order; this is what gets rasterized
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Returns false if there is no mesh `id`
    pub fn move_mesh(&mut self, id: MeshId, v: Vec3) -> bool {
        self.apply(id, |mesh| mesh.move_by(v))
    }

    pub fn rotate_mesh(&mut self, id: MeshId, angle: f32, axis: Axis) -> bool {
        self.apply(id, |mesh| mesh.rotate(angle, axis))
    }

    pub fn scale_mesh(&mut self, id: MeshId, k: f32) -> bool {
        self.apply(id, |mesh| mesh.scale(k))
    }

    fn apply(&mut self, id: MeshId, f: impl FnOnce(&mut Mesh) -> MeshChange) -> bool {
        let Some(mesh) = self.meshes.get_mut(id) else {
            return false;
        };
        let change = f(mesh);
        self.record(SceneEvent::Changed { mesh: id, change });
        true
    }

    fn record(&mut self, event: SceneEvent) {
        self.events.push(event);
        self.revision += 1;
    }

    /// Bumped once per recorded event, never reset
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Take the events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}
