//! Frame production: one rasterizer per camera and a short queue of
//! finished buffers between the producer and whoever presents them.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::rasterizer::{Camera, PixelBuffer, RasterSettings, Rasterizer};
use crate::scene::Mesh;

/// Finished frames kept before the oldest is dropped
pub const DEFAULT_QUEUE_LEN: usize = 3;

pub struct BufferPreparer {
    rasterizers: Vec<Rasterizer>,
    active: usize,
    ready: VecDeque<PixelBuffer>,
    spare: Vec<PixelBuffer>,
    capacity: usize,
}

impl BufferPreparer {
    /// `cameras` must not be empty
    pub fn new(cameras: Vec<Camera>, settings: RasterSettings) -> Self {
        debug_assert!(!cameras.is_empty());
        let rasterizers = cameras
            .into_iter()
            .map(|camera| Rasterizer::with_settings(camera, settings.clone()))
            .collect();
        Self {
            rasterizers,
            active: 0,
            ready: VecDeque::with_capacity(DEFAULT_QUEUE_LEN),
            spare: Vec::new(),
            capacity: DEFAULT_QUEUE_LEN,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn rasterizers(&self) -> &[Rasterizer] {
        &self.rasterizers
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn current(&self) -> &Rasterizer {
        &self.rasterizers[self.active]
    }

    pub fn current_mut(&mut self) -> &mut Rasterizer {
        &mut self.rasterizers[self.active]
    }

    pub fn current_camera_mut(&mut self) -> &mut Camera {
        &mut self.current_mut().camera
    }

    /// Switch the camera later frames are rendered from. Returns false if out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.rasterizers.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Advance to the next camera, wrapping around
    pub fn cycle(&mut self) {
        self.active = (self.active + 1) % self.rasterizers.len();
    }

    /// Render `meshes` through the active camera and queue the result
    pub fn prepare_new_buffer(&mut self, meshes: &[Mesh]) {
        let mut buffer = self.spare.pop().unwrap_or_else(PixelBuffer::placeholder);
        self.rasterizers[self.active].rasterize_into(meshes, &mut buffer);

        if self.ready.len() >= self.capacity {
            if let Some(stale) = self.ready.pop_front() {
                trace!("frame queue full, dropping oldest");
                self.spare.push(stale);
            }
        }
        self.ready.push_back(buffer);
    }

    /// Oldest finished frame, or a 1x1 placeholder when none is ready
    pub fn get_buffer(&mut self) -> PixelBuffer {
        self.ready.pop_front().unwrap_or_else(PixelBuffer::placeholder)
    }

    /// Hand a presented buffer back for reuse
    pub fn recycle(&mut self, buffer: PixelBuffer) {
        if self.spare.len() < self.capacity {
            self.spare.push(buffer);
        }
    }

    pub fn pending(&self) -> usize {
        self.ready.len()
    }

    /// Apply a new output size to every camera and drop frames of the old size
    pub fn resize(&mut self, width: usize, height: usize) {
        debug!("resizing output to {}x{}", width, height);
        for r in &mut self.rasterizers {
            r.camera.resize(width, height);
        }
        self.ready.clear();
    }
}
