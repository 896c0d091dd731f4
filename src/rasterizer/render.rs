//! Core rendering: scanline fill into a depth buffer, then per-pixel shading
//!
//! A frame runs in two passes. The fill pass projects every triangle that
//! survives the camera's coarse view test, sorts its corners by screen x and
//! walks it column by column in two halves (leftmost corner to middle, then
//! rightmost corner back to middle), interpolating camera-local position and
//! normal along the two bounding edges and then down each column. The depth
//! buffer keeps the nearest vertex per pixel and remembers which pixels were
//! touched. The shade pass runs each touched pixel's mesh shaders once.

use std::path::Path;

use log::trace;
use rayon::prelude::*;

use super::camera::Camera;
use super::math::Vec3;
use super::types::{Color, MeshId, Poly, RasterSettings, Vertex};
use crate::scene::Mesh;

/// Projected coordinates are clamped to this many pixels so that integer
/// span arithmetic stays in range for points next to the camera plane
const SCREEN_LIMIT: f32 = 1.0e6;

/// Finished frame: row-major 0xAARRGGBB pixels, origin top-left
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
    placeholder: bool,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            placeholder: false,
        }
    }

    /// 1x1 stand-in handed out when no finished frame is available
    pub fn placeholder() -> Self {
        Self {
            placeholder: true,
            ..Self::new(1, 1)
        }
    }

    /// True only for buffers made by `placeholder`; a rendered 1x1 frame is real
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Resize (reusing the allocation when possible) and clear to zero
    pub fn reset(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.placeholder = false;
        self.pixels.clear();
        self.pixels.resize(width * height, 0);
    }

    pub fn set_pixel(&mut self, index: usize, color: Color) {
        self.pixels[index] = color.to_argb();
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn color_at(&self, x: usize, y: usize) -> Color {
        Color::from_argb(self.pixel(x, y))
    }

    /// Convert to RGBA bytes (4 per pixel) for textures and image files
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&argb| Color::from_argb(argb).to_bytes())
            .collect()
    }

    /// Write the frame as a PNG file
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        image::save_buffer(
            path,
            &self.to_rgba8(),
            self.width as u32,
            self.height as u32,
            image::ExtendedColorType::Rgba8,
        )
    }
}

/// Nearest vertex per pixel plus the list of pixels that received a write
pub struct DepthBuffer {
    width: usize,
    height: usize,
    slots: Vec<Option<Vertex>>,
    visible: Vec<usize>,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            slots: vec![None; width * height],
            visible: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, index: usize) -> Option<&Vertex> {
        self.slots[index].as_ref()
    }

    pub fn at(&self, x: usize, y: usize) -> Option<&Vertex> {
        self.get(y * self.width + x)
    }

    /// Pixel indices in first-write order. An index appears once per time
    /// its slot went from empty to occupied, never removed on overwrite.
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    /// Store `vertex` if the slot is empty or it is strictly nearer than the
    /// current occupant. Equal depth keeps the existing vertex.
    pub fn test_and_set(&mut self, index: usize, vertex: Vertex) -> bool {
        let slot = &mut self.slots[index];
        if let Some(current) = slot {
            if vertex.position.z < current.position.z {
                *current = vertex;
                return true;
            }
            return false;
        }
        *slot = Some(vertex);
        self.visible.push(index);
        true
    }
}

/// Triangle corner after projection: integer column plus sub-pixel row
struct Corner {
    column: i32,
    y: f32,
    vertex: Vertex,
}

/// Running position along one bounding edge of a half-triangle
#[derive(Clone, Copy)]
struct Edge {
    pos: Vec3,
    normal: Vec3,
    y: f32,
    d_pos: Vec3,
    d_normal: Vec3,
    dy: f32,
}

impl Edge {
    fn flat(from: &Corner) -> Self {
        Self {
            pos: from.vertex.position,
            normal: from.vertex.normal,
            y: from.y,
            d_pos: Vec3::ZERO,
            d_normal: Vec3::ZERO,
            dy: 0.0,
        }
    }

    /// Per-column increments from `from` to `to` over `columns` (> 0) steps
    fn between(from: &Corner, to: &Corner, columns: i32) -> Self {
        let n = columns as f32;
        Self {
            pos: from.vertex.position,
            normal: from.vertex.normal,
            y: from.y,
            d_pos: (to.vertex.position - from.vertex.position) / n,
            d_normal: (to.vertex.normal - from.vertex.normal) / n,
            dy: (to.y - from.y) / n,
        }
    }

    /// Jump ahead `columns` steps without iterating
    fn skip(&mut self, columns: i32) {
        let k = columns as f32;
        self.pos += self.d_pos * k;
        self.normal += self.d_normal * k;
        self.y += self.dy * k;
    }

    fn step(&mut self) {
        self.pos += self.d_pos;
        self.normal += self.d_normal;
        self.y += self.dy;
    }
}

/// Renders meshes through one camera
pub struct Rasterizer {
    pub camera: Camera,
    pub settings: RasterSettings,
}

impl Rasterizer {
    pub fn new(camera: Camera) -> Self {
        Self::with_settings(camera, RasterSettings::default())
    }

    pub fn with_settings(camera: Camera, settings: RasterSettings) -> Self {
        Self { camera, settings }
    }

    pub fn width(&self) -> usize {
        self.camera.screen_width
    }

    pub fn height(&self) -> usize {
        self.camera.screen_height
    }

    /// Produce one finished frame
    pub fn rasterize(&self, meshes: &[Mesh]) -> PixelBuffer {
        let mut out = PixelBuffer::new(self.width(), self.height());
        self.rasterize_into(meshes, &mut out);
        out
    }

    /// Same as `rasterize`, reusing `out` (resized and cleared first)
    pub fn rasterize_into(&self, meshes: &[Mesh], out: &mut PixelBuffer) {
        out.reset(self.width(), self.height());
        let depth = self.compute_visible_vertices(meshes);
        self.compute_shaders(&depth, meshes, out);
    }

    /// Fill pass: scan-convert every observed triangle into a fresh depth buffer
    pub fn compute_visible_vertices(&self, meshes: &[Mesh]) -> DepthBuffer {
        let mut depth = DepthBuffer::new(self.width(), self.height());
        let mut triangles = 0usize;
        let mut culled = 0usize;

        for (id, mesh) in meshes.iter().enumerate() {
            for triangle in 0..mesh.triangle_count() {
                triangles += 1;
                let poly = mesh.local_poly(&self.camera, triangle * 3, id);
                if self.observed(&poly) {
                    self.compute_poly(poly, &mut depth);
                } else {
                    culled += 1;
                }
            }
        }

        trace!(
            "fill: {} triangles, {} outside view, {} pixels touched",
            triangles,
            culled,
            depth.visible().len()
        );
        depth
    }

    /// Conservative view test: any corner inside the view volume keeps the triangle
    pub fn observed(&self, poly: &Poly) -> bool {
        poly.vertices()
            .iter()
            .any(|v| self.camera.in_observe_local(v.position))
    }

    /// Project one camera-local triangle and fill it into `depth`
    pub fn compute_poly(&self, poly: Poly, depth: &mut DepthBuffer) {
        let projected = poly.vertices().map(|v| {
            let p = self.camera.screen_projection(v.position);
            let screen = Vec3::new(
                p.x.clamp(-SCREEN_LIMIT, SCREEN_LIMIT),
                p.y.clamp(-SCREEN_LIMIT, SCREEN_LIMIT),
                p.z,
            );
            (screen, v)
        });
        self.scan_convert(projected, depth);
    }

    fn scan_convert(&self, mut corners: [(Vec3, Vertex); 3], depth: &mut DepthBuffer) {
        // Stable sort keeps the input corner order for equal x
        corners.sort_by(|a, b| a.0.x.total_cmp(&b.0.x));
        let [left, mid, right] = corners.map(|(screen, vertex)| Corner {
            column: screen.x.floor() as i32,
            y: screen.y,
            vertex,
        });

        self.fill_half(depth, &left, &mid, &right, 1);
        self.fill_half(depth, &right, &mid, &left, -1);
    }

    /// Walk columns from `start` toward `mid` (`dir` = +1 rightward, -1 leftward).
    /// The second edge runs from `start` toward `far`.
    fn fill_half(&self, depth: &mut DepthBuffer, start: &Corner, mid: &Corner, far: &Corner, dir: i32) {
        let columns = (mid.column - start.column).abs();
        let (mut upper, mut lower) = if columns == 0 {
            (Edge::flat(start), Edge::flat(start))
        } else {
            let to_mid = Edge::between(start, mid, columns);
            let to_far = Edge::between(start, far, (far.column - start.column).abs());
            // The edge with the larger y slope bounds the column from below on screen
            if to_mid.dy > to_far.dy {
                (to_mid, to_far)
            } else {
                (to_far, to_mid)
            }
        };

        let last_column = depth.width() as i32 - 1;
        let (first, last) = if dir > 0 {
            ((-start.column).max(0), columns.min(last_column - start.column))
        } else {
            ((start.column - last_column).max(0), columns.min(start.column))
        };
        if first > last {
            return;
        }

        upper.skip(first);
        lower.skip(first);
        let mesh = start.vertex.mesh;
        for i in first..=last {
            self.fill_column(depth, start.column + dir * i, &upper, &lower, mesh);
            upper.step();
            lower.step();
        }
    }

    fn fill_column(&self, depth: &mut DepthBuffer, x: i32, upper: &Edge, lower: &Edge, mesh: MeshId) {
        if upper.y <= 0.0 {
            return;
        }

        let up = upper.y.floor() as i32;
        let down = lower.y.floor() as i32;
        let rows = up - down;
        let (d_pos, d_normal) = if rows != 0 {
            let n = rows as f32;
            ((upper.pos - lower.pos) / n, (upper.normal - lower.normal) / n)
        } else {
            (Vec3::ZERO, Vec3::ZERO)
        };

        let first = down.max(0);
        let last = up.min(depth.height() as i32 - 1);
        if first > last {
            return;
        }

        // Rows cut off above the screen still count toward the interpolation
        let skipped = (first - down) as f32;
        let mut pos = lower.pos + d_pos * skipped;
        let mut normal = lower.normal + d_normal * skipped;
        let width = depth.width();
        for y in first..=last {
            let index = y as usize * width + x as usize;
            depth.test_and_set(index, Vertex::new(pos, normal, mesh));
            pos += d_pos;
            normal += d_normal;
        }
    }

    /// Shade pass: run each touched pixel's shaders and write the result
    pub fn compute_shaders(&self, depth: &DepthBuffer, meshes: &[Mesh], out: &mut PixelBuffer) {
        if self.settings.parallel_shading {
            // Shade on the pool, then merge; every output slot is written by this thread only
            let shaded: Vec<(usize, Color)> = depth
                .visible()
                .par_iter()
                .filter_map(|&index| {
                    depth
                        .get(index)
                        .map(|vertex| (index, self.shade_pixel(*vertex, meshes)))
                })
                .collect();
            for (index, color) in shaded {
                out.set_pixel(index, color);
            }
        } else {
            for &index in depth.visible() {
                if let Some(vertex) = depth.get(index) {
                    let color = self.shade_pixel(*vertex, meshes);
                    out.set_pixel(index, color);
                }
            }
        }
    }

    fn shade_pixel(&self, mut vertex: Vertex, meshes: &[Mesh]) -> Color {
        vertex.color = self.settings.base_color;
        for shader in meshes[vertex.mesh].shaders() {
            shader.compute_shader(&mut vertex, &self.camera);
        }
        vertex.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{FlatShader, Pivot};
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Arc;

    fn camera(width: usize, height: usize) -> Camera {
        Camera::new(Vec3::ZERO, 1.0, FRAC_PI_2, width, height)
    }

    /// Camera-local point that projects onto screen pixel coordinates (sx, sy)
    fn unproject(cam: &Camera, sx: f32, sy: f32, z: f32) -> Vec3 {
        let f = cam.focal_length();
        Vec3::new(
            (sx - cam.screen_width as f32 / 2.0) * z / f,
            (cam.screen_height as f32 / 2.0 - sy) * z / f,
            z,
        )
    }

    fn triangle(points: [Vec3; 3], color: Color) -> Mesh {
        Mesh::new(Pivot::default(), points.to_vec(), vec![0, 1, 2])
            .with_shader(Arc::new(FlatShader::new(color)))
    }

    fn touched(buffer: &PixelBuffer) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..buffer.height {
            for x in 0..buffer.width {
                if buffer.pixel(x, y) != 0 {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_depth_buffer_nearest_wins() {
        let mut depth = DepthBuffer::new(4, 4);
        let at = |z: f32, mesh: MeshId| Vertex::new(Vec3::new(0.0, 0.0, z), Vec3::ZERO, mesh);

        assert!(depth.test_and_set(5, at(5.0, 0)));
        assert!(depth.test_and_set(5, at(3.0, 1)));
        assert!(!depth.test_and_set(5, at(4.0, 2)));
        assert_eq!(depth.get(5).map(|v| v.mesh), Some(1));
        assert_eq!(depth.visible(), &[5]);
    }

    #[test]
    fn test_depth_buffer_tie_keeps_first() {
        let mut depth = DepthBuffer::new(2, 2);
        let a = Vertex::new(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, 0);
        let b = Vertex::new(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, 1);
        assert!(depth.test_and_set(3, a));
        assert!(!depth.test_and_set(3, b));
        assert_eq!(depth.get(3).map(|v| v.mesh), Some(0));
    }

    #[test]
    fn test_zero_depth_is_a_real_occupant() {
        let mut depth = DepthBuffer::new(1, 1);
        assert!(depth.test_and_set(0, Vertex::new(Vec3::ZERO, Vec3::ZERO, 0)));
        assert!(!depth.test_and_set(0, Vertex::new(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, 1)));
        assert_eq!(depth.visible().len(), 1);
    }

    #[test]
    fn test_cube_silhouette() {
        let mut cam = camera(100, 100);
        cam.move_by(Vec3::new(0.0, 0.0, -3.0));

        let cube = Mesh::cube(Vec3::ZERO, 1.0).with_shader(Arc::new(FlatShader::new(Color::GREY)));
        // Far face of the same cube as its own red mesh
        let far_face = Mesh::new(
            Pivot::default(),
            vec![
                Vec3::new(-0.5, -0.5, 0.5),
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(-0.5, 0.5, 0.5),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
        .with_shader(Arc::new(FlatShader::new(Color::RED)));
        let meshes = vec![cube, far_face];

        let raster = Rasterizer::new(cam.clone());
        let frame = raster.rasterize(&meshes);
        let pixels = touched(&frame);
        assert!(!pixels.is_empty());

        // Analytic bounds from the eight projected corners
        let mut min = (f32::MAX, f32::MAX);
        let mut max = (f32::MIN, f32::MIN);
        for x in [-0.5, 0.5] {
            for y in [-0.5, 0.5] {
                for z in [-0.5, 0.5] {
                    let p = cam.screen_projection(cam.pivot().to_local(Vec3::new(x, y, z)));
                    min = (min.0.min(p.x), min.1.min(p.y));
                    max = (max.0.max(p.x), max.1.max(p.y));
                }
            }
        }
        let got_min_x = pixels.iter().map(|p| p.0).min().unwrap_or(0) as f32;
        let got_max_x = pixels.iter().map(|p| p.0).max().unwrap_or(0) as f32;
        let got_min_y = pixels.iter().map(|p| p.1).min().unwrap_or(0) as f32;
        let got_max_y = pixels.iter().map(|p| p.1).max().unwrap_or(0) as f32;
        assert!((got_min_x - min.0).abs() <= 1.0, "{} vs {}", got_min_x, min.0);
        assert!((got_max_x - max.0).abs() <= 1.0, "{} vs {}", got_max_x, max.0);
        assert!((got_min_y - min.1).abs() <= 1.0, "{} vs {}", got_min_y, min.1);
        assert!((got_max_y - max.1).abs() <= 1.0, "{} vs {}", got_max_y, max.1);

        // Nothing from the far face shows through
        let grey = Color::GREY.to_argb();
        for &(x, y) in &pixels {
            assert_eq!(frame.pixel(x, y), grey, "pixel ({}, {})", x, y);
        }

        // Interior pixels all hold the near face (camera depth 2.5)
        let depth = raster.compute_visible_vertices(&meshes);
        for y in 42..=58 {
            for x in 42..=58 {
                let v = depth.at(x, y).copied();
                assert!(v.is_some(), "empty interior pixel ({}, {})", x, y);
                if let Some(v) = v {
                    assert_eq!(v.mesh, 0);
                    assert!((v.position.z - 2.5).abs() < 1e-3, "z = {}", v.position.z);
                }
            }
        }
    }

    #[test]
    fn test_coplanar_tie_goes_to_first_processed() {
        let cam = camera(64, 64);
        let z = 5.0;
        // Two triangles at identical depth that share exactly the pixel (30, 10)
        let a = [
            unproject(&cam, 10.5, 10.5, z),
            unproject(&cam, 30.5, 10.5, z),
            unproject(&cam, 10.5, 30.5, z),
        ];
        let b = [
            unproject(&cam, 30.5, 10.5, z),
            unproject(&cam, 50.5, 10.5, z),
            unproject(&cam, 50.5, 30.5, z),
        ];

        let raster = Rasterizer::new(cam);
        let red_first = vec![triangle(a, Color::RED), triangle(b, Color::BLUE)];
        let frame = raster.rasterize(&red_first);
        assert_eq!(frame.color_at(30, 10), Color::RED);
        assert_eq!(frame.color_at(40, 12), Color::BLUE);
        assert_eq!(frame.color_at(20, 15), Color::RED);

        let depth = raster.compute_visible_vertices(&red_first);
        let shared = 10 * 64 + 30;
        assert_eq!(depth.visible().iter().filter(|&&i| i == shared).count(), 1);

        let blue_first = vec![triangle(b, Color::BLUE), triangle(a, Color::RED)];
        let frame = raster.rasterize(&blue_first);
        assert_eq!(frame.color_at(30, 10), Color::BLUE);
    }

    #[test]
    fn test_triangle_behind_camera_writes_nothing() {
        let raster = Rasterizer::new(camera(32, 32));
        let mesh = triangle(
            [
                Vec3::new(-1.0, -1.0, -5.0),
                Vec3::new(1.0, -1.0, -5.0),
                Vec3::new(0.0, 1.0, -5.0),
            ],
            Color::WHITE,
        );
        let meshes = vec![mesh];
        let depth = raster.compute_visible_vertices(&meshes);
        assert!(depth.visible().is_empty());
        assert!(raster.rasterize(&meshes).pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_conservative_visibility() {
        let cam = camera(100, 100);
        let raster = Rasterizer::new(cam.clone());

        // One corner on screen, the others far outside: kept
        let one_in = [
            unproject(&cam, 50.5, 50.5, 5.0),
            unproject(&cam, 400.0, 60.0, 5.0),
            unproject(&cam, 60.0, 400.0, 5.0),
        ];
        let meshes = vec![triangle(one_in, Color::WHITE)];
        let poly = meshes[0].local_poly(&cam, 0, 0);
        assert!(raster.observed(&poly));
        assert!(!raster.compute_visible_vertices(&meshes).visible().is_empty());

        // Covers the whole screen but no corner is inside: dropped
        let covering = [
            unproject(&cam, -500.0, -500.0, 5.0),
            unproject(&cam, 600.0, -500.0, 5.0),
            unproject(&cam, 50.0, 1000.0, 5.0),
        ];
        let meshes = vec![triangle(covering, Color::WHITE)];
        let poly = meshes[0].local_poly(&cam, 0, 0);
        assert!(!raster.observed(&poly));
        assert!(raster.compute_visible_vertices(&meshes).visible().is_empty());
    }

    fn corner(x: f32, y: f32, position: Vec3, normal: Vec3) -> (Vec3, Vertex) {
        (Vec3::new(x, y, position.z), Vertex::new(position, normal, 0))
    }

    fn assert_same_occupant(a: Option<&Vertex>, b: Option<&Vertex>, at: (usize, usize)) {
        match (a, b) {
            (None, None) => {}
            (Some(a), Some(b)) => {
                assert!(a.position.approx_eq(b.position, 1e-4), "{:?}: {:?} vs {:?}", at, a.position, b.position);
                assert!(a.normal.approx_eq(b.normal, 1e-4), "{:?}: {:?} vs {:?}", at, a.normal, b.normal);
            }
            _ => panic!("occupancy differs at {:?}: {:?} vs {:?}", at, a, b),
        }
    }

    #[test]
    fn test_left_edge_clipping_matches_unclipped() {
        // Same triangle drawn into a 100px wide buffer (left third off-screen)
        // and a 300px wide buffer where it sits 100px further right.
        let clipped = Rasterizer::new(camera(100, 100));
        let reference = Rasterizer::new(camera(300, 100));
        let tri = |shift: f32| {
            [
                corner(-15.5 + shift, 40.5, Vec3::new(-2.0, 1.0, 4.0), Vec3::new(0.0, 0.0, -1.0)),
                corner(16.25 + shift, 8.25, Vec3::new(0.5, 3.0, 8.0), Vec3::new(0.0, 1.0, 0.0)),
                corner(48.75 + shift, 70.5, Vec3::new(3.0, -2.0, 6.0), Vec3::new(1.0, 0.0, 0.0)),
            ]
        };

        let mut a = DepthBuffer::new(100, 100);
        clipped.scan_convert(tri(0.0), &mut a);
        let mut b = DepthBuffer::new(300, 100);
        reference.scan_convert(tri(100.0), &mut b);

        assert!(a.at(0, 40).is_some());
        for y in 0..100 {
            for x in 0..100 {
                assert_same_occupant(a.at(x, y), b.at(x + 100, y), (x, y));
            }
        }
    }

    #[test]
    fn test_top_edge_clipping_matches_unclipped() {
        let clipped = Rasterizer::new(camera(100, 100));
        let reference = Rasterizer::new(camera(100, 300));
        let tri = |shift: f32| {
            [
                corner(10.5, -30.5 + shift, Vec3::new(-1.0, 4.0, 5.0), Vec3::new(0.0, 0.0, -1.0)),
                corner(42.5, 60.25 + shift, Vec3::new(0.0, -2.0, 9.0), Vec3::new(0.0, 1.0, 0.0)),
                corner(74.5, 20.75 + shift, Vec3::new(2.0, 1.0, 7.0), Vec3::new(1.0, 0.0, 0.0)),
            ]
        };

        let mut a = DepthBuffer::new(100, 100);
        clipped.scan_convert(tri(0.0), &mut a);
        let mut b = DepthBuffer::new(100, 300);
        reference.scan_convert(tri(100.0), &mut b);

        assert!(a.at(42, 0).is_some());
        for y in 0..100 {
            for x in 0..100 {
                assert_same_occupant(a.at(x, y), b.at(x, y + 100), (x, y));
            }
        }
    }

    #[test]
    fn test_right_edge_clipping_matches_unclipped() {
        // Rightmost third lies past x = 99 in the narrow buffer
        let clipped = Rasterizer::new(camera(100, 100));
        let reference = Rasterizer::new(camera(300, 100));
        let tri = || {
            [
                corner(60.5, 40.5, Vec3::new(-2.0, 1.0, 4.0), Vec3::new(0.0, 0.0, -1.0)),
                corner(92.25, 8.25, Vec3::new(0.5, 3.0, 8.0), Vec3::new(0.0, 1.0, 0.0)),
                corner(124.75, 70.5, Vec3::new(3.0, -2.0, 6.0), Vec3::new(1.0, 0.0, 0.0)),
            ]
        };

        let mut a = DepthBuffer::new(100, 100);
        clipped.scan_convert(tri(), &mut a);
        let mut b = DepthBuffer::new(300, 100);
        reference.scan_convert(tri(), &mut b);

        assert!(a.at(99, 40).is_some());
        for y in 0..100 {
            for x in 0..100 {
                assert_same_occupant(a.at(x, y), b.at(x, y), (x, y));
            }
        }
    }

    #[test]
    fn test_bottom_edge_clipping_matches_unclipped() {
        let clipped = Rasterizer::new(camera(100, 100));
        let reference = Rasterizer::new(camera(100, 300));
        let tri = || {
            [
                corner(10.5, 60.5, Vec3::new(-1.0, 4.0, 5.0), Vec3::new(0.0, 0.0, -1.0)),
                corner(42.5, 160.25, Vec3::new(0.0, -2.0, 9.0), Vec3::new(0.0, 1.0, 0.0)),
                corner(74.5, 90.75, Vec3::new(2.0, 1.0, 7.0), Vec3::new(1.0, 0.0, 0.0)),
            ]
        };

        let mut a = DepthBuffer::new(100, 100);
        clipped.scan_convert(tri(), &mut a);
        let mut b = DepthBuffer::new(100, 300);
        reference.scan_convert(tri(), &mut b);

        assert!(a.at(40, 99).is_some());
        for y in 0..100 {
            for x in 0..100 {
                assert_same_occupant(a.at(x, y), b.at(x, y), (x, y));
            }
        }
    }

    #[test]
    fn test_degenerate_triangles_do_not_panic() {
        let cam = camera(50, 50);
        let raster = Rasterizer::new(cam.clone());
        let p = unproject(&cam, 25.5, 25.5, 4.0);
        let q = unproject(&cam, 40.5, 25.5, 4.0);
        let r = unproject(&cam, 10.5, 25.5, 4.0);
        let meshes = vec![
            triangle([p, p, p], Color::WHITE),
            triangle([r, p, q], Color::WHITE),
            triangle([p, unproject(&cam, 25.5, 5.5, 4.0), unproject(&cam, 25.7, 45.5, 4.0)], Color::WHITE),
        ];
        let depth = raster.compute_visible_vertices(&meshes);
        assert!(depth.at(25, 25).is_some());
    }

    #[test]
    fn test_vertex_on_camera_plane_is_safe() {
        let cam = camera(40, 40);
        let raster = Rasterizer::new(cam.clone());
        let meshes = vec![triangle(
            [
                unproject(&cam, 20.5, 20.5, 3.0),
                Vec3::new(0.5, 0.5, 0.0),
                Vec3::new(-1.0, 2.0, -4.0),
            ],
            Color::WHITE,
        )];
        let frame = raster.rasterize(&meshes);
        assert_eq!(frame.pixels.len(), 40 * 40);
    }

    #[test]
    fn test_shaders_run_in_registration_order() {
        let cam = camera(32, 32);
        let tri = [
            unproject(&cam, 4.5, 4.5, 3.0),
            unproject(&cam, 28.5, 6.5, 3.0),
            unproject(&cam, 12.5, 28.5, 3.0),
        ];
        let mesh = Mesh::new(Pivot::default(), tri.to_vec(), vec![0, 1, 2])
            .with_shader(Arc::new(FlatShader::new(Color::RED)))
            .with_shader(Arc::new(FlatShader::new(Color::BLUE)));
        let frame = Rasterizer::new(cam).rasterize(&[mesh]);
        let pixels = touched(&frame);
        assert!(!pixels.is_empty());
        assert!(pixels.iter().all(|&(x, y)| frame.color_at(x, y) == Color::BLUE));
    }

    #[test]
    fn test_no_shaders_leaves_base_color() {
        let cam = camera(32, 32);
        let tri = [
            unproject(&cam, 4.5, 4.5, 3.0),
            unproject(&cam, 28.5, 6.5, 3.0),
            unproject(&cam, 12.5, 28.5, 3.0),
        ];
        let settings = RasterSettings::default();
        let base = settings.base_color;
        let raster = Rasterizer::with_settings(cam, settings);
        let frame = raster.rasterize(&[Mesh::new(Pivot::default(), tri.to_vec(), vec![0, 1, 2])]);
        assert_eq!(frame.color_at(12, 10), base);
        assert_eq!(frame.pixel(0, 31), 0);
    }

    #[test]
    fn test_parallel_shading_matches_sequential() {
        let mut cam = camera(80, 60);
        cam.move_by(Vec3::new(0.3, 0.2, -4.0));
        cam.rotate(0.2, crate::rasterizer::Axis::Y);
        let mut cube = Mesh::cube(Vec3::ZERO, 1.5).with_shader(Arc::new(FlatShader::new(Color::GREEN)));
        let _ = cube.rotate(0.6, crate::rasterizer::Axis::X);
        let meshes = vec![cube];

        let sequential = Rasterizer::new(cam.clone()).rasterize(&meshes);
        let parallel = Rasterizer::with_settings(
            cam,
            RasterSettings { parallel_shading: true, ..RasterSettings::default() },
        )
        .rasterize(&meshes);
        assert_eq!(sequential, parallel);
        assert!(!touched(&parallel).is_empty());
    }

    #[test]
    fn test_rasterize_into_resizes_recycled_buffer() {
        let cam = camera(16, 8);
        let mut buffer = PixelBuffer::new(3, 3);
        buffer.pixels.fill(0xFFFF_FFFF);
        Rasterizer::new(cam).rasterize_into(&[], &mut buffer);
        assert_eq!((buffer.width, buffer.height), (16, 8));
        assert!(buffer.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_rgba8_byte_order() {
        let mut buffer = PixelBuffer::new(2, 1);
        buffer.set_pixel(1, Color::with_alpha(1, 2, 3, 4));
        assert_eq!(buffer.to_rgba8(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
        assert!(PixelBuffer::placeholder().is_placeholder());
    }

    #[test]
    fn test_one_pixel_frame_is_not_a_placeholder() {
        assert!(!PixelBuffer::new(1, 1).is_placeholder());

        let mut recycled = PixelBuffer::placeholder();
        Rasterizer::new(camera(1, 1)).rasterize_into(&[], &mut recycled);
        assert_eq!((recycled.width, recycled.height), (1, 1));
        assert!(!recycled.is_placeholder());
    }
}
