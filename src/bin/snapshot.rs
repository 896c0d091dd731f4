//! Render one frame of a scene to a PNG without opening a window
//!
//! Usage: snapshot [scene.ron] [out.png]

use std::time::Instant;

use scanline_renderer::logging::{init_logging, LoggingConfig};
use scanline_renderer::rasterizer::Rasterizer;
use scanline_renderer::scene::{load_scene, SceneConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) if path != "-" => load_scene(&path)?,
        _ => SceneConfig::cube_grid(5, 5, 5),
    };
    let out = args.next().unwrap_or_else(|| "snapshot.png".to_string());

    let (scene, camera, settings) = config.build()?;
    let rasterizer = Rasterizer::with_settings(camera, settings);

    let start = Instant::now();
    let frame = rasterizer.rasterize(scene.meshes());
    log::info!(
        "rendered {}x{} in {:.1} ms",
        frame.width,
        frame.height,
        start.elapsed().as_secs_f64() * 1000.0
    );

    frame.save_png(&out)?;
    log::info!("wrote {}", out);
    Ok(())
}
