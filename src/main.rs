//! Scanline Viewer: interactive window around the software rasterizer
//!
//! Usage: scanline-viewer [scene.ron]
//!
//! Without a scene file a grid of cubes is shown.
//! W/S/A/D move, Q/E turn, R/F tilt, P saves a PNG, Esc quits.

use macroquad::prelude::*;
use scanline_renderer::controller::{CameraController, CameraKey};
use scanline_renderer::frame::BufferPreparer;
use scanline_renderer::logging::{init_logging, LoggingConfig};
use scanline_renderer::scene::{load_scene, SceneConfig};
use scanline_renderer::VERSION;

const KEY_MAP: [(KeyCode, CameraKey); 8] = [
    (KeyCode::W, CameraKey::Forward),
    (KeyCode::S, CameraKey::Back),
    (KeyCode::A, CameraKey::Left),
    (KeyCode::D, CameraKey::Right),
    (KeyCode::Q, CameraKey::TurnLeft),
    (KeyCode::E, CameraKey::TurnRight),
    (KeyCode::R, CameraKey::TiltUp),
    (KeyCode::F, CameraKey::TiltDown),
];

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Scanline Viewer v{}", VERSION),
        window_width: 800,
        window_height: 600,
        window_resizable: true,
        ..Default::default()
    }
}

fn scene_config() -> SceneConfig {
    match std::env::args().nth(1) {
        Some(path) => match load_scene(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("could not load {}: {}, using the cube grid", path, e);
                SceneConfig::cube_grid(5, 5, 5)
            }
        },
        None => SceneConfig::cube_grid(5, 5, 5),
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    init_logging(LoggingConfig::default());

    let (scene, camera, settings) = match scene_config().build() {
        Ok(built) => built,
        Err(e) => {
            log::error!("{}", e);
            return;
        }
    };
    let mut preparer = BufferPreparer::new(vec![camera], settings);
    let mut controller = CameraController::new();
    let mut snapshots = 0;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        for (code, key) in KEY_MAP {
            if is_key_down(code) {
                controller.key_down(key);
            } else {
                controller.key_up(key);
            }
        }
        controller.apply(preparer.current_camera_mut());

        let size = (screen_width().max(1.0) as usize, screen_height().max(1.0) as usize);
        let camera = &preparer.current().camera;
        if size != (camera.screen_width, camera.screen_height) {
            preparer.resize(size.0, size.1);
        }

        preparer.prepare_new_buffer(scene.meshes());
        let frame = preparer.get_buffer();

        clear_background(BLACK);
        if !frame.is_placeholder() {
            let texture = Texture2D::from_rgba8(frame.width as u16, frame.height as u16, &frame.to_rgba8());
            texture.set_filter(FilterMode::Nearest);
            draw_texture_ex(
                &texture,
                0.0,
                0.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(Vec2::new(screen_width(), screen_height())),
                    ..Default::default()
                },
            );

            if is_key_pressed(KeyCode::P) {
                let path = format!("snapshot-{:03}.png", snapshots);
                match frame.save_png(&path) {
                    Ok(()) => {
                        log::info!("saved {}", path);
                        snapshots += 1;
                    }
                    Err(e) => log::warn!("could not save {}: {}", path, e),
                }
            }
        }
        preparer.recycle(frame);

        let pos = preparer.current().camera.position();
        draw_text(
            &format!("{} fps | Cam: ({:.0}, {:.0}, {:.0})", get_fps(), pos.x, pos.y, pos.z),
            10.0,
            20.0,
            20.0,
            WHITE,
        );

        next_frame().await;
    }
}
