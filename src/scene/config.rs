//! Scene loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable scene files.
//! A file describes one camera, the raster settings and a list of meshes;
//! `SceneConfig::build` validates it and turns it into live objects.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{Mesh, Scene};
use crate::rasterizer::{
    Axis, Camera, Color, DepthFogShader, DiffuseShader, FlatShader, Light, Pivot, RasterSettings,
    Shader, Vec3,
};

/// Error type for scene loading
#[derive(Debug)]
pub enum SceneError {
    Io(std::io::Error),
    Parse(ron::error::SpannedError),
    Serialize(ron::Error),
    Invalid(String),
}

impl From<std::io::Error> for SceneError {
    fn from(e: std::io::Error) -> Self {
        SceneError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SceneError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneError::Parse(e)
    }
}

impl From<ron::Error> for SceneError {
    fn from(e: ron::Error) -> Self {
        SceneError::Serialize(e)
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::Io(e) => write!(f, "IO error: {}", e),
            SceneError::Parse(e) => write!(f, "Parse error: {}", e),
            SceneError::Serialize(e) => write!(f, "Serialize error: {}", e),
            SceneError::Invalid(msg) => write!(f, "Invalid scene: {}", msg),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Io(e) => Some(e),
            SceneError::Parse(e) => Some(e),
            SceneError::Serialize(e) => Some(e),
            SceneError::Invalid(_) => None,
        }
    }
}

fn one() -> f32 {
    1.0
}

fn is_one(v: &f32) -> bool {
    *v == 1.0
}

/// Whole scene file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    #[serde(default)]
    pub settings: RasterSettings,
    #[serde(default)]
    pub meshes: Vec<MeshConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Applied in order, each about a world axis (radians)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rotations: Vec<(Axis, f32)>,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale: f32,
    /// Vertical field of view (radians)
    pub fov: f32,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rotations: Vec<(Axis, f32)>,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale: f32,
    #[serde(default)]
    pub shaders: Vec<ShaderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GeometryConfig {
    Cube {
        size: f32,
    },
    /// Raw indexed triangles in the mesh's local frame
    Triangles {
        vertices: Vec<Vec3>,
        indices: Vec<usize>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        normals: Vec<Vec3>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        normal_indices: Vec<usize>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShaderConfig {
    Flat { color: Color },
    Diffuse { light: Light, albedo: Color, ambient: f32 },
    DepthFog { near: f32, far: f32, color: Color },
}

impl ShaderConfig {
    fn build(&self) -> Arc<dyn Shader> {
        match *self {
            ShaderConfig::Flat { color } => Arc::new(FlatShader::new(color)),
            ShaderConfig::Diffuse { light, albedo, ambient } => {
                Arc::new(DiffuseShader::new(light, albedo, ambient))
            }
            ShaderConfig::DepthFog { near, far, color } => {
                Arc::new(DepthFogShader::new(near, far, color))
            }
        }
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<(), SceneError> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::Invalid(format!(
                "camera screen must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.fov > 0.0 && self.fov < std::f32::consts::PI) {
            return Err(SceneError::Invalid(format!("camera fov {} outside (0, pi)", self.fov)));
        }
        if self.scale <= 0.0 {
            return Err(SceneError::Invalid(format!("camera scale {} must be positive", self.scale)));
        }
        Ok(())
    }

    pub fn build(&self) -> Camera {
        let mut pivot = Pivot::at(self.position);
        for &(axis, angle) in &self.rotations {
            pivot.rotate(angle, axis);
        }
        Camera::with_pivot(pivot, self.scale, self.fov, self.width, self.height)
    }
}

impl GeometryConfig {
    fn validate(&self) -> Result<(), String> {
        match self {
            GeometryConfig::Cube { size } => {
                if *size <= 0.0 {
                    return Err(format!("cube size {} must be positive", size));
                }
            }
            GeometryConfig::Triangles { vertices, indices, normals, normal_indices } => {
                if indices.len() % 3 != 0 {
                    return Err(format!("{} indices is not a whole number of triangles", indices.len()));
                }
                if let Some(i) = indices.iter().find(|&&i| i >= vertices.len()) {
                    return Err(format!("index {} out of range ({} vertices)", i, vertices.len()));
                }
                if !normal_indices.is_empty() && normal_indices.len() != indices.len() {
                    return Err(format!(
                        "{} normal indices for {} indices",
                        normal_indices.len(),
                        indices.len()
                    ));
                }
                if !normals.is_empty() && normal_indices.is_empty() {
                    return Err("normals given without normal indices".to_string());
                }
                if let Some(i) = normal_indices.iter().find(|&&i| i >= normals.len()) {
                    return Err(format!("normal index {} out of range ({} normals)", i, normals.len()));
                }
            }
        }
        Ok(())
    }
}

impl MeshConfig {
    pub fn build(&self) -> Mesh {
        let mut mesh = match &self.geometry {
            GeometryConfig::Cube { size } => Mesh::cube(self.position, *size),
            GeometryConfig::Triangles { vertices, indices, normals, normal_indices } => {
                Mesh::new(Pivot::at(self.position), vertices.clone(), indices.clone())
                    .with_normals(normals.clone(), normal_indices.clone())
            }
        };
        if self.scale != 1.0 {
            let _ = mesh.scale(self.scale);
        }
        for &(axis, angle) in &self.rotations {
            let _ = mesh.rotate(angle, axis);
        }
        mesh.set_shaders(self.shaders.iter().map(ShaderConfig::build).collect());
        mesh
    }
}

impl SceneConfig {
    /// Check everything the renderer assumes but never checks per frame
    pub fn validate(&self) -> Result<(), SceneError> {
        self.camera.validate()?;
        for (i, mesh) in self.meshes.iter().enumerate() {
            mesh.geometry
                .validate()
                .map_err(|msg| SceneError::Invalid(format!("mesh {}: {}", i, msg)))?;
            if mesh.scale == 0.0 {
                warn!("mesh {} has zero scale and will collapse to a point", i);
            }
            if mesh.shaders.is_empty() {
                debug!("mesh {} has no shaders, its pixels keep the base color", i);
            }
        }
        Ok(())
    }

    /// Validate, then create the scene, its camera and the raster settings
    pub fn build(&self) -> Result<(Scene, Camera, RasterSettings), SceneError> {
        self.validate()?;
        let scene = Scene::from_meshes(self.meshes.iter().map(MeshConfig::build).collect());
        info!(
            "built scene: {} meshes, camera {}x{}",
            scene.len(),
            self.camera.width,
            self.camera.height
        );
        Ok((scene, self.camera.build(), self.settings.clone()))
    }

    /// Grid of rotated cubes lit from the camera with distance fog
    pub fn cube_grid(nx: usize, ny: usize, nz: usize) -> Self {
        let camera = CameraConfig {
            position: Vec3::new(0.0, 100.0, -400.0),
            rotations: Vec::new(),
            scale: 1.0,
            fov: 1.57,
            width: 800,
            height: 600,
        };
        let shaders = vec![
            ShaderConfig::Diffuse {
                light: Light::new(camera.position, 1.0),
                albedo: Color::new(220, 200, 170),
                ambient: 0.15,
            },
            ShaderConfig::DepthFog {
                near: 300.0,
                far: 4000.0,
                color: Color::new(30, 30, 30),
            },
        ];

        let spacing = 300.0;
        let mut meshes = Vec::with_capacity(nx * ny * nz);
        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    let n = meshes.len();
                    // Fixed pseudo-random sizes and angles so the scene is reproducible
                    let size = 50.0 + ((i * 7 + j * 13 + k * 29) % 16) as f32 * 15.0;
                    let turn = |seed: f32| ((n as f32 + 1.0) * seed).fract() * std::f32::consts::PI;
                    meshes.push(MeshConfig {
                        geometry: GeometryConfig::Cube { size },
                        position: Vec3::new(i as f32 * spacing, j as f32 * spacing, k as f32 * spacing),
                        rotations: vec![
                            (Axis::X, turn(0.618_034)),
                            (Axis::Y, turn(0.414_214)),
                            (Axis::Z, turn(0.732_051)),
                        ],
                        scale: 1.0,
                        shaders: shaders.clone(),
                    });
                }
            }
        }

        Self {
            camera,
            settings: RasterSettings::default(),
            meshes,
        }
    }
}

/// Load a scene from a RON file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<SceneConfig, SceneError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config = load_scene_from_str(&contents)?;
    info!("loaded scene {} ({} meshes)", path.display(), config.meshes.len());
    Ok(config)
}

/// Save a scene to a RON file
pub fn save_scene<P: AsRef<Path>>(config: &SceneConfig, path: P) -> Result<(), SceneError> {
    fs::write(path, scene_to_string(config)?)?;
    Ok(())
}

/// Load a scene from a RON string (for embedded scenes or testing)
pub fn load_scene_from_str(s: &str) -> Result<SceneConfig, SceneError> {
    Ok(ron::from_str(s)?)
}

pub fn scene_to_string(config: &SceneConfig) -> Result<String, SceneError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());
    Ok(ron::ser::to_string_pretty(config, pretty)?)
}
