//! JSON settings for the desktop app. Every field has a default, so a
//! config file only needs the keys it changes.

use std::path::{Path, PathBuf};

use anyhow::Context;
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    /// Directory checked for `<name>.wgsl` overrides of the built-in shaders.
    pub shader_dir: Option<PathBuf>,
    /// Floor texture. A procedural checker is used when unset.
    pub wall_texture: Option<PathBuf>,
    /// OBJ model placed in the lit demo.
    pub model: Option<PathBuf>,
    pub shadow_map_size: u32,
    pub spin_degrees_per_sec: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub speed: f32,
    /// Radians per second.
    pub rot_speed: f32,
    pub position: Vec3,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            shader_dir: None,
            wall_texture: None,
            model: None,
            shadow_map_size: glint_render_wgpu::DEFAULT_SHADOW_MAP_SIZE,
            spin_degrees_per_sec: 45.0,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "glint".into(),
            vsync: true,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            rot_speed: 1.0,
            position: Vec3::new(0.0, 3.0, 12.0),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// The config file when one was given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "window": { "width": 1280 }, "spin_degrees_per_sec": 0 }"#)
                .unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.spin_degrees_per_sec, 0.0);
        assert_eq!(config.shadow_map_size, 2048);
        assert!(config.model.is_none());
    }

    #[test]
    fn camera_position_is_an_array() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "camera": { "position": [1.0, 2.0, 3.0] } }"#).unwrap();
        assert_eq!(config.camera.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.camera.speed, 5.0);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "model": "assets/backpack.obj", "shadow_map_size": 1024 }}"#).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.model, Some(PathBuf::from("assets/backpack.obj")));
        assert_eq!(config.shadow_map_size, 1024);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(&dir.path().join("absent.json")).is_err());
        assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
    }
}
