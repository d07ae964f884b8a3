//! # Unified Configuration System
//!
//! Configuration for the window, the render contexts and asset locations.
//! Every field has a default so a partial (or missing) `terrain.toml` still
//! yields a complete configuration.
//!
//! ## Configuration Categories
//!
//! - **Window Config**: title, size, fullscreen and the requested GL version
//! - **Render Config**: clear color, frame delay and the list of viewports
//! - **Asset Config**: where shaders, textures and models are found

use serde::{Serialize, Deserialize};
use std::path::PathBuf;

pub use crate::config::{Config, ConfigError};

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Whether to start in fullscreen
    pub fullscreen: bool,
    /// Requested OpenGL core profile version (major, minor)
    pub gl_version: (u32, u32),
}

impl WindowConfig {
    /// Create a window configuration with the given title and size
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Self::default()
        }
    }

    /// Width over height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Terrain Demo".to_string(),
            width: 800,
            height: 600,
            fullscreen: false,
            gl_version: (4, 1),
        }
    }
}

/// # Viewport Configuration
///
/// One render context. The rectangle is given as fractions of the window so
/// split-screen layouts survive a change of window size in the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Left edge as a fraction of the window width
    pub x: f32,
    /// Bottom edge as a fraction of the window height
    pub y: f32,
    /// Width as a fraction of the window width
    pub width: f32,
    /// Height as a fraction of the window height
    pub height: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl ViewportConfig {
    /// Pixel rectangle `(x, y, width, height)` for a window of the given size
    pub fn to_pixels(&self, window_width: u32, window_height: u32) -> (f32, f32, f32, f32) {
        let w = window_width as f32;
        let h = window_height as f32;
        (self.x * w, self.y * h, self.width * w, self.height * h)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !(in_unit(self.x) && in_unit(self.y) && self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "viewport rectangle ({}, {}, {}, {}) must lie within the window",
                self.x, self.y, self.width, self.height
            )));
        }
        if self.x + self.width > 1.0 + f32::EPSILON || self.y + self.height > 1.0 + f32::EPSILON {
            return Err(ConfigError::Invalid("viewport extends past the window".to_string()));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(ConfigError::Invalid(format!("field of view {} out of range", self.fov)));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ConfigError::Invalid(format!(
                "clip range {}..{} is empty",
                self.near, self.far
            )));
        }
        Ok(())
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            fov: 45.0,
            near: 0.1,
            far: 300.0,
        }
    }
}

/// # Render Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Color the frame is cleared to
    pub clear_color: [f32; 4],
    /// Fixed sleep after each presented frame, in milliseconds
    pub frame_delay_ms: u64,
    /// Render contexts, drawn in order every frame
    pub viewports: Vec<ViewportConfig>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.3, 0.7, 1.0, 1.0],
            frame_delay_ms: 10,
            viewports: vec![ViewportConfig::default()],
        }
    }
}

/// # Asset Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory for assets
    pub assets_dir: PathBuf,
    /// Shader directory, relative to `assets_dir`
    pub shaders_dir: PathBuf,
    /// Texture directory, relative to `assets_dir`
    pub textures_dir: PathBuf,
    /// Model directory, relative to `assets_dir`
    pub models_dir: PathBuf,
}

impl AssetConfig {
    /// Set assets directory
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    /// Full path of a shader source file
    pub fn shader_path(&self, name: &str) -> PathBuf {
        self.assets_dir.join(&self.shaders_dir).join(name)
    }

    /// Full path of a texture file
    pub fn texture_path(&self, name: &str) -> PathBuf {
        self.assets_dir.join(&self.textures_dir).join(name)
    }

    /// Full path of a model file
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.assets_dir.join(&self.models_dir).join(name)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("resources"),
            shaders_dir: PathBuf::from("shaders"),
            textures_dir: PathBuf::from("textures"),
            models_dir: PathBuf::from("models"),
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Window configuration
    pub window: WindowConfig,
    /// Render configuration
    pub render: RenderConfig,
    /// Asset locations
    pub assets: AssetConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }
        if self.render.viewports.is_empty() {
            return Err(ConfigError::Invalid("at least one viewport is required".to_string()));
        }
        for viewport in &self.render.viewports {
            viewport.validate()?;
        }
        Ok(())
    }
}

impl Config for ApplicationConfig {}
