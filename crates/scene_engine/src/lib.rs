//! # Scene Engine
//!
//! A small OpenGL scene renderer with per-viewport frustum culling.
//!
//! ## Features
//!
//! - **Render Contexts**: several viewports, each with its own camera and frustum
//! - **Culled Instancing**: indexed meshes skip instances outside the view
//! - **Procedural Geometry**: heightmap terrain, cylinders, spheres and cubes
//! - **Assets**: PNG/JPEG textures with a path cache, OBJ models, cubemap skyboxes
//! - **Testable GPU Seam**: every GL call goes through [`render::GraphicsDevice`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         // Load shaders and meshes
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
//!         // Move cameras
//!         Ok(())
//!     }
//!
//!     fn render(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         engine.gl().clear();
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, engine: &mut Engine) {
//!         // Drop GPU resources
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut app = MyApp;
//!     Engine::run(config, &mut app)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;

pub mod foundation;
pub mod assets;
pub mod render;
pub mod input;
pub mod scene;

mod application;
mod engine;

pub use application::{Application, AppError, AppEvent};
pub use engine::{Engine, EngineError};
pub use scene::TerrainScene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError, AppEvent,
        Engine, EngineError,
        foundation::{
            math::{Vec3, Mat4, Mat4Ext},
            time::Timer,
        },
        render::{
            Camera, GlContext, Mesh, FlatMesh, Material, Model, Skybox,
            ShaderSources, Texture, TextureType, TextureCache,
        },
        input::{InputManager, KeyCode, MouseButton},
        core::config::{ApplicationConfig, Config},
        scene::TerrainScene,
    };
}
