//! # Rendering System
//!
//! OpenGL rendering for the terrain scene.
//!
//! ## Architecture
//!
//! - **Device**: [`GraphicsDevice`] is the only place GL calls happen; meshes,
//!   shaders and textures hold a shared handle to it and free their objects on drop
//! - **GL Context**: [`GlContext`] owns the shader programs and render contexts and
//!   is the gateway draw code uses for uniforms, textures and draw calls
//! - **Render Context**: [`RenderContext`] is one viewport with its camera,
//!   projection and view frustum
//! - **Resources**: meshes, materials, textures, models and the skybox

pub mod device;
pub mod vertex_layout;
pub mod shader;
pub mod frustum;
pub mod render_context;
pub mod gl_context;
pub mod lighting;
pub mod material;
pub mod primitives;
pub mod model;
pub mod skybox;
pub mod window;

pub use device::{GraphicsDevice, GlowDevice, SharedDevice, TextureHandle};
pub use vertex_layout::{Vertex, PositionVertex, VertexFormat, VertexLayout};
pub use shader::{ShaderProgram, ShaderSources};
pub use frustum::{BoundingSphere, Frustum, Plane};
pub use render_context::{RenderContext, Viewport};
pub use gl_context::GlContext;
pub use lighting::{DirectionalLight, SpotLight};
pub use material::{Material, Texture, TextureCache, TextureError, TextureType};
pub use primitives::{Camera, FlatMesh, Mesh};
pub use model::{Model, ModelError};
pub use skybox::Skybox;
pub use window::{Window, WindowError};

use device::ShaderStage;
use thiserror::Error;

/// Shader compilation and linking errors
#[derive(Error, Debug)]
pub enum ShaderError {
    /// A stage failed to compile
    #[error("{stage} shader failed to compile: {log}")]
    Compile {
        /// Stage that failed
        stage: ShaderStage,
        /// Driver info log
        log: String,
    },

    /// The program failed to link
    #[error("Shader program failed to link: {log}")]
    Link {
        /// Driver info log
        log: String,
    },

    /// A source file could not be read
    #[error("Shader source unavailable: {0}")]
    Source(#[from] crate::assets::AssetError),
}

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// GPU object creation failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Shader compile or link failure
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// A shader index outside the program list
    #[error("Shader index {index} out of range ({count} programs)")]
    InvalidShaderIndex {
        /// Requested index
        index: usize,
        /// Number of programs
        count: usize,
    },

    /// A render context index outside the list
    #[error("Render context index {index} out of range ({count} contexts)")]
    InvalidRenderContextIndex {
        /// Requested index
        index: usize,
        /// Number of render contexts
        count: usize,
    },

    /// An operation needed a render context but none was added
    #[error("No render context has been added")]
    NoRenderContext,

    /// A uniform that was never registered with `add_uniform`
    #[error("Uniform '{name}' is not registered on shader {shader}")]
    UnknownUniform {
        /// Uniform name
        name: String,
        /// Index of the current shader
        shader: usize,
    },

    /// More instances requested than positions supplied
    #[error("Requested {requested} instances but only {available} positions were supplied")]
    InstanceCountOutOfRange {
        /// Requested instance count
        requested: usize,
        /// Number of positions
        available: usize,
    },
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
