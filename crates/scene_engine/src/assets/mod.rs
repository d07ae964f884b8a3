//! Asset loading
//!
//! Thin adapters over the decoding crates: `image` for pixels, `tobj` for
//! models and plain file reads for shader sources. Nothing here touches the GPU.

pub mod image_loader;
pub mod obj_loader;
pub mod shader_source;

pub use image_loader::ImageData;
pub use obj_loader::{ObjLoader, ObjError, ImportedScene, ImportedMesh, ImportedMaterial, SceneNode};
pub use shader_source::load_shader_source;

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to load asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
