//! Core primitive types for rendering
//!
//! The camera, GPU meshes and the procedural shapes the scene is built from.

pub mod camera;
pub mod cube_data;
pub mod geometry;
pub mod mesh;

// Re-export commonly used types
pub use camera::Camera;
pub use mesh::{FlatMesh, Mesh};
