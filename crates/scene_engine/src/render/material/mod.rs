//! Materials and textures
//!
//! A [`Material`] is a shininess value plus one texture slot per
//! [`TextureType`]. Textures are owned by the [`TextureCache`]; materials keep
//! copies of their handles.

pub mod texture;
pub mod texture_cache;

pub use texture::{Texture, TextureError, TextureType};
pub use texture_cache::TextureCache;

/// Default specular exponent
pub const DEFAULT_SHININESS: f32 = 32.0;

/// Surface parameters of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Specular exponent uploaded as `material.shininess`
    pub shininess: f32,

    /// Texture slots indexed by [`TextureType::slot`]
    pub textures: [Option<Texture>; TextureType::COUNT],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            shininess: DEFAULT_SHININESS,
            textures: [None; TextureType::COUNT],
        }
    }
}

impl Material {
    /// Store `texture` in the slot of its type, replacing any previous one
    pub fn set_texture(&mut self, texture: Texture) {
        self.textures[texture.kind.slot()] = Some(texture);
    }

    /// Texture in the slot of `kind`
    pub fn texture(&self, kind: TextureType) -> Option<&Texture> {
        self.textures[kind.slot()].as_ref()
    }

    /// Filled slots with their slot index
    pub fn bound_textures(&self) -> impl Iterator<Item = (usize, &Texture)> {
        self.textures
            .iter()
            .enumerate()
            .filter_map(|(slot, texture)| texture.as_ref().map(|t| (slot, t)))
    }
}
