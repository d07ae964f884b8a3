//! Texture cache
//!
//! Loads each image file at most once and owns the resulting GPU textures.
//! Meshes and models receive [`Texture`] copies; the cache deletes the GPU
//! objects on [`TextureCache::clear`] or when it is dropped, so it must outlive
//! everything that draws with its textures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::texture::{Texture, TextureError, TextureType};
use crate::render::device::SharedDevice;

/// Path-keyed store of loaded textures
pub struct TextureCache {
    device: SharedDevice,
    textures: HashMap<PathBuf, Texture>,
}

impl TextureCache {
    /// Empty cache uploading through `device`
    pub fn new(device: SharedDevice) -> Self {
        Self {
            device,
            textures: HashMap::new(),
        }
    }

    /// Load `path` as a texture of `kind`, or return the cached one
    ///
    /// A cached texture keeps the type it was first loaded with.
    pub fn load(&mut self, path: impl AsRef<Path>, kind: TextureType) -> Result<Texture, TextureError> {
        let path = path.as_ref();
        if let Some(texture) = self.textures.get(path) {
            if texture.kind != kind {
                log::debug!(
                    "Texture {} already loaded as {:?}, ignoring requested {:?}",
                    path.display(),
                    texture.kind,
                    kind
                );
            }
            return Ok(*texture);
        }

        let texture = Texture::from_file(&*self.device, path, kind)?;
        log::info!(
            "Loaded {:?} texture {} ({}x{})",
            kind,
            path.display(),
            texture.width,
            texture.height
        );
        self.textures.insert(path.to_path_buf(), texture);
        Ok(texture)
    }

    /// Previously loaded texture for `path`
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Texture> {
        self.textures.get(path.as_ref()).copied()
    }

    /// Number of cached textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Delete every cached texture
    pub fn clear(&mut self) {
        for (_, texture) in self.textures.drain() {
            self.device.delete_texture(texture.handle);
        }
    }
}

impl Drop for TextureCache {
    fn drop(&mut self) {
        if !self.textures.is_empty() {
            log::debug!("Releasing {} cached textures", self.textures.len());
        }
        self.clear();
    }
}
