//! Texture types and GPU upload

use std::path::Path;

use thiserror::Error;

use crate::assets::{AssetError, ImageData};
use crate::render::device::{GraphicsDevice, TextureHandle, TextureParams};
use crate::render::RenderError;

/// Texture loading errors
#[derive(Error, Debug)]
pub enum TextureError {
    /// The image could not be read or decoded
    #[error("Failed to load texture image: {0}")]
    Image(#[from] AssetError),

    /// The GPU texture could not be created
    #[error("Failed to create texture: {0}")]
    Gpu(#[from] RenderError),
}

/// What a texture is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// Base color
    Diffuse,
    /// Specular intensity map
    Specular,
    /// Alpha mask
    Alpha,
    /// Displacement map
    Displacement,
    /// Tangent-space normal map
    Normal,
    /// Environment map
    Environment,
}

impl TextureType {
    /// Number of texture types, and so of material slots
    pub const COUNT: usize = 6;

    /// Every type in slot order
    pub const ALL: [TextureType; Self::COUNT] = [
        Self::Diffuse,
        Self::Specular,
        Self::Alpha,
        Self::Displacement,
        Self::Normal,
        Self::Environment,
    ];

    /// Material slot (and texture unit) of this type
    pub fn slot(self) -> usize {
        match self {
            Self::Diffuse => 0,
            Self::Specular => 1,
            Self::Alpha => 2,
            Self::Displacement => 3,
            Self::Normal => 4,
            Self::Environment => 5,
        }
    }

    /// Sampler uniform the lighting shaders read this type from
    pub fn sampler_uniform(self) -> Option<&'static str> {
        match self {
            Self::Diffuse => Some("material.diffuse"),
            Self::Specular => Some("material.specular"),
            _ => None,
        }
    }
}

/// A 2D texture on the GPU
///
/// Plain handle data; the [`TextureCache`](super::TextureCache) that created it
/// owns the GPU object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    /// GPU handle
    pub handle: TextureHandle,
    /// Usage type
    pub kind: TextureType,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Texture {
    /// Upload decoded pixels with the default sampling parameters
    pub fn from_image(device: &dyn GraphicsDevice, image: &ImageData, kind: TextureType) -> Result<Self, TextureError> {
        let handle = device.create_texture_2d(image, &TextureParams::default())?;
        Ok(Self {
            handle,
            kind,
            width: image.width,
            height: image.height,
        })
    }

    /// Decode an image file and upload it
    pub fn from_file(device: &dyn GraphicsDevice, path: &Path, kind: TextureType) -> Result<Self, TextureError> {
        let image = ImageData::from_file(path)?;
        Self::from_image(device, &image, kind)
    }
}
