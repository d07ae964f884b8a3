//! Vertex layout descriptors
//!
//! Buffer creation never special-cases a vertex type. Each vertex struct
//! describes itself with a [`VertexLayout`] (stride plus one entry per shader
//! attribute) and the device turns that list into attribute pointers.
//!
//! Attribute locations follow the shader convention used by every program in
//! `resources/shaders`: 0 = position, 1 = normal, 2 = texture coordinate.

use crate::foundation::math::Vec3;

/// Component type and count of one vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFormat {
    /// Two 32-bit floats
    Float32x2,
    /// Three 32-bit floats
    Float32x3,
}

impl AttributeFormat {
    /// Number of components
    pub fn components(self) -> i32 {
        match self {
            Self::Float32x2 => 2,
            Self::Float32x3 => 3,
        }
    }

    /// Size in bytes
    pub fn size(self) -> usize {
        self.components() as usize * std::mem::size_of::<f32>()
    }
}

/// One attribute inside an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader attribute location
    pub location: u32,
    /// Component layout
    pub format: AttributeFormat,
    /// Byte offset from the start of the vertex
    pub offset: usize,
}

/// Interleaved vertex layout: stride plus attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Distance in bytes between consecutive vertices
    pub stride: usize,
    /// Attributes, in location order
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Build a tightly packed layout, assigning locations and offsets in order
    pub fn packed(formats: &[AttributeFormat]) -> Self {
        let mut offset = 0;
        let attributes = formats
            .iter()
            .zip(0u32..)
            .map(|(&format, location)| {
                let attribute = VertexAttribute { location, format, offset };
                offset += format.size();
                attribute
            })
            .collect();

        Self { stride: offset, attributes }
    }
}

/// A vertex struct that can be uploaded to a vertex buffer
pub trait VertexFormat: bytemuck::Pod {
    /// Layout of the struct in a vertex buffer
    fn layout() -> VertexLayout;

    /// Object-space position, used for bounding volumes
    fn position(&self) -> Vec3;
}

/// Position, normal and texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

// Only f32 arrays, no padding
#[allow(unsafe_code)]
unsafe impl bytemuck::Pod for Vertex {}
#[allow(unsafe_code)]
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, tex_coord }
    }

    /// Normal as a vector
    pub fn normal_vector(&self) -> Vec3 {
        Vec3::from(self.normal)
    }
}

impl VertexFormat for Vertex {
    fn layout() -> VertexLayout {
        VertexLayout::packed(&[
            AttributeFormat::Float32x3,
            AttributeFormat::Float32x3,
            AttributeFormat::Float32x2,
        ])
    }

    fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

/// Position only, for unlit geometry such as the lamp and the skybox
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionVertex {
    /// Position in 3D space
    pub position: [f32; 3],
}

#[allow(unsafe_code)]
unsafe impl bytemuck::Pod for PositionVertex {}
#[allow(unsafe_code)]
unsafe impl bytemuck::Zeroable for PositionVertex {}

impl PositionVertex {
    /// Create a new position vertex
    pub fn new(position: [f32; 3]) -> Self {
        Self { position }
    }
}

impl From<Vertex> for PositionVertex {
    fn from(vertex: Vertex) -> Self {
        Self { position: vertex.position }
    }
}

impl VertexFormat for PositionVertex {
    fn layout() -> VertexLayout {
        VertexLayout::packed(&[AttributeFormat::Float32x3])
    }

    fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}
