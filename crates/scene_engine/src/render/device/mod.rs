//! Graphics device abstraction
//!
//! Every OpenGL call the renderer makes goes through [`GraphicsDevice`]. The
//! production implementation is [`GlowDevice`]; tests use a recording device
//! that logs calls instead of touching a driver.
//!
//! All methods take `&self` (OpenGL state lives in the driver), which lets
//! GPU resources hold a [`SharedDevice`] and release themselves on drop.

mod glow_device;
#[cfg(test)]
pub(crate) mod recording;

pub use glow_device::GlowDevice;

use std::rc::Rc;

use crate::assets::ImageData;
use crate::render::vertex_layout::VertexLayout;
use crate::render::RenderError;

/// Shared handle to the active device
pub type SharedDevice = Rc<dyn GraphicsDevice>;

/// Result type for device operations
pub type DeviceResult<T> = Result<T, RenderError>;

/// Handle to a compiled shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Handle to a vertex or index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Handle to a vertex array object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u32);

/// Handle to a texture object (2D or cubemap)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Location of a uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Geometry shader
    Geometry,
    /// Fragment shader
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Vertex => "vertex",
            Self::Geometry => "geometry",
            Self::Fragment => "fragment",
        };
        f.write_str(name)
    }
}

/// Buffer binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Vertex attributes
    Vertex,
    /// Element indices
    Index,
}

/// Expected update frequency of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times
    #[default]
    Static,
    /// Updated regularly
    Dynamic,
}

/// Texture binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureTarget {
    /// 2D texture
    Texture2D,
    /// Cubemap
    CubeMap,
}

/// Minification / magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Linear filtering
    Linear,
    /// Trilinear filtering across mipmaps (minification only)
    LinearMipmapLinear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Repeat the texture
    Repeat,
    /// Clamp to the edge texel
    ClampToEdge,
}

/// Sampling parameters for a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    /// Minification filter
    pub min_filter: FilterMode,
    /// Magnification filter
    pub mag_filter: FilterMode,
    /// Wrap mode on both axes
    pub wrap: WrapMode,
    /// Generate a mipmap chain after upload
    pub generate_mipmaps: bool,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            min_filter: FilterMode::LinearMipmapLinear,
            mag_filter: FilterMode::Linear,
            wrap: WrapMode::Repeat,
            generate_mipmaps: true,
        }
    }
}

/// Rasterizer polygon mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    /// Filled triangles
    Fill,
    /// Wireframe
    Line,
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunc {
    /// Pass if the fragment is nearer
    Less,
    /// Pass if the fragment is nearer or at the same depth
    LessOrEqual,
}

/// The OpenGL operations the renderer needs
///
/// Handles are plain ids; the device does not track ownership. Resource
/// wrappers (`GpuGeometry`, `ShaderProgram`, `TextureCache`, `Skybox`) delete
/// what they create.
pub trait GraphicsDevice {
    // Shaders

    /// Compile one shader stage; the error carries the driver info log
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> DeviceResult<ShaderHandle>;

    /// Link compiled stages into a program; the error carries the driver info log
    fn link_program(&self, shaders: &[ShaderHandle]) -> DeviceResult<ProgramHandle>;

    /// Delete a shader stage object
    fn delete_shader(&self, shader: ShaderHandle);

    /// Delete a program
    fn delete_program(&self, program: ProgramHandle);

    /// Make `program` current (or none)
    fn use_program(&self, program: Option<ProgramHandle>);

    /// Location of a named uniform; `None` when the program has no active uniform by that name
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Upload a float to the current program
    fn set_uniform_f32(&self, location: UniformLocation, value: f32);

    /// Upload an integer (samplers) to the current program
    fn set_uniform_i32(&self, location: UniformLocation, value: i32);

    /// Upload a vec3 to the current program
    fn set_uniform_vec3(&self, location: UniformLocation, value: [f32; 3]);

    /// Upload a column-major 4x4 matrix to the current program
    fn set_uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]);

    // Geometry

    /// Create a vertex array object
    fn create_vertex_array(&self) -> DeviceResult<VertexArrayHandle>;

    /// Bind a vertex array object (or none)
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);

    /// Delete a vertex array object
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);

    /// Create a buffer object
    fn create_buffer(&self) -> DeviceResult<BufferHandle>;

    /// Bind a buffer to a target (or unbind)
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Upload bytes to the buffer bound at `target`
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    /// Delete a buffer object
    fn delete_buffer(&self, buffer: BufferHandle);

    /// Describe the bound vertex buffer's attributes to the bound vertex array
    fn set_vertex_layout(&self, layout: &VertexLayout);

    // Textures

    /// Upload an RGBA8 image as a 2D texture
    fn create_texture_2d(&self, image: &ImageData, params: &TextureParams) -> DeviceResult<TextureHandle>;

    /// Upload six RGBA8 faces (+X, -X, +Y, -Y, +Z, -Z) as a cubemap
    fn create_cubemap(&self, faces: &[ImageData; 6]) -> DeviceResult<TextureHandle>;

    /// Delete a texture
    fn delete_texture(&self, texture: TextureHandle);

    /// Select the active texture unit
    fn active_texture(&self, unit: u32);

    /// Bind a texture (or none) to the active unit
    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>);

    // Fixed function state and draws

    /// Set the viewport rectangle in pixels
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);

    /// Set the clear color
    fn clear_color(&self, rgba: [f32; 4]);

    /// Clear color and depth buffers
    fn clear(&self);

    /// Enable or disable depth testing
    fn set_depth_test(&self, enabled: bool);

    /// Set the depth comparison function
    fn set_depth_func(&self, func: DepthFunc);

    /// Set the polygon rasterization mode for both faces
    fn set_polygon_mode(&self, mode: PolygonMode);

    /// Draw `count` vertices of the bound vertex array as triangles
    fn draw_arrays(&self, count: usize);

    /// Draw `count` `u32` indices of the bound vertex array as triangles
    fn draw_elements(&self, count: usize);
}
