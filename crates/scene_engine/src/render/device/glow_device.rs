//! OpenGL device backed by `glow`
//!
//! Every raw GL call of the crate lives in this file.

#![allow(unsafe_code)]

use std::ffi::c_void;
use std::num::NonZeroU32;

use glow::HasContext;

use super::{
    BufferHandle, BufferTarget, BufferUsage, DepthFunc, DeviceResult, FilterMode, GraphicsDevice,
    PolygonMode, ProgramHandle, ShaderHandle, ShaderStage, TextureHandle, TextureParams,
    TextureTarget, UniformLocation, VertexArrayHandle, WrapMode,
};
use crate::assets::ImageData;
use crate::render::vertex_layout::VertexLayout;
use crate::render::{RenderError, ShaderError};

/// [`GraphicsDevice`] on top of a loaded `glow::Context`
///
/// The GL context must be current on the calling thread for the whole
/// lifetime of the device.
pub struct GlowDevice {
    gl: glow::Context,
}

impl GlowDevice {
    /// Load GL function pointers through the window system's loader
    ///
    /// # Safety
    ///
    /// The context the loader belongs to must be current on this thread and
    /// must outlive the returned device.
    pub unsafe fn from_loader<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        let gl = glow::Context::from_loader_function(loader);
        let device = Self { gl };
        log::info!(
            "OpenGL {} on {}",
            device.gl.get_parameter_string(glow::VERSION),
            device.gl.get_parameter_string(glow::RENDERER)
        );
        device
    }

    /// Wrap an already loaded context
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }
}

fn non_zero(id: u32) -> DeviceResult<NonZeroU32> {
    NonZeroU32::new(id).ok_or_else(|| RenderError::ResourceCreationFailed("null GL object name".to_string()))
}

fn shader_kind(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Vertex => glow::ARRAY_BUFFER,
        BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

fn filter(mode: FilterMode) -> i32 {
    (match mode {
        FilterMode::Linear => glow::LINEAR,
        FilterMode::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }) as i32
}

fn wrap(mode: WrapMode) -> i32 {
    (match mode {
        WrapMode::Repeat => glow::REPEAT,
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
    }) as i32
}

fn dimensions(image: &ImageData) -> DeviceResult<(i32, i32)> {
    let width = i32::try_from(image.width);
    let height = i32::try_from(image.height);
    match (width, height) {
        (Ok(w), Ok(h)) if image.channels == 4 && image.data.len() == image.width as usize * image.height as usize * 4 => {
            Ok((w, h))
        }
        _ => Err(RenderError::ResourceCreationFailed(format!(
            "image {}x{} with {} channels cannot be uploaded as RGBA8",
            image.width, image.height, image.channels
        ))),
    }
}

impl GraphicsDevice for GlowDevice {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> DeviceResult<ShaderHandle> {
        unsafe {
            let shader = self
                .gl
                .create_shader(shader_kind(stage))
                .map_err(RenderError::ResourceCreationFailed)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(ShaderError::Compile { stage, log }.into());
            }
            Ok(ShaderHandle(shader.0.get()))
        }
    }

    fn link_program(&self, shaders: &[ShaderHandle]) -> DeviceResult<ProgramHandle> {
        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(RenderError::ResourceCreationFailed)?;

            let natives = shaders
                .iter()
                .map(|s| non_zero(s.0).map(glow::NativeShader))
                .collect::<DeviceResult<Vec<_>>>()?;
            for &shader in &natives {
                self.gl.attach_shader(program, shader);
            }
            self.gl.link_program(program);
            for &shader in &natives {
                self.gl.detach_shader(program, shader);
            }

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(ShaderError::Link { log }.into());
            }
            Ok(ProgramHandle(program.0.get()))
        }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        if let Ok(id) = non_zero(shader.0) {
            unsafe { self.gl.delete_shader(glow::NativeShader(id)) }
        }
    }

    fn delete_program(&self, program: ProgramHandle) {
        if let Ok(id) = non_zero(program.0) {
            unsafe { self.gl.delete_program(glow::NativeProgram(id)) }
        }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let native = program.and_then(|p| NonZeroU32::new(p.0)).map(glow::NativeProgram);
        unsafe { self.gl.use_program(native) }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let program = glow::NativeProgram(NonZeroU32::new(program.0)?);
        unsafe { self.gl.get_uniform_location(program, name) }.map(|loc| UniformLocation(loc.0))
    }

    fn set_uniform_f32(&self, location: UniformLocation, value: f32) {
        let loc = glow::NativeUniformLocation(location.0);
        unsafe { self.gl.uniform_1_f32(Some(&loc), value) }
    }

    fn set_uniform_i32(&self, location: UniformLocation, value: i32) {
        let loc = glow::NativeUniformLocation(location.0);
        unsafe { self.gl.uniform_1_i32(Some(&loc), value) }
    }

    fn set_uniform_vec3(&self, location: UniformLocation, value: [f32; 3]) {
        let loc = glow::NativeUniformLocation(location.0);
        unsafe { self.gl.uniform_3_f32(Some(&loc), value[0], value[1], value[2]) }
    }

    fn set_uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]) {
        let loc = glow::NativeUniformLocation(location.0);
        unsafe { self.gl.uniform_matrix_4_f32_slice(Some(&loc), false, value) }
    }

    fn create_vertex_array(&self) -> DeviceResult<VertexArrayHandle> {
        let vao = unsafe { self.gl.create_vertex_array() }.map_err(RenderError::ResourceCreationFailed)?;
        Ok(VertexArrayHandle(vao.0.get()))
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        let native = vertex_array.and_then(|v| NonZeroU32::new(v.0)).map(glow::NativeVertexArray);
        unsafe { self.gl.bind_vertex_array(native) }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        if let Ok(id) = non_zero(vertex_array.0) {
            unsafe { self.gl.delete_vertex_array(glow::NativeVertexArray(id)) }
        }
    }

    fn create_buffer(&self) -> DeviceResult<BufferHandle> {
        let buffer = unsafe { self.gl.create_buffer() }.map_err(RenderError::ResourceCreationFailed)?;
        Ok(BufferHandle(buffer.0.get()))
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let native = buffer.and_then(|b| NonZeroU32::new(b.0)).map(glow::NativeBuffer);
        unsafe { self.gl.bind_buffer(buffer_target(target), native) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let usage = match usage {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
        };
        unsafe { self.gl.buffer_data_u8_slice(buffer_target(target), data, usage) }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        if let Ok(id) = non_zero(buffer.0) {
            unsafe { self.gl.delete_buffer(glow::NativeBuffer(id)) }
        }
    }

    fn set_vertex_layout(&self, layout: &VertexLayout) {
        let stride = layout.stride as i32;
        for attribute in &layout.attributes {
            unsafe {
                self.gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.format.components(),
                    glow::FLOAT,
                    false,
                    stride,
                    attribute.offset as i32,
                );
                self.gl.enable_vertex_attrib_array(attribute.location);
            }
        }
    }

    fn create_texture_2d(&self, image: &ImageData, params: &TextureParams) -> DeviceResult<TextureHandle> {
        let (width, height) = dimensions(image)?;
        unsafe {
            let texture = self.gl.create_texture().map_err(RenderError::ResourceCreationFailed)?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));

            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap(params.wrap));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap(params.wrap));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter(params.min_filter));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter(params.mag_filter));

            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(image.data.as_slice())),
            );
            if params.generate_mipmaps {
                self.gl.generate_mipmap(glow::TEXTURE_2D);
            }

            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(TextureHandle(texture.0.get()))
        }
    }

    fn create_cubemap(&self, faces: &[ImageData; 6]) -> DeviceResult<TextureHandle> {
        let sizes = faces.iter().map(dimensions).collect::<DeviceResult<Vec<_>>>()?;
        unsafe {
            let texture = self.gl.create_texture().map_err(RenderError::ResourceCreationFailed)?;
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(texture));

            for ((face, image), (width, height)) in (0u32..).zip(faces).zip(sizes) {
                self.gl.tex_image_2d(
                    glow::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                    0,
                    glow::RGBA8 as i32,
                    width,
                    height,
                    0,
                    glow::RGBA,
                    glow::UNSIGNED_BYTE,
                    glow::PixelUnpackData::Slice(Some(image.data.as_slice())),
                );
            }

            let linear = filter(FilterMode::Linear);
            let clamp = wrap(WrapMode::ClampToEdge);
            self.gl.tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_MIN_FILTER, linear);
            self.gl.tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_MAG_FILTER, linear);
            self.gl.tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_WRAP_S, clamp);
            self.gl.tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_WRAP_T, clamp);
            self.gl.tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_WRAP_R, clamp);

            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, None);
            Ok(TextureHandle(texture.0.get()))
        }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        if let Ok(id) = non_zero(texture.0) {
            unsafe { self.gl.delete_texture(glow::NativeTexture(id)) }
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>) {
        let native = texture.and_then(|t| NonZeroU32::new(t.0)).map(glow::NativeTexture);
        unsafe { self.gl.bind_texture(texture_target(target), native) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        unsafe { self.gl.clear_color(rgba[0], rgba[1], rgba[2], rgba[3]) }
    }

    fn clear(&self) {
        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT) }
    }

    fn set_depth_test(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn set_depth_func(&self, func: DepthFunc) {
        let func = match func {
            DepthFunc::Less => glow::LESS,
            DepthFunc::LessOrEqual => glow::LEQUAL,
        };
        unsafe { self.gl.depth_func(func) }
    }

    fn set_polygon_mode(&self, mode: PolygonMode) {
        let mode = match mode {
            PolygonMode::Fill => glow::FILL,
            PolygonMode::Line => glow::LINE,
        };
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) }
    }

    fn draw_arrays(&self, count: usize) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, 0, count as i32) }
    }

    fn draw_elements(&self, count: usize) {
        unsafe { self.gl.draw_elements(glow::TRIANGLES, count as i32, glow::UNSIGNED_INT, 0) }
    }
}
