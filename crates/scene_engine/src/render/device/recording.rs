//! In-memory [`GraphicsDevice`] that records every call
//!
//! Used by unit tests to check draw sequences without a GL context.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::{
    BufferHandle, BufferTarget, BufferUsage, DepthFunc, DeviceResult, GraphicsDevice, PolygonMode,
    ProgramHandle, ShaderHandle, ShaderStage, SharedDevice, TextureHandle, TextureParams,
    TextureTarget, UniformLocation, VertexArrayHandle,
};
use crate::assets::ImageData;
use crate::render::vertex_layout::VertexLayout;
use crate::render::ShaderError;

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UseProgram(Option<ProgramHandle>),
    SetF32(String, f32),
    SetI32(String, i32),
    SetVec3(String, [f32; 3]),
    SetMat4(String, [f32; 16]),
    BindVertexArray(Option<VertexArrayHandle>),
    BufferData(BufferTarget, usize),
    VertexLayout(usize),
    ActiveTexture(u32),
    BindTexture(TextureTarget, Option<TextureHandle>),
    DeleteTexture(TextureHandle),
    DeleteBuffer(BufferHandle),
    DeleteVertexArray(VertexArrayHandle),
    DeleteProgram(ProgramHandle),
    Viewport(i32, i32, i32, i32),
    ClearColor([f32; 4]),
    Clear,
    DepthTest(bool),
    DepthFunc(DepthFunc),
    PolygonMode(PolygonMode),
    DrawArrays(usize),
    DrawElements(usize),
}

#[derive(Default)]
pub struct RecordingDevice {
    next_id: Cell<u32>,
    calls: RefCell<Vec<Call>>,
    locations: RefCell<HashMap<(u32, String), u32>>,
    location_names: RefCell<HashMap<u32, String>>,
    inactive: RefCell<HashSet<String>>,
    fail_compile: Cell<bool>,
}

impl RecordingDevice {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// The same device as a trait object for engine types
    pub fn shared(self: &Rc<Self>) -> SharedDevice {
        self.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn fail_next_compiles(&self, fail: bool) {
        self.fail_compile.set(fail);
    }

    /// Uniform names the "driver" reports as inactive
    pub fn mark_inactive(&self, name: &str) {
        self.inactive.borrow_mut().insert(name.to_string());
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::DrawArrays(_) | Call::DrawElements(_)))
            .count()
    }

    /// Every matrix uploaded to the uniform called `name`, in order
    pub fn mat4_uploads(&self, name: &str) -> Vec<[f32; 16]> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::SetMat4(n, m) if n == name => Some(*m),
                _ => None,
            })
            .collect()
    }

    fn next(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn name_of(&self, location: UniformLocation) -> String {
        self.location_names
            .borrow()
            .get(&location.0)
            .cloned()
            .unwrap_or_else(|| format!("<location {}>", location.0))
    }
}

impl GraphicsDevice for RecordingDevice {
    fn compile_shader(&self, stage: ShaderStage, _source: &str) -> DeviceResult<ShaderHandle> {
        if self.fail_compile.get() {
            return Err(ShaderError::Compile { stage, log: "0:1: syntax error".to_string() }.into());
        }
        Ok(ShaderHandle(self.next()))
    }

    fn link_program(&self, _shaders: &[ShaderHandle]) -> DeviceResult<ProgramHandle> {
        Ok(ProgramHandle(self.next()))
    }

    fn delete_shader(&self, _shader: ShaderHandle) {}

    fn delete_program(&self, program: ProgramHandle) {
        self.record(Call::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.record(Call::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        if self.inactive.borrow().contains(name) {
            return None;
        }
        let key = (program.0, name.to_string());
        if let Some(&loc) = self.locations.borrow().get(&key) {
            return Some(UniformLocation(loc));
        }
        let loc = self.next();
        self.locations.borrow_mut().insert(key, loc);
        self.location_names.borrow_mut().insert(loc, name.to_string());
        Some(UniformLocation(loc))
    }

    fn set_uniform_f32(&self, location: UniformLocation, value: f32) {
        self.record(Call::SetF32(self.name_of(location), value));
    }

    fn set_uniform_i32(&self, location: UniformLocation, value: i32) {
        self.record(Call::SetI32(self.name_of(location), value));
    }

    fn set_uniform_vec3(&self, location: UniformLocation, value: [f32; 3]) {
        self.record(Call::SetVec3(self.name_of(location), value));
    }

    fn set_uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]) {
        self.record(Call::SetMat4(self.name_of(location), *value));
    }

    fn create_vertex_array(&self) -> DeviceResult<VertexArrayHandle> {
        Ok(VertexArrayHandle(self.next()))
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        self.record(Call::DeleteVertexArray(vertex_array));
    }

    fn create_buffer(&self) -> DeviceResult<BufferHandle> {
        Ok(BufferHandle(self.next()))
    }

    fn bind_buffer(&self, _target: BufferTarget, _buffer: Option<BufferHandle>) {}

    fn buffer_data(&self, target: BufferTarget, data: &[u8], _usage: BufferUsage) {
        self.record(Call::BufferData(target, data.len()));
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        self.record(Call::DeleteBuffer(buffer));
    }

    fn set_vertex_layout(&self, layout: &VertexLayout) {
        self.record(Call::VertexLayout(layout.attributes.len()));
    }

    fn create_texture_2d(&self, _image: &ImageData, _params: &TextureParams) -> DeviceResult<TextureHandle> {
        Ok(TextureHandle(self.next()))
    }

    fn create_cubemap(&self, _faces: &[ImageData; 6]) -> DeviceResult<TextureHandle> {
        Ok(TextureHandle(self.next()))
    }

    fn delete_texture(&self, texture: TextureHandle) {
        self.record(Call::DeleteTexture(texture));
    }

    fn active_texture(&self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>) {
        self.record(Call::BindTexture(target, texture));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.record(Call::ClearColor(rgba));
    }

    fn clear(&self) {
        self.record(Call::Clear);
    }

    fn set_depth_test(&self, enabled: bool) {
        self.record(Call::DepthTest(enabled));
    }

    fn set_depth_func(&self, func: DepthFunc) {
        self.record(Call::DepthFunc(func));
    }

    fn set_polygon_mode(&self, mode: PolygonMode) {
        self.record(Call::PolygonMode(mode));
    }

    fn draw_arrays(&self, count: usize) {
        self.record(Call::DrawArrays(count));
    }

    fn draw_elements(&self, count: usize) {
        self.record(Call::DrawElements(count));
    }
}
