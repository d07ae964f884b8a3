//! # GL Context
//!
//! Gateway for every state-changing draw call. Owns the shader programs and
//! render contexts, each list with a "current" cursor that draw code shares
//! until it is moved again.
//!
//! ## Uniform validation
//! Uniform uploads look the name up in the current program's registered
//! table. Names never passed to [`GlContext::add_uniform`] are an error;
//! registered names the driver optimized out are silently skipped.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::device::{
    DepthFunc, PolygonMode, SharedDevice, TextureHandle, TextureTarget, UniformLocation,
    VertexArrayHandle,
};
use crate::render::render_context::{RenderContext, Viewport};
use crate::render::shader::{ShaderProgram, ShaderSources};
use crate::render::{RenderError, RenderResult};

/// Column-major float layout of a matrix, as OpenGL expects it
pub(crate) fn column_major(matrix: &Mat4) -> [f32; 16] {
    let columns: [[f32; 4]; 4] = (*matrix).into();
    bytemuck::cast(columns)
}

/// Shader programs, render contexts and the device they draw with
pub struct GlContext {
    device: SharedDevice,
    shaders: Vec<ShaderProgram>,
    current_shader: usize,
    render_contexts: Vec<RenderContext>,
    current_render_context: usize,
}

impl GlContext {
    /// Wrap a device with no programs or render contexts
    pub fn new(device: SharedDevice) -> Self {
        Self {
            device,
            shaders: Vec::new(),
            current_shader: 0,
            render_contexts: Vec::new(),
            current_render_context: 0,
        }
    }

    /// Shared device handle for resource constructors
    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    // Render contexts

    /// Append a render context and return its index
    ///
    /// Contexts are drawn in the order they were added.
    pub fn add_render_context(&mut self, viewport: Viewport, fov: f32, near: f32, far: f32) -> usize {
        self.render_contexts.push(RenderContext::new(viewport, fov, near, far));
        let index = self.render_contexts.len() - 1;
        log::debug!(
            "Added render context {} ({}x{} at {},{}; fov {})",
            index,
            viewport.width,
            viewport.height,
            viewport.x,
            viewport.y,
            fov
        );
        index
    }

    /// Number of render contexts
    pub fn render_context_count(&self) -> usize {
        self.render_contexts.len()
    }

    /// Index of the current render context
    pub fn current_render_context_index(&self) -> usize {
        self.current_render_context
    }

    /// The render context under the cursor
    pub fn current_render_context(&self) -> RenderResult<&RenderContext> {
        self.render_contexts
            .get(self.current_render_context)
            .ok_or(RenderError::NoRenderContext)
    }

    /// Mutable access to the render context under the cursor
    pub fn current_render_context_mut(&mut self) -> RenderResult<&mut RenderContext> {
        self.render_contexts
            .get_mut(self.current_render_context)
            .ok_or(RenderError::NoRenderContext)
    }

    /// Render context by index
    pub fn render_context(&self, index: usize) -> RenderResult<&RenderContext> {
        let count = self.render_contexts.len();
        self.render_contexts
            .get(index)
            .ok_or(RenderError::InvalidRenderContextIndex { index, count })
    }

    /// Mutable render context by index
    pub fn render_context_mut(&mut self, index: usize) -> RenderResult<&mut RenderContext> {
        let count = self.render_contexts.len();
        self.render_contexts
            .get_mut(index)
            .ok_or(RenderError::InvalidRenderContextIndex { index, count })
    }

    /// Advance the render context cursor, wrapping around
    pub fn next_render_context(&mut self) {
        if !self.render_contexts.is_empty() {
            self.current_render_context = (self.current_render_context + 1) % self.render_contexts.len();
        }
    }

    /// Apply the current render context's viewport
    pub fn set_viewport(&self) -> RenderResult<()> {
        let vp = self.current_render_context()?.viewport();
        self.device
            .viewport(vp.x as i32, vp.y as i32, vp.width as i32, vp.height as i32);
        Ok(())
    }

    /// Upload the current projection matrix
    pub fn set_projection_uniform(&self, name: &str) -> RenderResult<()> {
        let projection = *self.current_render_context()?.projection();
        self.set_matrix4(name, &projection)
    }

    /// Upload the current camera's view matrix
    pub fn set_view_uniform(&self, name: &str) -> RenderResult<()> {
        let view = self.current_render_context()?.view();
        self.set_matrix4(name, &view)
    }

    /// Upload the current view matrix without its translation
    pub fn set_view_uniform_for_skybox(&self, name: &str) -> RenderResult<()> {
        let view = self.current_render_context()?.view().without_translation();
        self.set_matrix4(name, &view)
    }

    /// Upload the current camera position
    pub fn set_camera_position(&self, name: &str) -> RenderResult<()> {
        let position = self.current_render_context()?.camera.position;
        self.set_vec3(name, &position)
    }

    // Shaders

    /// Compile and link a program, append it and return its index
    pub fn add_shader_program(&mut self, sources: &ShaderSources) -> RenderResult<usize> {
        let program = ShaderProgram::new(self.device.clone(), sources).map_err(|e| {
            log::error!("Failed to build shader program {}: {}", self.shaders.len(), e);
            e
        })?;
        self.shaders.push(program);
        Ok(self.shaders.len() - 1)
    }

    /// Make program `index` current and activate it
    pub fn use_shader(&mut self, index: usize) -> RenderResult<()> {
        self.set_current_shader(index)?;
        self.device.use_program(Some(self.shaders[index].handle()));
        Ok(())
    }

    /// Move the shader cursor without activating the program
    pub fn set_current_shader(&mut self, index: usize) -> RenderResult<()> {
        self.check_shader_index(index)?;
        self.current_shader = index;
        Ok(())
    }

    /// Index of the current shader
    pub fn current_shader(&self) -> usize {
        self.current_shader
    }

    /// Number of linked programs
    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    /// Register a uniform on the current shader
    pub fn add_uniform(&mut self, name: &str) -> RenderResult<()> {
        self.check_shader_index(self.current_shader)?;
        self.shaders[self.current_shader].add_uniform(name);
        Ok(())
    }

    /// Whether the current shader registered `name`
    pub fn has_uniform(&self, name: &str) -> bool {
        self.shaders
            .get(self.current_shader)
            .is_some_and(|program| program.has_uniform(name))
    }

    /// Upload a vector uniform
    pub fn set_vec3(&self, name: &str, value: &Vec3) -> RenderResult<()> {
        if let Some(location) = self.location(name)? {
            self.device.set_uniform_vec3(location, [value.x, value.y, value.z]);
        }
        Ok(())
    }

    /// Upload a float uniform
    pub fn set_float(&self, name: &str, value: f32) -> RenderResult<()> {
        if let Some(location) = self.location(name)? {
            self.device.set_uniform_f32(location, value);
        }
        Ok(())
    }

    /// Upload a matrix uniform
    pub fn set_matrix4(&self, name: &str, matrix: &Mat4) -> RenderResult<()> {
        if let Some(location) = self.location(name)? {
            self.device.set_uniform_mat4(location, &column_major(matrix));
        }
        Ok(())
    }

    /// Point a sampler uniform at a texture unit
    pub fn set_sampler(&self, name: &str, unit: u32) -> RenderResult<()> {
        if let Some(location) = self.location(name)? {
            self.device.set_uniform_i32(location, unit as i32);
        }
        Ok(())
    }

    fn check_shader_index(&self, index: usize) -> RenderResult<()> {
        if index < self.shaders.len() {
            Ok(())
        } else {
            Err(RenderError::InvalidShaderIndex {
                index,
                count: self.shaders.len(),
            })
        }
    }

    fn location(&self, name: &str) -> RenderResult<Option<UniformLocation>> {
        self.check_shader_index(self.current_shader)?;
        self.shaders[self.current_shader]
            .location(name)
            .ok_or_else(|| RenderError::UnknownUniform {
                name: name.to_string(),
                shader: self.current_shader,
            })
    }

    // Textures

    /// Bind a 2D texture to `unit` and optionally point `sampler` at it
    pub fn bind_texture(&self, texture: TextureHandle, unit: u32, sampler: Option<&str>) -> RenderResult<()> {
        self.bind(TextureTarget::Texture2D, texture, unit, sampler)
    }

    /// Bind a cubemap to `unit` and optionally point `sampler` at it
    pub fn bind_cubemap(&self, texture: TextureHandle, unit: u32, sampler: Option<&str>) -> RenderResult<()> {
        self.bind(TextureTarget::CubeMap, texture, unit, sampler)
    }

    fn bind(&self, target: TextureTarget, texture: TextureHandle, unit: u32, sampler: Option<&str>) -> RenderResult<()> {
        self.device.active_texture(unit);
        self.device.bind_texture(target, Some(texture));
        match sampler {
            Some(name) => self.set_sampler(name, unit),
            None => Ok(()),
        }
    }

    /// Select the texture unit later binds apply to
    pub fn set_active_texture(&self, unit: u32) {
        self.device.active_texture(unit);
    }

    /// Unbind the 2D textures of units `0..count` and reset the active unit
    pub fn unbind_texture_units(&self, count: u32) {
        for unit in 0..count {
            self.device.active_texture(unit);
            self.device.bind_texture(TextureTarget::Texture2D, None);
        }
        self.device.active_texture(0);
    }

    // Draw state

    /// Set the clear color
    pub fn clear_color(&self, rgba: [f32; 4]) {
        self.device.clear_color(rgba);
    }

    /// Clear color and depth buffers
    pub fn clear(&self) {
        self.device.clear();
    }

    /// Enable or disable depth testing
    pub fn set_depth_test(&self, enabled: bool) {
        self.device.set_depth_test(enabled);
    }

    /// Set the depth comparison
    pub fn set_depth_func(&self, func: DepthFunc) {
        self.device.set_depth_func(func);
    }

    /// Set the rasterization mode
    pub fn set_polygon_mode(&self, mode: PolygonMode) {
        self.device.set_polygon_mode(mode);
    }

    /// Bind (or unbind with `None`) a vertex array
    pub fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.device.bind_vertex_array(vertex_array);
    }

    /// Draw `count` vertices as triangles
    pub fn draw_arrays(&self, count: usize) {
        self.device.draw_arrays(count);
    }

    /// Draw `count` indices of the bound index buffer as triangles
    pub fn draw_elements(&self, count: usize) {
        self.device.draw_elements(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::recording::{Call, RecordingDevice};
    use std::rc::Rc;

    fn context_with_shader() -> (Rc<RecordingDevice>, GlContext) {
        let device = RecordingDevice::new();
        let mut gl = GlContext::new(device.shared());
        gl.add_shader_program(&ShaderSources::new("v", "f")).expect("program should link");
        (device, gl)
    }

    #[test]
    fn test_shader_indices_are_sequential() {
        let (_device, mut gl) = context_with_shader();
        let second = gl.add_shader_program(&ShaderSources::new("v", "f")).expect("link");
        assert_eq!(second, 1);
        assert_eq!(gl.shader_count(), 2);
        assert_eq!(gl.current_shader(), 0);
    }

    #[test]
    fn test_failed_program_is_not_appended() {
        let (device, mut gl) = context_with_shader();
        device.fail_next_compiles(true);
        assert!(gl.add_shader_program(&ShaderSources::new("v", "f")).is_err());
        assert_eq!(gl.shader_count(), 1);
    }

    #[test]
    fn test_use_shader_validates_index() {
        let (device, mut gl) = context_with_shader();
        assert!(matches!(
            gl.use_shader(3),
            Err(RenderError::InvalidShaderIndex { index: 3, count: 1 })
        ));
        assert!(matches!(
            gl.set_current_shader(1),
            Err(RenderError::InvalidShaderIndex { index: 1, count: 1 })
        ));

        gl.use_shader(0).expect("valid index");
        assert!(matches!(device.calls().last(), Some(Call::UseProgram(Some(_)))));
    }

    #[test]
    fn test_unregistered_uniform_is_rejected() {
        let (device, gl) = context_with_shader();
        let result = gl.set_float("material.shininess", 32.0);
        assert!(matches!(
            result,
            Err(RenderError::UnknownUniform { ref name, shader: 0 }) if name == "material.shininess"
        ));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_registered_uniforms_upload() {
        let (device, mut gl) = context_with_shader();
        gl.add_uniform("viewPos").expect("shader exists");
        gl.add_uniform("material.shininess").expect("shader exists");

        gl.set_vec3("viewPos", &Vec3::new(1.0, 2.0, 3.0)).expect("registered");
        gl.set_float("material.shininess", 32.0).expect("registered");

        assert_eq!(
            device.calls(),
            vec![
                Call::SetVec3("viewPos".into(), [1.0, 2.0, 3.0]),
                Call::SetF32("material.shininess".into(), 32.0),
            ]
        );
    }

    #[test]
    fn test_inactive_uniform_is_a_no_op() {
        let (device, mut gl) = context_with_shader();
        device.mark_inactive("spotLight.cutOff");
        gl.add_uniform("spotLight.cutOff").expect("shader exists");

        gl.set_float("spotLight.cutOff", 0.9).expect("registered but inactive");
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_uniforms_need_a_shader() {
        let device = RecordingDevice::new();
        let mut gl = GlContext::new(device.shared());
        assert!(matches!(
            gl.add_uniform("model"),
            Err(RenderError::InvalidShaderIndex { index: 0, count: 0 })
        ));
        assert!(!gl.has_uniform("model"));
    }

    #[test]
    fn test_render_context_cursor_wraps() {
        let (_device, mut gl) = context_with_shader();
        assert!(matches!(gl.current_render_context(), Err(RenderError::NoRenderContext)));

        let viewport = Viewport::new(0.0, 0.0, 400.0, 300.0);
        assert_eq!(gl.add_render_context(viewport, 45.0, 0.1, 100.0), 0);
        assert_eq!(gl.add_render_context(viewport, 60.0, 0.1, 100.0), 1);

        gl.next_render_context();
        assert_eq!(gl.current_render_context().expect("exists").fov(), 60.0);
        gl.next_render_context();
        assert_eq!(gl.current_render_context_index(), 0);
        assert!(matches!(
            gl.render_context(2),
            Err(RenderError::InvalidRenderContextIndex { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_viewport_and_camera_uniforms() {
        let (device, mut gl) = context_with_shader();
        gl.add_render_context(Viewport::new(10.0, 20.0, 400.0, 300.0), 45.0, 0.1, 100.0);
        gl.add_uniform("view").expect("shader exists");
        gl.add_uniform("viewPos").expect("shader exists");

        gl.set_viewport().expect("render context exists");
        gl.set_camera_position("viewPos").expect("registered");
        gl.set_view_uniform_for_skybox("view").expect("registered");

        let calls = device.calls();
        assert_eq!(calls[0], Call::Viewport(10, 20, 400, 300));
        assert_eq!(calls[1], Call::SetVec3("viewPos".into(), [0.0, 5.0, 10.0]));

        let skybox_view = device.mat4_uploads("view")[0];
        assert_eq!(&skybox_view[12..15], &[0.0, 0.0, 0.0], "Skybox view has no translation");
    }

    #[test]
    fn test_bind_texture_sets_sampler() {
        let (device, mut gl) = context_with_shader();
        gl.add_uniform("material.diffuse").expect("shader exists");

        gl.bind_texture(TextureHandle(7), 2, Some("material.diffuse")).expect("registered");
        assert_eq!(
            device.calls(),
            vec![
                Call::ActiveTexture(2),
                Call::BindTexture(TextureTarget::Texture2D, Some(TextureHandle(7))),
                Call::SetI32("material.diffuse".into(), 2),
            ]
        );
    }

    #[test]
    fn test_column_major_layout() {
        let m = Mat4::translation(&Vec3::new(1.0, 2.0, 3.0));
        let data = column_major(&m);
        assert_eq!(&data[12..16], &[1.0, 2.0, 3.0, 1.0]);
        assert_eq!(data[0], 1.0);
    }
}
