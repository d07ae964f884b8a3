//! Skybox
//!
//! A cubemap drawn on a unit cube around the camera. It is drawn last with
//! depth func `LEQUAL` so it only fills pixels nothing else covered.

use std::path::Path;

use crate::assets::ImageData;
use crate::render::device::{DepthFunc, SharedDevice, TextureHandle};
use crate::render::gl_context::GlContext;
use crate::render::material::TextureError;
use crate::render::primitives::geometry::create_lamp_cube;
use crate::render::primitives::FlatMesh;
use crate::render::RenderResult;

/// Sampler uniform of the skybox shader
pub const SKYBOX_SAMPLER: &str = "skybox";

/// Cubemap plus the cube it is drawn on
pub struct Skybox {
    device: SharedDevice,
    cubemap: TextureHandle,
    cube: FlatMesh,
    shader_index: usize,
}

impl Skybox {
    /// Upload six faces (+X, -X, +Y, -Y, +Z, -Z) drawn with program `shader_index`
    pub fn new(device: &SharedDevice, faces: &[ImageData; 6], shader_index: usize) -> RenderResult<Self> {
        let cube = create_lamp_cube(device)?;
        let cubemap = device.create_cubemap(faces)?;
        log::debug!("Created skybox cubemap {:?} ({}x{} faces)", cubemap, faces[0].width, faces[0].height);

        Ok(Self {
            device: device.clone(),
            cubemap,
            cube,
            shader_index,
        })
    }

    /// Decode six face images in +X, -X, +Y, -Y, +Z, -Z order
    pub fn from_files<P: AsRef<Path>>(
        device: &SharedDevice,
        faces: &[P; 6],
        shader_index: usize,
    ) -> Result<Self, TextureError> {
        let [px, nx, py, ny, pz, nz] = faces.each_ref().map(|p| ImageData::from_file(p));
        let images = [px?, nx?, py?, ny?, pz?, nz?];
        Ok(Self::new(device, &images, shader_index)?)
    }

    /// Draw around the camera of the current render context
    ///
    /// Leaves the skybox program current and restores depth func `LESS`.
    pub fn draw(&self, gl: &mut GlContext) -> RenderResult<()> {
        gl.set_depth_func(DepthFunc::LessOrEqual);
        let result = self.draw_cube(gl);
        gl.set_depth_func(DepthFunc::Less);
        result
    }

    fn draw_cube(&self, gl: &mut GlContext) -> RenderResult<()> {
        gl.use_shader(self.shader_index)?;
        gl.set_projection_uniform("projection")?;
        gl.set_view_uniform_for_skybox("view")?;
        gl.bind_cubemap(self.cubemap, 0, Some(SKYBOX_SAMPLER))?;
        self.cube.draw(gl)
    }

    /// Index of the program the skybox is drawn with
    pub fn shader_index(&self) -> usize {
        self.shader_index
    }
}

impl Drop for Skybox {
    fn drop(&mut self) {
        self.device.delete_texture(self.cubemap);
    }
}
