//! Shader programs
//!
//! A [`ShaderProgram`] is a linked program plus the table of uniforms that
//! draw code has registered on it. Uploads go through the table, so a typo in
//! a uniform name is reported instead of silently ignored.

use std::collections::HashMap;
use std::path::Path;

use crate::assets::load_shader_source;
use crate::render::device::{ProgramHandle, ShaderStage, SharedDevice, UniformLocation};
use crate::render::{RenderResult, ShaderError};

/// GLSL sources for one program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Vertex stage
    pub vertex: String,
    /// Fragment stage
    pub fragment: String,
    /// Optional geometry stage
    pub geometry: Option<String>,
}

impl ShaderSources {
    /// Vertex and fragment stages
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            geometry: None,
        }
    }

    /// Add a geometry stage
    pub fn with_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// Read the vertex and fragment stages from disk
    pub fn from_files(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> Result<Self, ShaderError> {
        Ok(Self {
            vertex: load_shader_source(vertex)?,
            fragment: load_shader_source(fragment)?,
            geometry: None,
        })
    }

    /// Add a geometry stage read from disk
    pub fn with_geometry_file(self, geometry: impl AsRef<Path>) -> Result<Self, ShaderError> {
        Ok(self.with_geometry(load_shader_source(geometry)?))
    }

    fn stages(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        [
            Some((ShaderStage::Vertex, self.vertex.as_str())),
            self.geometry.as_deref().map(|g| (ShaderStage::Geometry, g)),
            Some((ShaderStage::Fragment, self.fragment.as_str())),
        ]
        .into_iter()
        .flatten()
    }
}

/// A linked shader program and its registered uniforms
pub struct ShaderProgram {
    device: SharedDevice,
    handle: ProgramHandle,
    uniforms: HashMap<String, Option<UniformLocation>>,
}

impl ShaderProgram {
    /// Compile every stage and link them
    ///
    /// Stage objects are deleted once the program is linked, and on every
    /// failure path.
    pub fn new(device: SharedDevice, sources: &ShaderSources) -> RenderResult<Self> {
        let mut compiled = Vec::with_capacity(3);
        for (stage, source) in sources.stages() {
            match device.compile_shader(stage, source) {
                Ok(shader) => compiled.push(shader),
                Err(e) => {
                    compiled.iter().for_each(|&s| device.delete_shader(s));
                    return Err(e);
                }
            }
        }

        let linked = device.link_program(&compiled);
        compiled.iter().for_each(|&s| device.delete_shader(s));
        let handle = linked?;

        log::debug!("Linked shader program {:?} from {} stages", handle, compiled.len());
        Ok(Self {
            device,
            handle,
            uniforms: HashMap::new(),
        })
    }

    /// Register a uniform by name
    ///
    /// Names the driver reports as inactive (optimized out, or misspelled in
    /// the GLSL) are still registered; uploads to them do nothing.
    pub fn add_uniform(&mut self, name: &str) {
        let location = self.device.uniform_location(self.handle, name);
        if location.is_none() {
            log::warn!("Uniform '{}' is not active in program {:?}", name, self.handle);
        }
        self.uniforms.insert(name.to_string(), location);
    }

    /// Whether `name` was registered
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    /// Registered location: `None` if unregistered, `Some(None)` if registered but inactive
    pub fn location(&self, name: &str) -> Option<Option<UniformLocation>> {
        self.uniforms.get(name).copied()
    }

    /// Program handle
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Number of registered uniforms
    pub fn uniform_count(&self) -> usize {
        self.uniforms.len()
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        log::trace!("Deleting shader program {:?}", self.handle);
        self.device.delete_program(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::recording::{Call, RecordingDevice};
    use crate::render::RenderError;

    #[test]
    fn test_uniform_registration() {
        let device = RecordingDevice::new();
        let mut program = ShaderProgram::new(device.shared(), &ShaderSources::new("v", "f"))
            .expect("program should link");

        assert!(!program.has_uniform("model"));
        program.add_uniform("model");
        assert!(program.has_uniform("model"));
        assert!(matches!(program.location("model"), Some(Some(_))));
        assert_eq!(program.uniform_count(), 1);
        assert_eq!(program.location("view"), None);
    }

    #[test]
    fn test_inactive_uniform_is_registered_without_location() {
        let device = RecordingDevice::new();
        device.mark_inactive("material.specular");
        let mut program = ShaderProgram::new(device.shared(), &ShaderSources::new("v", "f"))
            .expect("program should link");

        program.add_uniform("material.specular");
        assert!(program.has_uniform("material.specular"));
        assert_eq!(program.location("material.specular"), Some(None));
    }

    #[test]
    fn test_compile_failure_is_an_error() {
        let device = RecordingDevice::new();
        device.fail_next_compiles(true);

        let result = ShaderProgram::new(device.shared(), &ShaderSources::new("v", "f"));
        assert!(matches!(
            result,
            Err(RenderError::Shader(ShaderError::Compile { stage: ShaderStage::Vertex, .. }))
        ));
    }

    #[test]
    fn test_geometry_stage_order() {
        let sources = ShaderSources::new("v", "f").with_geometry("g");
        let stages: Vec<_> = sources.stages().map(|(stage, _)| stage).collect();
        assert_eq!(stages, vec![ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Fragment]);
    }

    #[test]
    fn test_program_deleted_on_drop() {
        let device = RecordingDevice::new();
        let program = ShaderProgram::new(device.shared(), &ShaderSources::new("v", "f"))
            .expect("program should link");
        let handle = program.handle();

        drop(program);
        assert!(device.calls().contains(&Call::DeleteProgram(handle)));
    }

    #[test]
    fn test_missing_source_file() {
        let result = ShaderSources::from_files("missing.vert", "missing.frag");
        assert!(matches!(result, Err(ShaderError::Source(_))));

        let result = ShaderSources::new("v", "f").with_geometry_file("missing.geom");
        assert!(matches!(result, Err(ShaderError::Source(_))));
    }
}
