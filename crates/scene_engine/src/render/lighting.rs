//! Lighting system
//!
//! Light values and their upload to the `dirLight` / `spotLight` uniform
//! structs of the lighting shader.

use crate::foundation::math::{utils, Vec3};
use crate::render::gl_context::GlContext;
use crate::render::RenderResult;

const DIRECTIONAL_FIELDS: [&str; 4] = ["direction", "ambient", "diffuse", "specular"];

const SPOT_FIELDS: [&str; 10] = [
    "position",
    "direction",
    "ambient",
    "diffuse",
    "specular",
    "constant",
    "linear",
    "quadratic",
    "cutOff",
    "outerCutOff",
];

fn field(prefix: &str, name: &str) -> String {
    format!("{}.{}", prefix, name)
}

fn register(gl: &mut GlContext, prefix: &str, fields: &[&str]) -> RenderResult<()> {
    fields.iter().try_for_each(|name| gl.add_uniform(&field(prefix, name)))
}

/// Light with parallel rays (like sunlight)
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels
    pub direction: Vec3,
    /// Ambient color
    pub ambient: Vec3,
    /// Diffuse color
    pub diffuse: Vec3,
    /// Specular color
    pub specular: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(2.0, -2.0, -3.0),
            ambient: Vec3::repeat(0.4),
            diffuse: Vec3::repeat(0.5),
            specular: Vec3::repeat(1.0),
        }
    }
}

impl DirectionalLight {
    /// Register `prefix.direction`, `prefix.ambient`, ... on the current shader
    pub fn register_uniforms(gl: &mut GlContext, prefix: &str) -> RenderResult<()> {
        register(gl, prefix, &DIRECTIONAL_FIELDS)
    }

    /// Upload to the current shader
    pub fn apply(&self, gl: &GlContext, prefix: &str) -> RenderResult<()> {
        gl.set_vec3(&field(prefix, "direction"), &self.direction)?;
        gl.set_vec3(&field(prefix, "ambient"), &self.ambient)?;
        gl.set_vec3(&field(prefix, "diffuse"), &self.diffuse)?;
        gl.set_vec3(&field(prefix, "specular"), &self.specular)
    }
}

/// Cone-shaped light with distance attenuation (like a flashlight)
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    /// Light position
    pub position: Vec3,
    /// Cone axis
    pub direction: Vec3,
    /// Ambient color
    pub ambient: Vec3,
    /// Diffuse color
    pub diffuse: Vec3,
    /// Specular color
    pub specular: Vec3,
    /// Constant attenuation term
    pub constant: f32,
    /// Linear attenuation term
    pub linear: f32,
    /// Quadratic attenuation term
    pub quadratic: f32,
    /// Cosine of the inner cone angle
    pub cut_off: f32,
    /// Cosine of the outer cone angle
    pub outer_cut_off: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            direction: -Vec3::z(),
            ambient: Vec3::repeat(0.2),
            diffuse: Vec3::repeat(0.5),
            specular: Vec3::repeat(1.0),
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            cut_off: utils::deg_to_rad(12.5).cos(),
            outer_cut_off: utils::deg_to_rad(17.5).cos(),
        }
    }
}

impl SpotLight {
    /// Set the cone angles in degrees
    pub fn with_cone_degrees(mut self, inner: f32, outer: f32) -> Self {
        self.cut_off = utils::deg_to_rad(inner).cos();
        self.outer_cut_off = utils::deg_to_rad(outer).cos();
        self
    }

    /// Place the light at a camera, pointing where it looks
    pub fn follow(&mut self, position: Vec3, direction: Vec3) {
        self.position = position;
        self.direction = direction;
    }

    /// Register `prefix.position`, `prefix.cutOff`, ... on the current shader
    pub fn register_uniforms(gl: &mut GlContext, prefix: &str) -> RenderResult<()> {
        register(gl, prefix, &SPOT_FIELDS)
    }

    /// Upload to the current shader
    pub fn apply(&self, gl: &GlContext, prefix: &str) -> RenderResult<()> {
        gl.set_vec3(&field(prefix, "position"), &self.position)?;
        gl.set_vec3(&field(prefix, "direction"), &self.direction)?;
        gl.set_vec3(&field(prefix, "ambient"), &self.ambient)?;
        gl.set_vec3(&field(prefix, "diffuse"), &self.diffuse)?;
        gl.set_vec3(&field(prefix, "specular"), &self.specular)?;
        gl.set_float(&field(prefix, "constant"), self.constant)?;
        gl.set_float(&field(prefix, "linear"), self.linear)?;
        gl.set_float(&field(prefix, "quadratic"), self.quadratic)?;
        gl.set_float(&field(prefix, "cutOff"), self.cut_off)?;
        gl.set_float(&field(prefix, "outerCutOff"), self.outer_cut_off)
    }
}
