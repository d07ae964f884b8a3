//! # Meshes
//!
//! GPU-resident geometry with a material.
//!
//! - [`Mesh`] is indexed. Its instanced draw culls every instance against the
//!   current render context's frustum using the mesh's bounding sphere.
//! - [`FlatMesh`] is a plain vertex list. Its instanced draw spins each
//!   instance a little further around a fixed axis and never culls.
//!
//! Both release their vertex array and buffers on drop.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::device::{
    BufferHandle, BufferTarget, BufferUsage, PolygonMode, SharedDevice, VertexArrayHandle,
};
use crate::render::frustum::BoundingSphere;
use crate::render::gl_context::GlContext;
use crate::render::material::{Material, Texture, TextureType};
use crate::render::vertex_layout::{Vertex, VertexFormat};
use crate::render::{RenderError, RenderResult};

/// Uniform receiving each instance's model matrix
pub const MODEL_UNIFORM: &str = "model";

/// Uniform receiving the material's specular exponent
pub const SHININESS_UNIFORM: &str = "material.shininess";

/// Rotation step between consecutive [`FlatMesh`] instances, in degrees
pub const INSTANCE_ROTATION_STEP: f32 = 20.0;

/// Axis of the per-instance [`FlatMesh`] rotation
fn instance_rotation_axis() -> Vec3 {
    Vec3::new(1.0, 0.3, 0.5)
}

/// Vertex array plus buffers of one mesh
struct GpuGeometry {
    device: SharedDevice,
    vertex_array: VertexArrayHandle,
    vertex_buffer: BufferHandle,
    index_buffer: Option<BufferHandle>,
    /// Indices for indexed geometry, vertices otherwise
    count: usize,
}

impl GpuGeometry {
    fn upload<V: VertexFormat>(device: &SharedDevice, vertices: &[V], indices: Option<&[u32]>) -> RenderResult<Self> {
        let vertex_array = device.create_vertex_array()?;
        let vertex_buffer = match device.create_buffer() {
            Ok(buffer) => buffer,
            Err(e) => {
                device.delete_vertex_array(vertex_array);
                return Err(e);
            }
        };
        let index_buffer = match indices.map(|_| device.create_buffer()).transpose() {
            Ok(buffer) => buffer,
            Err(e) => {
                device.delete_buffer(vertex_buffer);
                device.delete_vertex_array(vertex_array);
                return Err(e);
            }
        };

        device.bind_vertex_array(Some(vertex_array));

        device.bind_buffer(BufferTarget::Vertex, Some(vertex_buffer));
        device.buffer_data(BufferTarget::Vertex, bytemuck::cast_slice(vertices), BufferUsage::Static);

        if let (Some(buffer), Some(indices)) = (index_buffer, indices) {
            device.bind_buffer(BufferTarget::Index, Some(buffer));
            device.buffer_data(BufferTarget::Index, bytemuck::cast_slice(indices), BufferUsage::Static);
        }

        device.set_vertex_layout(&V::layout());
        device.bind_vertex_array(None);

        Ok(Self {
            device: device.clone(),
            vertex_array,
            vertex_buffer,
            index_buffer,
            count: indices.map_or(vertices.len(), <[u32]>::len),
        })
    }

    fn draw(&self, gl: &GlContext) {
        if self.index_buffer.is_some() {
            gl.draw_elements(self.count);
        } else {
            gl.draw_arrays(self.count);
        }
    }
}

impl Drop for GpuGeometry {
    fn drop(&mut self) {
        if let Some(buffer) = self.index_buffer {
            self.device.delete_buffer(buffer);
        }
        self.device.delete_buffer(self.vertex_buffer);
        self.device.delete_vertex_array(self.vertex_array);
    }
}

/// Bind every filled texture slot to the unit of the same index
///
/// Samplers and shininess are only set when the current shader registered
/// them, so the same mesh can be drawn by shaders without material uniforms.
fn bind_material(gl: &GlContext, material: &Material) -> RenderResult<()> {
    for (slot, texture) in material.bound_textures() {
        let sampler = texture.kind.sampler_uniform().filter(|name| gl.has_uniform(name));
        gl.bind_texture(texture.handle, slot as u32, sampler)?;
    }
    gl.set_active_texture(0);

    if gl.has_uniform(SHININESS_UNIFORM) {
        gl.set_float(SHININESS_UNIFORM, material.shininess)?;
    }
    Ok(())
}

/// Unbind the vertex array and every material texture unit
///
/// Runs after every draw, also when binding or a uniform upload failed.
fn release_bindings(gl: &GlContext) {
    gl.bind_vertex_array(None);
    gl.unbind_texture_units(TextureType::COUNT as u32);
}

fn check_instance_count(n: usize, positions: &[Vec3]) -> RenderResult<()> {
    if n > positions.len() {
        return Err(RenderError::InstanceCountOutOfRange {
            requested: n,
            available: positions.len(),
        });
    }
    Ok(())
}

/// Indexed mesh with frustum-culled instancing
pub struct Mesh {
    geometry: GpuGeometry,
    /// Surface material
    pub material: Material,
    bounding_sphere: Option<BoundingSphere>,
}

impl Mesh {
    /// Upload indexed geometry
    ///
    /// The bounding sphere is computed from the vertex positions; an empty
    /// vertex list gets none and is never culled.
    pub fn new<V: VertexFormat>(device: &SharedDevice, vertices: &[V], indices: &[u32]) -> RenderResult<Self> {
        let geometry = GpuGeometry::upload(device, vertices, Some(indices))?;
        log::debug!("Created mesh with {} vertices, {} indices", vertices.len(), indices.len());
        Ok(Self {
            geometry,
            material: Material::default(),
            bounding_sphere: BoundingSphere::from_points(vertices.iter().map(VertexFormat::position)),
        })
    }

    /// Put `texture` in its type's material slot
    pub fn add_texture(&mut self, texture: Texture) {
        self.material.set_texture(texture);
    }

    /// Object-space bounding sphere
    pub fn bounding_sphere(&self) -> Option<&BoundingSphere> {
        self.bounding_sphere.as_ref()
    }

    /// Replace the bounding sphere; `None` disables culling
    pub fn set_bounding_sphere(&mut self, sphere: Option<BoundingSphere>) {
        self.bounding_sphere = sphere;
    }

    /// Number of indices drawn per call
    pub fn index_count(&self) -> usize {
        self.geometry.count
    }

    /// Draw once with whatever model matrix is currently uploaded
    pub fn draw(&self, gl: &GlContext) -> RenderResult<()> {
        let result = bind_material(gl, &self.material).map(|()| {
            gl.bind_vertex_array(Some(self.geometry.vertex_array));
            self.geometry.draw(gl);
        });
        release_bindings(gl);
        result
    }

    /// Draw the first `n` entries of `positions`, skipping invisible ones
    ///
    /// For each instance the model matrix is uploaded and the current render
    /// context's frustum is rebuilt around it before the culling test.
    /// Returns how many instances were drawn.
    pub fn draw_instanced(&self, gl: &mut GlContext, n: usize, positions: &[Vec3]) -> RenderResult<usize> {
        check_instance_count(n, positions)?;

        let result = bind_material(gl, &self.material).and_then(|()| {
            gl.bind_vertex_array(Some(self.geometry.vertex_array));
            self.draw_culled(gl, &positions[..n])
        });
        release_bindings(gl);

        let drawn = result?;
        log::trace!("Drew {} of {} mesh instances", drawn, n);
        Ok(drawn)
    }

    fn draw_culled(&self, gl: &mut GlContext, positions: &[Vec3]) -> RenderResult<usize> {
        let mut drawn = 0;
        for position in positions {
            let model = Mat4::translation(position);
            gl.set_matrix4(MODEL_UNIFORM, &model)?;

            let render_context = gl.current_render_context_mut()?;
            render_context.update_frustum(&model);
            let visible = self
                .bounding_sphere
                .map_or(true, |s| render_context.sphere_is_inside_frustum(&s.center, s.radius));

            if visible {
                self.geometry.draw(gl);
                drawn += 1;
            }
        }
        Ok(drawn)
    }

    /// Draw as lines, then restore filled polygons
    pub fn draw_wireframe(&self, gl: &GlContext) {
        gl.set_polygon_mode(PolygonMode::Line);
        gl.bind_vertex_array(Some(self.geometry.vertex_array));
        self.geometry.draw(gl);
        gl.bind_vertex_array(None);
        gl.set_polygon_mode(PolygonMode::Fill);
    }

    /// Smooth normals from triangle faces
    ///
    /// Each triangle `(a, b, c)` adds `(c - b) x (a - b)` to its three
    /// vertices, so larger faces weigh more. Sums are then normalized;
    /// vertices touched by no triangle (or only degenerate ones) keep a
    /// zero normal. Triangles referencing missing vertices are skipped.
    pub fn calculate_normals(vertices: &mut [Vertex], indices: &[u32]) {
        let mut sums = vec![Vec3::zeros(); vertices.len()];

        for triangle in indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            if a.max(b).max(c) >= vertices.len() {
                log::warn!("Skipping triangle {:?} outside {} vertices", triangle, vertices.len());
                continue;
            }

            let (pa, pb, pc) = (vertices[a].position(), vertices[b].position(), vertices[c].position());
            let normal = (pc - pb).cross(&(pa - pb));
            for index in [a, b, c] {
                sums[index] += normal;
            }
        }

        for (vertex, sum) in vertices.iter_mut().zip(sums) {
            let normal = sum.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros);
            vertex.normal = normal.into();
        }
    }
}

/// Non-indexed mesh
pub struct FlatMesh {
    geometry: GpuGeometry,
    /// Surface material
    pub material: Material,
    bounding_sphere: Option<BoundingSphere>,
}

impl FlatMesh {
    /// Upload a triangle list
    pub fn new<V: VertexFormat>(device: &SharedDevice, vertices: &[V]) -> RenderResult<Self> {
        let geometry = GpuGeometry::upload(device, vertices, None)?;
        log::debug!("Created flat mesh with {} vertices", vertices.len());
        Ok(Self {
            geometry,
            material: Material::default(),
            bounding_sphere: BoundingSphere::from_points(vertices.iter().map(VertexFormat::position)),
        })
    }

    /// Put `texture` in its type's material slot
    pub fn add_texture(&mut self, texture: Texture) {
        self.material.set_texture(texture);
    }

    /// Object-space bounding sphere
    pub fn bounding_sphere(&self) -> Option<&BoundingSphere> {
        self.bounding_sphere.as_ref()
    }

    /// Number of vertices drawn per call
    pub fn vertex_count(&self) -> usize {
        self.geometry.count
    }

    /// Draw once with whatever model matrix is currently uploaded
    pub fn draw(&self, gl: &GlContext) -> RenderResult<()> {
        let result = bind_material(gl, &self.material).map(|()| {
            gl.bind_vertex_array(Some(self.geometry.vertex_array));
            self.geometry.draw(gl);
        });
        release_bindings(gl);
        result
    }

    /// Draw the first `n` entries of `positions`, instance `i` rotated by
    /// `20 * i` degrees
    ///
    /// No culling is done; every instance is drawn and `n` is returned.
    pub fn draw_instanced(&self, gl: &GlContext, n: usize, positions: &[Vec3]) -> RenderResult<usize> {
        check_instance_count(n, positions)?;

        let result = bind_material(gl, &self.material).and_then(|()| {
            gl.bind_vertex_array(Some(self.geometry.vertex_array));

            let axis = instance_rotation_axis();
            for (i, position) in positions[..n].iter().enumerate() {
                let model = Mat4::translation(position)
                    * Mat4::rotation_degrees(INSTANCE_ROTATION_STEP * i as f32, &axis);
                gl.set_matrix4(MODEL_UNIFORM, &model)?;
                self.geometry.draw(gl);
            }
            Ok(n)
        });
        release_bindings(gl);
        result
    }

    /// Draw as lines, then restore filled polygons
    pub fn draw_wireframe(&self, gl: &GlContext) {
        gl.set_polygon_mode(PolygonMode::Line);
        gl.bind_vertex_array(Some(self.geometry.vertex_array));
        self.geometry.draw(gl);
        gl.bind_vertex_array(None);
        gl.set_polygon_mode(PolygonMode::Fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::recording::{Call, RecordingDevice};
    use crate::render::device::{TextureHandle, TextureTarget};
    use crate::render::gl_context::column_major;
    use crate::render::render_context::Viewport;
    use crate::render::shader::ShaderSources;
    use crate::render::vertex_layout::PositionVertex;
    use approx::assert_relative_eq;
    use std::rc::Rc;

    fn scene_gl(uniforms: &[&str]) -> (Rc<RecordingDevice>, GlContext) {
        let device = RecordingDevice::new();
        let mut gl = GlContext::new(device.shared());
        gl.add_shader_program(&ShaderSources::new("v", "f")).expect("link");
        for name in uniforms {
            gl.add_uniform(name).expect("shader exists");
        }
        gl.add_render_context(Viewport::new(0.0, 0.0, 800.0, 600.0), 45.0, 0.1, 300.0);
        gl.use_shader(0).expect("shader exists");
        device.clear_calls();
        (device, gl)
    }

    fn unit_quad() -> (Vec<Vertex>, Vec<u32>) {
        let up = [0.0, 1.0, 0.0];
        let vertices = vec![
            Vertex::new([-0.5, 0.0, -0.5], up, [0.0, 0.0]),
            Vertex::new([-0.5, 0.0, 0.5], up, [0.0, 1.0]),
            Vertex::new([0.5, 0.0, -0.5], up, [1.0, 0.0]),
            Vertex::new([0.5, 0.0, 0.5], up, [1.0, 1.0]),
        ];
        (vertices, vec![0, 3, 2, 0, 1, 3])
    }

    #[test]
    fn test_instanced_mesh_culls_hidden_instances() {
        let (device, mut gl) = scene_gl(&["model"]);
        let (vertices, indices) = unit_quad();
        let mesh = Mesh::new(gl.device(), &vertices, &indices).expect("upload");
        device.clear_calls();

        // Camera sits at (0, 5, 10) looking at the origin
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 50.0),
            Vec3::new(2.0, 0.0, -3.0),
        ];
        let drawn = mesh.draw_instanced(&mut gl, 3, &positions).expect("valid draw");

        assert_eq!(drawn, 2, "Instance behind the camera should be culled");
        assert_eq!(device.draw_count(), 2);

        let uploads = device.mat4_uploads("model");
        assert_eq!(uploads.len(), 3, "Every instance uploads its model matrix");
        for (upload, position) in uploads.iter().zip(&positions) {
            assert_eq!(*upload, column_major(&Mat4::translation(position)));
        }
    }

    #[test]
    fn test_instanced_mesh_rebuilds_frustum_per_instance() {
        let (_device, mut gl) = scene_gl(&["model"]);
        let (vertices, indices) = unit_quad();
        let mesh = Mesh::new(gl.device(), &vertices, &indices).expect("upload");

        let last = Vec3::new(0.0, 0.0, 50.0);
        mesh.draw_instanced(&mut gl, 1, &[last]).expect("valid draw");

        let rc = gl.current_render_context().expect("render context");
        assert!(!rc.sphere_is_inside_frustum(&Vec3::zeros(), 0.1), "Frustum is left in the last instance's space");
    }

    #[test]
    fn test_mesh_without_bounding_sphere_is_never_culled() {
        let (device, mut gl) = scene_gl(&["model"]);
        let (vertices, indices) = unit_quad();
        let mut mesh = Mesh::new(gl.device(), &vertices, &indices).expect("upload");
        mesh.set_bounding_sphere(None);
        device.clear_calls();

        let behind = [Vec3::new(0.0, 0.0, 50.0)];
        assert_eq!(mesh.draw_instanced(&mut gl, 1, &behind).expect("valid draw"), 1);
        assert!(device.calls().contains(&Call::DrawElements(mesh.index_count())));
    }

    #[test]
    fn test_instance_count_is_validated() {
        let (device, mut gl) = scene_gl(&["model"]);
        let (vertices, indices) = unit_quad();
        let mesh = Mesh::new(gl.device(), &vertices, &indices).expect("upload");

        let result = mesh.draw_instanced(&mut gl, 4, &[Vec3::zeros(); 3]);
        assert!(matches!(
            result,
            Err(RenderError::InstanceCountOutOfRange { requested: 4, available: 3 })
        ));
        assert_eq!(device.draw_count(), 0);

        assert_eq!(mesh.draw_instanced(&mut gl, 0, &[]).expect("empty draw"), 0);
    }

    fn assert_bindings_released(calls: &[Call]) {
        let last_vao = calls.iter().rev().find(|c| matches!(c, Call::BindVertexArray(_)));
        assert_eq!(last_vao, Some(&Call::BindVertexArray(None)), "Vertex array left bound");

        let tail = &calls[calls.len() - 2 * TextureType::COUNT - 1..];
        let unbinds = tail
            .iter()
            .filter(|c| matches!(c, Call::BindTexture(TextureTarget::Texture2D, None)))
            .count();
        assert_eq!(unbinds, TextureType::COUNT, "Texture units left bound");
        assert_eq!(calls.last(), Some(&Call::ActiveTexture(0)));
    }

    #[test]
    fn test_failed_instanced_draw_releases_bindings() {
        let (device, mut gl) = scene_gl(&[]);
        let (vertices, indices) = unit_quad();
        let mut mesh = Mesh::new(gl.device(), &vertices, &indices).expect("upload");
        mesh.add_texture(Texture { handle: TextureHandle(40), kind: TextureType::Diffuse, width: 1, height: 1 });
        device.clear_calls();

        let result = mesh.draw_instanced(&mut gl, 1, &[Vec3::zeros()]);
        assert!(matches!(result, Err(RenderError::UnknownUniform { ref name, .. }) if name == "model"));
        assert_eq!(device.draw_count(), 0);
        assert_bindings_released(&device.calls());
    }

    #[test]
    fn test_failed_flat_instanced_draw_releases_bindings() {
        let (device, gl) = scene_gl(&[]);
        let vertices: Vec<PositionVertex> = unit_quad().0.into_iter().map(PositionVertex::from).collect();
        let mesh = FlatMesh::new(gl.device(), &vertices).expect("upload");
        device.clear_calls();

        let result = mesh.draw_instanced(&gl, 2, &[Vec3::zeros(), Vec3::x()]);
        assert!(matches!(result, Err(RenderError::UnknownUniform { .. })));
        assert_bindings_released(&device.calls());
    }

    #[test]
    fn test_flat_mesh_rotates_instances_without_culling() {
        let (device, gl) = scene_gl(&["model"]);
        let vertices: Vec<PositionVertex> = unit_quad().0.into_iter().map(PositionVertex::from).collect();
        let mesh = FlatMesh::new(gl.device(), &vertices).expect("upload");
        device.clear_calls();

        let positions = [Vec3::zeros(), Vec3::new(0.0, 0.0, 50.0), Vec3::new(1.0, 2.0, 3.0)];
        let drawn = mesh.draw_instanced(&gl, 3, &positions).expect("valid draw");

        assert_eq!(drawn, 3);
        assert_eq!(device.draw_count(), 3, "Flat meshes never cull");

        let axis = Vec3::new(1.0, 0.3, 0.5);
        let uploads = device.mat4_uploads("model");
        for (i, (upload, position)) in uploads.iter().zip(&positions).enumerate() {
            let expected = Mat4::translation(position) * Mat4::rotation_degrees(20.0 * i as f32, &axis);
            let actual = Mat4::from_column_slice(upload);
            assert_relative_eq!(actual, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_draw_binds_textures_and_shininess() {
        let (device, gl) = scene_gl(&["model", "material.diffuse", "material.shininess"]);
        let (vertices, indices) = unit_quad();
        let mut mesh = Mesh::new(gl.device(), &vertices, &indices).expect("upload");
        mesh.add_texture(Texture { handle: TextureHandle(40), kind: TextureType::Diffuse, width: 1, height: 1 });
        mesh.add_texture(Texture { handle: TextureHandle(41), kind: TextureType::Specular, width: 1, height: 1 });
        device.clear_calls();

        mesh.draw(&gl).expect("registered uniforms");
        let calls = device.calls();

        assert!(calls.contains(&Call::SetI32("material.diffuse".into(), 0)));
        assert!(
            calls.contains(&Call::BindTexture(TextureTarget::Texture2D, Some(TextureHandle(41)))),
            "Specular texture is bound even without a registered sampler"
        );
        assert!(!calls.iter().any(|c| matches!(c, Call::SetI32(name, _) if name == "material.specular")));
        assert!(calls.contains(&Call::SetF32("material.shininess".into(), 32.0)));
        assert!(calls.contains(&Call::DrawElements(6)));

        let unbinds = calls
            .iter()
            .filter(|c| matches!(c, Call::BindTexture(TextureTarget::Texture2D, None)))
            .count();
        assert_eq!(unbinds, TextureType::COUNT, "Every texture unit is reset after drawing");
    }

    #[test]
    fn test_shininess_skipped_without_uniform() {
        let (device, gl) = scene_gl(&["model"]);
        let (vertices, indices) = unit_quad();
        let mesh = Mesh::new(gl.device(), &vertices, &indices).expect("upload");
        device.clear_calls();

        mesh.draw(&gl).expect("no material uniforms needed");
        assert!(!device.calls().iter().any(|c| matches!(c, Call::SetF32(..))));
    }

    #[test]
    fn test_wireframe_restores_fill_mode() {
        let (device, gl) = scene_gl(&[]);
        let (vertices, indices) = unit_quad();
        let mesh = Mesh::new(gl.device(), &vertices, &indices).expect("upload");
        device.clear_calls();

        mesh.draw_wireframe(&gl);
        let calls = device.calls();
        assert_eq!(calls.first(), Some(&Call::PolygonMode(PolygonMode::Line)));
        assert_eq!(calls.last(), Some(&Call::PolygonMode(PolygonMode::Fill)));
    }

    #[test]
    fn test_buffers_released_on_drop() {
        let device = RecordingDevice::new();
        let (vertices, indices) = unit_quad();
        let mesh = Mesh::new(&device.shared(), &vertices, &indices).expect("upload");
        device.clear_calls();

        drop(mesh);
        let calls = device.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::DeleteBuffer(_))).count(), 2);
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::DeleteVertexArray(_))).count(), 1);
    }

    #[test]
    fn test_bounding_sphere_from_vertices() {
        let device = RecordingDevice::new();
        let (vertices, indices) = unit_quad();
        let mesh = Mesh::new(&device.shared(), &vertices, &indices).expect("upload");

        let sphere = mesh.bounding_sphere().expect("non-empty mesh");
        assert_relative_eq!(sphere.center, Vec3::zeros());
        assert_relative_eq!(sphere.radius, 0.5f32.hypot(0.5));
    }

    #[test]
    fn test_calculate_normals_on_flat_quad() {
        let (mut vertices, indices) = unit_quad();
        for vertex in &mut vertices {
            vertex.normal = [0.0, 0.0, 0.0];
        }

        Mesh::calculate_normals(&mut vertices, &indices);
        for vertex in &vertices {
            assert_relative_eq!(vertex.normal_vector(), Vec3::y(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_calculate_normals_leaves_unused_vertices_zero() {
        let (mut vertices, _) = unit_quad();
        Mesh::calculate_normals(&mut vertices, &[]);
        assert!(vertices.iter().all(|v| v.normal == [0.0, 0.0, 0.0]));
    }
}
