//! Imported models
//!
//! A [`Model`] is the mesh list of an imported file, in depth-first scene
//! graph order, each mesh with the first diffuse and first specular texture
//! of its material.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::assets::{ImportedMaterial, ImportedMesh, ImportedScene, ObjError, ObjLoader};
use crate::foundation::math::Mat4;
use crate::render::device::SharedDevice;
use crate::render::gl_context::GlContext;
use crate::render::material::{TextureCache, TextureError, TextureType};
use crate::render::primitives::mesh::MODEL_UNIFORM;
use crate::render::primitives::Mesh;
use crate::render::vertex_layout::Vertex;
use crate::render::RenderError;

/// Model loading errors
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model file could not be imported
    #[error("Model import failed: {0}")]
    Import(#[from] ObjError),

    /// A referenced texture could not be loaded
    #[error("Model texture failed: {0}")]
    Texture(#[from] TextureError),

    /// A mesh could not be uploaded
    #[error("Model upload failed: {0}")]
    Render(#[from] RenderError),
}

/// Meshes of one imported model file
pub struct Model {
    meshes: Vec<Mesh>,
    directory: PathBuf,
}

impl Model {
    /// Import a model file and upload its meshes
    ///
    /// Texture paths in the file are resolved relative to the file's directory.
    pub fn load(device: &SharedDevice, textures: &mut TextureCache, path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let scene = ObjLoader::load(path)?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let model = Self::from_scene(device, textures, &scene, &directory)?;
        log::info!("Loaded model {} ({} meshes)", path.display(), model.meshes.len());
        Ok(model)
    }

    /// Upload an already imported scene
    pub fn from_scene(
        device: &SharedDevice,
        textures: &mut TextureCache,
        scene: &ImportedScene,
        directory: &Path,
    ) -> Result<Self, ModelError> {
        let mut meshes = Vec::with_capacity(scene.meshes.len());

        for index in scene.flattened_mesh_order() {
            let Some(imported) = scene.meshes.get(index) else {
                return Err(ObjError::InvalidFormat(format!(
                    "node references mesh {} of {}",
                    index,
                    scene.meshes.len()
                ))
                .into());
            };

            let vertices = build_vertices(imported);
            let mut mesh = Mesh::new(device, &vertices, &imported.indices)?;

            if let Some(material) = imported.material.and_then(|m| scene.materials.get(m)) {
                attach_textures(&mut mesh, material, textures, directory)?;
            }
            meshes.push(mesh);
        }

        Ok(Self {
            meshes,
            directory: directory.to_path_buf(),
        })
    }

    /// Draw every mesh with the currently uploaded model matrix
    pub fn draw(&self, gl: &GlContext) -> Result<(), RenderError> {
        self.meshes.iter().try_for_each(|mesh| mesh.draw(gl))
    }

    /// Upload `model` and draw the meshes whose bounding spheres are visible
    ///
    /// Uses the camera frustum of the current render context and leaves it
    /// untouched. Returns the number of meshes drawn.
    pub fn draw_visible(&self, gl: &GlContext, model: &Mat4) -> Result<usize, RenderError> {
        gl.set_matrix4(MODEL_UNIFORM, model)?;
        let frustum = gl.current_render_context()?.view_frustum();

        let mut drawn = 0;
        for mesh in &self.meshes {
            let visible = mesh
                .bounding_sphere()
                .map_or(true, |s| frustum.intersects_sphere(model, &s.center, s.radius));
            if visible {
                mesh.draw(gl)?;
                drawn += 1;
            }
        }
        Ok(drawn)
    }

    /// Meshes in draw order
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Directory texture paths were resolved against
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Interleave imported attributes, generating normals when the file has none
fn build_vertices(imported: &ImportedMesh) -> Vec<Vertex> {
    let has_normals = imported.normals.len() == imported.positions.len();

    let mut vertices: Vec<Vertex> = imported
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let normal = if has_normals { imported.normals[i] } else { [0.0; 3] };
            let tex_coord = imported
                .tex_coords
                .as_ref()
                .and_then(|uvs| uvs.get(i).copied())
                .unwrap_or([0.0, 0.0]);
            Vertex::new(position, normal, tex_coord)
        })
        .collect();

    if !has_normals {
        log::debug!("Generating normals for mesh '{}'", imported.name);
        Mesh::calculate_normals(&mut vertices, &imported.indices);
    }
    vertices
}

fn attach_textures(
    mesh: &mut Mesh,
    material: &ImportedMaterial,
    textures: &mut TextureCache,
    directory: &Path,
) -> Result<(), TextureError> {
    let slots = [
        (material.diffuse_textures.first(), TextureType::Diffuse),
        (material.specular_textures.first(), TextureType::Specular),
    ];

    for (file, kind) in slots {
        if let Some(file) = file {
            let texture = textures.load(directory.join(file), kind)?;
            mesh.add_texture(texture);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::SceneNode;
    use crate::foundation::math::{Mat4Ext, Vec3};
    use crate::render::device::recording::{Call, RecordingDevice};
    use crate::render::render_context::Viewport;
    use crate::render::shader::ShaderSources;
    use approx::assert_relative_eq;

    fn triangle(name: &str, offset: f32, material: Option<usize>) -> ImportedMesh {
        ImportedMesh {
            name: name.to_string(),
            positions: vec![[offset, 0.0, 0.0], [offset + 1.0, 0.0, 0.0], [offset, 0.0, -1.0]],
            normals: Vec::new(),
            tex_coords: None,
            indices: vec![0, 1, 2],
            material,
        }
    }

    fn two_level_scene() -> ImportedScene {
        ImportedScene {
            root: SceneNode {
                name: "root".into(),
                meshes: vec![2],
                children: vec![
                    SceneNode { name: "a".into(), meshes: vec![0], children: Vec::new() },
                    SceneNode { name: "b".into(), meshes: vec![1], children: Vec::new() },
                ],
            },
            meshes: vec![triangle("a", 0.0, None), triangle("b", 10.0, None), triangle("root", -10.0, None)],
            materials: Vec::new(),
        }
    }

    #[test]
    fn test_meshes_follow_depth_first_order() {
        let device = RecordingDevice::new();
        let mut textures = TextureCache::new(device.shared());
        let model = Model::from_scene(&device.shared(), &mut textures, &two_level_scene(), Path::new("."))
            .expect("upload");

        let centers: Vec<f32> = model
            .meshes()
            .iter()
            .map(|m| m.bounding_sphere().expect("non-empty").center.x)
            .collect();
        assert_eq!(centers, vec![-9.5, 0.5, 10.5]);
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let vertices = build_vertices(&triangle("t", 0.0, None));
        for vertex in vertices {
            assert_relative_eq!(vertex.normal_vector(), Vec3::y(), epsilon = 1e-6);
            assert_eq!(vertex.tex_coord, [0.0, 0.0]);
        }
    }

    #[test]
    fn test_dangling_mesh_reference_is_an_error() {
        let device = RecordingDevice::new();
        let mut textures = TextureCache::new(device.shared());
        let mut scene = two_level_scene();
        scene.root.meshes.push(9);

        let result = Model::from_scene(&device.shared(), &mut textures, &scene, Path::new("."));
        assert!(matches!(result, Err(ModelError::Import(ObjError::InvalidFormat(_)))));
    }

    #[test]
    fn test_material_textures_resolve_against_directory() {
        let dir = std::env::temp_dir().join("scene_engine_model_textures");
        std::fs::create_dir_all(&dir).expect("temp dir");
        image::RgbaImage::from_pixel(1, 1, image::Rgba([200, 100, 50, 255]))
            .save(dir.join("wood.png"))
            .expect("write png");

        let device = RecordingDevice::new();
        let mut textures = TextureCache::new(device.shared());
        let scene = ImportedScene {
            root: SceneNode { name: "root".into(), meshes: vec![0], children: Vec::new() },
            meshes: vec![triangle("t", 0.0, Some(0))],
            materials: vec![ImportedMaterial {
                name: "wood".into(),
                diffuse_textures: vec!["wood.png".into(), "unused.png".into()],
                specular_textures: Vec::new(),
            }],
        };

        let model = Model::from_scene(&device.shared(), &mut textures, &scene, &dir).expect("upload");
        let texture = model.meshes()[0].material.texture(TextureType::Diffuse).copied();
        assert_eq!(texture, textures.get(dir.join("wood.png")));
        assert_eq!(textures.len(), 1, "Only the first diffuse texture is loaded");
    }

    #[test]
    fn test_draw_visible_skips_meshes_outside_view() {
        let device = RecordingDevice::new();
        let mut gl = GlContext::new(device.shared());
        gl.add_shader_program(&ShaderSources::new("v", "f")).expect("link");
        gl.add_uniform("model").expect("shader exists");
        gl.add_render_context(Viewport::new(0.0, 0.0, 800.0, 600.0), 45.0, 0.1, 300.0);

        let mut textures = TextureCache::new(device.shared());
        let mut scene = two_level_scene();
        scene.meshes[2] = triangle("root", -2.0, None);
        // Far to the side of the default camera
        scene.meshes[1] = triangle("b", 500.0, None);
        let model = Model::from_scene(gl.device(), &mut textures, &scene, Path::new(".")).expect("upload");
        device.clear_calls();

        let drawn = model.draw_visible(&gl, &Mat4::translation(&Vec3::zeros())).expect("draw");
        assert_eq!(drawn, 2);
        assert_eq!(device.draw_count(), 2);
        assert!(device.calls().contains(&Call::DrawElements(3)));
    }
}
