//! OBJ model import
//!
//! Wraps `tobj` and returns an [`ImportedScene`]: a node tree that references
//! meshes and materials by index. The renderer flattens the tree into GPU
//! meshes; this module stays GPU-free.

use std::path::Path;
use thiserror::Error;

/// OBJ import errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// The OBJ file could not be read or parsed
    #[error("Failed to import {path}: {source}")]
    Load {
        /// File being imported
        path: String,
        /// Error reported by the parser
        #[source]
        source: tobj::LoadError,
    },

    /// Parsed data is inconsistent
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Geometry of one imported mesh with a single shared index list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    /// Mesh name from the file
    pub name: String,
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals; empty when the file has none
    pub normals: Vec<[f32; 3]>,
    /// First UV set, already flipped for OpenGL; `None` when the file has none
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// Triangle list indices
    pub indices: Vec<u32>,
    /// Index into [`ImportedScene::materials`]
    pub material: Option<usize>,
}

/// Texture references of one imported material
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedMaterial {
    /// Material name
    pub name: String,
    /// Diffuse texture file names, relative to the model directory
    pub diffuse_textures: Vec<String>,
    /// Specular texture file names, relative to the model directory
    pub specular_textures: Vec<String>,
}

/// A node of the imported scene graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneNode {
    /// Node name
    pub name: String,
    /// Indices into [`ImportedScene::meshes`]
    pub meshes: Vec<usize>,
    /// Child nodes
    pub children: Vec<SceneNode>,
}

/// A whole imported file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedScene {
    /// Root of the node tree
    pub root: SceneNode,
    /// All meshes referenced by nodes
    pub meshes: Vec<ImportedMesh>,
    /// All materials referenced by meshes
    pub materials: Vec<ImportedMaterial>,
}

impl ImportedScene {
    /// Mesh indices in depth-first order: a node's own meshes, then its children
    pub fn flattened_mesh_order(&self) -> Vec<usize> {
        fn visit(node: &SceneNode, out: &mut Vec<usize>) {
            out.extend_from_slice(&node.meshes);
            for child in &node.children {
                visit(child, out);
            }
        }

        let mut order = Vec::new();
        visit(&self.root, &mut order);
        order
    }
}

/// Loader for Wavefront OBJ files (with MTL materials)
pub struct ObjLoader;

impl ObjLoader {
    /// Import an OBJ file: faces are triangulated, UVs flipped vertically
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ImportedScene, ObjError> {
        let path = path.as_ref();
        log::debug!("Importing model {:?}", path);

        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };
        let (models, materials) = tobj::load_obj(path, &options).map_err(|source| ObjError::Load {
            path: path.display().to_string(),
            source,
        })?;

        let materials = match materials {
            Ok(materials) => materials,
            Err(e) => {
                log::warn!("Model {:?} has no usable materials: {}", path, e);
                Vec::new()
            }
        };

        let mut scene = ImportedScene {
            root: SceneNode {
                name: path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                ..SceneNode::default()
            },
            meshes: Vec::with_capacity(models.len()),
            materials: materials
                .into_iter()
                .map(|m| ImportedMaterial {
                    name: m.name,
                    diffuse_textures: m.diffuse_texture.into_iter().collect(),
                    specular_textures: m.specular_texture.into_iter().collect(),
                })
                .collect(),
        };

        for model in models {
            let mut mesh = convert_mesh(model.name.clone(), &model.mesh)?;
            if mesh.material.is_some_and(|m| m >= scene.materials.len()) {
                log::warn!("Mesh {} references a material that was not loaded", mesh.name);
                mesh.material = None;
            }

            scene.root.children.push(SceneNode {
                name: model.name,
                meshes: vec![scene.meshes.len()],
                children: Vec::new(),
            });
            scene.meshes.push(mesh);
        }

        log::info!(
            "Imported {:?}: {} meshes, {} materials",
            path,
            scene.meshes.len(),
            scene.materials.len()
        );
        Ok(scene)
    }
}

fn convert_mesh(name: String, mesh: &tobj::Mesh) -> Result<ImportedMesh, ObjError> {
    if mesh.positions.len() % 3 != 0 {
        return Err(ObjError::InvalidFormat(format!("mesh {} has a partial position", name)));
    }
    let vertex_count = mesh.positions.len() / 3;

    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals = if mesh.normals.len() == vertex_count * 3 {
        mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect()
    } else {
        Vec::new()
    };

    let tex_coords = (mesh.texcoords.len() == vertex_count * 2).then(|| {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| [t[0], 1.0 - t[1]])
            .collect()
    });

    if let Some(bad) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(ObjError::InvalidFormat(format!(
            "mesh {} index {} out of range ({} vertices)",
            name, bad, vertex_count
        )));
    }

    Ok(ImportedMesh {
        name,
        positions,
        normals,
        tex_coords,
        indices: mesh.indices.clone(),
        material: mesh.material_id,
    })
}
