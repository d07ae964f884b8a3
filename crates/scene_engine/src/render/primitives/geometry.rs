//! Procedural geometry
//!
//! Vertex and index generators for the scene's shapes, plus constructors
//! that upload them as meshes. The generators are pure data and never touch
//! the GPU.

use crate::assets::ImageData;
use crate::foundation::math::{constants, Vec3};
use crate::render::device::SharedDevice;
use crate::render::primitives::cube_data::{cube_positions, cube_vertices};
use crate::render::primitives::mesh::{FlatMesh, Mesh};
use crate::render::vertex_layout::Vertex;
use crate::render::RenderResult;

/// Height of a fully black heightmap pixel
pub const TERRAIN_MIN_HEIGHT: f32 = -10.0;

/// Height difference between black and white heightmap pixels
pub const TERRAIN_HEIGHT_RANGE: f32 = 10.0;

/// Offset added to grid coordinates to form texture coordinates
const TERRAIN_UV_OFFSET: f32 = 5.0;

/// Terrain height of pixel-grid vertex `(i, j)`
///
/// Grid vertices past the last pixel row or column reuse the edge pixel.
fn grid_height(heightmap: &ImageData, i: u32, j: u32) -> f32 {
    let x = i.min(heightmap.width.saturating_sub(1));
    let y = j.min(heightmap.height.saturating_sub(1));
    let pixel = heightmap.pixel(x, y);
    debug_assert!(pixel.is_some(), "heightmap sample ({x}, {y}) outside {}x{}", heightmap.width, heightmap.height);
    let [r, g, b, _] = pixel.unwrap_or([0, 0, 0, 255]);

    let luminance = (0.21 * f32::from(r) + 0.72 * f32::from(g) + 0.07 * f32::from(b)).trunc();
    luminance / 255.0 * TERRAIN_HEIGHT_RANGE + TERRAIN_MIN_HEIGHT
}

/// Grid index `i` as a coordinate centered on the origin
fn centered(i: u32, size: u32) -> f32 {
    (i64::from(i) - i64::from(size / 2)) as f32
}

/// Terrain grid from a heightmap
///
/// A `w x h` image yields `(w + 1) * (h + 1)` vertices one unit apart,
/// centered on the origin, ordered column by column (`x` outer, `z` inner)
/// to match [`plane_indices`]. Normals all point up; run
/// [`Mesh::calculate_normals`] for shading.
pub fn ground_vertices(heightmap: &ImageData) -> Vec<Vertex> {
    let (w, h) = (heightmap.width, heightmap.height);
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let mut vertices = Vec::with_capacity((w as usize + 1) * (h as usize + 1));
    for i in 0..=w {
        for j in 0..=h {
            let x = centered(i, w);
            let z = centered(j, h);
            let y = grid_height(heightmap, i, j);
            vertices.push(Vertex::new(
                [x, y, z],
                [0.0, 1.0, 0.0],
                [x + TERRAIN_UV_OFFSET, z + TERRAIN_UV_OFFSET],
            ));
        }
    }
    vertices
}

/// Terrain height at the grid vertex nearest to world `(x, z)`
///
/// `None` outside the terrain.
pub fn terrain_height(heightmap: &ImageData, x: f32, z: f32) -> Option<f32> {
    let (w, h) = (heightmap.width, heightmap.height);
    if w == 0 || h == 0 {
        return None;
    }

    let i = x.round() as i64 + i64::from(w / 2);
    let j = z.round() as i64 + i64::from(h / 2);
    let in_range = |v: i64, size: u32| (0..=i64::from(size)).contains(&v);
    (in_range(i, w) && in_range(j, h)).then(|| grid_height(heightmap, i as u32, j as u32))
}

/// Triangle indices of a `w x h` cell grid with `(w + 1) * (h + 1)` vertices
///
/// Vertex `(i, j)` has index `(h + 1) * i + j`. Triangles wind
/// counter-clockwise seen from +Y when `i` runs along +X and `j` along +Z.
pub fn plane_indices(w: u32, h: u32) -> Vec<u32> {
    let k = |i: u32, j: u32| (h + 1) * i + j;

    let mut indices = Vec::with_capacity(6 * w as usize * h as usize);
    for i in 0..w {
        for j in 0..h {
            indices.extend_from_slice(&[k(i, j), k(i + 1, j + 1), k(i + 1, j)]);
            indices.extend_from_slice(&[k(i, j), k(i, j + 1), k(i + 1, j + 1)]);
        }
    }
    indices
}

/// Capless cylinder around the Y axis
///
/// Each of the `faces + 1` angle steps (the seam is duplicated) adds a bottom
/// and then a top vertex.
pub fn cylinder_vertices(faces: u32, height: f32, radius: f32) -> Vec<Vertex> {
    let faces = faces.max(1);
    let step = constants::TAU / faces as f32;

    (0..=faces)
        .flat_map(|face| {
            let angle = face as f32 * step;
            let (x, z) = (radius * angle.cos(), radius * angle.sin());
            let normal: [f32; 3] = Vec3::new(x, 0.0, z)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vec3::zeros)
                .into();
            let u = face as f32 / faces as f32;

            [
                Vertex::new([x, -height / 2.0, z], normal, [u, 0.0]),
                Vertex::new([x, height / 2.0, z], normal, [u, 1.0]),
            ]
        })
        .collect()
}

/// Indices for [`cylinder_vertices`]: two triangles per face
pub fn cylinder_indices(faces: u32) -> Vec<u32> {
    (0..faces.max(1))
        .flat_map(|f| [2 * f, 2 * f + 2, 2 * f + 3, 2 * f, 2 * f + 3, 2 * f + 1])
        .collect()
}

/// UV sphere as `(sides + 1)^2` vertices
///
/// Slice `i` sweeps the angle around Y; ring `k` steps the height evenly from
/// `-radius` to `radius`. Index it with `plane_indices(sides, sides)`.
pub fn sphere_vertices(sides: u32, radius: f32) -> Vec<Vertex> {
    let sides = sides.max(1);
    let angle_step = constants::TAU / sides as f32;
    let height_step = 2.0 * radius / sides as f32;

    let mut vertices = Vec::with_capacity((sides as usize + 1).pow(2));
    for i in 0..=sides {
        let angle = i as f32 * angle_step;
        for k in 0..=sides {
            let y = k as f32 * height_step - radius;
            let ring = (radius * radius - y * y).max(0.0).sqrt();
            let (x, z) = (ring * angle.cos(), -ring * angle.sin());
            let normal: [f32; 3] = Vec3::new(x, y, z)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vec3::zeros)
                .into();

            vertices.push(Vertex::new(
                [x, y, z],
                normal,
                [i as f32 / sides as f32, k as f32 / sides as f32],
            ));
        }
    }
    vertices
}

/// Terrain mesh with computed normals
pub fn create_ground(device: &SharedDevice, heightmap: &ImageData) -> RenderResult<Mesh> {
    let mut vertices = ground_vertices(heightmap);
    let indices = plane_indices(heightmap.width, heightmap.height);
    Mesh::calculate_normals(&mut vertices, &indices);
    Mesh::new(device, &vertices, &indices)
}

/// Capless cylinder mesh
pub fn create_cylinder(device: &SharedDevice, faces: u32, height: f32, radius: f32) -> RenderResult<Mesh> {
    Mesh::new(device, &cylinder_vertices(faces, height, radius), &cylinder_indices(faces))
}

/// Sphere mesh
pub fn create_sphere(device: &SharedDevice, sides: u32, radius: f32) -> RenderResult<Mesh> {
    let sides = sides.max(1);
    Mesh::new(device, &sphere_vertices(sides, radius), &plane_indices(sides, sides))
}

/// Textured unit cube
pub fn create_cube(device: &SharedDevice) -> RenderResult<FlatMesh> {
    FlatMesh::new(device, &cube_vertices())
}

/// Position-only unit cube for light markers
pub fn create_lamp_cube(device: &SharedDevice) -> RenderResult<FlatMesh> {
    FlatMesh::new(device, &cube_positions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::vertex_layout::VertexFormat;
    use approx::assert_relative_eq;

    fn gray_heightmap(w: u32, h: u32, value: u8) -> ImageData {
        ImageData::solid_color(w, h, [value, value, value, 255])
    }

    #[test]
    fn test_ground_counts() {
        let map = gray_heightmap(4, 3, 0);
        assert_eq!(ground_vertices(&map).len(), 5 * 4);
        assert_eq!(plane_indices(4, 3).len(), 6 * 4 * 3);
    }

    #[test]
    fn test_ground_is_centered_with_offset_uvs() {
        let map = gray_heightmap(4, 2, 0);
        let vertices = ground_vertices(&map);

        let first = vertices[0];
        assert_eq!(first.position, [-2.0, -10.0, -1.0]);
        assert_eq!(first.tex_coord, [3.0, 4.0]);

        let last = vertices[vertices.len() - 1];
        assert_eq!(last.position, [2.0, -10.0, 1.0]);
    }

    #[test]
    fn test_height_follows_luminance() {
        let black = ground_vertices(&gray_heightmap(2, 2, 0));
        assert!(black.iter().all(|v| v.position[1] == -10.0), "Black maps to the lowest height");

        let white = ground_vertices(&gray_heightmap(2, 2, 255));
        assert!(white.iter().all(|v| v.position[1] > -0.1 && v.position[1] <= 0.0));

        // 0.21 * 10 + 0.72 * 20 + 0.07 * 30 = 18.6, truncated to 18
        let map = ImageData::solid_color(1, 1, [10, 20, 30, 255]);
        let expected = 18.0 / 255.0 * 10.0 - 10.0;
        assert_relative_eq!(ground_vertices(&map)[0].position[1], expected);
    }

    #[test]
    fn test_edge_vertices_reuse_last_pixel() {
        // 3x2 map, every pixel a different gray
        let (w, h) = (3u32, 2u32);
        let data = (0..h)
            .flat_map(|y| (0..w).map(move |x| (40 * x + 100 * y) as u8))
            .flat_map(|v| [v, v, v, 255])
            .collect();
        let map = ImageData::from_rgba(w, h, data).expect("6 RGBA pixels");
        let vertices = ground_vertices(&map);
        let height = |i: u32, j: u32| vertices[((h + 1) * i + j) as usize].position[1];

        for j in 0..h {
            assert_eq!(height(w, j), height(w - 1, j), "Column {} past the edge", j);
        }
        for i in 0..w {
            assert_eq!(height(i, h), height(i, h - 1), "Row {} past the edge", i);
        }
        assert_eq!(height(w, h), height(w - 1, h - 1));

        // The extra row and column are not flattened to black
        assert!(height(w, 0) > TERRAIN_MIN_HEIGHT);
        assert!(height(0, h) > TERRAIN_MIN_HEIGHT);
        assert!(height(w, h) > height(w, 0));
        assert!(height(w - 1, 0) > height(w - 2, 0));
    }

    #[test]
    fn test_odd_sized_ground() {
        let (w, h) = (3, 5);
        let vertices = ground_vertices(&gray_heightmap(w, h, 0));
        let indices = plane_indices(w, h);

        assert_eq!(vertices.len(), 4 * 6);
        assert_eq!(indices.len(), 6 * 3 * 5);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));

        // Half sizes truncate, so odd grids extend one unit further on +X/+Z
        assert_eq!(vertices[0].position, [-1.0, -10.0, -2.0]);
        assert_eq!(vertices[vertices.len() - 1].position, [2.0, -10.0, 3.0]);
    }

    #[test]
    fn test_terrain_height_lookup() {
        let map = gray_heightmap(4, 4, 0);
        assert_eq!(terrain_height(&map, 0.2, -1.7), Some(-10.0));
        assert_eq!(terrain_height(&map, 2.0, 2.0), Some(-10.0));
        assert_eq!(terrain_height(&map, 3.0, 0.0), None);
    }

    #[test]
    fn test_plane_indices_winding() {
        assert_eq!(plane_indices(1, 1), vec![0, 3, 2, 0, 1, 3]);

        let map = gray_heightmap(3, 3, 128);
        let vertices = ground_vertices(&map);
        for triangle in plane_indices(3, 3).chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| vertices[i as usize].position());
            let normal = (c - b).cross(&(a - b));
            assert!(normal.y > 0.0, "Triangle {:?} faces down", triangle);
        }
    }

    #[test]
    fn test_cylinder_shape() {
        let vertices = cylinder_vertices(8, 4.0, 1.15);
        assert_eq!(vertices.len(), 18);

        for pair in vertices.chunks_exact(2) {
            assert_relative_eq!(pair[0].position[1], -2.0);
            assert_relative_eq!(pair[1].position[1], 2.0);
            let p = pair[0].position();
            assert_relative_eq!(p.x.hypot(p.z), 1.15, epsilon = 1e-5);
        }
        assert_relative_eq!(vertices[16].tex_coord[0], 1.0);
    }

    #[test]
    fn test_cylinder_indices_in_range() {
        let faces = 32;
        let vertex_count = cylinder_vertices(faces, 4.0, 1.0).len() as u32;
        let indices = cylinder_indices(faces);

        assert_eq!(indices.len(), 6 * faces as usize);
        assert!(indices.iter().all(|&i| i < vertex_count));
        assert_eq!(&indices[..6], &[0, 2, 3, 0, 3, 1]);
    }

    #[test]
    fn test_sphere_vertices_lie_on_surface() {
        let sides = 16;
        let vertices = sphere_vertices(sides, 2.0);
        assert_eq!(vertices.len(), 17 * 17);

        for vertex in &vertices {
            assert_relative_eq!(vertex.position().norm(), 2.0, epsilon = 1e-4);
        }
        assert_eq!(vertices[0].position, [0.0, -2.0, 0.0]);
        assert_eq!(vertices[0].tex_coord, [0.0, 0.0]);
        assert_eq!(vertices[vertices.len() - 1].tex_coord, [1.0, 1.0]);
    }
}
