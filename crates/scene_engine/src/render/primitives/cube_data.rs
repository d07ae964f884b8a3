//! Unit cube vertex data
//!
//! 36 vertices (12 triangles) of a cube spanning ±0.5 with per-face normals
//! and texture coordinates.

use crate::render::vertex_layout::{PositionVertex, Vertex};

/// Vertices per cube
pub const CUBE_VERTEX_COUNT: usize = 36;

#[rustfmt::skip]
const CUBE: [[f32; 8]; CUBE_VERTEX_COUNT] = [
    // back face
    [-0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0],
    [ 0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 0.0],
    [ 0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0],
    [ 0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0],
    [-0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 1.0],
    [-0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0],
    // front face
    [-0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0],
    [ 0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 0.0],
    [ 0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0],
    [ 0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0],
    [-0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 1.0],
    [-0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0],
    // left face
    [-0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0],
    [-0.5,  0.5, -0.5, -1.0,  0.0,  0.0,  1.0, 1.0],
    [-0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0],
    [-0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0],
    [-0.5, -0.5,  0.5, -1.0,  0.0,  0.0,  0.0, 0.0],
    [-0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0],
    // right face
    [ 0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0],
    [ 0.5,  0.5, -0.5,  1.0,  0.0,  0.0,  1.0, 1.0],
    [ 0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0],
    [ 0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0],
    [ 0.5, -0.5,  0.5,  1.0,  0.0,  0.0,  0.0, 0.0],
    [ 0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0],
    // bottom face
    [-0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0],
    [ 0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  1.0, 1.0],
    [ 0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0],
    [ 0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0],
    [-0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  0.0, 0.0],
    [-0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0],
    // top face
    [-0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0],
    [ 0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  1.0, 1.0],
    [ 0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0],
    [ 0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0],
    [-0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  0.0, 0.0],
    [-0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0],
];

/// Cube with normals and texture coordinates
pub fn cube_vertices() -> Vec<Vertex> {
    CUBE.iter()
        .map(|v| Vertex::new([v[0], v[1], v[2]], [v[3], v[4], v[5]], [v[6], v[7]]))
        .collect()
}

/// Cube positions only, for untextured unlit draws
pub fn cube_positions() -> Vec<PositionVertex> {
    cube_vertices().into_iter().map(PositionVertex::from).collect()
}
