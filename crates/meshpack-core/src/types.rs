//! Core types used throughout meshpack

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// RGB color with floating point components (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    /// Create a color from RGB values
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create a color from the first three components of an RGBA array
    pub fn from_rgba(rgba: [f32; 4]) -> Self {
        Self::rgb(rgba[0], rgba[1], rgba[2])
    }

}

/// Missing diffuse colors resolve to black.
impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// One entry of the global vertex table.
///
/// `normal` is carried by the file format but never filled from source
/// data, so it stays zero for every vertex produced by the flattener.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    /// Create a vertex at the given position with a zero normal
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            normal: Vec3::ZERO,
        }
    }
}

/// Per-mesh entry of the mesh table: diffuse color plus the ranges this
/// mesh owns in the global vertex and index tables.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshRecord {
    pub color: Color,
    pub vertex_base: u32,
    pub vertex_count: u32,
    pub index_base: u32,
    pub index_count: u32,
}

impl MeshRecord {
    /// One past the last vertex owned by this mesh
    pub fn vertex_end(&self) -> u64 {
        u64::from(self.vertex_base) + u64::from(self.vertex_count)
    }

    /// One past the last index owned by this mesh
    pub fn index_end(&self) -> u64 {
        u64::from(self.index_base) + u64::from(self.index_count)
    }

    /// Number of triangles described by this mesh's indices
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }
}
