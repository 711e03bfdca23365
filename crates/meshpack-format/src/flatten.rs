//! Scene flattening: concatenate every mesh's vertices and triangle indices
//! into two global tables and record each mesh's ranges into them.

use std::fmt;
use std::str::FromStr;

use meshpack_assets::{Scene, SceneMesh};
use meshpack_core::{Color, MeshRecord, Vertex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{to_u32, FormatError};
use crate::layout;

/// Offset added to a mesh's face indices when they are copied into the
/// global index table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexRebase {
    /// Add the global index count reached before the mesh's faces. This is
    /// what existing packed files contain; only the first mesh's indices
    /// address its own vertices.
    #[default]
    IndexBase,
    /// Add the mesh's `vertex_base`, so every index addresses the global
    /// vertex table.
    VertexBase,
}

impl fmt::Display for IndexRebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexRebase::IndexBase => f.write_str("index-base"),
            IndexRebase::VertexBase => f.write_str("vertex-base"),
        }
    }
}

impl FromStr for IndexRebase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index-base" => Ok(IndexRebase::IndexBase),
            "vertex-base" => Ok(IndexRebase::VertexBase),
            other => Err(format!(
                "unknown index rebase '{}' (expected 'index-base' or 'vertex-base')",
                other
            )),
        }
    }
}

/// A flattened scene: the three tables of a packed file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatScene {
    pub meshes: Vec<MeshRecord>,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl FlatScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Byte length of this scene once written.
    pub fn encoded_len(&self) -> u64 {
        layout::encoded_len(self.meshes.len(), self.vertices.len(), self.indices.len())
    }

    /// Check that the mesh records partition the vertex and index tables
    /// into consecutive, non-overlapping ranges covering both tables.
    pub fn check_partition(&self) -> Result<(), FormatError> {
        let mut vertex_end = 0u64;
        let mut index_end = 0u64;

        for (i, mesh) in self.meshes.iter().enumerate() {
            if u64::from(mesh.vertex_base) != vertex_end {
                return Err(FormatError::Partition {
                    mesh: i,
                    reason: format!("vertex_base {} but expected {}", mesh.vertex_base, vertex_end),
                });
            }
            if u64::from(mesh.index_base) != index_end {
                return Err(FormatError::Partition {
                    mesh: i,
                    reason: format!("index_base {} but expected {}", mesh.index_base, index_end),
                });
            }
            if mesh.index_count % 3 != 0 {
                return Err(FormatError::Partition {
                    mesh: i,
                    reason: format!("index_count {} is not a multiple of 3", mesh.index_count),
                });
            }
            vertex_end = mesh.vertex_end();
            index_end = mesh.index_end();
        }

        if vertex_end != self.vertices.len() as u64 || index_end != self.indices.len() as u64 {
            return Err(FormatError::Partition {
                mesh: self.meshes.len(),
                reason: format!(
                    "records cover {} vertices and {} indices, tables hold {} and {}",
                    vertex_end,
                    index_end,
                    self.vertices.len(),
                    self.indices.len()
                ),
            });
        }
        Ok(())
    }
}

/// Single-owner accumulator that grows the global tables mesh by mesh.
struct Flattener<'a> {
    scene: &'a Scene,
    rebase: IndexRebase,
    out: FlatScene,
}

impl<'a> Flattener<'a> {
    fn new(scene: &'a Scene, rebase: IndexRebase) -> Self {
        Self {
            scene,
            rebase,
            out: FlatScene::new(),
        }
    }

    fn diffuse(&self, mesh: &SceneMesh) -> Color {
        self.scene
            .material(mesh.material_index)
            .and_then(|m| m.diffuse)
            .unwrap_or(Color::BLACK)
    }

    fn push_mesh(&mut self, mesh: &SceneMesh) -> Result<(), FormatError> {
        let mut record = MeshRecord {
            color: self.diffuse(mesh),
            vertex_base: to_u32("vertex base", self.out.vertices.len())?,
            vertex_count: to_u32("vertex count", mesh.vertex_count())?,
            index_base: to_u32("index base", self.out.indices.len())?,
            index_count: 0,
        };

        self.out
            .vertices
            .extend(mesh.positions.iter().copied().map(Vertex::from_position));

        let offset = match self.rebase {
            IndexRebase::IndexBase => record.index_base,
            IndexRebase::VertexBase => record.vertex_base,
        };

        for face in mesh.faces.iter().filter(|f| f.is_triangle()) {
            for &index in &face.indices {
                let rebased = offset.checked_add(index).ok_or_else(|| FormatError::Overflow {
                    what: "rebased index",
                    value: u64::from(offset) + u64::from(index),
                })?;
                self.out.indices.push(rebased);
            }
            record.index_count += 3;
        }

        to_u32("index count", self.out.indices.len())?;

        debug!(
            "Flattened mesh '{}': vertices {}+{}, indices {}+{} ({} triangles)",
            mesh.name,
            record.vertex_base,
            record.vertex_count,
            record.index_base,
            record.index_count,
            record.triangle_count()
        );
        self.out.meshes.push(record);
        Ok(())
    }

    fn finish(self) -> FlatScene {
        self.out
    }
}

/// Flatten every mesh of the scene, in order, into a `FlatScene`.
///
/// Only faces with exactly three indices are kept; every other face is
/// dropped without affecting the mesh's `index_count`.
pub fn flatten(scene: &Scene, rebase: IndexRebase) -> Result<FlatScene, FormatError> {
    to_u32("mesh count", scene.meshes.len())?;

    let mut flattener = Flattener::new(scene, rebase);
    for mesh in &scene.meshes {
        flattener.push_mesh(mesh)?;
    }
    let flat = flattener.finish();

    debug!(
        "Flattened {} meshes: {} vertices, {} indices ({})",
        flat.meshes.len(),
        flat.vertices.len(),
        flat.indices.len(),
        rebase
    );
    Ok(flat)
}
