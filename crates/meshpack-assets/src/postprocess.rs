//! Scene post-processing applied after import.
//!
//! These passes establish the shape the flattener expects: polygons split
//! into triangles, duplicate vertices merged, and each mesh holding a
//! single primitive kind.

use std::collections::HashMap;

use tracing::debug;

use crate::scene::{Face, PrimitiveKind, Scene, SceneMesh};

/// Which post-processing passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcess {
    pub triangulate: bool,
    pub join_identical_vertices: bool,
    pub sort_by_primitive_type: bool,
}

impl Default for PostProcess {
    fn default() -> Self {
        Self {
            triangulate: true,
            join_identical_vertices: true,
            sort_by_primitive_type: true,
        }
    }
}

impl PostProcess {
    /// No passes at all; the scene is used exactly as loaded.
    pub fn none() -> Self {
        Self {
            triangulate: false,
            join_identical_vertices: false,
            sort_by_primitive_type: false,
        }
    }

    /// Run the enabled passes in order: triangulate, join, sort.
    pub fn apply(&self, scene: &mut Scene) {
        if self.triangulate {
            let split: usize = scene.meshes.iter_mut().map(triangulate).sum();
            debug!("Triangulated {} polygons", split);
        }
        if self.join_identical_vertices {
            let removed: usize = scene.meshes.iter_mut().map(join_identical_vertices).sum();
            debug!("Joined {} duplicate vertices", removed);
        }
        if self.sort_by_primitive_type {
            let added = sort_by_primitive_type(scene);
            debug!("Split primitive types into {} extra meshes", added);
        }
    }
}

/// Fan-triangulate every face with more than three indices. Returns the
/// number of polygons that were split.
pub fn triangulate(mesh: &mut SceneMesh) -> usize {
    if !mesh.faces.iter().any(|f| f.kind() == PrimitiveKind::Polygon) {
        return 0;
    }

    let mut split = 0;
    let mut faces = Vec::with_capacity(mesh.faces.len());
    for face in mesh.faces.drain(..) {
        if face.kind() == PrimitiveKind::Polygon {
            let hub = face.indices[0];
            faces.extend(
                face.indices[1..]
                    .windows(2)
                    .map(|pair| Face::triangle(hub, pair[0], pair[1])),
            );
            split += 1;
        } else {
            faces.push(face);
        }
    }
    mesh.faces = faces;
    split
}

/// Bit pattern of one vertex: position, normal, texcoord.
type VertexBits = ([u32; 3], Option<[u32; 3]>, Option<[u32; 2]>);

fn vertex_bits(mesh: &SceneMesh, i: usize) -> VertexBits {
    let p = mesh.positions[i];
    let normal = mesh
        .normals
        .as_ref()
        .and_then(|n| n.get(i))
        .map(|n| [n.x.to_bits(), n.y.to_bits(), n.z.to_bits()]);
    let tex_coord = mesh
        .tex_coords
        .as_ref()
        .and_then(|t| t.get(i))
        .map(|t| [t[0].to_bits(), t[1].to_bits()]);
    ([p.x.to_bits(), p.y.to_bits(), p.z.to_bits()], normal, tex_coord)
}

/// Merge vertices whose attributes are bit-identical, keeping first
/// occurrence order. Returns the number of vertices removed.
pub fn join_identical_vertices(mesh: &mut SceneMesh) -> usize {
    let count = mesh.positions.len();
    let mut seen: HashMap<VertexBits, u32> = HashMap::with_capacity(count);
    let mut remap: Vec<u32> = Vec::with_capacity(count);
    let mut keep: Vec<usize> = Vec::with_capacity(count);

    for i in 0..count {
        let next = keep.len() as u32;
        let index = *seen.entry(vertex_bits(mesh, i)).or_insert(next);
        if index == next {
            keep.push(i);
        }
        remap.push(index);
    }

    let removed = count - keep.len();
    if removed == 0 {
        return 0;
    }

    compact(mesh, &keep);
    for face in &mut mesh.faces {
        for index in &mut face.indices {
            if let Some(&mapped) = remap.get(*index as usize) {
                *index = mapped;
            }
        }
    }
    removed
}

/// Keep only the listed vertices (in the given order) in every attribute array.
fn compact(mesh: &mut SceneMesh, keep: &[usize]) {
    mesh.positions = keep.iter().map(|&i| mesh.positions[i]).collect();
    if let Some(normals) = mesh.normals.as_mut() {
        *normals = keep.iter().map(|&i| normals[i]).collect();
    }
    if let Some(tex_coords) = mesh.tex_coords.as_mut() {
        *tex_coords = keep.iter().map(|&i| tex_coords[i]).collect();
    }
}

/// Build a mesh from a subset of another mesh's faces, carrying only the
/// vertices those faces reference (in first-use order).
fn extract(source: &SceneMesh, faces: Vec<Face>) -> SceneMesh {
    let mut remap: HashMap<u32, u32> = HashMap::new();
    let mut keep: Vec<usize> = Vec::new();

    let faces = faces
        .into_iter()
        .map(|face| {
            let indices = face
                .indices
                .iter()
                .map(|&old| {
                    *remap.entry(old).or_insert_with(|| {
                        keep.push(old as usize);
                        (keep.len() - 1) as u32
                    })
                })
                .collect();
            Face::new(indices)
        })
        .collect();

    let mut mesh = SceneMesh {
        name: source.name.clone(),
        positions: source.positions.clone(),
        normals: source.normals.clone(),
        tex_coords: source.tex_coords.clone(),
        faces,
        material_index: source.material_index,
    };
    compact(&mut mesh, &keep);
    mesh
}

/// Split every mesh that mixes primitive kinds into one mesh per kind
/// (points, lines, triangles, polygons). Returns how many meshes were added.
pub fn sort_by_primitive_type(scene: &mut Scene) -> usize {
    let before = scene.meshes.len();
    let mut meshes = Vec::with_capacity(before);

    for mesh in scene.meshes.drain(..) {
        let kinds = mesh.primitive_kinds();
        if kinds.len() <= 1 {
            meshes.push(mesh);
            continue;
        }
        for kind in kinds {
            let faces = mesh
                .faces
                .iter()
                .filter(|f| f.kind() == kind)
                .cloned()
                .collect();
            meshes.push(extract(&mesh, faces));
        }
    }

    scene.meshes = meshes;
    scene.meshes.len() - before
}
