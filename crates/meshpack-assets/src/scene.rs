use meshpack_core::{Color, Vec3};

/// An imported scene (format-agnostic). Meshes are kept in source order and
/// reference materials by index into `materials`.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<Material>,
}

impl Scene {
    /// Look up a material by index.
    pub fn material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    /// Total number of faces across all meshes, whatever their kind.
    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|m| m.faces.len()).sum()
    }

    /// Total number of faces with exactly three indices.
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(SceneMesh::triangle_count).sum()
    }

    /// Check that every face index and every per-vertex attribute array
    /// matches the vertex count of its mesh.
    pub fn validate(&self) -> Result<(), String> {
        for (mesh_index, mesh) in self.meshes.iter().enumerate() {
            let vertex_count = mesh.vertex_count();

            if let Some(normals) = &mesh.normals {
                if normals.len() != vertex_count {
                    return Err(format!(
                        "mesh {} '{}' has {} normals for {} vertices",
                        mesh_index,
                        mesh.name,
                        normals.len(),
                        vertex_count
                    ));
                }
            }

            if let Some(tex_coords) = &mesh.tex_coords {
                if tex_coords.len() != vertex_count {
                    return Err(format!(
                        "mesh {} '{}' has {} texture coordinates for {} vertices",
                        mesh_index,
                        mesh.name,
                        tex_coords.len(),
                        vertex_count
                    ));
                }
            }

            for face in &mesh.faces {
                if let Some(&bad) = face.indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(format!(
                        "mesh {} '{}' references vertex {} but has only {} vertices",
                        mesh_index, mesh.name, bad, vertex_count
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A single mesh of the scene: one vertex array, one face list and one
/// material.
#[derive(Debug, Clone, Default)]
pub struct SceneMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub faces: Vec<Face>,
    pub material_index: usize,
}

impl SceneMesh {
    /// Create an empty mesh using the given material.
    pub fn new(name: impl Into<String>, material_index: usize) -> Self {
        Self {
            name: name.into(),
            material_index,
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.iter().filter(|f| f.is_triangle()).count()
    }

    /// The distinct primitive kinds present in this mesh, in sort order.
    pub fn primitive_kinds(&self) -> Vec<PrimitiveKind> {
        let mut kinds: Vec<PrimitiveKind> = self.faces.iter().map(Face::kind).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

/// Classification of a face by its index count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimitiveKind {
    Point,
    Line,
    Triangle,
    Polygon,
}

/// An ordered list of per-mesh vertex indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl Face {
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices }
    }

    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self {
            indices: vec![a, b, c],
        }
    }

    pub fn is_triangle(&self) -> bool {
        self.indices.len() == 3
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self.indices.len() {
            0 | 1 => PrimitiveKind::Point,
            2 => PrimitiveKind::Line,
            3 => PrimitiveKind::Triangle,
            _ => PrimitiveKind::Polygon,
        }
    }
}

/// An entry of the scene's material table.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// Diffuse reflectance color, if the source material defines one.
    pub diffuse: Option<Color>,
}

impl Material {
    pub const FALLBACK_NAME: &'static str = "default";

    pub fn new(name: impl Into<String>, diffuse: Option<Color>) -> Self {
        Self {
            name: name.into(),
            diffuse,
        }
    }

    /// Material assigned to geometry that names no material. It carries no
    /// diffuse property.
    pub fn fallback() -> Self {
        Self::new(Self::FALLBACK_NAME, None)
    }
}
