use std::path::Path;

use gltf::mesh::Mode;
use meshpack_core::{Color, Vec3};
use tracing::debug;

use crate::error::AssetError;
use crate::scene::{Face, Material, Scene, SceneMesh};

/// Load a glTF 2.0 file (.gltf or .glb) into a scene.
///
/// Every primitive becomes its own mesh. Images are never decoded; only the
/// geometry buffers are resolved.
pub fn load_gltf(path: &Path) -> Result<Scene, AssetError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)
        .map_err(|e| AssetError::ImportFailed(path.to_path_buf(), e.to_string()))?;

    let buffers = gltf::import_buffers(&document, path.parent(), blob)
        .map_err(|e| AssetError::ImportFailed(path.to_path_buf(), e.to_string()))?;

    let mut materials: Vec<Material> = document
        .materials()
        .enumerate()
        .map(|(i, material)| {
            let name = material
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("material{}", i));
            let base_color = material.pbr_metallic_roughness().base_color_factor();
            Material::new(name, Some(Color::from_rgba(base_color)))
        })
        .collect();

    // Primitives without a material share one trailing fallback entry.
    let fallback_index = materials.len();
    let mut needs_fallback = false;

    let mut meshes = Vec::new();

    for mesh in document.meshes() {
        let mesh_name = mesh.name().unwrap_or("unnamed").to_string();
        let primitive_count = mesh.primitives().count();

        for (primitive_index, primitive) in mesh.primitives().enumerate() {
            let name = if primitive_count > 1 {
                format!("{}.{}", mesh_name, primitive_index)
            } else {
                mesh_name.clone()
            };

            let material_index = primitive.material().index().unwrap_or_else(|| {
                needs_fallback = true;
                fallback_index
            });

            let reader = primitive.reader(|buffer| {
                buffers.get(buffer.index()).map(|data| data.0.as_slice())
            });

            let positions: Vec<Vec3> = reader
                .read_positions()
                .map(|iter| iter.map(Vec3::from_array).collect())
                .unwrap_or_default();

            let normals: Option<Vec<Vec3>> = reader
                .read_normals()
                .map(|iter| iter.map(Vec3::from_array).collect());

            let tex_coords: Option<Vec<[f32; 2]>> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect());

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|idx| idx.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            let faces = faces_for_mode(primitive.mode(), &indices);

            debug!(
                "Loaded primitive '{}': {} vertices, {} faces ({:?})",
                name,
                positions.len(),
                faces.len(),
                primitive.mode()
            );

            meshes.push(SceneMesh {
                name,
                positions,
                normals,
                tex_coords,
                faces,
                material_index,
            });
        }
    }

    if needs_fallback {
        materials.push(Material::fallback());
    }

    debug!(
        "glTF '{}': {} meshes, {} materials",
        path.display(),
        meshes.len(),
        materials.len()
    );

    Ok(Scene { meshes, materials })
}

/// Turn a primitive's index stream into faces according to its topology.
fn faces_for_mode(mode: Mode, indices: &[u32]) -> Vec<Face> {
    match mode {
        Mode::Points => indices.iter().map(|&i| Face::new(vec![i])).collect(),
        Mode::Lines => indices
            .chunks_exact(2)
            .map(|pair| Face::new(pair.to_vec()))
            .collect(),
        Mode::LineStrip => indices
            .windows(2)
            .map(|pair| Face::new(pair.to_vec()))
            .collect(),
        Mode::LineLoop => {
            let mut faces: Vec<Face> = indices
                .windows(2)
                .map(|pair| Face::new(pair.to_vec()))
                .collect();
            if let (Some(&first), Some(&last)) = (indices.first(), indices.last()) {
                if indices.len() > 2 {
                    faces.push(Face::new(vec![last, first]));
                }
            }
            faces
        }
        Mode::Triangles => indices
            .chunks_exact(3)
            .map(|tri| Face::triangle(tri[0], tri[1], tri[2]))
            .collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, tri)| {
                // Odd triangles swap their first two vertices to keep winding.
                if i % 2 == 0 {
                    Face::triangle(tri[0], tri[1], tri[2])
                } else {
                    Face::triangle(tri[1], tri[0], tri[2])
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&hub, rest)) => rest
                .windows(2)
                .map(|pair| Face::triangle(hub, pair[0], pair[1]))
                .collect(),
            None => Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    // Mesh "Triangle": indexed, material "Red".
    // Mesh "Quad": non-indexed triangle fan, no material.
    const FIXTURE: &str = r#"{
        "asset": { "version": "2.0" },
        "buffers": [
            { "byteLength": 42, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIA" },
            { "byteLength": 48, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAACAPwAAgD8AAAAAAAAAAAAAgD8AAAAA" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 },
            { "buffer": 1, "byteOffset": 0, "byteLength": 48 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 2, "componentType": 5126, "count": 4, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] }
        ],
        "materials": [
            { "name": "Red", "pbrMetallicRoughness": { "baseColorFactor": [1, 0, 0, 1] } }
        ],
        "meshes": [
            { "name": "Triangle", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] },
            { "name": "Quad", "primitives": [ { "attributes": { "POSITION": 2 }, "mode": 6 } ] }
        ]
    }"#;

    fn write_fixture(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("meshpack-gltf-tests");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_meshes_and_materials() {
        let path = write_fixture("two_meshes.gltf", FIXTURE);
        let scene = load_gltf(&path).unwrap();

        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.materials.len(), 2);
        assert_eq!(scene.materials[0].name, "Red");
        assert_eq!(scene.materials[0].diffuse, Some(Color::RED));
        assert_eq!(scene.materials[1], Material::fallback());

        let triangle = &scene.meshes[0];
        assert_eq!(triangle.name, "Triangle");
        assert_eq!(triangle.material_index, 0);
        assert_eq!(
            triangle.positions,
            vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)]
        );
        assert_eq!(triangle.faces, vec![Face::triangle(0, 1, 2)]);
        assert!(triangle.normals.is_none());
        assert!(triangle.tex_coords.is_none());

        let quad = &scene.meshes[1];
        assert_eq!(quad.name, "Quad");
        assert_eq!(quad.material_index, 1);
        assert_eq!(quad.positions.len(), 4);
        assert_eq!(
            quad.faces,
            vec![Face::triangle(0, 1, 2), Face::triangle(0, 2, 3)]
        );
    }

    /// Pack a JSON document and a binary buffer into a GLB container.
    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());

        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
        out.extend_from_slice(&json);

        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&0x004E_4942u32.to_le_bytes());
        out.extend_from_slice(&bin);
        out
    }

    #[test]
    fn loads_binary_glb() {
        let mut bin = Vec::new();
        for f in [0.0f32, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0] {
            bin.extend_from_slice(&f.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }

        let json = r#"{
            "asset": { "version": "2.0" },
            "buffers": [ { "byteLength": 42 } ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [2, 2, 0] },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ],
            "materials": [
                { "name": "Teal", "pbrMetallicRoughness": { "baseColorFactor": [0, 0.5, 0.5, 1] } }
            ],
            "meshes": [
                { "name": "Binary", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] }
            ]
        }"#;

        let dir = std::env::temp_dir().join("meshpack-gltf-tests");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("triangle.glb");
        fs::write(&path, glb(json, &bin)).unwrap();

        let scene = load_gltf(&path).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.materials[0].diffuse, Some(Color::rgb(0.0, 0.5, 0.5)));

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.name, "Binary");
        assert_eq!(
            mesh.positions,
            vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)]
        );
        assert_eq!(mesh.faces, vec![Face::triangle(0, 1, 2)]);
    }

    #[test]
    fn invalid_document_is_import_failure() {
        let path = write_fixture("broken.gltf", "{ this is not json");
        match load_gltf(&path) {
            Err(AssetError::ImportFailed(p, _)) => assert_eq!(p, path),
            other => panic!("expected ImportFailed, got: {:?}", other),
        }
    }

    #[test]
    fn strip_alternates_winding() {
        let faces = faces_for_mode(Mode::TriangleStrip, &[0, 1, 2, 3]);
        assert_eq!(faces, vec![Face::triangle(0, 1, 2), Face::triangle(2, 1, 3)]);
    }

    #[test]
    fn line_loop_closes() {
        let faces = faces_for_mode(Mode::LineLoop, &[0, 1, 2]);
        assert_eq!(
            faces,
            vec![
                Face::new(vec![0, 1]),
                Face::new(vec![1, 2]),
                Face::new(vec![2, 0])
            ]
        );
    }

    #[test]
    fn points_and_lines_are_not_triangles() {
        assert!(faces_for_mode(Mode::Points, &[0, 1, 2])
            .iter()
            .all(|f| !f.is_triangle()));
        assert_eq!(faces_for_mode(Mode::Lines, &[0, 1, 2, 3, 4]).len(), 2);
    }
}
