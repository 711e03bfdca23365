use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use meshpack_core::{MeshRecord, Vertex};
use tracing::debug;

use crate::error::{FormatError, Section};
use crate::flatten::FlatScene;
use crate::layout::Decode;

/// Cap on capacity reserved up front, so a corrupt count cannot trigger a
/// huge allocation before the data runs out.
const MAX_PREALLOC: usize = 1 << 16;

fn in_section<T>(section: Section, result: io::Result<T>) -> Result<T, FormatError> {
    result.map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => FormatError::Truncated { section },
        _ => FormatError::Stream(e),
    })
}

fn read_section<T: Decode, R: Read + ?Sized>(
    reader: &mut R,
    section: Section,
) -> Result<Vec<T>, FormatError> {
    let count = in_section(section, u32::decode(reader))? as usize;
    let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        items.push(in_section(section, T::decode(reader))?);
    }
    Ok(items)
}

/// Read the mesh, vertex and index sections from `reader`.
pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<FlatScene, FormatError> {
    let meshes = read_section::<MeshRecord, R>(reader, Section::Meshes)?;
    let vertices = read_section::<Vertex, R>(reader, Section::Vertices)?;
    let indices = read_section::<u32, R>(reader, Section::Indices)?;
    Ok(FlatScene {
        meshes,
        vertices,
        indices,
    })
}

/// Read a packed mesh file, rejecting any bytes after the index section.
pub fn read_file(path: &Path) -> Result<FlatScene, FormatError> {
    let file = File::open(path).map_err(|e| FormatError::Io(path.to_path_buf(), e))?;
    let mut reader = BufReader::new(file);
    let scene = read_from(&mut reader)?;

    let trailing = io::copy(&mut reader, &mut io::sink())
        .map_err(|e| FormatError::Io(path.to_path_buf(), e))?;
    if trailing > 0 {
        return Err(FormatError::TrailingBytes(trailing));
    }

    debug!(
        "Read '{}': {} meshes, {} vertices, {} indices",
        path.display(),
        scene.meshes.len(),
        scene.vertices.len(),
        scene.indices.len()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::{flatten, IndexRebase};
    use crate::writer::{write_file, write_to};
    use meshpack_assets::{Face, Material, Scene, SceneMesh};
    use meshpack_core::{Color, Vec3};
    use std::fs;
    use std::io::Cursor;

    fn sample() -> FlatScene {
        let mut a = SceneMesh::new("a", 0);
        a.positions = vec![Vec3::new(0.5, -1.25, 3.0), Vec3::X, Vec3::Y, Vec3::ONE];
        a.faces = vec![Face::triangle(0, 1, 2), Face::triangle(2, 1, 3)];
        let mut b = SceneMesh::new("b", 1);
        b.positions = vec![Vec3::NEG_ONE, Vec3::Z, Vec3::new(f32::MIN_POSITIVE, 1e-30, 7.0)];
        b.faces = vec![Face::triangle(0, 1, 2), Face::new(vec![0, 1])];

        let scene = Scene {
            meshes: vec![a, b],
            materials: vec![
                Material::new("warm", Some(Color::rgb(0.9, 0.4, 0.1))),
                Material::new("plain", None),
            ],
        };
        flatten(&scene, IndexRebase::default()).unwrap()
    }

    fn encode(scene: &FlatScene) -> Vec<u8> {
        let mut buf = Vec::new();
        write_to(&mut buf, scene).unwrap();
        buf
    }

    #[test]
    fn round_trip_is_bit_exact() {
        let scene = sample();
        let decoded = read_from(&mut Cursor::new(encode(&scene))).unwrap();
        assert_eq!(decoded, scene);

        let original_bits: Vec<u32> = scene
            .vertices
            .iter()
            .flat_map(|v| v.position.to_array())
            .map(f32::to_bits)
            .collect();
        let decoded_bits: Vec<u32> = decoded
            .vertices
            .iter()
            .flat_map(|v| v.position.to_array())
            .map(f32::to_bits)
            .collect();
        assert_eq!(decoded_bits, original_bits);
        assert!(decoded.check_partition().is_ok());
    }

    #[test]
    fn truncated_sections_are_named() {
        let bytes = encode(&sample());
        let mesh_cut = &bytes[..4 + 10];
        let vertex_cut = &bytes[..4 + 2 * 28 + 4 + 5];
        let index_cut = &bytes[..bytes.len() - 1];

        assert!(matches!(
            read_from(&mut Cursor::new(mesh_cut)),
            Err(FormatError::Truncated { section: Section::Meshes })
        ));
        assert!(matches!(
            read_from(&mut Cursor::new(vertex_cut)),
            Err(FormatError::Truncated { section: Section::Vertices })
        ));
        assert!(matches!(
            read_from(&mut Cursor::new(index_cut)),
            Err(FormatError::Truncated { section: Section::Indices })
        ));
    }

    #[test]
    fn empty_input_is_truncated_mesh_section() {
        assert!(matches!(
            read_from(&mut Cursor::new(Vec::<u8>::new())),
            Err(FormatError::Truncated { section: Section::Meshes })
        ));
    }

    #[test]
    fn huge_count_does_not_preallocate() {
        let bytes = u32::MAX.to_le_bytes();
        assert!(matches!(
            read_from(&mut Cursor::new(bytes)),
            Err(FormatError::Truncated { section: Section::Meshes })
        ));
    }

    #[test]
    fn file_round_trip_and_trailing_bytes() {
        let dir = std::env::temp_dir().join("meshpack-reader-tests");
        fs::create_dir_all(&dir).unwrap();

        let path = dir.join("sample.mesh");
        write_file(&path, &sample(), true).unwrap();
        assert_eq!(read_file(&path).unwrap(), sample());

        let padded = dir.join("padded.mesh");
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&[0, 0, 0]);
        fs::write(&padded, bytes).unwrap();
        assert!(matches!(read_file(&padded), Err(FormatError::TrailingBytes(3))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_file(Path::new("/nonexistent/meshpack/file.mesh")).unwrap_err();
        assert!(matches!(err, FormatError::Io(..)));
    }
}
