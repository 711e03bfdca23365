//! On-disk record layout.
//!
//! A packed file is three count-prefixed sections with no header and no
//! padding. Every integer is a little-endian `u32`, every float a
//! little-endian `f32`:
//!
//! ```text
//! u32 mesh_count
//! mesh_count   x { f32 r, g, b; u32 vertex_base; u32 vertex_count; u32 index_base; u32 index_count }
//! u32 vertex_count
//! vertex_count x { f32 px, py, pz; f32 nx, ny, nz }
//! u32 index_count
//! index_count  x u32 index
//! ```
//!
//! Field order and widths are defined here and nowhere else.

use std::io::{self, Read, Write};

use meshpack_core::{Color, MeshRecord, Vec3, Vertex};

/// Size of a section count prefix.
pub const COUNT_SIZE: usize = 4;
/// Size of one mesh record: 3 floats + 4 integers.
pub const MESH_RECORD_SIZE: usize = 28;
/// Size of one vertex record: 6 floats.
pub const VERTEX_RECORD_SIZE: usize = 24;
/// Size of one index.
pub const INDEX_SIZE: usize = 4;

/// A value with a fixed binary representation.
pub trait Encode {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()>;
}

/// A value that can be read back from its fixed binary representation.
pub trait Decode: Sized {
    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self>;
}

impl Encode for u32 {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }
}

impl Decode for u32 {
    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

impl Encode for f32 {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }
}

impl Decode for f32 {
    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }
}

impl Encode for Vec3 {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        self.x.encode(writer)?;
        self.y.encode(writer)?;
        self.z.encode(writer)
    }
}

impl Decode for Vec3 {
    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let x = f32::decode(reader)?;
        let y = f32::decode(reader)?;
        let z = f32::decode(reader)?;
        Ok(Vec3::new(x, y, z))
    }
}

impl Encode for Color {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        self.r.encode(writer)?;
        self.g.encode(writer)?;
        self.b.encode(writer)
    }
}

impl Decode for Color {
    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let r = f32::decode(reader)?;
        let g = f32::decode(reader)?;
        let b = f32::decode(reader)?;
        Ok(Color::rgb(r, g, b))
    }
}

impl Encode for MeshRecord {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        self.color.encode(writer)?;
        self.vertex_base.encode(writer)?;
        self.vertex_count.encode(writer)?;
        self.index_base.encode(writer)?;
        self.index_count.encode(writer)
    }
}

impl Decode for MeshRecord {
    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(MeshRecord {
            color: Color::decode(reader)?,
            vertex_base: u32::decode(reader)?,
            vertex_count: u32::decode(reader)?,
            index_base: u32::decode(reader)?,
            index_count: u32::decode(reader)?,
        })
    }
}

impl Encode for Vertex {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        self.position.encode(writer)?;
        self.normal.encode(writer)
    }
}

impl Decode for Vertex {
    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(Vertex {
            position: Vec3::decode(reader)?,
            normal: Vec3::decode(reader)?,
        })
    }
}

/// Total byte length of a file holding the given number of records.
pub fn encoded_len(meshes: usize, vertices: usize, indices: usize) -> u64 {
    (3 * COUNT_SIZE
        + meshes * MESH_RECORD_SIZE
        + vertices * VERTEX_RECORD_SIZE
        + indices * INDEX_SIZE) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encoded<T: Encode>(value: &T) -> Vec<u8> {
        let mut buf = Vec::new();
        value.encode(&mut buf).unwrap();
        buf
    }

    #[test]
    fn record_sizes_match_constants() {
        assert_eq!(encoded(&MeshRecord::default()).len(), MESH_RECORD_SIZE);
        assert_eq!(encoded(&Vertex::default()).len(), VERTEX_RECORD_SIZE);
        assert_eq!(encoded(&0u32).len(), INDEX_SIZE);
    }

    #[test]
    fn mesh_record_field_order() {
        let record = MeshRecord {
            color: Color::rgb(1.0, 0.5, 0.25),
            vertex_base: 1,
            vertex_count: 2,
            index_base: 3,
            index_count: 6,
        };
        let bytes = encoded(&record);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0.5f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &0.25f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &1u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &2u32.to_le_bytes());
        assert_eq!(&bytes[20..24], &3u32.to_le_bytes());
        assert_eq!(&bytes[24..28], &6u32.to_le_bytes());
    }

    #[test]
    fn vertex_is_position_then_normal() {
        let vertex = Vertex {
            position: Vec3::new(1.0, 2.0, 3.0),
            normal: Vec3::new(4.0, 5.0, 6.0),
        };
        let bytes = encoded(&vertex);
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let decoded = Vertex::decode(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(decoded, vertex);
    }

    #[test]
    fn decode_short_input_fails() {
        let err = MeshRecord::decode(&mut Cursor::new(vec![0u8; 10])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn encoded_len_counts_prefixes() {
        assert_eq!(encoded_len(0, 0, 0), 12);
        assert_eq!(encoded_len(1, 3, 3), 12 + 28 + 72 + 12);
    }
}
