use std::fmt;
use std::path::PathBuf;

/// Section of a packed mesh file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Meshes,
    Vertices,
    Indices,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Meshes => "mesh",
            Section::Vertices => "vertex",
            Section::Indices => "index",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while flattening, writing or reading a packed mesh.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("I/O error on '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("stream error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("{what} {value} does not fit in a 32-bit field")]
    Overflow { what: &'static str, value: u64 },

    #[error("unexpected end of data in {section} section")]
    Truncated { section: Section },

    #[error("{0} trailing bytes after the index section")]
    TrailingBytes(u64),

    #[error("mesh {mesh} breaks the contiguous layout: {reason}")]
    Partition { mesh: usize, reason: String },
}

/// Narrow a table length or offset to the 32-bit width used on disk.
pub(crate) fn to_u32(what: &'static str, value: usize) -> Result<u32, FormatError> {
    u32::try_from(value).map_err(|_| FormatError::Overflow {
        what,
        value: value as u64,
    })
}
