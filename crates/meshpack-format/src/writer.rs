use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{to_u32, FormatError};
use crate::flatten::FlatScene;
use crate::layout::Encode;

/// Write the mesh, vertex and index sections to `writer`.
pub fn write_to<W: Write + ?Sized>(writer: &mut W, scene: &FlatScene) -> Result<(), FormatError> {
    to_u32("mesh count", scene.meshes.len())?.encode(writer)?;
    for mesh in &scene.meshes {
        mesh.encode(writer)?;
    }

    to_u32("vertex count", scene.vertices.len())?.encode(writer)?;
    for vertex in &scene.vertices {
        vertex.encode(writer)?;
    }

    to_u32("index count", scene.indices.len())?.encode(writer)?;
    for index in &scene.indices {
        index.encode(writer)?;
    }

    Ok(())
}

/// Sibling path used while an atomic write is in progress.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "meshpack".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

fn write_and_sync(path: &Path, scene: &FlatScene) -> Result<(), FormatError> {
    let file = File::create(path).map_err(|e| FormatError::Io(path.to_path_buf(), e))?;
    let mut writer = BufWriter::new(file);
    write_to(&mut writer, scene)?;

    let file = writer
        .into_inner()
        .map_err(|e| FormatError::Io(path.to_path_buf(), e.into_error()))?;
    file.sync_all()
        .map_err(|e| FormatError::Io(path.to_path_buf(), e))?;
    Ok(())
}

/// Write a packed mesh file to `path` and return the number of bytes written.
///
/// With `atomic` set, the data goes to a temporary sibling file that is
/// renamed over `path` only once everything has been written and synced;
/// on failure the temporary file is removed and `path` is left untouched.
pub fn write_file(path: &Path, scene: &FlatScene, atomic: bool) -> Result<u64, FormatError> {
    if atomic {
        let tmp = temp_path(path);
        debug!("Writing '{}' via '{}'", path.display(), tmp.display());

        let result = write_and_sync(&tmp, scene)
            .and_then(|()| fs::rename(&tmp, path).map_err(|e| FormatError::Io(path.to_path_buf(), e)));

        if let Err(e) = result {
            if tmp.exists() {
                if let Err(cleanup) = fs::remove_file(&tmp) {
                    warn!("Failed to remove '{}': {}", tmp.display(), cleanup);
                }
            }
            return Err(e);
        }
    } else {
        write_and_sync(path, scene)?;
    }

    let bytes = scene.encoded_len();
    info!("Wrote {} bytes to '{}'", bytes, path.display());
    Ok(bytes)
}
