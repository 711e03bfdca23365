use std::path::PathBuf;

/// Errors that can occur while importing a scene.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to import '{0}': {1}")]
    ImportFailed(PathBuf, String),

    #[error("parse error in '{path}' at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid scene in '{0}': {1}")]
    InvalidScene(PathBuf, String),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("unsupported model format in '{0}'")]
    UnsupportedFormat(PathBuf),
}
