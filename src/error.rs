use std::io;
use std::path::PathBuf;

/// Failures that abort one whole import. Everything below this level
/// degrades to defaults and is only logged.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("glTF parse error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("OBJ parse error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("scene in {0} has no root node")]
    MissingRoot(PathBuf),
}

impl ImportError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ImportError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for import operations
pub type Result<T> = std::result::Result<T, ImportError>;
