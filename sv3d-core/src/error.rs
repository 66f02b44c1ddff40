/// Error types shared by the importers and the command line surface
use std::path::PathBuf;

/// Errors that can occur while importing an asset file
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported asset format '{0}'")]
    UnsupportedFormat(PathBuf),

    #[error("failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to load OBJ '{path}': {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to load glTF '{path}': {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("'{path}' contains no scene")]
    EmptyScene { path: PathBuf },

    #[error("mesh {mesh} of '{path}' references vertex {index} which does not exist")]
    IndexOutOfBounds { path: PathBuf, mesh: usize, index: u32 },
}

/// Invalid command line input
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("need a valid render type: 'points', 'lines' or 'triangles', got '{0}'")]
    InvalidRenderType(String),
}
