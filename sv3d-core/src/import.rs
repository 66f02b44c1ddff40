/// Asset import: turns a model file into an immutable [`Scene`]
use log::{debug, info};
use std::path::Path;

use crate::error::ImportError;
use crate::geometry::{Scene, SceneNode};
use crate::{gltf_scene, obj, stl};

/// File formats understood by [`import_scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Obj,
    Stl,
    Gltf,
}

impl AssetFormat {
    /// Guess the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "obj" => Some(AssetFormat::Obj),
            "stl" => Some(AssetFormat::Stl),
            "gltf" | "glb" => Some(AssetFormat::Gltf),
            _ => None,
        }
    }
}

/// Load a model file into a scene tree
///
/// Fails fast: a missing file, an unknown extension, a parser error or a face
/// referencing a vertex that does not exist all abort the import.
pub fn import_scene(path: impl AsRef<Path>) -> Result<Scene, ImportError> {
    let path = path.as_ref();
    std::fs::metadata(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format = AssetFormat::from_path(path)
        .ok_or_else(|| ImportError::UnsupportedFormat(path.to_path_buf()))?;
    debug!("Importing {:?} as {:?}", path, format);

    let scene = match format {
        AssetFormat::Obj => obj::load_obj_scene(path)?,
        AssetFormat::Stl => load_stl_scene(path)?,
        AssetFormat::Gltf => gltf_scene::load_gltf_scene(path)?,
    };
    validate(path, &scene)?;

    info!(
        "Loaded {:?}: {} meshes, {} faces, {} nodes",
        path,
        scene.meshes.len(),
        scene.face_count(),
        scene.root.node_count()
    );
    Ok(scene)
}

fn load_stl_scene(path: &Path) -> Result<Scene, ImportError> {
    let data = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = stl::parse_stl(&data).map_err(|message| ImportError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    let name = mesh.name.clone();
    let mut scene = Scene::from_mesh(mesh);
    scene.root.name = name;
    Ok(scene)
}

/// Rejects faces pointing past the end of their mesh
fn validate(path: &Path, scene: &Scene) -> Result<(), ImportError> {
    for (mesh, data) in scene.meshes.iter().enumerate() {
        if let Some(index) = data.first_invalid_index() {
            return Err(ImportError::IndexOutOfBounds {
                path: path.to_path_buf(),
                mesh,
                index,
            });
        }
    }
    Ok(())
}

/// Root node for formats whose top level is a flat list of objects
pub(crate) fn group(name: Option<&str>, children: Vec<SceneNode>) -> SceneNode {
    let mut root = SceneNode::new();
    root.name = name.map(str::to_string);
    root.children = children;
    root
}
