/// Wavefront OBJ loading through `tobj`
use nalgebra::Point3;
use std::path::Path;

use crate::error::ImportError;
use crate::geometry::{Face, Mesh, Scene, SceneNode};
use crate::import::group;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// One child node per OBJ object, each owning its own mesh
pub fn load_obj_scene(path: &Path) -> Result<Scene, ImportError> {
    let (models, materials) =
        tobj::load_obj(path, &load_options()).map_err(|source| ImportError::Obj {
            path: path.to_path_buf(),
            source,
        })?;
    if let Err(e) = materials {
        // Materials are not rendered, a broken .mtl is not worth failing over
        log::debug!("Ignoring materials of {:?}: {}", path, e);
    }

    Ok(scene_from_models(models))
}

pub(crate) fn scene_from_models(models: Vec<tobj::Model>) -> Scene {
    let mut meshes = Vec::with_capacity(models.len());
    let mut children = Vec::with_capacity(models.len());
    for model in models {
        let mesh = mesh_from_model(&model);
        children.push(SceneNode::new().named(model.name).with_mesh(meshes.len()));
        meshes.push(mesh);
    }
    Scene::new(meshes, group(None, children))
}

fn mesh_from_model(model: &tobj::Model) -> Mesh {
    let data = &model.mesh;
    let mut mesh = Mesh::with_capacity(data.positions.len() / 3, data.indices.len() / 3)
        .named(model.name.clone());
    for xyz in data.positions.chunks_exact(3) {
        mesh.push_position(Point3::new(xyz[0], xyz[1], xyz[2]));
    }
    for corners in data.indices.chunks_exact(3) {
        mesh.add_face(Face::new(corners[0], corners[1], corners[2]));
    }
    mesh
}
