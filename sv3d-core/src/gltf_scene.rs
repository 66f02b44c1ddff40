/// glTF 2.0 loading: keeps the node hierarchy and local transforms
use gltf::mesh::Mode;
use log::warn;
use nalgebra::{Matrix4, Point3};
use std::path::Path;

use crate::error::ImportError;
use crate::geometry::{Face, Mesh, Scene, SceneNode};
use crate::import::group;

pub fn load_gltf_scene(path: &Path) -> Result<Scene, ImportError> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| ImportError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;
    scene_from_document(&document, &buffers).ok_or_else(|| ImportError::EmptyScene {
        path: path.to_path_buf(),
    })
}

/// `None` when the document does not contain any scene
pub(crate) fn scene_from_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Option<Scene> {
    let gltf_scene = document.default_scene().or_else(|| document.scenes().next())?;

    // A glTF mesh may expand into several of ours, one per primitive
    let mut meshes = Vec::new();
    let mut primitive_table = Vec::with_capacity(document.meshes().len());
    for gltf_mesh in document.meshes() {
        let mut ids = Vec::new();
        for primitive in gltf_mesh.primitives() {
            if let Some(mesh) = mesh_from_primitive(&gltf_mesh, &primitive, buffers) {
                ids.push(meshes.len());
                meshes.push(mesh);
            }
        }
        primitive_table.push(ids);
    }

    let roots = gltf_scene
        .nodes()
        .map(|node| convert_node(&node, &primitive_table))
        .collect();
    Some(Scene::new(meshes, group(gltf_scene.name(), roots)))
}

fn convert_node(node: &gltf::Node, primitive_table: &[Vec<usize>]) -> SceneNode {
    let mut scene_node =
        SceneNode::new().with_transform(Matrix4::from(node.transform().matrix()));
    scene_node.name = node.name().map(str::to_string);
    if let Some(mesh) = node.mesh() {
        scene_node.meshes = primitive_table[mesh.index()].clone();
    }
    scene_node.children = node
        .children()
        .map(|child| convert_node(&child, primitive_table))
        .collect();
    scene_node
}

fn mesh_from_primitive(
    gltf_mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Option<Mesh> {
    let mode = primitive.mode();
    if !matches!(mode, Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan) {
        warn!(
            "Skipping {:?} primitive {} of mesh {:?}",
            mode,
            primitive.index(),
            gltf_mesh.name()
        );
        return None;
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
    let positions: Vec<Point3<f32>> = reader
        .read_positions()
        .map(|positions| positions.map(Point3::from).collect())
        .unwrap_or_default();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let mut mesh = Mesh::with_capacity(positions.len(), indices.len() / 3);
    mesh.name = gltf_mesh.name().map(str::to_string);
    mesh.positions = positions;
    mesh.faces = triangulate(mode, &indices);
    Some(mesh)
}

/// Expands strips and fans into independent triangles
pub(crate) fn triangulate(mode: Mode, indices: &[u32]) -> Vec<Face> {
    match mode {
        Mode::Triangles => indices
            .chunks_exact(3)
            .map(|c| Face::new(c[0], c[1], c[2]))
            .collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                // Every other triangle is flipped to keep the winding consistent
                if i % 2 == 0 {
                    Face::new(w[0], w[1], w[2])
                } else {
                    Face::new(w[0], w[2], w[1])
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&hub, rest)) => rest
                .windows(2)
                .map(|w| Face::new(w[0], w[1], hub))
                .collect(),
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}
