use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use nalgebra::Point3;
use sv3d_core::{
    compute_bounding_box, count_components, flatten, flatten_with, import_scene, FlattenSpace,
    ImportError, Normalization,
};

const CUBE_AND_TRIANGLE_OBJ: &str = "
o cube
v -1 -1 -1
v  1 -1 -1
v  1  1 -1
v -1  1 -1
v -1 -1  1
v  1 -1  1
v  1  1  1
v -1  1  1
f 1 2 3 4
f 5 8 7 6
f 1 5 6 2
f 2 6 7 3
f 3 7 8 4
f 5 1 4 8
o triangle
v 3 0 0
v 4 0 0
v 3 1 0
f 9 10 11
";

const TRIANGLE_STL: &str = "solid wedge
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 2 0 0
      vertex 0 2 0
    endloop
  endfacet
endsolid wedge
";

const HIERARCHY_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "name": "demo", "nodes": [0, 2] }],
  "nodes": [
    { "name": "parent", "translation": [10.0, 0.0, 0.0], "children": [1] },
    { "name": "child", "mesh": 0 },
    { "name": "sibling", "mesh": 0 }
  ],
  "meshes": [{ "name": "tri", "primitives": [{ "attributes": { "POSITION": 0 } }] }],
  "buffers": [{
    "byteLength": 36,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
  }],
  "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
  "accessors": [{
    "bufferView": 0,
    "componentType": 5126,
    "count": 3,
    "type": "VEC3",
    "min": [0.0, 0.0, 0.0],
    "max": [1.0, 1.0, 0.0]
  }]
}"#;

/// Writes `contents` to a file unique to this test process
fn asset(name: &str, contents: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sv3d-import-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_obj_objects_become_nodes() {
    let path = asset("two_objects.obj", CUBE_AND_TRIANGLE_OBJ.as_bytes());
    let scene = import_scene(&path).unwrap();

    assert_eq!(scene.meshes.len(), 2);
    assert_eq!(scene.root.children.len(), 2);
    assert_eq!(scene.root.children[0].name.as_deref(), Some("cube"));
    assert_eq!(scene.meshes[0].faces.len(), 12);
    assert_eq!(scene.meshes[1].faces.len(), 1);

    let bounds = compute_bounding_box(&scene);
    assert_relative_eq!(bounds.min, Point3::new(-1.0, -1.0, -1.0));
    assert_relative_eq!(bounds.max, Point3::new(4.0, 1.0, 1.0));

    let normalization = Normalization::reference(&bounds);
    let (buffer, ranges) = flatten(&scene, &normalization);
    assert_eq!(buffer.len(), count_components(&scene));
    assert_eq!(buffer.len(), 13 * 9);
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].end(), ranges[1].offset);
    assert_eq!(ranges[1].end(), buffer.len());

    let flat_bounds = buffer.bounding_box();
    assert_relative_eq!(flat_bounds.max.x - flat_bounds.min.x, 4.0, epsilon = 1e-5);
    assert_relative_eq!(flat_bounds.center(), Point3::origin(), epsilon = 1e-5);
}

#[test]
fn test_ascii_stl_scene() {
    let path = asset("wedge.stl", TRIANGLE_STL.as_bytes());
    let scene = import_scene(&path).unwrap();

    assert_eq!(scene.root.name.as_deref(), Some("wedge"));
    assert_eq!(scene.root.meshes, vec![0]);
    assert!(scene.root.children.is_empty());

    let (buffer, ranges) = flatten(&scene, &Normalization::identity());
    assert_eq!(buffer.len(), 9);
    assert_eq!(ranges[0].vertices(), 0..3);
}

#[test]
fn test_gltf_keeps_hierarchy() {
    let path = asset("hierarchy.gltf", HIERARCHY_GLTF.as_bytes());
    let scene = import_scene(&path).unwrap();

    assert_eq!(scene.root.name.as_deref(), Some("demo"));
    assert_eq!(scene.root.node_count(), 4);
    assert_eq!(scene.root.children[0].children[0].name.as_deref(), Some("child"));

    // The parent translation reaches the child but not the sibling
    let bounds = compute_bounding_box(&scene);
    assert_relative_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
    assert_relative_eq!(bounds.max, Point3::new(11.0, 1.0, 0.0));

    let (local, ranges) = flatten(&scene, &Normalization::identity());
    assert_eq!(local.len(), 18);
    let nodes: Vec<_> = ranges.iter().map(|range| range.node).collect();
    assert_eq!(nodes, vec![2, 3]);

    let (world, _) = flatten_with(&scene, &Normalization::identity(), FlattenSpace::World);
    assert_relative_eq!(world.vertex(1).unwrap(), Point3::new(11.0, 0.0, 0.0));
    assert_relative_eq!(world.vertex(4).unwrap(), Point3::new(1.0, 0.0, 0.0));
}

#[test]
fn test_unknown_extension_is_rejected() {
    let path = asset("model.fbx", b"not really");
    assert!(matches!(
        import_scene(&path),
        Err(ImportError::UnsupportedFormat(p)) if p == path
    ));
}

#[test]
fn test_garbage_stl_is_a_parse_error() {
    let path = asset("broken.stl", b"solid nothing here");
    assert!(matches!(import_scene(&path), Err(ImportError::Parse { .. })));
}

#[test]
fn test_missing_file_is_reported() {
    let err = import_scene("no/such/model.obj").unwrap_err();
    assert!(matches!(err, ImportError::Io { .. }));
    assert!(err.to_string().contains("no/such/model.obj"));
}
