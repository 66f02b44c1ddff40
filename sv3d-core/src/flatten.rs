/// Scene tree traversal and flattening into a single vertex stream
///
/// Every traversal in this module goes through [`walk`], so the bounding box,
/// the component count and the flattened buffer all see the nodes in the same
/// depth-first pre-order.
use log::{debug, warn};
use nalgebra::{Matrix4, Point3};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::geometry::{BoundingBox, Mesh, Scene, SceneNode};

/// Floats per emitted vertex
pub const COMPONENTS_PER_VERTEX: usize = 3;

/// Width along X that [`Normalization::reference`] maps an asset to
pub const REFERENCE_WIDTH: f32 = 4.0;

/// A node as seen by a [`walk`] visitor
pub struct Visit<'a> {
    /// Pre-order position of the node, root is 0
    pub index: usize,
    pub node: &'a SceneNode,
    /// Product of all transforms from the root down to and including `node`
    pub world: Matrix4<f32>,
}

/// Depth-first pre-order walk over the scene tree
///
/// The accumulated transform is handed down by value, so every child of a
/// node starts from the same parent transform no matter what its siblings did.
pub fn walk<'a>(scene: &'a Scene, mut visit: impl FnMut(&Visit<'a>)) {
    fn recurse<'a>(
        node: &'a SceneNode,
        parent: Matrix4<f32>,
        next_index: &mut usize,
        visit: &mut dyn FnMut(&Visit<'a>),
    ) {
        let world = parent * node.transform;
        let index = *next_index;
        *next_index += 1;
        visit(&Visit { index, node, world });
        for child in &node.children {
            recurse(child, world, next_index, visit);
        }
    }

    let mut next_index = 0;
    recurse(&scene.root, Matrix4::identity(), &mut next_index, &mut visit);
}

/// Meshes owned by a node, in mesh-list order
fn node_meshes<'a>(scene: &'a Scene, node: &'a SceneNode) -> impl Iterator<Item = &'a Mesh> + 'a {
    node.meshes.iter().filter_map(move |&id| {
        let mesh = scene.meshes.get(id);
        if mesh.is_none() {
            warn!("Node {:?} references missing mesh {}", node.name, id);
        }
        mesh
    })
}

fn mesh_components(mesh: &Mesh) -> usize {
    mesh.faces.len() * 3 * COMPONENTS_PER_VERTEX
}

/// World space bounds of every vertex of every mesh in the scene
pub fn compute_bounding_box(scene: &Scene) -> BoundingBox {
    let mut bounds = BoundingBox::empty();
    walk(scene, |visit| {
        for mesh in node_meshes(scene, visit.node) {
            for position in &mesh.positions {
                bounds.grow(&visit.world.transform_point(position));
            }
        }
    });
    bounds
}

/// Number of floats [`flatten`] emits for the scene (3 per face corner)
pub fn count_components(scene: &Scene) -> usize {
    let mut count = 0;
    walk(scene, |visit| {
        count += node_meshes(scene, visit.node).map(mesh_components).sum::<usize>();
    });
    count
}

/// Re-centers an asset on the origin and scales it uniformly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub center: Point3<f32>,
    pub scale: f32,
}

impl Normalization {
    pub fn identity() -> Self {
        Self {
            center: Point3::origin(),
            scale: 1.0,
        }
    }

    /// Scale chosen so the X extent of `bounds` becomes `target_width`
    ///
    /// Only the X axis is considered, assets taller or deeper than they are
    /// wide may end up larger than `target_width` along those axes.
    pub fn from_bounds(bounds: &BoundingBox, target_width: f32) -> Self {
        if bounds.is_empty() {
            warn!("Scene has no vertices, skipping normalization");
            return Self::identity();
        }
        let center = bounds.center();
        let width = bounds.max.x - bounds.min.x;
        let scale = target_width / width;
        if !scale.is_finite() || width <= f32::EPSILON {
            warn!("Scene has no extent along X (width {}), keeping unit scale", width);
            return Self { center, scale: 1.0 };
        }
        Self { center, scale }
    }

    /// 4 units of width along X
    pub fn reference(bounds: &BoundingBox) -> Self {
        Self::from_bounds(bounds, REFERENCE_WIDTH)
    }

    pub fn apply(&self, point: &Point3<f32>) -> Point3<f32> {
        Point3::from((point - self.center) * self.scale)
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_scaling(self.scale) * Matrix4::new_translation(&(-self.center.coords))
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Self::identity()
    }
}

/// Which space vertices are in before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlattenSpace {
    /// Mesh-local positions, node transforms ignored
    #[default]
    Local,
    /// Node world transforms baked into the positions
    World,
}

/// Contiguous `xyz` positions ready for upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatVertexBuffer {
    data: Vec<f32>,
}

impl FlatVertexBuffer {
    pub fn with_capacity(components: usize) -> Self {
        Self {
            data: Vec::with_capacity(components),
        }
    }

    fn push(&mut self, point: &Point3<f32>) {
        self.data.extend_from_slice(&[point.x, point.y, point.z]);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Length in floats
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.data.len() / COMPONENTS_PER_VERTEX
    }

    pub fn vertex(&self, index: usize) -> Option<Point3<f32>> {
        let start = index * COMPONENTS_PER_VERTEX;
        self.data
            .get(start..start + COMPONENTS_PER_VERTEX)
            .map(|xyz| Point3::new(xyz[0], xyz[1], xyz[2]))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_components(&self.data)
    }
}

/// The slice of a [`FlatVertexBuffer`] covering one node's own meshes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRange {
    /// Pre-order index of the node
    pub node: usize,
    pub name: Option<String>,
    /// Offset in floats
    pub offset: usize,
    /// Length in floats
    pub count: usize,
}

impl DrawRange {
    pub fn end(&self) -> usize {
        self.offset + self.count
    }

    /// The same range expressed in vertices, as a draw call expects it
    pub fn vertices(&self) -> Range<usize> {
        self.offset / COMPONENTS_PER_VERTEX..self.end() / COMPONENTS_PER_VERTEX
    }
}

/// Flattens mesh-local positions, see [`flatten_with`]
pub fn flatten(scene: &Scene, normalization: &Normalization) -> (FlatVertexBuffer, Vec<DrawRange>) {
    flatten_with(scene, normalization, FlattenSpace::Local)
}

/// Emits every face corner of the scene in pre-order and records one
/// [`DrawRange`] per node owning at least one mesh
pub fn flatten_with(
    scene: &Scene,
    normalization: &Normalization,
    space: FlattenSpace,
) -> (FlatVertexBuffer, Vec<DrawRange>) {
    let expected = count_components(scene);
    let mut buffer = FlatVertexBuffer::with_capacity(expected);
    let mut ranges = Vec::new();

    walk(scene, |visit| {
        if visit.node.meshes.is_empty() {
            return;
        }
        let offset = buffer.len();
        for mesh in node_meshes(scene, visit.node) {
            for face in &mesh.faces {
                for &index in &face.indices {
                    let position = mesh.positions[index as usize];
                    let position = match space {
                        FlattenSpace::Local => position,
                        FlattenSpace::World => visit.world.transform_point(&position),
                    };
                    buffer.push(&normalization.apply(&position));
                }
            }
        }
        ranges.push(DrawRange {
            node: visit.index,
            name: visit.node.name.clone(),
            offset,
            count: buffer.len() - offset,
        });
    });

    debug_assert_eq!(buffer.len(), expected);
    debug!(
        "Flattened {} vertices into {} draw ranges",
        buffer.vertex_count(),
        ranges.len()
    );
    (buffer, ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Face;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn world_origin(world: &Matrix4<f32>) -> Vector3<f32> {
        world.fixed_view::<3, 1>(0, 3).into_owned()
    }

    fn quad_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            mesh.push_position(Point3::new(x, y, 0.0));
        }
        mesh.add_face(Face::new(0, 1, 2));
        mesh.add_face(Face::new(0, 2, 3));
        mesh
    }

    fn nested_scene() -> Scene {
        // root (group)
        // ├── a (mesh 0, translated +x)
        // │   └── b (mesh 1, mesh 0)
        // └── c (group)
        //     └── d (mesh 1)
        let root = SceneNode::new()
            .named("root")
            .with_child(
                SceneNode::new()
                    .named("a")
                    .with_transform(Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0)))
                    .with_mesh(0)
                    .with_child(SceneNode::new().named("b").with_mesh(1).with_mesh(0)),
            )
            .with_child(
                SceneNode::new()
                    .named("c")
                    .with_child(SceneNode::new().named("d").with_mesh(1)),
            );
        Scene::new(vec![quad_mesh(), Mesh::cube(2.0)], root)
    }

    #[test]
    fn test_walk_is_preorder() {
        let scene = nested_scene();
        let mut names = Vec::new();
        walk(&scene, |visit| {
            names.push((visit.index, visit.node.name.clone().unwrap()));
        });
        let expected = ["root", "a", "b", "c", "d"];
        assert_eq!(names.len(), expected.len());
        for (i, (index, name)) in names.iter().enumerate() {
            assert_eq!(*index, i);
            assert_eq!(name, expected[i]);
        }
    }

    #[test]
    fn test_siblings_do_not_inherit_transforms() {
        let scene = nested_scene();
        let mut origins = Vec::new();
        walk(&scene, |visit| origins.push(world_origin(&visit.world)));
        // b inherits a's translation, c and d do not
        assert_relative_eq!(origins[2], Vector3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(origins[3], Vector3::zeros());
        assert_relative_eq!(origins[4], Vector3::zeros());
    }

    #[test]
    fn test_single_mesh_scenario() {
        let scene = Scene::from_mesh(quad_mesh());
        let normalization = Normalization::reference(&compute_bounding_box(&scene));
        let (buffer, ranges) = flatten(&scene, &normalization);

        assert_eq!(count_components(&scene), 18);
        assert_eq!(buffer.len(), 18);
        assert_eq!(buffer.vertex_count(), 6);
        assert_eq!(ranges.len(), 1);
        assert_eq!((ranges[0].offset, ranges[0].count), (0, 18));
        assert_eq!(ranges[0].vertices(), 0..6);
    }

    #[test]
    fn test_count_matches_flatten() {
        let scene = nested_scene();
        let (buffer, _) = flatten(&scene, &Normalization::identity());
        assert_eq!(buffer.len(), count_components(&scene));
        assert_eq!(buffer.len(), COMPONENTS_PER_VERTEX * buffer.vertex_count());
        // a: 2 faces, b: 12 + 2, d: 12
        assert_eq!(buffer.vertex_count(), 28 * 3);
    }

    #[test]
    fn test_ranges_tile_the_buffer() {
        let scene = nested_scene();
        let (buffer, ranges) = flatten(&scene, &Normalization::identity());

        // Only nodes with meshes get a range
        let nodes: Vec<_> = ranges.iter().map(|r| r.node).collect();
        assert_eq!(nodes, vec![1, 2, 4]);

        let mut end = 0;
        for range in &ranges {
            assert_eq!(range.offset, end);
            end = range.end();
        }
        assert_eq!(end, buffer.len());
        assert_eq!(ranges[1].count, (12 + 2) * 9);
    }

    #[test]
    fn test_flatten_emits_in_face_order() {
        let scene = Scene::from_mesh(quad_mesh());
        let (buffer, _) = flatten(&scene, &Normalization::identity());
        let corners: Vec<_> = (0..6).map(|i| buffer.vertex(i).unwrap()).collect();
        assert_eq!(corners[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(corners[2], Point3::new(1.0, 1.0, 0.0));
        assert_eq!(corners[3], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(corners[5], Point3::new(0.0, 1.0, 0.0));
        assert_eq!(buffer.vertex(6), None);
    }

    #[test]
    fn test_bounding_box_uses_world_transforms() {
        let scene = nested_scene();
        let bounds = compute_bounding_box(&scene);
        // Cube under d spans -1..1, quad under a spans 10..11 in x
        assert_relative_eq!(bounds.min, Point3::new(-1.0, -1.0, -1.0));
        assert_relative_eq!(bounds.max, Point3::new(11.0, 1.0, 1.0));
    }

    #[test]
    fn test_bounding_box_ignores_sibling_order() {
        let scene = nested_scene();
        let mut reversed = scene.clone();
        reversed.root.children.reverse();
        reversed.root.children[1].children[0].meshes.reverse();

        let a = compute_bounding_box(&scene);
        let b = compute_bounding_box(&reversed);
        assert_relative_eq!(a.min, b.min, epsilon = 1e-6);
        assert_relative_eq!(a.max, b.max, epsilon = 1e-6);
    }

    #[test]
    fn test_reference_normalization() {
        let mut mesh = Mesh::cube(1.0);
        for position in &mut mesh.positions {
            *position = Point3::new(position.x * 3.0 + 5.0, position.y - 2.0, position.z * 7.0);
        }
        let scene = Scene::from_mesh(mesh);
        let normalization = Normalization::reference(&compute_bounding_box(&scene));
        let (buffer, _) = flatten(&scene, &normalization);

        let bounds = buffer.bounding_box();
        assert_relative_eq!(bounds.max.x - bounds.min.x, REFERENCE_WIDTH, epsilon = 1e-5);
        assert_relative_eq!(bounds.center(), Point3::origin(), epsilon = 1e-5);
        // Depth is scaled by the X factor, not fitted
        assert_relative_eq!(bounds.max.z - bounds.min.z, 7.0 * 4.0 / 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_normalization_matrix_matches_apply() {
        let normalization = Normalization {
            center: Point3::new(1.0, 2.0, 3.0),
            scale: 0.5,
        };
        let point = Point3::new(3.0, -2.0, 5.0);
        assert_relative_eq!(
            normalization.to_matrix().transform_point(&point),
            normalization.apply(&point)
        );
    }

    #[test]
    fn test_empty_meshes_are_not_an_error() {
        let scene = Scene::from_mesh(Mesh::new());
        let bounds = compute_bounding_box(&scene);
        assert!(bounds.is_empty());

        let normalization = Normalization::reference(&bounds);
        assert_eq!(normalization, Normalization::identity());

        let (buffer, ranges) = flatten(&scene, &normalization);
        assert!(buffer.is_empty());
        assert_eq!(count_components(&scene), 0);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].count, 0);
    }

    #[test]
    fn test_flat_along_x_keeps_unit_scale() {
        let mut mesh = Mesh::new();
        mesh.add_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        );
        let normalization = Normalization::reference(&compute_bounding_box(&Scene::from_mesh(mesh)));
        assert_eq!(normalization.scale, 1.0);
    }

    #[test]
    fn test_world_space_flatten_bakes_transforms() {
        let scene = nested_scene();
        let (local, _) = flatten_with(&scene, &Normalization::identity(), FlattenSpace::Local);
        let (world, ranges) = flatten_with(&scene, &Normalization::identity(), FlattenSpace::World);
        assert_eq!(local.len(), world.len());

        // First range belongs to node a, shifted by +10 in x
        let first = ranges[0].vertices().start;
        let delta = world.vertex(first).unwrap() - local.vertex(first).unwrap();
        assert_relative_eq!(delta, Vector3::new(10.0, 0.0, 0.0));
    }
}
