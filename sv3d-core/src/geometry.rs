/// Scene data model: nodes, meshes and faces as produced by the importers
use nalgebra::{Matrix4, Point3, Vector3};

/// A triangle referencing three positions of its mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub indices: [u32; 3],
}

impl Face {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { indices: [a, b, c] }
    }
}

/// An indexed triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub positions: Vec<Point3<f32>>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(positions: usize, faces: usize) -> Self {
        Self {
            name: None,
            positions: Vec::with_capacity(positions),
            faces: Vec::with_capacity(faces),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a position and returns its index
    pub fn push_position(&mut self, position: Point3<f32>) -> u32 {
        self.positions.push(position);
        (self.positions.len() - 1) as u32
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// Appends an unshared triangle (three fresh positions)
    pub fn add_triangle(&mut self, v0: Point3<f32>, v1: Point3<f32>, v2: Point3<f32>) {
        let a = self.push_position(v0);
        let b = self.push_position(v1);
        let c = self.push_position(v2);
        self.add_face(Face::new(a, b, c));
    }

    /// Index of the first face corner that does not refer to a position
    pub fn first_invalid_index(&self) -> Option<u32> {
        let len = self.positions.len();
        self.faces
            .iter()
            .flat_map(|face| face.indices)
            .find(|&index| index as usize >= len)
    }

    /// Face normal, `None` for degenerate triangles
    pub fn face_normal(&self, face: &Face) -> Option<Vector3<f32>> {
        let [a, b, c] = face.indices.map(|i| self.positions[i as usize]);
        (b - a).cross(&(c - a)).try_normalize(f32::EPSILON)
    }

    /// Create a simple cube mesh for testing
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::with_capacity(8, 12);
        for i in 0..8u32 {
            let sign = |bit: u32| if i & bit == 0 { -half } else { half };
            mesh.push_position(Point3::new(sign(1), sign(2), sign(4)));
        }

        // Two triangles per side, corners indexed by the xyz bit pattern
        const SIDES: [[u32; 4]; 6] = [
            [4, 5, 7, 6], // front  (+z)
            [1, 0, 2, 3], // back   (-z)
            [2, 6, 7, 3], // top    (+y)
            [0, 1, 5, 4], // bottom (-y)
            [5, 1, 3, 7], // right  (+x)
            [0, 4, 6, 2], // left   (-x)
        ];
        for [a, b, c, d] in SIDES {
            mesh.add_face(Face::new(a, b, c));
            mesh.add_face(Face::new(a, c, d));
        }
        mesh
    }
}

/// A node of the imported scene tree
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: Option<String>,
    /// Local-to-parent transform
    pub transform: Matrix4<f32>,
    /// Indices into [`Scene::meshes`]
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new() -> Self {
        Self {
            name: None,
            transform: Matrix4::identity(),
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including `self`
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}

/// An imported asset: a mesh table and the node tree referencing it
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub meshes: Vec<Mesh>,
    pub root: SceneNode,
}

impl Scene {
    pub fn new(meshes: Vec<Mesh>, root: SceneNode) -> Self {
        Self { meshes, root }
    }

    /// Wraps a single mesh owned by the root node
    pub fn from_mesh(mesh: Mesh) -> Self {
        Self::new(vec![mesh], SceneNode::new().with_mesh(0))
    }

    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.faces.len()).sum()
    }
}

/// Axis aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    /// Sentinel box that any sample will replace
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn grow(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Bounds of a flat `xyz xyz ...` component slice
    pub fn from_components(components: &[f32]) -> Self {
        components
            .chunks_exact(3)
            .fold(Self::empty(), |mut bounds, xyz| {
                bounds.grow(&Point3::new(xyz[0], xyz[1], xyz[2]));
                bounds
            })
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_faces_are_valid() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.positions.len(), 8);
        assert_eq!(cube.faces.len(), 12);
        assert_eq!(cube.first_invalid_index(), None);
    }

    #[test]
    fn test_cube_normals_point_outwards() {
        let cube = Mesh::cube(2.0);
        for face in &cube.faces {
            let normal = cube.face_normal(face).unwrap();
            let centroid = face
                .indices
                .iter()
                .map(|&i| cube.positions[i as usize].coords)
                .sum::<Vector3<f32>>()
                / 3.0;
            assert!(normal.dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_invalid_index_detection() {
        let mut mesh = Mesh::new();
        mesh.push_position(Point3::origin());
        mesh.add_face(Face::new(0, 0, 3));
        assert_eq!(mesh.first_invalid_index(), Some(3));
    }

    #[test]
    fn test_bounding_box_grow() {
        let mut bounds = BoundingBox::empty();
        assert!(bounds.is_empty());

        bounds.grow(&Point3::new(1.0, -2.0, 3.0));
        bounds.grow(&Point3::new(-1.0, 2.0, 0.0));
        assert!(!bounds.is_empty());
        assert_eq!(bounds.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(bounds.center(), Point3::new(0.0, 0.0, 1.5));
        assert_eq!(bounds.size(), Vector3::new(2.0, 4.0, 3.0));
    }

    #[test]
    fn test_node_count() {
        let root = SceneNode::new()
            .with_child(SceneNode::new().with_child(SceneNode::new()))
            .with_child(SceneNode::new());
        assert_eq!(root.node_count(), 4);
    }
}
