/// SV3D Core Library - asset flattening and stereo camera math
///
/// This library provides the renderer independent part of the stereo model
/// viewer: importing a model into a scene tree, flattening that tree into a
/// single normalized vertex stream with per-node draw ranges, and deriving
/// mono or side-by-side stereo view/projection matrices.

pub mod clock;
pub mod draw;
pub mod error;
pub mod flatten;
pub mod geometry;
pub mod gltf_scene;
pub mod import;
pub mod obj;
pub mod projection;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use clock::FrameClock;
pub use draw::{draw_all, draw_node, DrawTarget, PrimitiveMode};
pub use error::{ImportError, UsageError};
pub use flatten::{
    compute_bounding_box, count_components, flatten, flatten_with, walk, DrawRange,
    FlatVertexBuffer, FlattenSpace, Normalization,
};
pub use geometry::{BoundingBox, Face, Mesh, Scene, SceneNode};
pub use import::{import_scene, AssetFormat};
pub use projection::{CameraConfig, Eye, Frustum, InputSnapshot, StereoCamera, StereoRig, WindowSize};
pub use transform::{RotationState, Transform};
