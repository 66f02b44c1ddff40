/// Model rotation state and matrix helpers
use nalgebra::{Matrix4, Vector3};
use std::f32::consts::PI;

/// User controlled model rotation, in half turns around X and Y
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
}

impl RotationState {
    /// Increment applied per key press
    pub const STEP: f32 = 0.01;

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in half turns)
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    pub fn reset(&mut self) {
        *self = Self::zero();
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Model matrix for a rotation state: Y rotation applied after X
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let ry = Matrix4::new_rotation(Vector3::new(0.0, PI * rotation.y, 0.0));
        let rx = Matrix4::new_rotation(Vector3::new(PI * rotation.x, 0.0, 0.0));
        ry * rx
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}
