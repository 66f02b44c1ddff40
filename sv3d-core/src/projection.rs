/// First person camera with mono and side-by-side stereo projections
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest convergence depth accepted by [`StereoCamera::update_stereo`]
pub const MIN_Z_DEPTH: f32 = 1e-3;

/// Camera settings, loaded from the viewer config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in radians
    pub fov: f32,
    /// Units per second
    pub speed: f32,
    pub near: f32,
    pub far: f32,
    /// Radians per second, multiplied by `speed`
    pub fov_rate: f32,
    pub min_fov: f32,
    pub max_fov: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 2.0],
            direction: [0.0, 0.0, -1.0],
            // Upside down on purpose, models are viewed with Y pointing down
            up: [0.0, -1.0, 0.0],
            fov: std::f32::consts::PI * 0.4,
            speed: 3.0,
            near: 0.1,
            far: 100.0,
            fov_rate: 0.1,
            min_fov: 0.1,
            max_fov: 3.0,
        }
    }
}

/// Stereo pair parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoRig {
    pub interocular: f32,
    /// Distance of the zero parallax plane
    pub z_depth: f32,
    pub depth_step: f32,
    pub min_z_depth: f32,
    pub max_z_depth: f32,
}

impl StereoRig {
    /// Moves the convergence plane by `steps` increments, clamped
    pub fn adjust_depth(&mut self, steps: f32) {
        self.z_depth = (self.z_depth + steps * self.depth_step)
            .clamp(self.min_z_depth.max(MIN_Z_DEPTH), self.max_z_depth);
    }
}

impl Default for StereoRig {
    fn default() -> Self {
        Self {
            interocular: 0.65,
            z_depth: 5.0,
            depth_step: 0.5,
            min_z_depth: 0.5,
            max_z_depth: 100.0,
        }
    }
}

/// Directional input sampled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub forward: bool,
    pub backward: bool,
    pub narrow_fov: bool,
    pub widen_fov: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    /// +1 for the left eye, -1 for the right eye
    pub fn sign(&self) -> f32 {
        match self {
            Eye::Left => 1.0,
            Eye::Right => -1.0,
        }
    }
}

/// Viewport size in pixels (or terminal cells)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, 1.0 for degenerate sizes
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Off-axis perspective volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    /// OpenGL style projection matrix (clip z in -1..1)
    #[rustfmt::skip]
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let Frustum { left, right, bottom, top, near, far } = *self;
        let width = right - left;
        let height = top - bottom;
        let depth = far - near;
        Matrix4::new(
            2.0 * near / width, 0.0, (right + left) / width, 0.0,
            0.0, 2.0 * near / height, (top + bottom) / height, 0.0,
            0.0, 0.0, -(far + near) / depth, -2.0 * far * near / depth,
            0.0, 0.0, -1.0, 0.0,
        )
    }

    /// Horizontal offset of the frustum center on the near plane
    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

/// Camera pose that is advanced once per frame by an [`InputSnapshot`]
#[derive(Debug, Clone)]
pub struct StereoCamera {
    position: Point3<f32>,
    direction: Vector3<f32>,
    up: Vector3<f32>,
    fov: f32,
    speed: f32,
    near: f32,
    far: f32,
    fov_rate: f32,
    min_fov: f32,
    max_fov: f32,
}

impl StereoCamera {
    pub fn new(config: &CameraConfig) -> Self {
        let min_fov = config.min_fov.max(f32::EPSILON);
        let max_fov = config.max_fov.max(min_fov);
        Self {
            position: Point3::from(config.position),
            direction: Vector3::from(config.direction),
            up: Vector3::from(config.up),
            fov: config.fov.clamp(min_fov, max_fov),
            speed: config.speed,
            near: config.near,
            far: config.far,
            fov_rate: config.fov_rate,
            min_fov,
            max_fov,
        }
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Camera local horizontal axis
    pub fn right_axis(&self) -> Vector3<f32> {
        self.direction
            .cross(&self.up)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::x)
    }

    /// Applies at most one input effect, scaled by the time since the last frame
    ///
    /// Priority is forward, backward, narrow, widen.
    pub fn advance(&mut self, input: &InputSnapshot, elapsed: Duration) {
        let dt = elapsed.as_secs_f32();
        if input.forward {
            self.position += self.direction * dt * self.speed;
        } else if input.backward {
            self.position -= self.direction * dt * self.speed;
        } else if input.narrow_fov {
            self.set_fov(self.fov - self.fov_rate * dt * self.speed);
        } else if input.widen_fov {
            self.set_fov(self.fov + self.fov_rate * dt * self.speed);
        }
    }

    /// Field of view is silently kept within the configured bounds
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(self.min_fov, self.max_fov);
    }

    /// Advance, then return `(view, projection)` for a single eye
    pub fn update_mono(
        &mut self,
        window: WindowSize,
        input: &InputSnapshot,
        elapsed: Duration,
    ) -> (Matrix4<f32>, Matrix4<f32>) {
        self.advance(input, elapsed);
        self.mono_matrices(window)
    }

    pub fn mono_matrices(&self, window: WindowSize) -> (Matrix4<f32>, Matrix4<f32>) {
        let view = Matrix4::look_at_rh(&self.position, &(self.position + self.direction), &self.up);
        let projection = Matrix4::new_perspective(window.aspect(), self.fov, self.near, self.far);
        (view, projection)
    }

    /// Asymmetric frustum for one eye, converging at `z_depth`
    pub fn stereo_frustum(&self, window: WindowSize, z_depth: f32, interocular: f32, eye: Eye) -> Frustum {
        let z_depth = z_depth.max(MIN_Z_DEPTH);
        let shift = (interocular / 2.0) * self.near / z_depth * eye.sign();
        let top = (self.fov / 2.0).tan() * self.near;
        let half_width = window.aspect() * top;
        Frustum {
            left: -half_width + shift,
            right: half_width + shift,
            bottom: -top,
            top,
            near: self.near,
            far: self.far,
        }
    }

    /// Eye position, half the interocular distance to the side of the camera
    pub fn eye_position(&self, interocular: f32, eye: Eye) -> Point3<f32> {
        self.position - self.right_axis() * (eye.sign() * interocular / 2.0)
    }

    /// `(view, projection)` for one eye of a side-by-side stereo pair
    ///
    /// Both eyes keep the camera's view direction; convergence comes from the
    /// frustum shift, so there is no toe-in and no vertical parallax.
    pub fn update_stereo(
        &self,
        window: WindowSize,
        z_depth: f32,
        interocular: f32,
        eye: Eye,
    ) -> (Matrix4<f32>, Matrix4<f32>) {
        let eye_position = self.eye_position(interocular, eye);
        let view = Matrix4::look_at_rh(&eye_position, &(eye_position + self.direction), &self.up);
        let projection = self
            .stereo_frustum(window, z_depth, interocular, eye)
            .to_matrix();
        (view, projection)
    }
}

impl Default for StereoCamera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}
