/// Keyboard driven viewer state, independent of the terminal itself
use crossterm::event::KeyCode;
use log::info;
use nalgebra::Matrix4;
use std::time::Duration;
use sv3d_core::{Eye, InputSnapshot, RotationState, StereoCamera, StereoRig, Transform, WindowSize};

/// Everything the keys can change between two frames
pub struct ViewerState {
    pub camera: StereoCamera,
    pub rig: StereoRig,
    pub rotation: RotationState,
    pub stereo: bool,
    pub running: bool,
    input: InputSnapshot,
}

impl ViewerState {
    pub fn new(camera: StereoCamera, rig: StereoRig, stereo: bool) -> Self {
        Self {
            camera,
            rig,
            rotation: RotationState::zero(),
            stereo,
            running: true,
            input: InputSnapshot::default(),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            // Up/Down walk in mono and move the convergence plane in stereo
            KeyCode::Up if self.stereo => self.rig.adjust_depth(1.0),
            KeyCode::Down if self.stereo => self.rig.adjust_depth(-1.0),
            KeyCode::Up => self.input.forward = true,
            KeyCode::Down => self.input.backward = true,
            KeyCode::Left => self.input.narrow_fov = true,
            KeyCode::Right => self.input.widen_fov = true,
            KeyCode::Char('z') => self.rotation.rotate(RotationState::STEP, 0.0),
            KeyCode::Char('x') => self.rotation.rotate(-RotationState::STEP, 0.0),
            KeyCode::Char('a') => self.rotation.rotate(0.0, RotationState::STEP),
            KeyCode::Char('s') => self.rotation.rotate(0.0, -RotationState::STEP),
            KeyCode::Char(' ') => self.rotation.reset(),
            KeyCode::Char('m') => {
                self.stereo = !self.stereo;
                info!("Switched to {} view", if self.stereo { "stereo" } else { "mono" });
            }
            _ => {}
        }
    }

    /// Input gathered since the last call
    pub fn take_input(&mut self) -> InputSnapshot {
        std::mem::take(&mut self.input)
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::rotation_matrix(&self.rotation)
    }

    /// Consumes the pending input, returns `(view, projection)` for one eye
    ///
    /// `None` renders the mono view. In stereo the camera only advances on the
    /// first eye so both eyes of a frame share the same camera.
    pub fn eye_matrices(
        &mut self,
        window: WindowSize,
        eye: Option<Eye>,
        elapsed: Duration,
    ) -> (Matrix4<f32>, Matrix4<f32>) {
        match eye {
            None => {
                let input = self.take_input();
                self.camera.update_mono(window, &input, elapsed)
            }
            Some(eye) => {
                if eye == Eye::Left {
                    let input = self.take_input();
                    self.camera.advance(&input, elapsed);
                }
                self.camera
                    .update_stereo(window, self.rig.z_depth, self.rig.interocular, eye)
            }
        }
    }

    pub fn status(&self) -> String {
        let view = if self.stereo {
            format!(
                "stereo iod {:.2} depth {:.1}",
                self.rig.interocular, self.rig.z_depth
            )
        } else {
            let position = self.camera.position();
            format!("mono z {:.2}", position.z)
        };
        format!("{} | fov {:.2}", view, self.camera.fov())
    }
}
