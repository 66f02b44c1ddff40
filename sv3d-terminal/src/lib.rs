/// Terminal front end: renders a flattened scene as ASCII, mono or side-by-side stereo
use crossterm::{
    cursor,
    event::{self, Event, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use log::debug;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use sv3d_core::{
    draw_all, DrawRange, Eye, FlatVertexBuffer, FrameClock, PrimitiveMode, StereoCamera, StereoRig,
};

pub mod config;
pub mod renderer;
pub mod state;

pub use config::{ConfigError, NormalizationConfig, ViewerConfig};
pub use renderer::{AsciiRenderer, RenderPass, Viewport};
pub use state::ViewerState;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    buffer: FlatVertexBuffer,
    ranges: Vec<DrawRange>,
    mode: PrimitiveMode,
    state: ViewerState,
    renderer: AsciiRenderer,
    clock: FrameClock,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(
        buffer: FlatVertexBuffer,
        ranges: Vec<DrawRange>,
        mode: PrimitiveMode,
        camera: StereoCamera,
        rig: StereoRig,
        stereo: bool,
    ) -> io::Result<Self> {
        let (width, height) = terminal::size()?;

        Ok(Self {
            buffer,
            ranges,
            mode,
            state: ViewerState::new(camera, rig, stereo),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            clock: FrameClock::new(),
            last_fps_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.state.running {
            let frame_start = Instant::now();

            self.handle_input()?;

            let elapsed = self.clock.tick();
            self.render(elapsed)?;

            // Frame timing
            self.frame_count += 1;
            let frame_time = frame_start.elapsed();
            if frame_time < target_frame_time {
                std::thread::sleep(target_frame_time - frame_time);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        debug!("Rendered {} frames in {:?}", self.clock.frames(), self.clock.total());
        Ok(())
    }

    /// Drains every pending event without blocking
    fn handle_input(&mut self) -> io::Result<()> {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                    self.state.handle_key(code);
                }
                Event::Resize(width, height) => {
                    self.renderer.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn render(&mut self, elapsed: Duration) -> io::Result<()> {
        self.renderer.clear();

        if self.state.stereo {
            let (left, right) = self.renderer.split_viewports();
            self.render_eye(left, Some(Eye::Left), elapsed);
            self.render_eye(right, Some(Eye::Right), elapsed);
        } else {
            let viewport = self.renderer.full_viewport();
            self.render_eye(viewport, None, elapsed);
        }

        // Output to terminal
        let mut stdout = stdout();
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "SV3D | {} | {} | FPS: {:.1} | Up/Down Left/Right z/x/a/s Space M Q",
                self.mode,
                self.state.status(),
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }

    fn render_eye(&mut self, viewport: Viewport, eye: Option<Eye>, elapsed: Duration) {
        let (view, projection) = self
            .state
            .eye_matrices(viewport.window_size(), eye, elapsed);
        let model = self.state.model_matrix();

        let mut pass = self
            .renderer
            .pass(self.buffer.as_slice(), model, &view, &projection, viewport);
        draw_all(&mut pass, &self.ranges, self.mode);
    }
}
