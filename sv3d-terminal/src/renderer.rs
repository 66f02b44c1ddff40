/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;
use std::ops::Range;
use sv3d_core::flatten::COMPONENTS_PER_VERTEX;
use sv3d_core::{DrawTarget, PrimitiveMode, Transform, WindowSize};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

const POINT_CHAR: char = 'o';
const LINE_CHAR: char = '#';

/// A terminal cell is roughly twice as tall as it is wide
const CELL_ASPECT: u32 = 2;

/// Rectangle of the character grid an eye is drawn into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Size to build projections with, corrected for the cell aspect
    pub fn window_size(&self) -> WindowSize {
        WindowSize::new(self.width as u32, self.height as u32 * CELL_ASPECT)
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x as i32
            && y >= self.y as i32
            && x < (self.x + self.width) as i32
            && y < (self.y + self.height) as i32
    }
}

/// ASCII renderer that converts flattened geometry to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    pub fn full_viewport(&self) -> Viewport {
        Viewport::new(0, 0, self.width, self.height)
    }

    /// Left and right halves for side-by-side stereo
    pub fn split_viewports(&self) -> (Viewport, Viewport) {
        let half = self.width / 2;
        (
            Viewport::new(0, 0, half, self.height),
            Viewport::new(half, 0, self.width - half, self.height),
        )
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        if x < self.width && y < self.height {
            Some(self.char_buffer[y * self.width + x])
        } else {
            None
        }
    }

    /// Starts a draw pass over `vertices` (packed `xyz` floats) into `viewport`
    pub fn pass<'a>(
        &'a mut self,
        vertices: &'a [f32],
        model: Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
        viewport: Viewport,
    ) -> RenderPass<'a> {
        RenderPass {
            renderer: self,
            vertices,
            model,
            mvp: Transform::mvp_matrix(&model, view, projection),
            viewport,
        }
    }

    fn plot(&mut self, x: i32, y: i32, depth: f32, character: char, clip: &Viewport) {
        if !clip.contains(x, y) || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = character;
        }
    }

    fn rasterize_line(&mut self, a: (f32, f32, f32), b: (f32, f32, f32), clip: &Viewport) {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let x = a.0 + dx * step as f32 / steps as f32;
            let y = a.1 + dy * step as f32 / steps as f32;
            let depth = a.2 + (b.2 - a.2) * step as f32 / steps as f32;
            self.plot(x.floor() as i32, y.floor() as i32, depth, LINE_CHAR, clip);
        }
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, clip: &Viewport) {
        let [v0, v1, v2] = *coords;

        // Bounding box, clipped to the viewport
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(clip.x as i32);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min((clip.x + clip.width) as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(clip.y as i32);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min((clip.y + clip.height) as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        self.plot(x, y, depth, character, clip);
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' | LINE_CHAR => Color::White,
                    '%' | '@' | POINT_CHAR => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    #[cfg(test)]
    fn depth_at(&self, x: usize, y: usize) -> f32 {
        self.depth_buffer[y * self.width + x]
    }
}

/// One eye's worth of draw calls against a shared vertex buffer
pub struct RenderPass<'a> {
    renderer: &'a mut AsciiRenderer,
    vertices: &'a [f32],
    model: Matrix4<f32>,
    mvp: Matrix4<f32>,
    viewport: Viewport,
}

impl RenderPass<'_> {
    fn position(&self, index: usize) -> Point3<f32> {
        let start = index * COMPONENTS_PER_VERTEX;
        let xyz = &self.vertices[start..start + COMPONENTS_PER_VERTEX];
        Point3::new(xyz[0], xyz[1], xyz[2])
    }

    /// Homogeneous projection into viewport cells, `None` when clipped
    fn project(&self, point: &Point3<f32>) -> Option<(f32, f32, f32)> {
        let clip = self.mvp * point.to_homogeneous();
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }

        let vp = &self.viewport;
        let x = vp.x as f32 + (ndc.x + 1.0) * 0.5 * vp.width as f32;
        let y = vp.y as f32 + (1.0 - ndc.y) * 0.5 * vp.height as f32;
        Some((x, y, ndc.z))
    }

    fn draw_point(&mut self, index: usize) {
        if let Some((x, y, depth)) = self.project(&self.position(index)) {
            let viewport = self.viewport;
            self.renderer
                .plot(x.floor() as i32, y.floor() as i32, depth, POINT_CHAR, &viewport);
        }
    }

    fn draw_line(&mut self, first: usize) {
        let a = self.project(&self.position(first));
        let b = self.project(&self.position(first + 1));
        if let (Some(a), Some(b)) = (a, b) {
            let viewport = self.viewport;
            self.renderer.rasterize_line(a, b, &viewport);
        }
    }

    fn draw_triangle(&mut self, first: usize) {
        let corners = [
            self.position(first),
            self.position(first + 1),
            self.position(first + 2),
        ];

        let mut screen = [(0.0, 0.0, 0.0); 3];
        for (slot, corner) in screen.iter_mut().zip(&corners) {
            match self.project(corner) {
                Some(coords) => *slot = coords,
                None => return, // Triangle is clipped
            }
        }

        // Face normal in model space after rotation, lit from the viewer
        let world: Vec<Point3<f32>> = corners
            .iter()
            .map(|corner| self.model.transform_point(corner))
            .collect();
        let normal = (world[1] - world[0])
            .cross(&(world[2] - world[0]))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);
        let light_dir = Vector3::new(0.0, 0.0, 1.0);
        let brightness = normal.dot(&light_dir).abs();

        // Index 0 is blank, keep edge-on faces visible
        let last = LUMINOSITY_RAMP.len() - 1;
        let char_index = ((brightness * last as f32) as usize).clamp(1, last);
        let character = LUMINOSITY_RAMP[char_index];

        let viewport = self.viewport;
        self.renderer.rasterize_triangle(&screen, character, &viewport);
    }
}

impl DrawTarget for RenderPass<'_> {
    fn draw_arrays(&mut self, mode: PrimitiveMode, vertices: Range<usize>) {
        let available = self.vertices.len() / COMPONENTS_PER_VERTEX;
        let end = vertices.end.min(available);
        let stride = mode.stride();

        let mut first = vertices.start;
        while first + stride <= end {
            match mode {
                PrimitiveMode::Points => self.draw_point(first),
                PrimitiveMode::Lines => self.draw_line(first),
                PrimitiveMode::Triangles => self.draw_triangle(first),
            }
            first += stride;
        }
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
