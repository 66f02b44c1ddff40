/// Draw call delegation for flattened scenes
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::UsageError;
use crate::flatten::DrawRange;

/// Primitive topology used to interpret the flat vertex stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveMode {
    Points,
    Lines,
    #[default]
    Triangles,
}

impl PrimitiveMode {
    pub const ALL: [PrimitiveMode; 3] = [Self::Points, Self::Lines, Self::Triangles];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveMode::Points => "points",
            PrimitiveMode::Lines => "lines",
            PrimitiveMode::Triangles => "triangles",
        }
    }

    /// Vertices consumed per primitive
    pub fn stride(&self) -> usize {
        match self {
            PrimitiveMode::Points => 1,
            PrimitiveMode::Lines => 2,
            PrimitiveMode::Triangles => 3,
        }
    }
}

impl fmt::Display for PrimitiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveMode {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UsageError::InvalidRenderType(s.to_string()))
    }
}

/// Anything that can draw a range of the uploaded vertex buffer
pub trait DrawTarget {
    fn draw_arrays(&mut self, mode: PrimitiveMode, vertices: Range<usize>);
}

/// Issues the draw call for a single node
pub fn draw_node<T: DrawTarget + ?Sized>(target: &mut T, range: &DrawRange, mode: PrimitiveMode) {
    target.draw_arrays(mode, range.vertices());
}

/// Issues one draw call per range, in flatten order
pub fn draw_all<T: DrawTarget + ?Sized>(target: &mut T, ranges: &[DrawRange], mode: PrimitiveMode) {
    for range in ranges {
        draw_node(target, range, mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(PrimitiveMode, Range<usize>)>,
    }

    impl DrawTarget for Recorder {
        fn draw_arrays(&mut self, mode: PrimitiveMode, vertices: Range<usize>) {
            self.calls.push((mode, vertices));
        }
    }

    #[test]
    fn test_parse_render_type() {
        assert_eq!("points".parse::<PrimitiveMode>().unwrap(), PrimitiveMode::Points);
        assert_eq!("lines".parse::<PrimitiveMode>().unwrap(), PrimitiveMode::Lines);
        assert_eq!("triangles".parse::<PrimitiveMode>().unwrap(), PrimitiveMode::Triangles);
    }

    #[test]
    fn test_parse_rejects_other_values() {
        for bad in ["", "Triangles", "quads", "line"] {
            let err = bad.parse::<PrimitiveMode>().unwrap_err();
            assert!(matches!(err, UsageError::InvalidRenderType(ref s) if s == bad));
        }
    }

    #[test]
    fn test_draw_all_converts_to_vertices() {
        let ranges = vec![
            DrawRange { node: 1, name: None, offset: 0, count: 18 },
            DrawRange { node: 3, name: None, offset: 18, count: 9 },
        ];
        let mut recorder = Recorder::default();
        draw_all(&mut recorder, &ranges, PrimitiveMode::Lines);
        assert_eq!(
            recorder.calls,
            vec![(PrimitiveMode::Lines, 0..6), (PrimitiveMode::Lines, 6..9)]
        );
    }
}
