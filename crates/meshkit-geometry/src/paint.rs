//! Gradient paints.
//!
//! A gradient is stored in figure space on the mesh and re-derived in world
//! space whenever the transform changes. The world-space copy is what the
//! batcher compares and what backends upload.

use glam::Vec2;
use meshkit_core::{Color, MeshError, Result};

use crate::transform::Transform2D;

/// Maximum number of color stops a gradient uniform can carry.
pub const MAX_GRADIENT_STOPS: usize = 8;

/// Offset written after the last packed stop when fewer than
/// [`MAX_GRADIENT_STOPS`] are used.
pub const GRADIENT_STOP_SENTINEL: f32 = -1.0;

/// Gradient family, which fixes the arity of the gradient vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradientKind {
    /// `[x0, y0, x1, y1]`
    Linear,
    /// `[x0, y0, r0, x1, y1, r1]`
    Radial,
    /// `[cx, cy, r]`, expanded to a radial gradient starting at the center.
    Circular,
}

impl GradientKind {
    /// Number of floats expected in the gradient vector.
    pub fn arity(self) -> usize {
        match self {
            GradientKind::Linear => 4,
            GradientKind::Radial => 6,
            GradientKind::Circular => 3,
        }
    }
}

/// Which part of a mesh a gradient paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradientTarget {
    Fill,
    Stroke,
}

/// A color stop in a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient (0.0 to 1.0)
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self {
            offset: offset.clamp(0.0, 1.0),
            color,
        }
    }
}

/// Geometry of a gradient after normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientShape {
    Linear {
        start: Vec2,
        end: Vec2,
    },
    Radial {
        start: Vec2,
        start_radius: f32,
        end: Vec2,
        end_radius: f32,
    },
}

impl GradientShape {
    fn transformed(&self, transform: &Transform2D) -> Self {
        match *self {
            GradientShape::Linear { start, end } => GradientShape::Linear {
                start: transform.transform_point(start),
                end: transform.transform_point(end),
            },
            GradientShape::Radial {
                start,
                start_radius,
                end,
                end_radius,
            } => {
                let scale = transform.uniform_scale();
                GradientShape::Radial {
                    start: transform.transform_point(start),
                    start_radius: start_radius * scale,
                    end: transform.transform_point(end),
                    end_radius: end_radius * scale,
                }
            }
        }
    }
}

/// A linear or two-circle radial gradient with sorted stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub shape: GradientShape,
    stops: Vec<GradientStop>,
}

impl Gradient {
    /// Build a gradient from a raw vector whose length must match `kind.arity()`.
    ///
    /// Stops are clamped to `0..=1` and sorted by offset.
    pub fn new(kind: GradientKind, vector: &[f32], stops: Vec<GradientStop>) -> Result<Self> {
        if vector.len() != kind.arity() {
            return Err(MeshError::invalid(format!(
                "{kind:?} gradient expects {} values, got {}",
                kind.arity(),
                vector.len()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(MeshError::invalid("gradient vector must be finite"));
        }
        let shape = match kind {
            GradientKind::Linear => GradientShape::Linear {
                start: Vec2::new(vector[0], vector[1]),
                end: Vec2::new(vector[2], vector[3]),
            },
            GradientKind::Radial => GradientShape::Radial {
                start: Vec2::new(vector[0], vector[1]),
                start_radius: vector[2],
                end: Vec2::new(vector[3], vector[4]),
                end_radius: vector[5],
            },
            GradientKind::Circular => {
                let center = Vec2::new(vector[0], vector[1]);
                GradientShape::Radial {
                    start: center,
                    start_radius: 0.0,
                    end: center,
                    end_radius: vector[2],
                }
            }
        };
        if let GradientShape::Radial {
            start_radius,
            end_radius,
            ..
        } = shape
        {
            if start_radius < 0.0 || end_radius < 0.0 {
                return Err(MeshError::invalid("gradient radii must be non-negative"));
            }
        }
        Self::from_shape(shape, stops)
    }

    pub fn linear(start: Vec2, end: Vec2, stops: Vec<GradientStop>) -> Result<Self> {
        Self::new(GradientKind::Linear, &[start.x, start.y, end.x, end.y], stops)
    }

    pub fn circular(center: Vec2, radius: f32, stops: Vec<GradientStop>) -> Result<Self> {
        Self::new(GradientKind::Circular, &[center.x, center.y, radius], stops)
    }

    fn from_shape(shape: GradientShape, mut stops: Vec<GradientStop>) -> Result<Self> {
        if stops.is_empty() {
            return Err(MeshError::invalid("gradient needs at least one stop"));
        }
        if stops.len() > MAX_GRADIENT_STOPS {
            return Err(MeshError::invalid(format!(
                "gradient has {} stops, at most {MAX_GRADIENT_STOPS} are supported",
                stops.len()
            )));
        }
        let finite = |c: &Color| c.r.is_finite() && c.g.is_finite() && c.b.is_finite() && c.a.is_finite();
        if stops.iter().any(|s| !s.offset.is_finite() || !finite(&s.color)) {
            return Err(MeshError::invalid("gradient stops must be finite"));
        }
        for stop in &mut stops {
            stop.offset = stop.offset.clamp(0.0, 1.0);
        }
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Ok(Self { shape, stops })
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Same gradient mapped through `transform`; radii scale by `sqrt(|det|)`.
    pub fn transformed(&self, transform: &Transform2D) -> Self {
        Self {
            shape: self.shape.transformed(transform),
            stops: self.stops.clone(),
        }
    }

    /// Gradient parameter `t` at `point`, unclamped.
    pub fn parameter_at(&self, point: Vec2) -> f32 {
        match self.shape {
            GradientShape::Linear { start, end } => {
                let dir = end - start;
                let len_sq = dir.length_squared();
                if len_sq < f32::EPSILON {
                    return 0.0;
                }
                (point - start).dot(dir) / len_sq
            }
            GradientShape::Radial {
                start,
                start_radius,
                end,
                end_radius,
            } => radial_parameter(point, start, start_radius, end, end_radius),
        }
    }

    /// Interpolated color at parameter `t`, clamped to the first/last stop.
    pub fn color_at(&self, t: f32) -> Color {
        let Some(first) = self.stops.first() else {
            return Color::TRANSPARENT;
        };
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        if t <= first.offset {
            return first.color;
        }
        let mut prev = first;
        for stop in &self.stops[1..] {
            if t <= stop.offset {
                let range = stop.offset - prev.offset;
                if range < f32::EPSILON {
                    return stop.color;
                }
                return prev.color.lerp(stop.color, (t - prev.offset) / range);
            }
            prev = stop;
        }
        prev.color
    }

    pub fn sample(&self, point: Vec2) -> Color {
        self.color_at(self.parameter_at(point))
    }

    /// Whether any stop has alpha below one.
    pub fn is_translucent(&self) -> bool {
        self.stops.iter().any(|s| !s.color.is_opaque())
    }

    pub fn kind(&self) -> GradientKind {
        match self.shape {
            GradientShape::Linear { .. } => GradientKind::Linear,
            GradientShape::Radial { .. } => GradientKind::Radial,
        }
    }

    /// Geometry as a fixed-size vector.
    ///
    /// Linear: `[x0, y0, x1, y1, 0, 0]`. Radial: `[x0, y0, r0, x1, y1, r1]`.
    pub fn vector(&self) -> [f32; 6] {
        match self.shape {
            GradientShape::Linear { start, end } => [start.x, start.y, end.x, end.y, 0.0, 0.0],
            GradientShape::Radial {
                start,
                start_radius,
                end,
                end_radius,
            } => [start.x, start.y, start_radius, end.x, end.y, end_radius],
        }
    }

    /// Stops packed as `[offset, r, g, b, a] * n`, followed by a sentinel
    /// offset when fewer than [`MAX_GRADIENT_STOPS`] are used.
    pub fn packed_stops(&self) -> Vec<f32> {
        let mut packed = Vec::with_capacity(self.stops.len() * 5 + 1);
        for stop in &self.stops {
            packed.push(stop.offset);
            packed.extend_from_slice(&stop.color.to_array());
        }
        if self.stops.len() < MAX_GRADIENT_STOPS {
            packed.push(GRADIENT_STOP_SENTINEL);
        }
        packed
    }
}

/// Solve for the largest `t` such that `point` lies on the circle
/// interpolated between `(c0, r0)` and `(c1, r1)` with a non-negative radius.
fn radial_parameter(point: Vec2, c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> f32 {
    let cd = c1 - c0;
    let pd = point - c0;
    let dr = r1 - r0;

    let a = cd.length_squared() - dr * dr;
    let b = pd.dot(cd) + r0 * dr;
    let c = pd.length_squared() - r0 * r0;

    if a.abs() < 1e-6 {
        if b.abs() < 1e-6 {
            return 0.0;
        }
        let t = c / (2.0 * b);
        return if r0 + t * dr >= 0.0 { t } else { 0.0 };
    }

    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return 0.0;
    }
    let root = discriminant.sqrt();
    let t1 = (b + root) / a;
    let t2 = (b - root) / a;
    let (hi, lo) = if t1 > t2 { (t1, t2) } else { (t2, t1) };
    if r0 + hi * dr >= 0.0 {
        hi
    } else if r0 + lo * dr >= 0.0 {
        lo
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_to_blue() -> Vec<GradientStop> {
        vec![
            GradientStop::new(0.0, Color::RED),
            GradientStop::new(1.0, Color::BLUE),
        ]
    }

    #[test]
    fn test_arity_is_checked() {
        assert!(Gradient::new(GradientKind::Linear, &[0.0, 0.0, 1.0], red_to_blue()).is_err());
        assert!(Gradient::new(GradientKind::Radial, &[0.0; 6], red_to_blue()).is_ok());
        assert!(Gradient::new(GradientKind::Circular, &[0.0, 0.0, 5.0], red_to_blue()).is_ok());
    }

    #[test]
    fn test_circular_expands_to_radial() {
        let g = Gradient::new(GradientKind::Circular, &[3.0, 4.0, 10.0], red_to_blue()).unwrap();
        assert_eq!(g.kind(), GradientKind::Radial);
        assert_eq!(g.vector(), [3.0, 4.0, 0.0, 3.0, 4.0, 10.0]);
    }

    #[test]
    fn test_too_many_stops() {
        let stops = (0..9).map(|i| GradientStop::new(i as f32 / 8.0, Color::WHITE)).collect();
        let err = Gradient::new(GradientKind::Linear, &[0.0, 0.0, 1.0, 0.0], stops).unwrap_err();
        assert!(matches!(err, MeshError::InvalidArgument(_)));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Gradient::new(GradientKind::Linear, &[0.0, f32::NAN, 1.0, 0.0], red_to_blue()).is_err());
        let stops = vec![GradientStop {
            offset: f32::INFINITY,
            color: Color::RED,
        }];
        assert!(Gradient::new(GradientKind::Linear, &[0.0, 0.0, 1.0, 0.0], stops).is_err());
    }

    #[test]
    fn test_stops_sorted_and_clamped() {
        let stops = vec![
            GradientStop {
                offset: 1.5,
                color: Color::BLUE,
            },
            GradientStop {
                offset: -0.5,
                color: Color::RED,
            },
        ];
        let g = Gradient::linear(Vec2::ZERO, Vec2::X, stops).unwrap();
        assert_eq!(g.stops()[0].offset, 0.0);
        assert_eq!(g.stops()[0].color, Color::RED);
        assert_eq!(g.stops()[1].offset, 1.0);
    }

    #[test]
    fn test_linear_sample() {
        let g = Gradient::linear(Vec2::ZERO, Vec2::new(100.0, 0.0), red_to_blue()).unwrap();
        let mid = g.sample(Vec2::new(50.0, 20.0));
        assert!((mid.r - 0.5).abs() < 0.01);
        assert!((mid.b - 0.5).abs() < 0.01);
        assert_eq!(g.sample(Vec2::new(-10.0, 0.0)), Color::RED);
        assert_eq!(g.sample(Vec2::new(200.0, 0.0)), Color::BLUE);
    }

    #[test]
    fn test_circular_parameter() {
        let g = Gradient::circular(Vec2::ZERO, 10.0, red_to_blue()).unwrap();
        assert!(g.parameter_at(Vec2::ZERO).abs() < 1e-5);
        assert!((g.parameter_at(Vec2::new(5.0, 0.0)) - 0.5).abs() < 1e-5);
        assert!((g.parameter_at(Vec2::new(0.0, 10.0)) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_packed_stops_layout() {
        let g = Gradient::linear(Vec2::ZERO, Vec2::X, red_to_blue()).unwrap();
        let packed = g.packed_stops();
        assert_eq!(packed.len(), 11);
        assert_eq!(&packed[..5], &[0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(packed[10], GRADIENT_STOP_SENTINEL);

        let full = (0..MAX_GRADIENT_STOPS)
            .map(|i| GradientStop::new(i as f32 / 7.0, Color::WHITE))
            .collect();
        let g = Gradient::linear(Vec2::ZERO, Vec2::X, full).unwrap();
        assert_eq!(g.packed_stops().len(), MAX_GRADIENT_STOPS * 5);
    }

    #[test]
    fn test_transformed_radii_use_uniform_scale() {
        let g = Gradient::circular(Vec2::new(1.0, 1.0), 10.0, red_to_blue()).unwrap();
        let t = Transform2D::scale_xy(Vec2::new(2.0, 8.0));
        let world = g.transformed(&t);
        assert_eq!(world.vector(), [2.0, 8.0, 0.0, 2.0, 8.0, 40.0]);
    }

    #[test]
    fn test_translucency() {
        let g = Gradient::linear(Vec2::ZERO, Vec2::X, red_to_blue()).unwrap();
        assert!(!g.is_translucent());
        let g = Gradient::linear(
            Vec2::ZERO,
            Vec2::X,
            vec![GradientStop::new(0.0, Color::RED.with_alpha_factor(0.5))],
        )
        .unwrap();
        assert!(g.is_translucent());
    }
}
