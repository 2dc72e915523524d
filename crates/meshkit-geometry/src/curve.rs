//! Curve primitives and their adaptive flattening.

use glam::Vec2;
use lyon::geom::{ArcFlags, SvgArc};
use lyon::math::{Angle, Point, Vector};

/// Recursion cap for bezier subdivision; deep enough for any curve that fits
/// in a few thousand device pixels.
const MAX_SUBDIVISION_DEPTH: u32 = 16;

/// Distance from `p` to the segment `a..b`.
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// A quadratic Bezier curve (one control point).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticBezier {
    pub from: Vec2,
    pub control: Vec2,
    pub to: Vec2,
}

impl QuadraticBezier {
    pub fn new(from: Vec2, control: Vec2, to: Vec2) -> Self {
        Self { from, control, to }
    }

    /// Evaluate the curve at parameter t (0.0 to 1.0).
    pub fn eval(&self, t: f32) -> Vec2 {
        let mt = 1.0 - t;
        self.from * (mt * mt) + self.control * (2.0 * mt * t) + self.to * (t * t)
    }

    /// Exact degree elevation.
    pub fn to_cubic(&self) -> CubicBezier {
        CubicBezier::new(
            self.from,
            self.from + (self.control - self.from) * (2.0 / 3.0),
            self.to + (self.control - self.to) * (2.0 / 3.0),
            self.to,
        )
    }

    /// Append the flattened polyline, excluding `from`, to `out`.
    pub fn flatten_into(&self, tolerance: f32, out: &mut Vec<Vec2>) {
        self.to_cubic().flatten_into(tolerance, out);
    }
}

/// A cubic Bezier curve (two control points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub from: Vec2,
    pub control1: Vec2,
    pub control2: Vec2,
    pub to: Vec2,
}

impl CubicBezier {
    pub fn new(from: Vec2, control1: Vec2, control2: Vec2, to: Vec2) -> Self {
        Self {
            from,
            control1,
            control2,
            to,
        }
    }

    /// Evaluate the curve at parameter t (0.0 to 1.0).
    pub fn eval(&self, t: f32) -> Vec2 {
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let t2 = t * t;
        self.from * (mt2 * mt)
            + self.control1 * (3.0 * mt2 * t)
            + self.control2 * (3.0 * mt * t2)
            + self.to * (t2 * t)
    }

    /// Split the curve at parameter t (de Casteljau).
    pub fn split(&self, t: f32) -> (Self, Self) {
        let p01 = self.from.lerp(self.control1, t);
        let p12 = self.control1.lerp(self.control2, t);
        let p23 = self.control2.lerp(self.to, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        let p0123 = p012.lerp(p123, t);

        (
            Self::new(self.from, p01, p012, p0123),
            Self::new(p0123, p123, p23, self.to),
        )
    }

    /// Whether the chord is within `tolerance` of every point on the curve.
    ///
    /// The curve lies in the convex hull of its control points and the
    /// distance to a segment is convex, so checking the two inner control
    /// points bounds the deviation of the whole curve.
    pub fn is_flat(&self, tolerance: f32) -> bool {
        distance_to_segment(self.control1, self.from, self.to) <= tolerance
            && distance_to_segment(self.control2, self.from, self.to) <= tolerance
    }

    /// Append the flattened polyline, excluding `from`, to `out`.
    pub fn flatten_into(&self, tolerance: f32, out: &mut Vec<Vec2>) {
        self.subdivide(tolerance, 0, out);
    }

    fn subdivide(&self, tolerance: f32, depth: u32, out: &mut Vec<Vec2>) {
        if depth >= MAX_SUBDIVISION_DEPTH || self.is_flat(tolerance) {
            out.push(self.to);
            return;
        }
        let (a, b) = self.split(0.5);
        a.subdivide(tolerance, depth + 1, out);
        b.subdivide(tolerance, depth + 1, out);
    }
}

/// An SVG-style elliptical arc segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticalArc {
    pub from: Vec2,
    pub to: Vec2,
    pub radii: Vec2,
    /// Rotation of the ellipse x axis, in radians.
    pub x_rotation: f32,
    pub large_arc: bool,
    pub sweep: bool,
}

impl EllipticalArc {
    /// Append the flattened polyline, excluding `from`, to `out`.
    ///
    /// Degenerate radii turn the arc into a straight line, as in SVG.
    pub fn flatten_into(&self, tolerance: f32, out: &mut Vec<Vec2>) {
        if self.from.distance_squared(self.to) <= f32::EPSILON {
            return;
        }
        if self.radii.x.abs() <= f32::EPSILON || self.radii.y.abs() <= f32::EPSILON {
            out.push(self.to);
            return;
        }

        let arc = SvgArc {
            from: Point::new(self.from.x, self.from.y),
            to: Point::new(self.to.x, self.to.y),
            radii: Vector::new(self.radii.x.abs(), self.radii.y.abs()),
            x_rotation: Angle::radians(self.x_rotation),
            flags: ArcFlags {
                large_arc: self.large_arc,
                sweep: self.sweep,
            },
        }
        .to_arc();

        let sweep = arc.sweep_angle.radians.abs();
        let radius = arc.radii.x.abs().max(arc.radii.y.abs());
        let steps = arc_step_count(sweep, radius, tolerance);
        for i in 1..steps {
            let p = arc.sample(i as f32 / steps as f32);
            out.push(Vec2::new(p.x, p.y));
        }
        out.push(self.to);
    }
}

/// Number of chords needed so the sagitta of each stays within `tolerance`.
pub(crate) fn arc_step_count(sweep: f32, radius: f32, tolerance: f32) -> usize {
    if sweep <= f32::EPSILON || radius <= f32::EPSILON {
        return 1;
    }
    let step = if tolerance < radius {
        2.0 * (1.0 - tolerance / radius).acos()
    } else {
        std::f32::consts::FRAC_PI_2
    };
    ((sweep / step.max(1e-4)).ceil() as usize).clamp(1, 4096)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_cubic_is_single_segment() {
        let c = CubicBezier::new(
            Vec2::ZERO,
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(3.0, 0.0),
        );
        let mut out = Vec::new();
        c.flatten_into(0.1, &mut out);
        assert_eq!(out, vec![Vec2::new(3.0, 0.0)]);
    }

    #[test]
    fn test_tighter_tolerance_produces_more_points() {
        let c = CubicBezier::new(
            Vec2::ZERO,
            Vec2::new(0.0, 100.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 0.0),
        );
        let mut coarse = Vec::new();
        let mut fine = Vec::new();
        c.flatten_into(1.0, &mut coarse);
        c.flatten_into(0.01, &mut fine);
        assert!(fine.len() > coarse.len());
        assert_eq!(*fine.last().unwrap(), c.to);
    }

    #[test]
    fn test_quad_elevation_matches() {
        let q = QuadraticBezier::new(Vec2::ZERO, Vec2::new(50.0, 100.0), Vec2::new(100.0, 0.0));
        let c = q.to_cubic();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!(q.eval(t).distance(c.eval(t)) < 1e-3);
        }
    }

    #[test]
    fn test_half_circle_arc_stays_on_circle() {
        let arc = EllipticalArc {
            from: Vec2::new(-10.0, 0.0),
            to: Vec2::new(10.0, 0.0),
            radii: Vec2::splat(10.0),
            x_rotation: 0.0,
            large_arc: false,
            sweep: true,
        };
        let mut out = Vec::new();
        arc.flatten_into(0.05, &mut out);
        assert!(out.len() > 4);
        for p in &out {
            assert!((p.length() - 10.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_zero_radius_arc_is_line() {
        let arc = EllipticalArc {
            from: Vec2::ZERO,
            to: Vec2::new(5.0, 5.0),
            radii: Vec2::ZERO,
            x_rotation: 0.0,
            large_arc: false,
            sweep: false,
        };
        let mut out = Vec::new();
        arc.flatten_into(0.1, &mut out);
        assert_eq!(out, vec![Vec2::new(5.0, 5.0)]);
    }
}
