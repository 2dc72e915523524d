//! Polyline stroke extrusion.
//!
//! Walks a contour one vertex at a time and emits two offset rails, `left` on
//! the side of the segment normal `perp(dir)` and `right` on the other. Every
//! rail point is also appended to a triangle strip as it is produced, so the
//! stroke is already triangulated when the walk ends.

use std::f32::consts::PI;

use glam::Vec2;
use meshkit_core::Result;
use meshkit_core::profiling::profile_function;

use crate::contour::{Contour, Contours};
use crate::stroke::{LineCap, LineJoin, StrokeStyle};
use crate::vertex::TessellatedMesh;

const COINCIDENT_EPSILON: f32 = 1e-6;
/// Segments whose directions differ by less than this cross product are collinear.
const STRAIGHT_EPSILON: f32 = 1e-6;

/// Join geometry actually emitted at a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Miter,
    Bevel,
    Round,
}

/// Extruded outline of a single contour.
#[derive(Debug, Clone, Default)]
pub struct StrokeGeometry {
    pub left: Vec<Vec2>,
    pub right: Vec<Vec2>,
    /// One entry per joined vertex, in walk order.
    pub joins: Vec<JoinKind>,
    pub mesh: TessellatedMesh<Vec2>,
}

impl StrokeGeometry {
    /// The closed outline polygon: the left rail followed by the right rail reversed.
    pub fn outline(&self) -> Vec<Vec2> {
        self.left
            .iter()
            .chain(self.right.iter().rev())
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }
}

/// Extrude every contour (dashed first when the style has a dash pattern)
/// into one triangle list.
pub fn extrude(contours: &Contours, style: &StrokeStyle, max_miter: f32) -> Result<TessellatedMesh<Vec2>> {
    profile_function!();
    style.validate()?;
    let mut mesh = TessellatedMesh::new();
    if style.width <= 0.0 {
        return Ok(mesh);
    }

    let dashed;
    let pieces: &[Contour] = match &style.dash {
        Some(dash) => {
            dashed = contours.dash(&dash.pattern, dash.offset)?;
            &dashed
        }
        None => contours.as_slice(),
    };

    for contour in pieces {
        mesh.append(extrude_contour(contour, style, max_miter).mesh);
    }
    tracing::trace!(
        contours = pieces.len(),
        vertices = mesh.vertex_count(),
        "extruded stroke"
    );
    Ok(mesh)
}

/// Extrude one contour.
pub fn extrude_contour(contour: &Contour, style: &StrokeStyle, max_miter: f32) -> StrokeGeometry {
    let extruder = Extruder {
        half: style.half_width(),
        style,
        max_miter,
    };
    if extruder.half <= 0.0 {
        return StrokeGeometry::default();
    }

    let mut points = Vec::with_capacity(contour.points.len());
    for p in &contour.points {
        if points
            .last()
            .is_none_or(|last: &Vec2| last.distance(*p) > COINCIDENT_EPSILON)
        {
            points.push(*p);
        }
    }

    if contour.closed {
        let mut ring = points.clone();
        if ring.len() > 1 && ring[0].distance(ring[ring.len() - 1]) <= COINCIDENT_EPSILON {
            ring.pop();
        }
        if ring.len() >= 3 {
            return extruder.ring(&ring);
        }
    }
    extruder.open(&points)
}

struct Extruder<'a> {
    half: f32,
    style: &'a StrokeStyle,
    max_miter: f32,
}

enum Join {
    Miter {
        left: Vec2,
        right: Vec2,
    },
    Bevel {
        kind: JoinKind,
        inner_left: bool,
        inner: Vec2,
        outer_in: Vec2,
        fan: Vec<Vec2>,
        outer_out: Vec2,
    },
}

impl Extruder<'_> {
    fn open(&self, points: &[Vec2]) -> StrokeGeometry {
        let n = points.len();
        if n < 2 {
            return StrokeGeometry::default();
        }
        let h = self.half;
        let cap = self.style.cap;
        let segments = self.style.round_segments.max(1);

        let first_dir = (points[1] - points[0]).normalize();
        let last_dir = (points[n - 1] - points[n - 2]).normalize();
        let (mut start, mut end) = (points[0], points[n - 1]);
        if cap == LineCap::Square {
            start -= first_dir * h;
            end += last_dir * h;
        }

        let mut rails = Rails::default();

        let start_normal = first_dir.perp() * h;
        if cap.rounds_start() {
            rails.push_right(start - start_normal);
            for i in 1..segments {
                let angle = -PI * i as f32 / segments as f32;
                rails.push_left(start + Vec2::from_angle(angle).rotate(-start_normal));
            }
            rails.push_left(start + start_normal);
        } else {
            rails.push_left(start + start_normal);
            rails.push_right(start - start_normal);
        }

        for i in 1..n - 1 {
            let join = self.plan_join(points[i - 1], points[i], points[i + 1]);
            rails.join(join);
        }

        let end_normal = last_dir.perp() * h;
        rails.push_left(end + end_normal);
        rails.push_right(end - end_normal);
        if cap.rounds_end() {
            for i in 1..segments {
                let angle = PI * i as f32 / segments as f32;
                rails.push_right(end + Vec2::from_angle(angle).rotate(-end_normal));
            }
        }

        rails.geometry
    }

    /// Closed contours start on the exit side of the join at the first vertex
    /// and finish by emitting that join in full, so the strip closes on itself
    /// without separate start or end extrusions.
    fn ring(&self, points: &[Vec2]) -> StrokeGeometry {
        let m = points.len();
        let plan = |i: usize| self.plan_join(points[(i + m - 1) % m], points[i], points[(i + 1) % m]);

        let mut rails = Rails::default();
        let first = plan(0);
        rails.exit(&first);
        for i in 1..m {
            rails.join(plan(i));
        }
        rails.join(first);
        rails.geometry
    }

    fn plan_join(&self, prev: Vec2, cur: Vec2, next: Vec2) -> Join {
        let h = self.half;
        let dir_a = (cur - prev).normalize();
        let dir_b = (next - cur).normalize();
        let normal_a = dir_a.perp();
        let normal_b = dir_b.perp();
        let cross = dir_a.perp_dot(dir_b);

        if cross.abs() <= STRAIGHT_EPSILON && dir_a.dot(dir_b) > 0.0 {
            return Join::Miter {
                left: cur + normal_a * h,
                right: cur - normal_a * h,
            };
        }

        let miter = (dir_a + dir_b).normalize_or_zero().perp();
        let denom = miter.dot(normal_a);
        let miter_len = if denom.abs() > f32::EPSILON {
            (h / denom).abs().min(self.max_miter)
        } else {
            self.max_miter
        };

        let kind = match self.style.join {
            LineJoin::Miter if miter_len <= self.style.miter_limit * h => {
                return Join::Miter {
                    left: cur + miter * miter_len,
                    right: cur - miter * miter_len,
                };
            }
            LineJoin::Miter | LineJoin::Bevel => JoinKind::Bevel,
            LineJoin::Round => JoinKind::Round,
        };

        // The inner rail meets on the miter line, pulled in so it never passes
        // the adjacent segments or the miter limit.
        let reach = miter_len
            .min(prev.distance(cur))
            .min(cur.distance(next))
            .min(self.style.miter_limit * h)
            .max(h);
        let inner_left = cross > 0.0;
        let side = if inner_left { 1.0 } else { -1.0 };
        let outer_in = cur - normal_a * (h * side);
        let outer_out = cur - normal_b * (h * side);

        let fan = if kind == JoinKind::Round {
            let turn = cross.atan2(dir_a.dot(dir_b));
            let step = PI / self.style.round_segments.max(1) as f32;
            let steps = ((turn.abs() / step).ceil() as usize).max(1);
            (1..steps)
                .map(|i| cur + Vec2::from_angle(turn * i as f32 / steps as f32).rotate(outer_in - cur))
                .collect()
        } else {
            Vec::new()
        };

        Join::Bevel {
            kind,
            inner_left,
            inner: cur + miter * (reach * side),
            outer_in,
            fan,
            outer_out,
        }
    }
}

#[derive(Default)]
struct Rails {
    geometry: StrokeGeometry,
    last_left: Option<u32>,
    last_right: Option<u32>,
}

impl Rails {
    fn vertex(&mut self, p: Vec2) -> u32 {
        let index = self.geometry.mesh.vertices.len() as u32;
        self.geometry.mesh.vertices.push(p);
        index
    }

    fn push_left(&mut self, p: Vec2) {
        let index = self.vertex(p);
        self.geometry.left.push(p);
        if let (Some(l), Some(r)) = (self.last_left, self.last_right) {
            self.geometry.mesh.indices.extend_from_slice(&[l, r, index]);
        }
        self.last_left = Some(index);
    }

    fn push_right(&mut self, p: Vec2) {
        let index = self.vertex(p);
        self.geometry.right.push(p);
        if let (Some(l), Some(r)) = (self.last_left, self.last_right) {
            self.geometry.mesh.indices.extend_from_slice(&[l, r, index]);
        }
        self.last_right = Some(index);
    }

    /// Emit the points a join leaves the vertex with, without triangles.
    fn exit(&mut self, join: &Join) {
        match join {
            Join::Miter { left, right } => {
                self.push_left(*left);
                self.push_right(*right);
            }
            Join::Bevel {
                inner_left: true,
                inner,
                outer_out,
                ..
            } => {
                self.push_left(*inner);
                self.push_right(*outer_out);
            }
            Join::Bevel {
                inner, outer_out, ..
            } => {
                self.push_left(*outer_out);
                self.push_right(*inner);
            }
        }
    }

    fn join(&mut self, join: Join) {
        match join {
            Join::Miter { left, right } => {
                self.geometry.joins.push(JoinKind::Miter);
                self.push_left(left);
                self.push_right(right);
            }
            Join::Bevel {
                kind,
                inner_left,
                inner,
                outer_in,
                fan,
                outer_out,
            } => {
                self.geometry.joins.push(kind);
                if inner_left {
                    self.push_left(inner);
                    self.push_right(outer_in);
                    for p in fan {
                        self.push_right(p);
                    }
                    self.push_right(outer_out);
                } else {
                    self.push_right(inner);
                    self.push_left(outer_in);
                    for p in fan {
                        self.push_left(p);
                    }
                    self.push_left(outer_out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshkit_core::Color;

    const MAX_MITER: f32 = 1e20;

    fn open(points: &[Vec2]) -> Contour {
        Contour::new(points.to_vec(), false)
    }

    fn style(width: f32) -> StrokeStyle {
        StrokeStyle::solid(Color::BLACK, width)
    }

    #[test]
    fn test_butt_segment_is_a_quad() {
        let g = extrude_contour(&open(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]), &style(2.0), MAX_MITER);
        assert_eq!(g.left, vec![Vec2::new(0.0, 1.0), Vec2::new(10.0, 1.0)]);
        assert_eq!(g.right, vec![Vec2::new(0.0, -1.0), Vec2::new(10.0, -1.0)]);
        assert_eq!(g.mesh.triangle_count(), 2);
        assert!(g.joins.is_empty());
    }

    #[test]
    fn test_square_cap_extends_endpoints() {
        let s = style(2.0).with_cap(LineCap::Square);
        let g = extrude_contour(&open(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]), &s, MAX_MITER);
        assert_eq!(g.left[0], Vec2::new(-1.0, 1.0));
        assert_eq!(g.right[1], Vec2::new(11.0, -1.0));
    }

    #[test]
    fn test_round_caps_lie_on_circle() {
        let s = style(4.0).with_cap(LineCap::Round).with_round_segments(8);
        let g = extrude_contour(&open(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]), &s, MAX_MITER);
        // 7 fan points per cap on top of the 4 butt points.
        assert_eq!(g.mesh.vertex_count(), 4 + 14);
        for p in &g.left[..7] {
            assert!((p.length() - 2.0).abs() < 1e-4);
            assert!(p.x <= 1e-4, "start cap must sit behind the start point");
        }
        for p in &g.right[2..] {
            assert!((p.distance(Vec2::new(10.0, 0.0)) - 2.0).abs() < 1e-4);
            assert!(p.x >= 10.0 - 1e-4);
        }
    }

    #[test]
    fn test_round_start_only() {
        let s = style(4.0).with_cap(LineCap::RoundStart).with_round_segments(4);
        let g = extrude_contour(&open(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]), &s, MAX_MITER);
        assert_eq!(g.left.len(), 3 + 2);
        assert_eq!(g.right.len(), 2);
    }

    #[test]
    fn test_right_angle_miter() {
        let g = extrude_contour(
            &open(&[Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)]),
            &style(2.0),
            MAX_MITER,
        );
        assert_eq!(g.joins, vec![JoinKind::Miter]);
        let corner = Vec2::new(10.0, 0.0);
        assert!((g.left[1].distance(corner) - 2f32.sqrt()).abs() < 1e-4);
        assert!((g.right[1].distance(corner) - 2f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_round_join_fan() {
        let s = style(2.0).with_join(LineJoin::Round).with_round_segments(4);
        let corner = Vec2::new(10.0, 0.0);
        let g = extrude_contour(&open(&[Vec2::ZERO, corner, Vec2::new(10.0, 10.0)]), &s, MAX_MITER);
        assert_eq!(g.joins, vec![JoinKind::Round]);
        // Left turn: the fan runs along the right rail.
        let fan = &g.right[1..g.right.len() - 1];
        assert!(fan.len() >= 3);
        for p in fan {
            assert!((p.distance(corner) - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_reversal_does_not_produce_nan() {
        let g = extrude_contour(
            &open(&[Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::ZERO]),
            &style(2.0),
            MAX_MITER,
        );
        assert_eq!(g.joins, vec![JoinKind::Bevel]);
        assert!(g.mesh.vertices.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_closed_triangle_ring() {
        let contour = Contour::new(
            vec![Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0), Vec2::ZERO],
            true,
        );
        let g = extrude_contour(&contour, &style(1.0), MAX_MITER);
        assert_eq!(g.joins.len(), 3);
        assert_eq!(g.left.first(), g.left.last());
        assert_eq!(g.right.first(), g.right.last());
    }

    #[test]
    fn test_zero_width_is_empty() {
        let g = extrude_contour(&open(&[Vec2::ZERO, Vec2::X]), &style(0.0), MAX_MITER);
        assert!(g.is_empty());
    }

    #[test]
    fn test_dashed_extrusion_has_one_quad_per_dash() {
        let contours = Contours::new(vec![open(&[Vec2::ZERO, Vec2::new(100.0, 0.0)])], 1.0);
        let mesh = extrude(&contours, &style(2.0).dashed(10.0, 10.0), MAX_MITER).unwrap();
        assert_eq!(mesh.vertex_count(), 5 * 4);
        assert_eq!(mesh.triangle_count(), 5 * 2);
    }

    #[test]
    fn test_outline_polygon_order() {
        let g = extrude_contour(&open(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]), &style(2.0), MAX_MITER);
        assert_eq!(
            g.outline(),
            vec![
                Vec2::new(0.0, 1.0),
                Vec2::new(10.0, 1.0),
                Vec2::new(10.0, -1.0),
                Vec2::new(0.0, -1.0)
            ]
        );
    }
}
