//! Flattened contours and arc-length queries.
//!
//! A [`Contour`] is a polyline produced by flattening one sub-path of a
//! [`Figure`](crate::Figure). [`Contours`] groups the sub-paths of one figure
//! and caches their total length.

use std::sync::OnceLock;

use glam::Vec2;
use meshkit_core::profiling::profile_function;
use meshkit_core::{MeshError, Result};

use crate::curve::{CubicBezier, EllipticalArc, QuadraticBezier, distance_to_segment};
use crate::path::PathCommand;

/// Points closer than this are treated as coincident.
const COINCIDENT_EPSILON: f32 = 1e-6;

/// A flattened sub-path.
///
/// Closed contours repeat their first point at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Vec2>,
    pub closed: bool,
}

impl Contour {
    pub fn new(points: Vec<Vec2>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of the segment lengths.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Number of line segments.
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Self { min, max })
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Grow the box by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// A point on the outline and the direction of travel there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAtLength {
    pub position: Vec2,
    /// Tangent angle in radians.
    pub angle: f32,
}

impl PointAtLength {
    const ORIGIN: Self = Self {
        position: Vec2::ZERO,
        angle: 0.0,
    };
}

/// Result of cutting contours at an arc length.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Everything before the cut, ending at `point`.
    pub head: Vec<Contour>,
    /// Everything after the cut, starting at `point`. `None` unless the rest was requested.
    pub tail: Option<Vec<Contour>>,
    pub point: Vec2,
}

/// All contours of a figure flattened at one scale.
#[derive(Debug)]
pub struct Contours {
    contours: Vec<Contour>,
    scale: f32,
    total_length: OnceLock<f32>,
}

impl Clone for Contours {
    fn clone(&self) -> Self {
        Self::new(self.contours.clone(), self.scale)
    }
}

impl PartialEq for Contours {
    fn eq(&self, other: &Self) -> bool {
        self.scale == other.scale && self.contours == other.contours
    }
}

impl Contours {
    /// Wrap already-flattened contours. Contours with fewer than two points are dropped.
    pub fn new(mut contours: Vec<Contour>, scale: f32) -> Self {
        contours.retain(|c| c.points.len() >= 2);
        Self {
            contours,
            scale,
            total_length: OnceLock::new(),
        }
    }

    /// Flatten path commands into contours.
    ///
    /// Curves are subdivided until they stay within `tolerance / scale` of
    /// their chords. Zero-length segments are dropped, and Douglas–Peucker
    /// simplification runs when `simplify > 0`.
    pub fn flatten(commands: &[PathCommand], scale: f32, simplify: f32, tolerance: f32) -> Self {
        profile_function!();
        let tolerance = tolerance / scale.max(f32::EPSILON);
        let mut builder = ContourBuilder::default();
        let mut scratch = Vec::new();

        for command in commands {
            match *command {
                PathCommand::MoveTo(to) => builder.move_to(to),
                PathCommand::LineTo(to) => builder.line_to(to),
                PathCommand::QuadTo { control, to } => {
                    scratch.clear();
                    QuadraticBezier::new(builder.pen, control, to)
                        .flatten_into(tolerance, &mut scratch);
                    builder.extend(&scratch);
                }
                PathCommand::CubicTo {
                    control1,
                    control2,
                    to,
                } => {
                    scratch.clear();
                    CubicBezier::new(builder.pen, control1, control2, to)
                        .flatten_into(tolerance, &mut scratch);
                    builder.extend(&scratch);
                }
                PathCommand::ArcTo {
                    radii,
                    x_rotation,
                    large_arc,
                    sweep,
                    to,
                } => {
                    scratch.clear();
                    EllipticalArc {
                        from: builder.pen,
                        to,
                        radii,
                        x_rotation,
                        large_arc,
                        sweep,
                    }
                    .flatten_into(tolerance, &mut scratch);
                    builder.extend(&scratch);
                    // Keep the pen exact even if the arc collapsed.
                    builder.pen = to;
                }
                PathCommand::Close => builder.close(),
            }
        }

        let mut contours = builder.finish();
        if simplify > 0.0 {
            for contour in &mut contours {
                contour.points = simplify_polyline(&contour.points, simplify);
            }
        }
        Self::new(contours, scale)
    }

    /// The scale these contours were flattened at.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn as_slice(&self) -> &[Contour] {
        &self.contours
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contour> {
        self.contours.iter()
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn into_vec(self) -> Vec<Contour> {
        self.contours
    }

    /// Bounding box of every point, or `None` when there are no contours.
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.contours.iter().flat_map(|c| c.points.iter()))
    }

    /// Sum of all segment lengths. Computed once.
    pub fn total_length(&self) -> f32 {
        *self
            .total_length
            .get_or_init(|| self.contours.iter().map(Contour::length).sum())
    }

    /// Point and tangent angle at `length` along the outline.
    ///
    /// `length` is clamped to `[0, total_length]`; at either end the angle of
    /// the first or last segment is reported.
    pub fn point_at_length(&self, length: f32) -> Result<PointAtLength> {
        if !length.is_finite() {
            return Err(MeshError::invalid(format!(
                "point_at_length requires a finite length, got {length}"
            )));
        }
        let (Some(first), Some(last)) = (self.contours.first(), self.contours.last()) else {
            return Ok(PointAtLength::ORIGIN);
        };

        if length <= 0.0 {
            return Ok(PointAtLength {
                position: first.points[0],
                angle: segment_angle(first.points[0], first.points[1]),
            });
        }
        let total = self.total_length();
        if length >= total {
            let n = last.points.len();
            return Ok(PointAtLength {
                position: last.points[n - 1],
                angle: segment_angle(last.points[n - 2], last.points[n - 1]),
            });
        }

        let mut walked = 0.0;
        for contour in &self.contours {
            for w in contour.points.windows(2) {
                let segment = w[0].distance(w[1]);
                if walked + segment >= length {
                    let t = (length - walked) / segment;
                    return Ok(PointAtLength {
                        position: w[0].lerp(w[1], t),
                        angle: segment_angle(w[0], w[1]),
                    });
                }
                walked += segment;
            }
        }

        // Accumulated rounding can leave `length` a hair past the last segment.
        let n = last.points.len();
        Ok(PointAtLength {
            position: last.points[n - 1],
            angle: segment_angle(last.points[n - 2], last.points[n - 1]),
        })
    }

    /// Cut the outline at `length`, inserting an exact vertex at the cut.
    ///
    /// The tail is only materialized when `keep_rest` is set.
    pub fn split_at_length(&self, length: f32, keep_rest: bool) -> Result<Split> {
        if !length.is_finite() {
            return Err(MeshError::invalid(format!(
                "split_at_length requires a finite length, got {length}"
            )));
        }
        Ok(split_contours(&self.contours, length, keep_rest))
    }

    /// The "on" pieces of a dash pattern laid along the outline.
    ///
    /// On/off parity alternates across the whole walk, so odd-length patterns
    /// behave as if repeated twice. A negative `offset` steps backward through
    /// the cycle. An empty pattern or one summing to zero leaves the contours
    /// undashed, as does a pattern too fine to walk in [`MAX_DASH_INTERVALS`]
    /// steps. A dash crossing the start of a closed contour comes out as one
    /// piece.
    pub fn dash(&self, pattern: &[f32], offset: f32) -> Result<Vec<Contour>> {
        profile_function!();
        if let Some(bad) = pattern.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(MeshError::invalid(format!(
                "dash lengths must be finite and non-negative, got {bad}"
            )));
        }
        if !offset.is_finite() {
            return Err(MeshError::invalid("dash offset must be finite"));
        }
        let sum: f32 = pattern.iter().sum();
        if pattern.is_empty() || sum <= 0.0 {
            return Ok(self.contours.clone());
        }

        let cycle: Vec<f32> = if pattern.len() % 2 == 1 {
            pattern.repeat(2)
        } else {
            pattern.to_vec()
        };
        let cycle_length: f64 = cycle.iter().map(|v| f64::from(*v)).sum();

        let intervals = f64::from(self.total_length()) / cycle_length * cycle.len() as f64;
        if intervals > MAX_DASH_INTERVALS {
            tracing::warn!(
                "Dash pattern needs about {:.0} intervals, stroking undashed",
                intervals
            );
            return Ok(self.contours.clone());
        }

        let mut phase = f64::from(offset).rem_euclid(cycle_length);
        let mut index = 0;
        while phase > 0.0 && phase >= f64::from(cycle[index]) {
            phase -= f64::from(cycle[index]);
            index = (index + 1) % cycle.len();
        }

        let mut cursor = DashCursor {
            left: f64::from(cycle[index]) - phase,
            cycle: &cycle,
            index,
        };
        let mut dashes = Vec::new();
        for contour in &self.contours {
            cursor.walk(contour, &mut dashes);
        }
        dashes.retain(|c| c.points.len() >= 2);
        Ok(dashes)
    }
}

/// Dash walks needing more on/off intervals than this are left undashed.
pub const MAX_DASH_INTERVALS: f64 = 1_000_000.0;

/// Position inside a dash cycle, carried across segments and contours.
struct DashCursor<'a> {
    cycle: &'a [f32],
    index: usize,
    /// Length still to walk in the current interval.
    left: f64,
}

impl DashCursor<'_> {
    fn starts_dash(&self) -> bool {
        self.index % 2 == 0 && self.left > 0.0
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % self.cycle.len();
        self.left = f64::from(self.cycle[self.index]);
    }

    /// Emit the "on" pieces of `contour` and move the cursor past it.
    fn walk(&mut self, contour: &Contour, dashes: &mut Vec<Contour>) {
        let Some(&start) = contour.points.first() else {
            return;
        };
        let mut current = self.starts_dash().then(|| vec![start]);
        let opening = current.is_some().then_some(dashes.len());

        for w in contour.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let segment = f64::from(a.distance(b));
            if segment <= 0.0 {
                continue;
            }
            let mut pos = 0.0;
            loop {
                if self.left <= 0.0 {
                    if let Some(points) = current.take() {
                        dashes.push(Contour::new(points, false));
                    }
                    self.advance();
                    if self.starts_dash() {
                        current = Some(vec![a.lerp(b, (pos / segment) as f32)]);
                    }
                    continue;
                }
                let next = pos + self.left;
                if next >= segment {
                    self.left = next - segment;
                    if let Some(points) = &mut current {
                        points.push(b);
                    }
                    break;
                }
                if let Some(points) = &mut current {
                    points.push(a.lerp(b, (next / segment) as f32));
                }
                pos = next;
                self.left = 0.0;
            }
        }

        let Some(mut points) = current else {
            return;
        };
        match opening {
            // Still on after a full lap: the whole contour is one dash.
            Some(first) if first == dashes.len() => {
                dashes.push(Contour::new(points, contour.closed));
            }
            // The dash runs on past the start point into the opening dash.
            Some(first) if contour.closed && self.left > f64::from(COINCIDENT_EPSILON) => {
                let head = std::mem::take(&mut dashes[first].points);
                points.extend_from_slice(&head[1..]);
                dashes[first].points = points;
            }
            _ => dashes.push(Contour::new(points, false)),
        }
    }
}

fn segment_angle(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

fn split_contours(contours: &[Contour], length: f32, keep_rest: bool) -> Split {
    let start = contours
        .first()
        .map(|c| c.points[0])
        .unwrap_or(Vec2::ZERO);
    if length <= 0.0 {
        return Split {
            head: Vec::new(),
            tail: keep_rest.then(|| contours.to_vec()),
            point: start,
        };
    }

    let mut head = Vec::new();
    let mut walked = 0.0;
    for (ci, contour) in contours.iter().enumerate() {
        let contour_length = contour.length();
        if walked + contour_length < length {
            head.push(contour.clone());
            walked += contour_length;
            continue;
        }

        for (si, w) in contour.points.windows(2).enumerate() {
            let segment = w[0].distance(w[1]);
            if walked + segment < length {
                walked += segment;
                continue;
            }
            let t = ((length - walked) / segment).clamp(0.0, 1.0);
            let cut = w[0].lerp(w[1], t);

            let mut head_points = contour.points[..=si].to_vec();
            if head_points
                .last()
                .is_none_or(|p| p.distance(cut) > COINCIDENT_EPSILON)
            {
                head_points.push(cut);
            }
            if head_points.len() >= 2 {
                head.push(Contour::new(head_points, false));
            }

            let tail = keep_rest.then(|| {
                let mut rest_points = vec![cut];
                let after = &contour.points[si + 1..];
                if after
                    .first()
                    .is_some_and(|p| p.distance(cut) <= COINCIDENT_EPSILON)
                {
                    rest_points.extend_from_slice(&after[1..]);
                } else {
                    rest_points.extend_from_slice(after);
                }
                let mut tail = Vec::with_capacity(contours.len() - ci);
                if rest_points.len() >= 2 {
                    tail.push(Contour::new(rest_points, false));
                }
                tail.extend_from_slice(&contours[ci + 1..]);
                tail
            });
            return Split {
                head,
                tail,
                point: cut,
            };
        }
    }

    let end = contours
        .last()
        .and_then(|c| c.points.last().copied())
        .unwrap_or(Vec2::ZERO);
    Split {
        head,
        tail: keep_rest.then(Vec::new),
        point: end,
    }
}

/// Douglas–Peucker simplification keeping both endpoints.
pub fn simplify_polyline(points: &[Vec2], tolerance: f32) -> Vec<Vec2> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let (index, distance) = (first + 1..last)
            .map(|i| (i, distance_to_segment(points[i], points[first], points[last])))
            .fold((first, 0.0f32), |best, cur| if cur.1 > best.1 { cur } else { best });
        if distance > tolerance {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

#[derive(Default)]
struct ContourBuilder {
    contours: Vec<Contour>,
    current: Vec<Vec2>,
    pen: Vec2,
    start: Option<Vec2>,
}

impl ContourBuilder {
    fn move_to(&mut self, to: Vec2) {
        self.flush(false);
        self.current.push(to);
        self.start = Some(to);
        self.pen = to;
    }

    fn ensure_started(&mut self) {
        if self.current.is_empty() {
            self.current.push(self.pen);
            if self.start.is_none() {
                self.start = Some(self.pen);
            }
        }
    }

    fn line_to(&mut self, to: Vec2) {
        self.ensure_started();
        self.push_point(to);
        self.pen = to;
    }

    fn extend(&mut self, points: &[Vec2]) {
        self.ensure_started();
        for p in points {
            self.push_point(*p);
        }
        if let Some(last) = points.last() {
            self.pen = *last;
        }
    }

    fn push_point(&mut self, p: Vec2) {
        if self
            .current
            .last()
            .is_some_and(|last| last.distance(p) <= COINCIDENT_EPSILON)
        {
            return;
        }
        self.current.push(p);
    }

    fn close(&mut self) {
        let Some(start) = self.start else {
            return;
        };
        if !self.current.is_empty() {
            self.push_point(start);
            self.flush(true);
        }
        self.pen = start;
    }

    fn flush(&mut self, closed: bool) {
        let points = std::mem::take(&mut self.current);
        if points.len() >= 2 {
            self.contours.push(Contour::new(points, closed));
        }
    }

    fn finish(mut self) -> Vec<Contour> {
        self.flush(false);
        self.contours
    }
}
