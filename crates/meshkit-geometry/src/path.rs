//! Path commands and the [`Figure`] that owns them.
//!
//! A figure is a command list plus the precision settings used to flatten it.
//! Flattened [`Contours`] are cached per `(scale, simplify)` and dropped
//! whenever a command is added.

use std::f32::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;

use glam::Vec2;
use meshkit_core::alloc::HashMap;
use meshkit_core::{PipelineConfig, Result};
use parking_lot::RwLock;

use crate::contour::{Contours, PointAtLength};

/// Cached contour sets kept per figure before the cache is reset.
const MAX_CACHED_SCALES: usize = 8;

/// A command in a path. Coordinates are absolute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new sub-path.
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo {
        control: Vec2,
        to: Vec2,
    },
    CubicTo {
        control1: Vec2,
        control2: Vec2,
        to: Vec2,
    },
    /// SVG elliptical arc from the current point.
    ArcTo {
        radii: Vec2,
        /// X-axis rotation in radians
        x_rotation: f32,
        large_arc: bool,
        /// Positive-angle direction if true
        sweep: bool,
        to: Vec2,
    },
    /// Close the current sub-path by drawing a line to its start.
    Close,
}

type CacheKey = (u32, u32);

/// An ordered list of path commands with flattening settings.
///
/// Figures are usually built once, wrapped in an [`Arc`] and shared by every
/// mesh that draws them.
///
/// ```
/// use glam::Vec2;
/// use meshkit_geometry::Figure;
///
/// let mut figure = Figure::new();
/// figure.rect(Vec2::ZERO, Vec2::new(100.0, 100.0));
/// assert_eq!(figure.contours(1.0).total_length(), 400.0);
/// ```
#[derive(Debug)]
pub struct Figure {
    commands: Vec<PathCommand>,
    scale: f32,
    simplify: f32,
    tolerance: f32,
    pen: Vec2,
    subpath_start: Option<Vec2>,
    cache: RwLock<HashMap<CacheKey, Arc<Contours>>>,
}

impl Default for Figure {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Figure {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            scale: self.scale,
            simplify: self.simplify,
            tolerance: self.tolerance,
            pen: self.pen,
            subpath_start: self.subpath_start,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

impl Figure {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            scale: 1.0,
            simplify: 0.0,
            tolerance: PipelineConfig::default().tolerance,
            pen: Vec2::ZERO,
            subpath_start: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_commands(commands: impl IntoIterator<Item = PathCommand>) -> Self {
        let mut figure = Self::new();
        for command in commands {
            figure.push(command);
        }
        figure
    }

    /// Precision hint multiplied into every flattening scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale.max(f32::EPSILON);
        self.invalidate();
        self
    }

    /// Douglas–Peucker tolerance applied after flattening; `0` disables it.
    pub fn with_simplify(mut self, simplify: f32) -> Self {
        self.simplify = simplify.max(0.0);
        self.invalidate();
        self
    }

    /// Flattening tolerance in device pixels.
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance.max(f32::EPSILON);
        self.invalidate();
        self
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn simplify(&self) -> f32 {
        self.simplify
    }

    /// Current pen position.
    pub fn current_pos(&self) -> Vec2 {
        self.pen
    }

    /// Drop every cached contour set.
    pub fn invalidate(&mut self) {
        self.cache.get_mut().clear();
    }

    /// Contours flattened for drawing at `scale` (on top of the figure's own hint).
    pub fn contours(&self, scale: f32) -> Arc<Contours> {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        let key = (scale.to_bits(), self.simplify.to_bits());
        if let Some(contours) = self.cache.read().get(&key) {
            return Arc::clone(contours);
        }

        let contours = Arc::new(Contours::flatten(
            &self.commands,
            self.scale * scale,
            self.simplify,
            self.tolerance,
        ));
        let mut cache = self.cache.write();
        if cache.len() >= MAX_CACHED_SCALES {
            cache.clear();
        }
        cache.insert(key, Arc::clone(&contours));
        contours
    }

    /// Point at `fraction` (0..=1) of the total outline length.
    pub fn point_at_fraction(&self, fraction: f32) -> Result<PointAtLength> {
        let contours = self.contours(1.0);
        contours.point_at_length(fraction * contours.total_length())
    }

    fn push(&mut self, command: PathCommand) {
        match command {
            PathCommand::MoveTo(to) => {
                self.pen = to;
                self.subpath_start = Some(to);
            }
            PathCommand::LineTo(to)
            | PathCommand::QuadTo { to, .. }
            | PathCommand::CubicTo { to, .. }
            | PathCommand::ArcTo { to, .. } => {
                if self.subpath_start.is_none() {
                    self.subpath_start = Some(self.pen);
                }
                self.pen = to;
            }
            PathCommand::Close => {
                if let Some(start) = self.subpath_start {
                    self.pen = start;
                }
            }
        }
        self.commands.push(command);
        self.invalidate();
    }

    pub fn move_to(&mut self, to: Vec2) -> &mut Self {
        self.push(PathCommand::MoveTo(to));
        self
    }

    pub fn line_to(&mut self, to: Vec2) -> &mut Self {
        self.push(PathCommand::LineTo(to));
        self
    }

    pub fn quad_to(&mut self, control: Vec2, to: Vec2) -> &mut Self {
        self.push(PathCommand::QuadTo { control, to });
        self
    }

    pub fn cubic_to(&mut self, control1: Vec2, control2: Vec2, to: Vec2) -> &mut Self {
        self.push(PathCommand::CubicTo {
            control1,
            control2,
            to,
        });
        self
    }

    /// SVG-style elliptical arc from the current point to `to`.
    pub fn arc_to(
        &mut self,
        radii: Vec2,
        x_rotation: f32,
        large_arc: bool,
        sweep: bool,
        to: Vec2,
    ) -> &mut Self {
        self.push(PathCommand::ArcTo {
            radii,
            x_rotation,
            large_arc,
            sweep,
            to,
        });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.push(PathCommand::Close);
        self
    }

    /// Canvas-style circular arc around `center`, connected to the current
    /// sub-path by a straight line.
    pub fn arc(
        &mut self,
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        anticlockwise: bool,
    ) -> &mut Self {
        self.ellipse(
            center,
            Vec2::splat(radius),
            0.0,
            start_angle,
            end_angle,
            anticlockwise,
        )
    }

    /// Canvas-style elliptical arc.
    ///
    /// The sweep is normalized the way canvas does it: a clockwise arc covers
    /// `end - start` modulo a full turn, unless the difference already spans a
    /// full turn.
    pub fn ellipse(
        &mut self,
        center: Vec2,
        radii: Vec2,
        rotation: f32,
        start_angle: f32,
        end_angle: f32,
        anticlockwise: bool,
    ) -> &mut Self {
        let axis = Vec2::from_angle(rotation);
        let point_at =
            |angle: f32| center + axis.rotate(Vec2::new(radii.x * angle.cos(), radii.y * angle.sin()));

        let raw = end_angle - start_angle;
        let sweep = if anticlockwise {
            if -raw >= TAU {
                -TAU
            } else {
                -(-raw).rem_euclid(TAU)
            }
        } else if raw >= TAU {
            TAU
        } else {
            raw.rem_euclid(TAU)
        };

        let start = point_at(start_angle);
        if self.subpath_start.is_some() {
            self.line_to(start);
        } else {
            self.move_to(start);
        }

        let pieces = ((sweep.abs() / FRAC_PI_2).ceil() as usize).max(1);
        for i in 1..=pieces {
            let angle = start_angle + sweep * (i as f32 / pieces as f32);
            self.arc_to(radii, rotation, false, sweep > 0.0, point_at(angle));
        }
        self
    }

    /// Closed axis-aligned rectangle.
    pub fn rect(&mut self, position: Vec2, size: Vec2) -> &mut Self {
        self.move_to(position);
        self.line_to(position + Vec2::new(size.x, 0.0));
        self.line_to(position + size);
        self.line_to(position + Vec2::new(0.0, size.y));
        self.close()
    }

    /// Closed circle.
    pub fn circle(&mut self, center: Vec2, radius: f32) -> &mut Self {
        self.move_to(center + Vec2::new(radius, 0.0));
        self.arc(center, radius, 0.0, TAU, false);
        self.close()
    }

    /// Closed polygon through `points`.
    pub fn polygon(&mut self, points: &[Vec2]) -> &mut Self {
        let Some((first, rest)) = points.split_first() else {
            return self;
        };
        self.move_to(*first);
        for point in rest {
            self.line_to(*point);
        }
        self.close()
    }

    /// Append every command of `other`.
    pub fn add_figure(&mut self, other: &Figure) -> &mut Self {
        for command in &other.commands {
            self.push(*command);
        }
        self
    }

    /// Remove all commands.
    pub fn clear(&mut self) -> &mut Self {
        self.commands.clear();
        self.pen = Vec2::ZERO;
        self.subpath_start = None;
        self.invalidate();
        self
    }
}
