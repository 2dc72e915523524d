//! Stroke properties for geometry outlines.
//!
//! Defines how paths are stroked: width, caps, joins, and dash patterns.

use meshkit_core::{Color, MeshError, PipelineConfig, Result};

/// Line cap style for open stroke endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Flat cap ending at the endpoint.
    #[default]
    Butt,
    /// Flat cap extended by half the line width.
    Square,
    /// Semicircular caps on both ends.
    Round,
    /// Semicircular cap on the first endpoint only.
    RoundStart,
    /// Semicircular cap on the last endpoint only.
    RoundEnd,
}

impl LineCap {
    pub fn rounds_start(self) -> bool {
        matches!(self, Self::Round | Self::RoundStart)
    }

    pub fn rounds_end(self) -> bool {
        matches!(self, Self::Round | Self::RoundEnd)
    }
}

/// Line join style for stroke corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    /// Sharp corner, degraded to bevel past the miter limit.
    #[default]
    Miter,
    /// Bevel plus a fan of `round_segments` steps per half turn.
    Round,
    /// Flat corner.
    Bevel,
}

/// Dash pattern for stroked lines.
#[derive(Debug, Clone, PartialEq)]
pub struct DashPattern {
    /// Alternating on/off lengths.
    pub pattern: Vec<f32>,
    /// Distance into the pattern at which the outline starts. May be negative.
    pub offset: f32,
}

impl DashPattern {
    pub fn new(pattern: Vec<f32>, offset: f32) -> Self {
        Self { pattern, offset }
    }

    /// Create a simple dashed line.
    pub fn dashed(dash: f32, gap: f32) -> Self {
        Self::new(vec![dash, gap], 0.0)
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }
}

/// Stroke style of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    /// Full line width in figure units.
    pub width: f32,
    pub color: Color,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: Option<DashPattern>,
    /// Fan steps per half turn for round joins and caps.
    pub round_segments: u32,
}

impl StrokeStyle {
    /// Create a solid color stroke.
    pub fn solid(color: Color, width: f32) -> Self {
        let defaults = PipelineConfig::default();
        Self {
            width,
            color,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: defaults.miter_limit,
            dash: None,
            round_segments: defaults.round_segments,
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    /// Set the miter limit.
    pub fn with_miter_limit(mut self, limit: f32) -> Self {
        self.miter_limit = limit.max(1.0);
        self
    }

    pub fn with_dash(mut self, pattern: DashPattern) -> Self {
        self.dash = Some(pattern);
        self
    }

    /// Set a simple dashed pattern.
    pub fn dashed(mut self, dash: f32, gap: f32) -> Self {
        self.dash = Some(DashPattern::dashed(dash, gap));
        self
    }

    pub fn with_round_segments(mut self, segments: u32) -> Self {
        self.round_segments = segments.max(1);
        self
    }

    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    /// Check if the stroke is visible.
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.color.a > 0.0
    }

    /// Reject widths and dash patterns the extruder cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(MeshError::invalid(format!(
                "stroke width must be finite and non-negative, got {}",
                self.width
            )));
        }
        if !self.miter_limit.is_finite() {
            return Err(MeshError::invalid("miter limit must be finite"));
        }
        if let Some(dash) = &self.dash {
            if dash.pattern.iter().any(|v| !v.is_finite() || *v < 0.0) || !dash.offset.is_finite() {
                return Err(MeshError::invalid(
                    "dash lengths must be finite and non-negative with a finite offset",
                ));
            }
        }
        Ok(())
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::solid(Color::BLACK, 1.0)
    }
}
