//! Fill rules and fill styles.

use meshkit_core::Color;

/// Which regions of overlapping contours count as inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// Inside where the winding number is not zero.
    #[default]
    NonZero,
    /// Inside where a ray crosses an odd number of edges.
    EvenOdd,
}

/// Fill style of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStyle {
    pub color: Color,
    pub rule: FillRule,
}

impl FillStyle {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            rule: FillRule::NonZero,
        }
    }

    pub fn with_rule(mut self, rule: FillRule) -> Self {
        self.rule = rule;
        self
    }

    /// A fully transparent fill still triangulates but draws nothing.
    pub fn is_visible(&self) -> bool {
        !self.color.is_transparent()
    }
}

impl Default for FillStyle {
    fn default() -> Self {
        Self::solid(Color::BLACK)
    }
}

impl From<Color> for FillStyle {
    fn from(color: Color) -> Self {
        Self::solid(color)
    }
}
