//! Color-matrix filters and filter chains.

use std::fmt;

use meshkit_core::{Color, MeshError, Result};

/// A 4x5 row-major color matrix: one `[r, g, b, a, offset]` row per output channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix(pub [f32; 20]);

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorMatrix {
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, 0.0, // Red
        0.0, 1.0, 0.0, 0.0, 0.0, // Green
        0.0, 0.0, 1.0, 0.0, 0.0, // Blue
        0.0, 0.0, 0.0, 1.0, 0.0, // Alpha
    ]);

    const GRAYSCALE: [f32; 20] = [
        0.2126, 0.7152, 0.0722, 0.0, 0.0, // Red
        0.2126, 0.7152, 0.0722, 0.0, 0.0, // Green
        0.2126, 0.7152, 0.0722, 0.0, 0.0, // Blue
        0.0, 0.0, 0.0, 1.0, 0.0, // Alpha
    ];

    const SEPIA: [f32; 20] = [
        0.393, 0.769, 0.189, 0.0, 0.0, // Red
        0.349, 0.686, 0.168, 0.0, 0.0, // Green
        0.272, 0.534, 0.131, 0.0, 0.0, // Blue
        0.0, 0.0, 0.0, 1.0, 0.0, // Alpha
    ];

    fn mix_identity(target: &[f32; 20], amount: f32) -> Self {
        let mut m = Self::IDENTITY.0;
        for (out, (id, t)) in m.iter_mut().zip(Self::IDENTITY.0.iter().zip(target)) {
            *out = id * (1.0 - amount) + t * amount;
        }
        Self(m)
    }

    fn diagonal(r: f32, g: f32, b: f32, a: f32, offset: f32) -> Self {
        Self([
            r, 0.0, 0.0, 0.0, offset, //
            0.0, g, 0.0, 0.0, offset, //
            0.0, 0.0, b, 0.0, offset, //
            0.0, 0.0, 0.0, a, 0.0,
        ])
    }

    pub fn grayscale(amount: f32) -> Self {
        Self::mix_identity(&Self::GRAYSCALE, amount.clamp(0.0, 1.0))
    }

    pub fn sepia(amount: f32) -> Self {
        Self::mix_identity(&Self::SEPIA, amount.clamp(0.0, 1.0))
    }

    pub fn brightness(amount: f32) -> Self {
        Self::diagonal(amount, amount, amount, 1.0, 0.0)
    }

    pub fn contrast(amount: f32) -> Self {
        Self::diagonal(amount, amount, amount, 1.0, 0.5 - 0.5 * amount)
    }

    pub fn invert(amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let scale = 1.0 - 2.0 * amount;
        Self::diagonal(scale, scale, scale, 1.0, amount)
    }

    pub fn opacity(amount: f32) -> Self {
        Self::diagonal(1.0, 1.0, 1.0, amount.clamp(0.0, 1.0), 0.0)
    }

    pub fn saturate(amount: f32) -> Self {
        let s = amount;
        Self([
            0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s, 0.0, 0.0, //
            0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s, 0.0, 0.0, //
            0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    pub fn hue_rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self([
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
            0.0,
            0.0,
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
            0.0,
            0.0,
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
            0.0,
        ])
    }

    /// Matrix equivalent to applying `self` and then `next`.
    pub fn then(&self, next: &ColorMatrix) -> Self {
        let a = &next.0;
        let b = &self.0;
        let mut out = [0.0; 20];
        for row in 0..4 {
            for col in 0..5 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[row * 5 + k] * b[k * 5 + col];
                }
                if col == 4 {
                    sum += a[row * 5 + 4];
                }
                out[row * 5 + col] = sum;
            }
        }
        Self(out)
    }

    /// Apply to a straight-alpha color.
    pub fn apply(&self, color: Color) -> Color {
        let input = color.to_array();
        let m = &self.0;
        let channel = |row: usize| {
            let r = &m[row * 5..row * 5 + 5];
            r[0] * input[0] + r[1] * input[1] + r[2] * input[2] + r[3] * input[3] + r[4]
        };
        Color::rgba(channel(0), channel(1), channel(2), channel(3))
    }
}

/// One entry of a mesh's filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Grayscale(f32),
    Brightness(f32),
    Contrast(f32),
    Invert(f32),
    Opacity(f32),
    Saturate(f32),
    Sepia(f32),
    /// Rotation in degrees.
    HueRotate(f32),
    Blur(f32),
    DropShadow {
        offset_x: f32,
        offset_y: f32,
        blur: f32,
        color: Color,
    },
    Url(String),
}

impl Filter {
    /// Matrix for color-matrix filters, `None` for the rest.
    pub fn color_matrix(&self) -> Option<ColorMatrix> {
        Some(match *self {
            Filter::Grayscale(a) => ColorMatrix::grayscale(a),
            Filter::Brightness(a) => ColorMatrix::brightness(a),
            Filter::Contrast(a) => ColorMatrix::contrast(a),
            Filter::Invert(a) => ColorMatrix::invert(a),
            Filter::Opacity(a) => ColorMatrix::opacity(a),
            Filter::Saturate(a) => ColorMatrix::saturate(a),
            Filter::Sepia(a) => ColorMatrix::sepia(a),
            Filter::HueRotate(deg) => ColorMatrix::hue_rotate(deg),
            Filter::Blur(_) | Filter::DropShadow { .. } | Filter::Url(_) => return None,
        })
    }

    /// Whether the filter needs the mesh composited on its own.
    pub fn is_isolated(&self) -> bool {
        self.color_matrix().is_none()
    }

    fn validate(&self) -> Result<()> {
        let ok = match self {
            Filter::HueRotate(deg) => deg.is_finite(),
            Filter::DropShadow {
                offset_x,
                offset_y,
                blur,
                ..
            } => offset_x.is_finite() && offset_y.is_finite() && blur.is_finite() && *blur >= 0.0,
            Filter::Url(_) => true,
            Filter::Grayscale(a)
            | Filter::Brightness(a)
            | Filter::Contrast(a)
            | Filter::Invert(a)
            | Filter::Opacity(a)
            | Filter::Saturate(a)
            | Filter::Sepia(a)
            | Filter::Blur(a) => a.is_finite() && *a >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(MeshError::invalid(format!("invalid filter argument: {self}")))
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Grayscale(a) => write!(f, "grayscale({a})"),
            Filter::Brightness(a) => write!(f, "brightness({a})"),
            Filter::Contrast(a) => write!(f, "contrast({a})"),
            Filter::Invert(a) => write!(f, "invert({a})"),
            Filter::Opacity(a) => write!(f, "opacity({a})"),
            Filter::Saturate(a) => write!(f, "saturate({a})"),
            Filter::Sepia(a) => write!(f, "sepia({a})"),
            Filter::HueRotate(deg) => write!(f, "hue-rotate({deg}deg)"),
            Filter::Blur(radius) => write!(f, "blur({radius}px)"),
            Filter::DropShadow {
                offset_x,
                offset_y,
                blur,
                color,
            } => {
                let [r, g, b, _] = color.to_rgba8();
                write!(
                    f,
                    "drop-shadow({offset_x}px {offset_y}px {blur}px rgba({r},{g},{b},{}))",
                    color.a
                )
            }
            Filter::Url(url) => write!(f, "url({url})"),
        }
    }
}

/// Ordered filters of a mesh with the cumulative color matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    filters: Vec<Filter>,
    matrix: Option<ColorMatrix>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter; color-matrix filters apply after everything already in the chain.
    pub fn push(&mut self, filter: Filter) -> Result<()> {
        filter.validate()?;
        if let Some(m) = filter.color_matrix() {
            let current = self.matrix.unwrap_or_default();
            self.matrix = Some(current.then(&m));
        }
        self.filters.push(filter);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.filters.clear();
        self.matrix = None;
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Cumulative matrix, `None` when no color-matrix filter was added.
    pub fn color_matrix(&self) -> Option<&ColorMatrix> {
        self.matrix.as_ref()
    }

    pub fn needs_isolation(&self) -> bool {
        self.filters.iter().any(Filter::is_isolated)
    }

    /// Space-separated CSS filter text for non-GPU fallbacks.
    pub fn css_text(&self) -> String {
        self.filters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
