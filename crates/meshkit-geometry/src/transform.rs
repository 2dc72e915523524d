//! 2D affine transformations.

use glam::{Mat3, Vec2, Vec3};

/// A 2D affine transformation matrix.
///
/// Internally uses a 3x3 matrix whose last row is always `[0, 0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    matrix: Mat3,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    /// Identity transform (no transformation).
    pub const IDENTITY: Self = Self {
        matrix: Mat3::IDENTITY,
    };

    pub fn from_mat3(matrix: Mat3) -> Self {
        Self { matrix }
    }

    /// Create from the six affine coefficients `[a, b, c, d, e, f]`, mapping
    /// `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
    pub fn from_array([a, b, c, d, e, f]: [f32; 6]) -> Self {
        Self {
            matrix: Mat3::from_cols(Vec3::new(a, b, 0.0), Vec3::new(c, d, 0.0), Vec3::new(e, f, 1.0)),
        }
    }

    /// The six affine coefficients `[a, b, c, d, e, f]`.
    pub fn to_array(&self) -> [f32; 6] {
        let m = &self.matrix;
        [m.x_axis.x, m.x_axis.y, m.y_axis.x, m.y_axis.y, m.z_axis.x, m.z_axis.y]
    }

    pub fn translate(offset: Vec2) -> Self {
        Self {
            matrix: Mat3::from_translation(offset),
        }
    }

    /// Create a rotation transform (angle in radians).
    pub fn rotate(angle: f32) -> Self {
        Self {
            matrix: Mat3::from_angle(angle),
        }
    }

    pub fn scale_xy(scale: Vec2) -> Self {
        Self {
            matrix: Mat3::from_scale(scale),
        }
    }

    /// Create a skew transform from the horizontal and vertical skew angles in radians.
    pub fn skew(skew_x: f32, skew_y: f32) -> Self {
        Self {
            matrix: Mat3::from_cols(
                Vec3::new(1.0, skew_y.tan(), 0.0),
                Vec3::new(skew_x.tan(), 1.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ),
        }
    }

    /// `self` applied around `origin` instead of the coordinate origin.
    pub fn about(&self, origin: Vec2) -> Self {
        Self::translate(-origin)
            .then(self)
            .then(&Self::translate(origin))
    }

    /// Combine two transforms (self then other).
    pub fn then(&self, other: &Transform2D) -> Self {
        Self {
            matrix: other.matrix * self.matrix,
        }
    }

    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.matrix.transform_point2(point)
    }

    /// Transform a vector (ignores translation).
    pub fn transform_vector(&self, vector: Vec2) -> Vec2 {
        self.matrix.transform_vector2(vector)
    }

    pub fn determinant(&self) -> f32 {
        self.matrix.determinant()
    }

    /// Get the inverse transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.matrix.determinant();
        if det.abs() < f32::EPSILON || !det.is_finite() {
            None
        } else {
            Some(Self {
                matrix: self.matrix.inverse(),
            })
        }
    }

    pub fn as_mat3(&self) -> &Mat3 {
        &self.matrix
    }

    /// Area-preserving scale factor, `sqrt(|det|)`.
    ///
    /// Used to pick a flattening resolution and to scale gradient radii.
    pub fn uniform_scale(&self) -> f32 {
        self.matrix.determinant().abs().sqrt()
    }

    /// Largest stretch along either axis.
    pub fn max_scale(&self) -> f32 {
        let x = Vec2::new(self.matrix.x_axis.x, self.matrix.x_axis.y).length();
        let y = Vec2::new(self.matrix.y_axis.x, self.matrix.y_axis.y).length();
        x.max(y)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl std::ops::Mul<Transform2D> for Transform2D {
    type Output = Transform2D;

    /// `a * b` applies `b` first, like matrix multiplication.
    fn mul(self, rhs: Transform2D) -> Transform2D {
        rhs.then(&self)
    }
}

impl std::ops::Mul<Vec2> for Transform2D {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        self.transform_point(rhs)
    }
}
