//! Per-draw uniform state of a mesh.

use crate::filter::ColorMatrix;
use crate::paint::Gradient;
use crate::texture::TextureHandle;

/// Texture binding of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureUniform {
    pub handle: TextureHandle,
    pub repeat: bool,
}

/// Everything a draw needs besides vertex data.
///
/// Two meshes can share a draw call when their uniforms compare equal,
/// with the texture allowed to differ if one side has none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uniforms {
    pub texture: Option<TextureUniform>,
    /// World-space fill gradient.
    pub fill_gradient: Option<Gradient>,
    /// World-space stroke gradient.
    pub stroke_gradient: Option<Gradient>,
    pub color_matrix: Option<ColorMatrix>,
    pub clip: Option<TextureHandle>,
}

impl Uniforms {
    /// Equal textures, or at least one side without a texture.
    pub fn texture_compatible(&self, other: &Uniforms) -> bool {
        match (self.texture, other.texture) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Equal in everything but the texture.
    pub fn same_state(&self, other: &Uniforms) -> bool {
        self.fill_gradient == other.fill_gradient
            && self.stroke_gradient == other.stroke_gradient
            && self.color_matrix == other.color_matrix
            && self.clip == other.clip
    }

    /// Whether both can be drawn with one set of uniforms.
    pub fn can_merge(&self, other: &Uniforms) -> bool {
        self.same_state(other) && self.texture_compatible(other)
    }

    pub fn has_gradient(&self) -> bool {
        self.fill_gradient.is_some() || self.stroke_gradient.is_some()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use meshkit_core::Color;

    use super::*;
    use crate::paint::GradientStop;

    fn tex(id: u64) -> Option<TextureUniform> {
        Some(TextureUniform {
            handle: TextureHandle(id),
            repeat: false,
        })
    }

    #[test]
    fn test_texture_compatibility() {
        let a = Uniforms {
            texture: tex(1),
            ..Default::default()
        };
        let b = Uniforms::default();
        let c = Uniforms {
            texture: tex(2),
            ..Default::default()
        };
        assert!(a.can_merge(&b));
        assert!(b.can_merge(&a));
        assert!(!a.can_merge(&c));
        assert!(a.can_merge(&a.clone()));
    }

    #[test]
    fn test_gradient_breaks_merge() {
        let g = Gradient::linear(Vec2::ZERO, Vec2::X, vec![GradientStop::new(0.0, Color::RED)]).unwrap();
        let a = Uniforms {
            fill_gradient: Some(g),
            ..Default::default()
        };
        assert!(!a.can_merge(&Uniforms::default()));
        assert!(a.has_gradient());
    }

    #[test]
    fn test_color_matrix_compared_by_value() {
        let a = Uniforms {
            color_matrix: Some(ColorMatrix::sepia(1.0)),
            ..Default::default()
        };
        let b = Uniforms {
            color_matrix: Some(ColorMatrix::sepia(1.0)),
            ..Default::default()
        };
        assert!(a.can_merge(&b));
        assert!(!a.can_merge(&Uniforms::default()));
    }
}
