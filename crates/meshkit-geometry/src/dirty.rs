//! Dirty tracking for lazily rebuilt mesh buffers.

use bitflags::bitflags;

bitflags! {
    /// Parts of a [`MeshBuffer`](crate::MeshBuffer) that must be recomputed.
    ///
    /// A style change only touches what it affects, so a translation never
    /// re-triangulates and a color change never re-derives positions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MeshDirty: u8 {
        const NONE           = 0b0000_0000;

        /// Contours, fill triangulation or stroke extrusion changed.
        /// Implies every other flag.
        const TOPOLOGY       = 0b0000_0001;

        /// Only the transform changed; positions are re-derived from the snapshot.
        const TRANSFORM      = 0b0000_0010;

        /// Texture placement changed.
        const TEXTURE_COORDS = 0b0000_0100;

        /// Gradient geometry or stops changed.
        const GRADIENT       = 0b0000_1000;

        /// Fill/stroke colors or opacity changed.
        const COLORS         = 0b0001_0000;

        /// Clip mask changed.
        const CLIP           = 0b0010_0000;
    }
}

impl MeshDirty {
    #[inline]
    pub fn needs_topology(&self) -> bool {
        self.contains(Self::TOPOLOGY)
    }

    /// Positions carry the opacity tag, so color changes rewrite them too.
    #[inline]
    pub fn needs_positions(&self) -> bool {
        self.intersects(Self::TOPOLOGY | Self::TRANSFORM | Self::COLORS)
    }

    #[inline]
    pub fn needs_texture_coords(&self) -> bool {
        self.intersects(Self::TOPOLOGY | Self::TEXTURE_COORDS)
    }

    #[inline]
    pub fn needs_gradient(&self) -> bool {
        self.intersects(Self::TOPOLOGY | Self::GRADIENT)
    }

    #[inline]
    pub fn needs_colors(&self) -> bool {
        self.intersects(Self::TOPOLOGY | Self::COLORS)
    }

    /// Clip coordinates are computed in world space.
    #[inline]
    pub fn needs_clip(&self) -> bool {
        self.intersects(Self::TOPOLOGY | Self::TRANSFORM | Self::CLIP)
    }
}

impl Default for MeshDirty {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_implies_everything() {
        let d = MeshDirty::TOPOLOGY;
        assert!(d.needs_positions());
        assert!(d.needs_texture_coords());
        assert!(d.needs_gradient());
        assert!(d.needs_colors());
        assert!(d.needs_clip());
    }

    #[test]
    fn test_transform_only() {
        let d = MeshDirty::TRANSFORM;
        assert!(!d.needs_topology());
        assert!(d.needs_positions());
        assert!(d.needs_clip());
        assert!(!d.needs_texture_coords());
        assert!(!d.needs_gradient());
        assert!(!d.needs_colors());
    }

    #[test]
    fn test_texture_only() {
        let d = MeshDirty::TEXTURE_COORDS;
        assert!(d.needs_texture_coords());
        assert!(!d.needs_positions());
        assert!(!d.needs_colors());
    }

    #[test]
    fn test_default_is_clean() {
        assert!(MeshDirty::default().is_empty());
    }
}
