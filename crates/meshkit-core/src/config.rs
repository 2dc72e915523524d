//! Pipeline configuration.

/// Tunables shared by flattening, extrusion and batching.
///
/// The hysteresis band and the miter clamp are empirical values.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Maximum distance, in device pixels, between a curve and its flattened polyline.
    pub tolerance: f32,
    /// Re-flatten when the transform scale grows past `cached * reflatten_upper`.
    pub reflatten_upper: f32,
    /// Re-flatten when the transform scale drops below `cached * reflatten_lower`.
    pub reflatten_lower: f32,
    /// Clamp applied to miter lengths of (nearly) anti-parallel segments.
    pub max_miter_value: f32,
    /// Default miter limit for new stroke styles.
    pub miter_limit: f32,
    /// Default number of fan steps per half turn for round joins and caps.
    pub round_segments: u32,
    /// Vertex budget of a single batch.
    pub max_vertices_per_batch: usize,
    /// Ceiling for the total number of vertices held by a scratch pool.
    pub max_pool_vertices: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.25,
            reflatten_upper: 1.5,
            reflatten_lower: 0.67,
            max_miter_value: 1e20,
            miter_limit: 10.0,
            round_segments: 20,
            max_vertices_per_batch: 1500,
            max_pool_vertices: 1 << 22,
        }
    }
}

impl PipelineConfig {
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance.max(f32::EPSILON);
        self
    }

    pub fn with_reflatten_band(mut self, lower: f32, upper: f32) -> Self {
        self.reflatten_lower = lower;
        self.reflatten_upper = upper;
        self
    }

    pub fn with_max_vertices_per_batch(mut self, max: usize) -> Self {
        self.max_vertices_per_batch = max.max(1);
        self
    }

    pub fn with_max_pool_vertices(mut self, max: usize) -> Self {
        self.max_pool_vertices = max;
        self
    }

    pub fn with_round_segments(mut self, segments: u32) -> Self {
        self.round_segments = segments.max(1);
        self
    }

    /// Whether contours flattened at `cached` are still accurate enough at `scale`.
    pub fn within_reflatten_band(&self, cached: f32, scale: f32) -> bool {
        let ratio = scale / cached;
        ratio <= self.reflatten_upper && ratio >= self.reflatten_lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflatten_band() {
        let config = PipelineConfig::default();
        assert!(config.within_reflatten_band(1.0, 1.0));
        assert!(config.within_reflatten_band(1.0, 1.4));
        assert!(!config.within_reflatten_band(1.0, 1.6));
        assert!(config.within_reflatten_band(2.0, 1.4));
        assert!(!config.within_reflatten_band(2.0, 1.2));
    }

    #[test]
    fn test_builder_clamps() {
        let config = PipelineConfig::default()
            .with_max_vertices_per_batch(0)
            .with_round_segments(0);
        assert_eq!(config.max_vertices_per_batch, 1);
        assert_eq!(config.round_segments, 1);
    }
}
