//! Reusable vertex storage for batch compression.
//!
//! Every [`BatchCompressor::compress`](crate::BatchCompressor::compress) call
//! clears the pool and appends the vertex data of each packed mesh. The
//! vectors keep their capacity between calls, so a steady scene stops
//! allocating after the first frame.
//!
//! ```
//! use meshkit_render::ScratchPool;
//!
//! let pool = ScratchPool::new(1 << 16);
//! assert_eq!(pool.grow_count(), 0);
//! assert_eq!(pool.vertex_len(), 0);
//! ```

use meshkit_core::{MeshError, PipelineConfig, Result};
use meshkit_geometry::{MeshBuffer, NO_TEXTURE_COORD};

/// Source rect written for vertices of meshes without a texture.
const FULL_SOURCE_RECT: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

/// Growable attribute storage shared by all batches of one compression.
///
/// All vertex attribute vectors always have the same length. Attributes a
/// mesh does not provide are padded with sentinels so any batch can be sliced
/// by a single vertex range.
#[derive(Debug)]
pub struct ScratchPool {
    pub(crate) positions: Vec<[f32; 3]>,
    pub(crate) indices: Vec<u32>,
    pub(crate) colors: Vec<[u8; 4]>,
    pub(crate) tex_coords: Vec<[f32; 2]>,
    pub(crate) source_rects: Vec<[f32; 4]>,
    pub(crate) clip_uvs: Vec<[f32; 2]>,
    pub(crate) gradient_coords: Vec<f32>,
    /// Ceiling on vertices held at once
    max_vertices: usize,
    grow_count: usize,
}

impl ScratchPool {
    /// Create an empty pool that refuses to hold more than `max_vertices`.
    pub fn new(max_vertices: usize) -> Self {
        Self {
            positions: Vec::new(),
            indices: Vec::new(),
            colors: Vec::new(),
            tex_coords: Vec::new(),
            source_rects: Vec::new(),
            clip_uvs: Vec::new(),
            gradient_coords: Vec::new(),
            max_vertices,
            grow_count: 0,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_pool_vertices)
    }

    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    /// Vertices currently stored.
    pub fn vertex_len(&self) -> usize {
        self.positions.len()
    }

    /// Indices currently stored.
    pub fn index_len(&self) -> usize {
        self.indices.len()
    }

    /// Vertices the pool can hold without reallocating.
    pub fn vertex_capacity(&self) -> usize {
        self.positions.capacity()
    }

    /// Indices the pool can hold without reallocating.
    pub fn index_capacity(&self) -> usize {
        self.indices.capacity()
    }

    /// Number of times any storage had to grow.
    pub fn grow_count(&self) -> usize {
        self.grow_count
    }

    /// Drop the contents, keeping capacity.
    pub(crate) fn reset(&mut self) {
        self.positions.clear();
        self.indices.clear();
        self.colors.clear();
        self.tex_coords.clear();
        self.source_rects.clear();
        self.clip_uvs.clear();
        self.gradient_coords.clear();
    }

    /// Append the vertex data of one mesh. Its indices are offset by `base`,
    /// the number of vertices already in the current batch.
    pub(crate) fn push_mesh(&mut self, buffer: &MeshBuffer, base: u32) -> Result<()> {
        let count = buffer.vertex_count();
        let requested = self.positions.len() + count;
        if requested > self.max_vertices {
            return Err(MeshError::CapacityExceeded {
                what: "scratch pool vertices",
                requested,
                limit: self.max_vertices,
            });
        }
        self.reserve(count, buffer.index_count());

        let end = requested;
        self.positions.extend_from_slice(&buffer.positions);
        self.indices.extend(buffer.indices.iter().map(|i| i + base));
        self.colors.extend_from_slice(&buffer.colors);
        match &buffer.tex_coords {
            Some(coords) => self.tex_coords.extend_from_slice(coords),
            None => self.tex_coords.resize(end, NO_TEXTURE_COORD),
        }
        match &buffer.source_rects {
            Some(rects) => self.source_rects.extend_from_slice(rects),
            None => self.source_rects.resize(end, FULL_SOURCE_RECT),
        }
        match &buffer.clip_uvs {
            Some(uvs) => self.clip_uvs.extend_from_slice(uvs),
            None => self.clip_uvs.resize(end, NO_TEXTURE_COORD),
        }
        match &buffer.gradient_coords {
            Some(coords) => self.gradient_coords.extend_from_slice(coords),
            None => self.gradient_coords.resize(end, 0.0),
        }
        Ok(())
    }

    fn reserve(&mut self, vertices: usize, indices: usize) {
        let len = self.positions.len();
        let needed = len + vertices;
        if needed > self.positions.capacity() {
            // Round up to the next power of two, but never past the ceiling
            let target = needed.next_power_of_two().min(self.max_vertices).max(needed);
            let additional = target - len;
            self.positions.reserve(additional);
            self.colors.reserve(additional);
            self.tex_coords.reserve(additional);
            self.source_rects.reserve(additional);
            self.clip_uvs.reserve(additional);
            self.gradient_coords.reserve(additional);
            self.grow_count += 1;
            tracing::debug!("Scratch pool grew to {} vertices", self.positions.capacity());
        }

        let index_len = self.indices.len();
        let needed = index_len + indices;
        if needed > self.indices.capacity() {
            self.indices.reserve(needed.next_power_of_two() - index_len);
            self.grow_count += 1;
            tracing::debug!("Scratch pool grew to {} indices", self.indices.capacity());
        }
    }
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshBuffer {
        MeshBuffer {
            positions: vec![[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]],
            indices: vec![0, 1, 2],
            colors: vec![[255, 0, 0, 255]; 3],
            fill_vertex_count: 3,
            fill_index_count: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_push_rebases_indices() {
        let mut pool = ScratchPool::new(64);
        pool.push_mesh(&triangle(), 0).unwrap();
        pool.push_mesh(&triangle(), 3).unwrap();
        assert_eq!(pool.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(pool.vertex_len(), 6);
    }

    #[test]
    fn test_missing_attributes_are_padded() {
        let mut pool = ScratchPool::new(64);
        let mut textured = triangle();
        textured.tex_coords = Some(vec![[0.5, 0.5]; 3]);
        pool.push_mesh(&triangle(), 0).unwrap();
        pool.push_mesh(&textured, 3).unwrap();

        assert_eq!(pool.tex_coords.len(), 6);
        assert_eq!(pool.tex_coords[0], NO_TEXTURE_COORD);
        assert_eq!(pool.tex_coords[3], [0.5, 0.5]);
        assert_eq!(pool.source_rects.len(), 6);
        assert_eq!(pool.clip_uvs.len(), 6);
        assert_eq!(pool.gradient_coords, vec![0.0; 6]);
    }

    #[test]
    fn test_ceiling_is_enforced() {
        let mut pool = ScratchPool::new(4);
        pool.push_mesh(&triangle(), 0).unwrap();
        let err = pool.push_mesh(&triangle(), 3).unwrap_err();
        assert_eq!(
            err,
            MeshError::CapacityExceeded {
                what: "scratch pool vertices",
                requested: 6,
                limit: 4,
            }
        );
        assert_eq!(pool.vertex_len(), 3);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut pool = ScratchPool::new(1024);
        for i in 0..10 {
            pool.push_mesh(&triangle(), i * 3).unwrap();
        }
        let capacity = pool.vertex_capacity();
        let grows = pool.grow_count();
        assert!(grows > 0);

        pool.reset();
        assert_eq!(pool.vertex_len(), 0);
        assert_eq!(pool.vertex_capacity(), capacity);

        for i in 0..10 {
            pool.push_mesh(&triangle(), i * 3).unwrap();
        }
        assert_eq!(pool.grow_count(), grows);
    }
}
