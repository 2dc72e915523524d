//! Merging consecutive meshes into as few draw calls as possible.

use meshkit_core::profiling::profile_function;
use meshkit_core::{PipelineConfig, Result};
use meshkit_geometry::Mesh;

use crate::batch::{BatchPlan, Batches};
use crate::scratch::ScratchPool;

/// Packs meshes into [`Batches`], preserving their order.
///
/// A mesh joins the open batch when all of these hold:
/// - neither the batch nor the mesh needs isolated compositing
/// - the last member has no `after_render` hook and the mesh no `before_render` hook
/// - both use the same program
/// - their uniforms match, with a missing texture matching any texture
/// - the batch stays within `max_vertices_per_batch`
///
/// Meshes that draw nothing are skipped without closing the open batch.
///
/// ```
/// use glam::Vec2;
/// use meshkit_core::{Color, PipelineConfig};
/// use meshkit_geometry::{Figure, FillStyle, Mesh};
/// use meshkit_render::{BatchCompressor, ScratchPool};
///
/// let mut figure = Figure::new();
/// figure.rect(Vec2::ZERO, Vec2::new(10.0, 10.0));
///
/// let mut meshes: Vec<Mesh> = (0..3)
///     .map(|i| {
///         let mut mesh = Mesh::new(figure.clone());
///         mesh.set_fill(FillStyle::solid(Color::RED));
///         mesh.translate(Vec2::new(i as f32 * 20.0, 0.0));
///         mesh
///     })
///     .collect();
///
/// let compressor = BatchCompressor::new(PipelineConfig::default());
/// let mut pool = ScratchPool::default();
/// let batches = compressor.compress(&mut meshes, &mut pool).unwrap();
/// assert_eq!(batches.len(), 1);
/// assert_eq!(batches.mesh_count(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BatchCompressor {
    config: PipelineConfig,
}

impl BatchCompressor {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn max_vertices_per_batch(&self) -> usize {
        self.config.max_vertices_per_batch
    }

    /// Rebuild the vertex data of every visible mesh and pack it into `pool`.
    ///
    /// Fails with `CapacityExceeded` when the packed meshes need more than the
    /// pool's vertex ceiling. The pool contents are unspecified after a failure
    /// and are cleared by the next call.
    pub fn compress<'p>(
        &self,
        meshes: &mut [Mesh],
        pool: &'p mut ScratchPool,
    ) -> Result<Batches<'p>> {
        profile_function!();
        pool.reset();
        let capacity = self.config.max_vertices_per_batch.max(1);

        let mut plans: Vec<BatchPlan> = Vec::new();
        let mut current: Option<BatchPlan> = None;
        let mut packed = 0;
        let mut culled = 0;

        for index in 0..meshes.len() {
            if meshes[index].can_ignore() {
                culled += 1;
                continue;
            }
            let data = meshes[index].mesh_data();
            if data.is_empty() {
                culled += 1;
                continue;
            }
            let vertex_count = data.vertex_count();

            let mesh = &meshes[index];
            let joins = current.as_ref().is_some_and(|plan| {
                can_join(plan, mesh) && plan.vertices.len() + vertex_count <= capacity
            });
            if !joins && let Some(done) = current.take() {
                close(&mut plans, done);
            }
            let plan = current.get_or_insert_with(|| {
                BatchPlan::start(mesh, pool.vertex_len(), pool.index_len())
            });

            let base = (pool.vertex_len() - plan.vertices.start) as u32;
            pool.push_mesh(meshes[index].mesh_data(), base)?;
            plan.absorb(&meshes[index], index);
            plan.vertices.end = pool.vertex_len();
            plan.indices.end = pool.index_len();
            packed += 1;
        }
        if let Some(done) = current.take() {
            close(&mut plans, done);
        }

        tracing::trace!(
            "Compressed {} meshes into {} batches ({} culled, {} vertices)",
            packed,
            plans.len(),
            culled,
            pool.vertex_len()
        );
        let pool: &'p ScratchPool = pool;
        Ok(Batches::new(pool, plans, packed, culled))
    }
}

fn can_join(plan: &BatchPlan, mesh: &Mesh) -> bool {
    !plan.isolated
        && !mesh.needs_isolation()
        && plan.after_render.is_none()
        && mesh.before_render().is_none()
        && plan.program == mesh.program()
        && plan.uniforms.can_merge(mesh.uniforms())
}

fn close(plans: &mut Vec<BatchPlan>, plan: BatchPlan) {
    tracing::trace!(
        "Batch {} closed: {} meshes, {} vertices",
        plans.len(),
        plan.members.len(),
        plan.vertices.len()
    );
    plans.push(plan);
}

impl BatchPlan {
    fn start(mesh: &Mesh, vertex_start: usize, index_start: usize) -> Self {
        Self {
            vertices: vertex_start..vertex_start,
            indices: index_start..index_start,
            uniforms: mesh.uniforms().clone(),
            program: mesh.program(),
            enable_blend: false,
            isolated: mesh.needs_isolation(),
            before_render: mesh.before_render().cloned(),
            after_render: None,
            members: Vec::new(),
        }
    }

    fn absorb(&mut self, mesh: &Mesh, index: usize) {
        if self.uniforms.texture.is_none() {
            self.uniforms.texture = mesh.uniforms().texture;
        }
        self.enable_blend |= mesh.enable_blend();
        self.after_render = mesh.after_render().cloned();
        self.members.push(index);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec2;
    use meshkit_core::{Color, MeshError};
    use meshkit_geometry::{
        Figure, FillStyle, Filter, GradientKind, GradientStop, GradientTarget, ProgramId,
        RenderHook, Texture, TextureHandle, TextureOptions,
    };

    use super::*;

    fn square(x: f32) -> Mesh {
        let mut figure = Figure::new();
        figure.rect(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let mut mesh = Mesh::new(figure);
        mesh.set_fill(FillStyle::solid(Color::RED));
        mesh.translate(Vec2::new(x, 0.0));
        mesh
    }

    fn textured(x: f32, id: u64) -> Mesh {
        let mut mesh = square(x);
        mesh.set_texture(Texture::new(TextureHandle(id), 8, 8), TextureOptions::default());
        mesh
    }

    fn noop_hook() -> RenderHook {
        Arc::new(|_| {})
    }

    fn compress(meshes: &mut [Mesh]) -> Vec<Vec<usize>> {
        let compressor = BatchCompressor::default();
        let mut pool = ScratchPool::default();
        let batches = compressor.compress(meshes, &mut pool).unwrap();
        batches.iter().map(|b| b.members().to_vec()).collect()
    }

    #[test]
    fn test_compatible_meshes_share_a_batch() {
        let mut meshes: Vec<Mesh> = (0..3).map(|i| square(i as f32 * 20.0)).collect();
        let compressor = BatchCompressor::default();
        let mut pool = ScratchPool::default();
        let batches = compressor.compress(&mut meshes, &mut pool).unwrap();

        assert_eq!(batches.len(), 1);
        let batch = batches.get(0).unwrap();
        assert_eq!(batch.pack_index(), 0);
        assert_eq!(batch.pack_length(), 3);
        assert!(batch.tex_coords().is_none());
        assert!(batch.clip_uvs().is_none());

        let per_mesh = meshes[0].mesh_data().vertex_count();
        assert_eq!(batch.vertex_count(), per_mesh * 3);
        assert!(batch.indices().iter().all(|&i| (i as usize) < batch.vertex_count()));
        // Indices of the last member point at its own vertices
        let last = &batch.indices()[batch.index_count() - 1];
        assert!(*last as usize >= per_mesh * 2);
    }

    #[test]
    fn test_different_textures_split() {
        let mut meshes = vec![textured(0.0, 1), square(20.0), textured(40.0, 2)];
        assert_eq!(compress(&mut meshes), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_texture_promoted_to_first_textured_member() {
        let mut meshes = vec![square(0.0), textured(20.0, 7)];
        let compressor = BatchCompressor::default();
        let mut pool = ScratchPool::default();
        let batches = compressor.compress(&mut meshes, &mut pool).unwrap();

        assert_eq!(batches.len(), 1);
        let batch = batches.get(0).unwrap();
        assert_eq!(batch.uniforms().texture.map(|t| t.handle), Some(TextureHandle(7)));
        let coords = batch.tex_coords().unwrap();
        assert_eq!(coords[0], meshkit_geometry::NO_TEXTURE_COORD);
        assert_eq!(batch.source_rects().unwrap().len(), batch.vertex_count());
    }

    #[test]
    fn test_hooks_break_batches() {
        let mut meshes = vec![square(0.0), square(20.0), square(40.0), square(60.0)];
        meshes[0].set_after_render(Some(noop_hook()));
        meshes[2].set_before_render(Some(noop_hook()));
        assert_eq!(compress(&mut meshes), vec![vec![0], vec![1], vec![2, 3]]);
    }

    #[test]
    fn test_hooks_come_from_first_and_last_member() {
        let mut meshes = vec![square(0.0), square(20.0)];
        meshes[0].set_before_render(Some(noop_hook()));
        meshes[1].set_after_render(Some(noop_hook()));
        let compressor = BatchCompressor::default();
        let mut pool = ScratchPool::default();
        let batches = compressor.compress(&mut meshes, &mut pool).unwrap();

        assert_eq!(batches.len(), 1);
        let batch = batches.get(0).unwrap();
        assert!(batch.before_render().is_some());
        assert!(batch.after_render().is_some());
    }

    #[test]
    fn test_isolated_mesh_is_alone() {
        let mut meshes = vec![square(0.0), square(20.0), square(40.0)];
        meshes[1].add_filter(Filter::Blur(2.0)).unwrap();
        assert_eq!(compress(&mut meshes), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_program_and_uniforms_break_batches() {
        let mut meshes = vec![square(0.0), square(20.0), square(40.0), square(60.0)];
        meshes[1].set_program(Some(ProgramId(3)));
        meshes[3].add_filter(Filter::Sepia(1.0)).unwrap();
        assert_eq!(
            compress(&mut meshes),
            vec![vec![0], vec![1], vec![2], vec![3]]
        );
    }

    #[test]
    fn test_gradient_uniforms_break_batches() {
        let mut meshes = vec![square(0.0), square(20.0)];
        meshes[1]
            .set_gradient(
                GradientKind::Linear,
                &[0.0, 0.0, 10.0, 0.0],
                vec![GradientStop::new(0.0, Color::RED), GradientStop::new(1.0, Color::BLUE)],
                GradientTarget::Fill,
            )
            .unwrap();
        let compressor = BatchCompressor::default();
        let mut pool = ScratchPool::default();
        let batches = compressor.compress(&mut meshes, &mut pool).unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches.get(0).unwrap().gradient_coords().is_none());
        assert!(batches.get(1).unwrap().gradient_coords().is_some());
    }

    #[test]
    fn test_culled_meshes_keep_contiguity() {
        let mut hidden = square(20.0);
        hidden.clear_fill();
        let mut meshes = vec![square(0.0), hidden, square(40.0)];
        let compressor = BatchCompressor::default();
        let mut pool = ScratchPool::default();
        let batches = compressor.compress(&mut meshes, &mut pool).unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(batches.get(0).unwrap().members(), &[0, 2]);
        assert_eq!(batches.culled_count(), 1);
        assert_eq!(batches.mesh_count(), 2);
    }

    #[test]
    fn test_capacity_forces_boundary() {
        let per_mesh = square(0.0).mesh_data().vertex_count();
        let config = PipelineConfig::default().with_max_vertices_per_batch(per_mesh * 2);
        let compressor = BatchCompressor::new(config);
        let mut meshes: Vec<Mesh> = (0..5).map(|i| square(i as f32 * 20.0)).collect();
        let mut pool = ScratchPool::default();
        let batches = compressor.compress(&mut meshes, &mut pool).unwrap();

        let members: Vec<usize> = batches.iter().map(|b| b.pack_length()).collect();
        assert_eq!(members, vec![2, 2, 1]);
        assert!(batches.iter().all(|b| b.vertex_count() <= per_mesh * 2));
    }

    #[test]
    fn test_oversized_mesh_forms_its_own_batch() {
        let config = PipelineConfig::default().with_max_vertices_per_batch(1);
        let compressor = BatchCompressor::new(config);
        let mut meshes = vec![square(0.0), square(20.0)];
        let mut pool = ScratchPool::default();
        let batches = compressor.compress(&mut meshes, &mut pool).unwrap();
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_pool_ceiling_fails() {
        let mut meshes: Vec<Mesh> = (0..4).map(|i| square(i as f32 * 20.0)).collect();
        let per_mesh = meshes[0].mesh_data().vertex_count();
        let compressor = BatchCompressor::default();
        let mut pool = ScratchPool::new(per_mesh * 2);
        let err = compressor.compress(&mut meshes, &mut pool).unwrap_err();
        assert!(matches!(err, MeshError::CapacityExceeded { limit, .. } if limit == per_mesh * 2));
    }

    #[test]
    fn test_enable_blend_is_ored() {
        let mut meshes = vec![square(0.0), square(20.0)];
        meshes[1].set_opacity(0.5);
        let compressor = BatchCompressor::default();
        let mut pool = ScratchPool::default();
        let batches = compressor.compress(&mut meshes, &mut pool).unwrap();
        assert_eq!(batches.len(), 1);
        assert!(batches.get(0).unwrap().enable_blend());
    }

    #[test]
    fn test_pool_is_reused_between_calls() {
        let mut meshes: Vec<Mesh> = (0..8).map(|i| square(i as f32 * 20.0)).collect();
        let compressor = BatchCompressor::default();
        let mut pool = ScratchPool::default();
        compressor.compress(&mut meshes, &mut pool).unwrap();
        let grows = pool.grow_count();
        compressor.compress(&mut meshes, &mut pool).unwrap();
        assert_eq!(pool.grow_count(), grows);
    }
}
