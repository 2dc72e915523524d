//! Renderer facade: compress, pick a shader variant, draw.

use bitflags::bitflags;
use meshkit_core::profiling::{profile_function, profile_scope};
use meshkit_core::{MeshError, PipelineConfig, Result};
use meshkit_geometry::{HookContext, Mesh, MeshBuffer, Texture, Uniforms};

use crate::batch::Batch;
use crate::cloud::{InstanceData, MeshCloud};
use crate::compress::BatchCompressor;
use crate::scratch::ScratchPool;

bitflags! {
    /// Shader features a draw needs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderVariant: u8 {
        const NONE     = 0b0000_0000;
        /// Sample a texture through per-vertex coordinates and source rects.
        const TEXTURE  = 0b0000_0001;
        /// Apply the color matrix uniform.
        const FILTER   = 0b0000_0010;
        /// Evaluate the fill and stroke gradient uniforms.
        const GRADIENT = 0b0000_0100;
        /// Multiply by the clip mask.
        const CLIP     = 0b0000_1000;
        /// Instanced draw with per-instance transforms, colors and frames.
        const CLOUD    = 0b0001_0000;
    }
}

impl ShaderVariant {
    pub fn for_uniforms(uniforms: &Uniforms) -> Self {
        let mut variant = Self::NONE;
        variant.set(Self::TEXTURE, uniforms.texture.is_some());
        variant.set(Self::FILTER, uniforms.color_matrix.is_some());
        variant.set(Self::GRADIENT, uniforms.has_gradient());
        variant.set(Self::CLIP, uniforms.clip.is_some());
        variant
    }

    pub fn for_batch(batch: &Batch<'_>) -> Self {
        Self::for_uniforms(batch.uniforms())
    }
}

impl Default for ShaderVariant {
    fn default() -> Self {
        Self::NONE
    }
}

/// One instanced draw handed to [`RenderBackend::draw_cloud`].
#[derive(Debug, Clone, Copy)]
pub struct CloudDraw<'a> {
    pub buffer: &'a MeshBuffer,
    pub uniforms: &'a Uniforms,
    pub instances: &'a InstanceData,
    /// Textures selected by each instance's frame index.
    pub frames: &'a [Texture],
    pub enable_blend: bool,
}

/// Where batches end up.
///
/// The facade calls `draw` once per batch, in order, between the batch's
/// render hooks.
pub trait RenderBackend: Send {
    fn draw(&mut self, batch: &Batch<'_>, variant: ShaderVariant) -> Result<()>;

    /// Draw a mesh cloud. Backends without instancing report a degraded
    /// render, which the facade logs and skips.
    fn draw_cloud(&mut self, _cloud: &CloudDraw<'_>, _variant: ShaderVariant) -> Result<()> {
        Err(MeshError::DegradedRender(
            "backend does not support instanced drawing".into(),
        ))
    }
}

/// Statistics from one `render` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Number of draw calls issued.
    pub batches: usize,
    /// Meshes packed into a batch.
    pub meshes: usize,
    /// Meshes skipped because they draw nothing.
    pub culled: usize,
    pub vertices: usize,
    pub indices: usize,
    /// Cloud instances drawn.
    pub instances: usize,
}

/// Owns a backend together with the compressor and scratch pool feeding it.
///
/// ```
/// use glam::Vec2;
/// use meshkit_core::{Color, Result};
/// use meshkit_geometry::{Figure, FillStyle, Mesh};
/// use meshkit_render::{Batch, RenderBackend, Renderer, ShaderVariant};
///
/// #[derive(Default)]
/// struct CountingBackend {
///     draws: usize,
/// }
///
/// impl RenderBackend for CountingBackend {
///     fn draw(&mut self, _batch: &Batch<'_>, _variant: ShaderVariant) -> Result<()> {
///         self.draws += 1;
///         Ok(())
///     }
/// }
///
/// let mut figure = Figure::new();
/// figure.rect(Vec2::ZERO, Vec2::new(10.0, 10.0));
/// let mut mesh = Mesh::new(figure);
/// mesh.set_fill(FillStyle::solid(Color::GREEN));
///
/// let mut renderer = Renderer::new(CountingBackend::default());
/// let stats = renderer.render(&mut [mesh]).unwrap();
/// assert_eq!(stats.batches, 1);
/// assert_eq!(renderer.backend().draws, 1);
/// ```
pub struct Renderer<B: RenderBackend> {
    backend: B,
    compressor: BatchCompressor,
    pool: ScratchPool,
    stats: FrameStats,
}

impl<B: RenderBackend> Renderer<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, PipelineConfig::default())
    }

    pub fn with_config(backend: B, config: PipelineConfig) -> Self {
        tracing::debug!(
            "Creating renderer: {} vertices per batch, pool ceiling {}",
            config.max_vertices_per_batch,
            config.max_pool_vertices
        );
        Self {
            backend,
            pool: ScratchPool::from_config(&config),
            compressor: BatchCompressor::new(config),
            stats: FrameStats::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn compressor(&self) -> &BatchCompressor {
        &self.compressor
    }

    pub fn pool(&self) -> &ScratchPool {
        &self.pool
    }

    /// Statistics of the last `render` or `render_cloud` call.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Compress `meshes` and draw every batch in order.
    pub fn render(&mut self, meshes: &mut [Mesh]) -> Result<FrameStats> {
        profile_function!();
        let batches = self.compressor.compress(meshes, &mut self.pool)?;
        let mut stats = FrameStats {
            meshes: batches.mesh_count(),
            culled: batches.culled_count(),
            ..Default::default()
        };

        for batch in batches.iter() {
            profile_scope!("draw_batch");
            let variant = ShaderVariant::for_batch(&batch);
            let context = batch.hook_context();
            if let Some(hook) = batch.before_render() {
                hook(&context);
            }
            self.backend.draw(&batch, variant)?;
            if let Some(hook) = batch.after_render() {
                hook(&context);
            }
            stats.batches += 1;
            stats.vertices += batch.vertex_count();
            stats.indices += batch.index_count();
        }

        tracing::trace!(
            "Rendered {} meshes in {} batches ({} culled)",
            stats.meshes,
            stats.batches,
            stats.culled
        );
        self.stats = stats;
        Ok(stats)
    }

    /// Draw every instance of `cloud` with one instanced draw.
    pub fn render_cloud(&mut self, cloud: &mut MeshCloud) -> Result<FrameStats> {
        profile_function!();
        let mut stats = FrameStats::default();
        if cloud.amount() == 0 || cloud.mesh().can_ignore() {
            stats.culled = 1;
            self.stats = stats;
            return Ok(stats);
        }

        let instances = cloud.instance_data();
        let frames = cloud.frames().to_vec();
        let mesh = cloud.mesh_mut();
        let enable_blend = mesh.enable_blend();
        let before = mesh.before_render().cloned();
        let after = mesh.after_render().cloned();
        let uniforms = mesh.uniforms().clone();
        let buffer = mesh.mesh_data();
        if buffer.is_empty() {
            stats.culled = 1;
            self.stats = stats;
            return Ok(stats);
        }

        let mut variant = ShaderVariant::for_uniforms(&uniforms) | ShaderVariant::CLOUD;
        if !frames.is_empty() {
            variant |= ShaderVariant::TEXTURE;
        }
        let draw = CloudDraw {
            buffer,
            uniforms: &uniforms,
            instances: &instances,
            frames: &frames,
            enable_blend,
        };

        let context = HookContext {
            pack_index: 0,
            pack_length: 1,
        };
        if let Some(hook) = &before {
            hook(&context);
        }
        match self.backend.draw_cloud(&draw, variant) {
            Ok(()) => {
                stats.batches = 1;
                stats.meshes = 1;
                stats.vertices = buffer.vertex_count();
                stats.indices = buffer.index_count();
                stats.instances = instances.len();
            }
            Err(MeshError::DegradedRender(reason)) => {
                tracing::warn!("Skipping mesh cloud: {}", reason);
                stats.culled = 1;
            }
            Err(err) => return Err(err),
        }
        if let Some(hook) = &after {
            hook(&context);
        }

        self.stats = stats;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use meshkit_core::Color;
    use meshkit_geometry::{
        Aabb, ClipMask, Figure, FillStyle, Filter, TextureHandle, TextureOptions,
    };

    use super::*;

    #[derive(Default)]
    struct RecordingBackend {
        variants: Vec<ShaderVariant>,
    }

    impl RenderBackend for RecordingBackend {
        fn draw(&mut self, _batch: &Batch<'_>, variant: ShaderVariant) -> Result<()> {
            self.variants.push(variant);
            Ok(())
        }
    }

    fn square() -> Mesh {
        let mut figure = Figure::new();
        figure.rect(Vec2::ZERO, Vec2::splat(10.0));
        let mut mesh = Mesh::new(figure);
        mesh.set_fill(FillStyle::solid(Color::RED));
        mesh
    }

    #[test]
    fn test_variant_selection() {
        let plain = square();
        let mut filtered = square();
        filtered.add_filter(Filter::Grayscale(1.0)).unwrap();
        let mut textured = square();
        textured.set_texture(
            Texture::new(TextureHandle(1), 4, 4),
            TextureOptions::default(),
        );
        let mut clipped = square();
        clipped.set_clip_mask(Some(ClipMask {
            texture: TextureHandle(2),
            rect: Aabb {
                min: Vec2::ZERO,
                max: Vec2::splat(10.0),
            },
        }));

        let mut renderer = Renderer::new(RecordingBackend::default());
        renderer
            .render(&mut [plain, filtered, textured, clipped])
            .unwrap();
        assert_eq!(
            renderer.backend().variants,
            vec![
                ShaderVariant::NONE,
                ShaderVariant::FILTER,
                ShaderVariant::TEXTURE,
                ShaderVariant::CLIP,
            ]
        );
    }

    #[test]
    fn test_cloud_without_instancing_is_skipped() {
        let mut renderer = Renderer::new(RecordingBackend::default());
        let mut cloud = MeshCloud::new(square(), 4);
        let stats = renderer.render_cloud(&mut cloud).unwrap();
        assert_eq!(stats.batches, 0);
        assert_eq!(stats.culled, 1);
    }

    #[test]
    fn test_stats_are_kept() {
        let mut renderer = Renderer::new(RecordingBackend::default());
        let stats = renderer.render(&mut [square(), square()]).unwrap();
        assert_eq!(renderer.stats(), stats);
        assert_eq!(stats.meshes, 2);
        assert_eq!(stats.vertices, renderer.pool().vertex_len());
    }
}
