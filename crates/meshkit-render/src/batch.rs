//! Draw batches produced by the compressor.

use std::fmt;
use std::ops::Range;

use meshkit_geometry::{HookContext, ProgramId, RenderHook, Uniforms};

use crate::scratch::ScratchPool;

/// Layout of one batch inside the scratch pool.
#[derive(Clone)]
pub(crate) struct BatchPlan {
    pub(crate) vertices: Range<usize>,
    pub(crate) indices: Range<usize>,
    /// Uniforms of the first member with the texture promoted to the first
    /// textured member.
    pub(crate) uniforms: Uniforms,
    pub(crate) program: Option<ProgramId>,
    pub(crate) enable_blend: bool,
    pub(crate) isolated: bool,
    pub(crate) before_render: Option<RenderHook>,
    pub(crate) after_render: Option<RenderHook>,
    /// Input positions of the packed meshes, in order.
    pub(crate) members: Vec<usize>,
}

/// One draw call worth of merged meshes.
///
/// Vertex attributes are views into the [`ScratchPool`] the batch was
/// compressed into; indices are relative to the first vertex of the batch.
#[derive(Clone, Copy)]
pub struct Batch<'a> {
    pool: &'a ScratchPool,
    plan: &'a BatchPlan,
}

impl<'a> Batch<'a> {
    pub fn positions(&self) -> &'a [[f32; 3]] {
        &self.pool.positions[self.plan.vertices.clone()]
    }

    pub fn indices(&self) -> &'a [u32] {
        &self.pool.indices[self.plan.indices.clone()]
    }

    pub fn colors(&self) -> &'a [[u8; 4]] {
        &self.pool.colors[self.plan.vertices.clone()]
    }

    /// Texture coordinates, present when any member has a texture.
    pub fn tex_coords(&self) -> Option<&'a [[f32; 2]]> {
        self.is_textured()
            .then(|| &self.pool.tex_coords[self.plan.vertices.clone()])
    }

    /// Normalized source rects, present when any member has a texture.
    pub fn source_rects(&self) -> Option<&'a [[f32; 4]]> {
        self.is_textured()
            .then(|| &self.pool.source_rects[self.plan.vertices.clone()])
    }

    /// Clip mask coordinates, present when the batch is clipped.
    pub fn clip_uvs(&self) -> Option<&'a [[f32; 2]]> {
        self.plan
            .uniforms
            .clip
            .is_some()
            .then(|| &self.pool.clip_uvs[self.plan.vertices.clone()])
    }

    /// Gradient parameters, present when the batch carries a gradient.
    pub fn gradient_coords(&self) -> Option<&'a [f32]> {
        self.plan
            .uniforms
            .has_gradient()
            .then(|| &self.pool.gradient_coords[self.plan.vertices.clone()])
    }

    pub fn uniforms(&self) -> &'a Uniforms {
        &self.plan.uniforms
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.plan.program
    }

    pub fn is_textured(&self) -> bool {
        self.plan.uniforms.texture.is_some()
    }

    /// Whether any member needs alpha blending.
    pub fn enable_blend(&self) -> bool {
        self.plan.enable_blend
    }

    /// The batch holds one mesh that must be composited on its own.
    pub fn needs_isolation(&self) -> bool {
        self.plan.isolated
    }

    /// Hook of the first member.
    pub fn before_render(&self) -> Option<&'a RenderHook> {
        self.plan.before_render.as_ref()
    }

    /// Hook of the last member.
    pub fn after_render(&self) -> Option<&'a RenderHook> {
        self.plan.after_render.as_ref()
    }

    /// Input position of the first member.
    pub fn pack_index(&self) -> usize {
        self.plan.members.first().copied().unwrap_or_default()
    }

    /// Number of members.
    pub fn pack_length(&self) -> usize {
        self.plan.members.len()
    }

    /// Input positions of all members.
    pub fn members(&self) -> &'a [usize] {
        &self.plan.members
    }

    pub fn hook_context(&self) -> HookContext {
        HookContext {
            pack_index: self.pack_index(),
            pack_length: self.pack_length(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.plan.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.plan.indices.len()
    }

    // Byte views for upload

    pub fn position_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.positions())
    }

    pub fn index_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.indices())
    }

    pub fn color_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.colors())
    }
}

impl fmt::Debug for Batch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("vertices", &self.plan.vertices)
            .field("indices", &self.plan.indices)
            .field("members", &self.plan.members)
            .field("uniforms", &self.plan.uniforms)
            .field("program", &self.plan.program)
            .field("enable_blend", &self.plan.enable_blend)
            .field("isolated", &self.plan.isolated)
            .finish_non_exhaustive()
    }
}

/// Result of one compression. Borrows the scratch pool until dropped.
pub struct Batches<'a> {
    pool: &'a ScratchPool,
    plans: Vec<BatchPlan>,
    meshes: usize,
    culled: usize,
}

impl<'a> Batches<'a> {
    pub(crate) fn new(
        pool: &'a ScratchPool,
        plans: Vec<BatchPlan>,
        meshes: usize,
        culled: usize,
    ) -> Self {
        Self {
            pool,
            plans,
            meshes,
            culled,
        }
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Batch<'_>> {
        self.plans.get(index).map(|plan| Batch {
            pool: self.pool,
            plan,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Batch<'_>> + '_ {
        self.plans.iter().map(|plan| Batch {
            pool: self.pool,
            plan,
        })
    }

    /// Meshes packed into some batch.
    pub fn mesh_count(&self) -> usize {
        self.meshes
    }

    /// Meshes skipped because they draw nothing.
    pub fn culled_count(&self) -> usize {
        self.culled
    }

    pub fn vertex_count(&self) -> usize {
        self.pool.vertex_len()
    }

    pub fn index_count(&self) -> usize {
        self.pool.index_len()
    }
}

impl fmt::Debug for Batches<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'s> IntoIterator for &'s Batches<'_> {
    type Item = Batch<'s>;
    type IntoIter = Box<dyn Iterator<Item = Batch<'s>> + 's>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
