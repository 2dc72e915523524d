//! Mesh assembly: styles, transform and paint bound to a shared figure,
//! with lazily derived vertex data.

use std::f32::consts::SQRT_2;
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use meshkit_core::profiling::{profile_function, profile_scope};
use meshkit_core::{Color, MeshError, PipelineConfig, Result};

use crate::contour::{Aabb, Contour, Contours};
use crate::dirty::MeshDirty;
use crate::extrude::extrude;
use crate::fill::FillStyle;
use crate::filter::{Filter, FilterChain};
use crate::paint::{Gradient, GradientKind, GradientStop, GradientTarget};
use crate::path::Figure;
use crate::stroke::{LineJoin, StrokeStyle};
use crate::tessellator::{LyonTriangulator, Triangulator};
use crate::texture::{
    ClipMask, NO_TEXTURE_COORD, Texture, TextureOptions, TextureProvider, texture_coord,
};
use crate::transform::Transform2D;
use crate::uniforms::{TextureUniform, Uniforms};

/// Shader program override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u64);

/// Position of the current draw within a frame, passed to render hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookContext {
    pub pack_index: usize,
    pub pack_length: usize,
}

/// Callback run around the draw of the batch containing a mesh.
pub type RenderHook = Arc<dyn Fn(&HookContext) + Send + Sync>;

/// Vertex data derived from a [`Mesh`].
///
/// Fill vertices come first, followed by stroke vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    /// World positions as `[x, y, tag]`. The tag is `+opacity` for fill
    /// vertices and `-opacity` for stroke vertices.
    pub positions: Vec<[f32; 3]>,
    /// Figure-space positions before the transform.
    pub position0: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub colors: Vec<[u8; 4]>,
    /// Texture coordinates; stroke vertices carry [`NO_TEXTURE_COORD`].
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// Normalized `[x, y, w, h]` of the sampled image region, per vertex.
    pub source_rects: Option<Vec<[f32; 4]>>,
    pub clip_uvs: Option<Vec<[f32; 2]>>,
    /// Gradient parameter per vertex, computed in figure space.
    pub gradient_coords: Option<Vec<f32>>,
    pub fill_vertex_count: usize,
    pub fill_index_count: usize,
}

impl MeshBuffer {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn fill_indices(&self) -> &[u32] {
        &self.indices[..self.fill_index_count]
    }

    pub fn stroke_indices(&self) -> &[u32] {
        &self.indices[self.fill_index_count..]
    }
}

/// A figure with its styles, paint and transform.
///
/// ```
/// use glam::Vec2;
/// use meshkit_core::Color;
/// use meshkit_geometry::{FillStyle, Figure, Mesh};
///
/// let mut figure = Figure::new();
/// figure.rect(Vec2::ZERO, Vec2::new(10.0, 10.0));
///
/// let mut mesh = Mesh::new(figure);
/// mesh.set_fill(FillStyle::solid(Color::RED));
/// assert!(mesh.is_point_in_fill(Vec2::new(5.0, 5.0)));
/// assert!(!mesh.mesh_data().is_empty());
/// ```
#[derive(Clone)]
pub struct Mesh {
    figure: Arc<Figure>,
    contours: Arc<Contours>,
    /// Transform scale the current contours were fetched for.
    flatten_scale: f32,
    fill: Option<FillStyle>,
    stroke: Option<StrokeStyle>,
    transform: Transform2D,
    texture: Option<(Texture, TextureOptions)>,
    fill_gradient: Option<Gradient>,
    stroke_gradient: Option<Gradient>,
    filters: FilterChain,
    opacity: f32,
    program: Option<ProgramId>,
    before_render: Option<RenderHook>,
    after_render: Option<RenderHook>,
    clip: Option<ClipMask>,
    uniforms: Uniforms,
    buffer: MeshBuffer,
    dirty: MeshDirty,
    triangulator: Arc<dyn Triangulator>,
    config: PipelineConfig,
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("fill", &self.fill)
            .field("stroke", &self.stroke)
            .field("transform", &self.transform)
            .field("texture", &self.texture)
            .field("opacity", &self.opacity)
            .field("program", &self.program)
            .field("filters", &self.filters.css_text())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl Mesh {
    pub fn new(figure: impl Into<Arc<Figure>>) -> Self {
        Self::with_config(figure, PipelineConfig::default())
    }

    pub fn with_config(figure: impl Into<Arc<Figure>>, config: PipelineConfig) -> Self {
        let figure = figure.into();
        let contours = figure.contours(1.0);
        Self {
            figure,
            contours,
            flatten_scale: 1.0,
            fill: None,
            stroke: None,
            transform: Transform2D::IDENTITY,
            texture: None,
            fill_gradient: None,
            stroke_gradient: None,
            filters: FilterChain::new(),
            opacity: 1.0,
            program: None,
            before_render: None,
            after_render: None,
            clip: None,
            uniforms: Uniforms::default(),
            buffer: MeshBuffer::default(),
            dirty: MeshDirty::TOPOLOGY,
            triangulator: Arc::new(LyonTriangulator::new()),
            config,
        }
    }

    /// Replace the fill triangulator.
    pub fn with_triangulator(mut self, triangulator: Arc<dyn Triangulator>) -> Self {
        self.triangulator = triangulator;
        self.dirty |= MeshDirty::TOPOLOGY;
        self
    }

    pub fn figure(&self) -> &Arc<Figure> {
        &self.figure
    }

    /// Swap the figure, keeping every style.
    pub fn set_figure(&mut self, figure: impl Into<Arc<Figure>>) -> &mut Self {
        self.figure = figure.into();
        self.contours = self.figure.contours(self.flatten_scale);
        self.dirty |= MeshDirty::TOPOLOGY;
        self
    }

    pub fn contours(&self) -> &Arc<Contours> {
        &self.contours
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn dirty(&self) -> MeshDirty {
        self.dirty
    }

    pub fn fill(&self) -> Option<&FillStyle> {
        self.fill.as_ref()
    }

    pub fn stroke(&self) -> Option<&StrokeStyle> {
        self.stroke.as_ref()
    }

    pub fn transform_matrix(&self) -> &Transform2D {
        &self.transform
    }

    pub fn texture(&self) -> Option<&(Texture, TextureOptions)> {
        self.texture.as_ref()
    }

    /// Figure-space gradient for `target`.
    pub fn gradient(&self, target: GradientTarget) -> Option<&Gradient> {
        match target {
            GradientTarget::Fill => self.fill_gradient.as_ref(),
            GradientTarget::Stroke => self.stroke_gradient.as_ref(),
        }
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn before_render(&self) -> Option<&RenderHook> {
        self.before_render.as_ref()
    }

    pub fn after_render(&self) -> Option<&RenderHook> {
        self.after_render.as_ref()
    }

    pub fn clip_mask(&self) -> Option<&ClipMask> {
        self.clip.as_ref()
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    // ---- styles -------------------------------------------------------

    pub fn set_fill(&mut self, fill: FillStyle) -> &mut Self {
        let color_only = self.fill.is_some_and(|old| old.rule == fill.rule);
        self.fill = Some(fill);
        self.dirty |= if color_only {
            MeshDirty::COLORS
        } else {
            MeshDirty::TOPOLOGY
        };
        self
    }

    pub fn clear_fill(&mut self) -> &mut Self {
        if self.fill.take().is_some() {
            self.dirty |= MeshDirty::TOPOLOGY;
        }
        self
    }

    /// Set the stroke style after checking its width and dash pattern.
    pub fn set_stroke(&mut self, stroke: StrokeStyle) -> Result<&mut Self> {
        stroke.validate()?;
        let color_only = self.stroke.as_ref().is_some_and(|old| {
            let mut recolored = old.clone();
            recolored.color = stroke.color;
            recolored == stroke
        });
        self.stroke = Some(stroke);
        self.dirty |= if color_only {
            MeshDirty::COLORS
        } else {
            MeshDirty::TOPOLOGY
        };
        Ok(self)
    }

    pub fn clear_stroke(&mut self) -> &mut Self {
        if self.stroke.take().is_some() {
            self.dirty |= MeshDirty::TOPOLOGY;
        }
        self
    }

    /// Overall opacity, clamped to `0..=1`.
    pub fn set_opacity(&mut self, opacity: f32) -> &mut Self {
        self.opacity = if opacity.is_nan() {
            0.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        self.dirty |= MeshDirty::COLORS;
        self
    }

    pub fn set_program(&mut self, program: Option<ProgramId>) -> &mut Self {
        self.program = program;
        self
    }

    pub fn set_before_render(&mut self, hook: Option<RenderHook>) -> &mut Self {
        self.before_render = hook;
        self
    }

    pub fn set_after_render(&mut self, hook: Option<RenderHook>) -> &mut Self {
        self.after_render = hook;
        self
    }

    // ---- texture ------------------------------------------------------

    /// Paint the fill with `texture`. A mesh without a fill gets a transparent one.
    pub fn set_texture(&mut self, texture: Texture, options: TextureOptions) -> &mut Self {
        if self.fill.is_none() {
            self.fill = Some(FillStyle::solid(Color::TRANSPARENT));
            self.dirty |= MeshDirty::TOPOLOGY;
        }
        self.uniforms.texture = Some(TextureUniform {
            handle: texture.handle,
            repeat: options.repeat,
        });
        self.texture = Some((texture, options));
        self.dirty |= MeshDirty::TEXTURE_COORDS;
        self
    }

    pub fn clear_texture(&mut self) -> &mut Self {
        if self.texture.take().is_some() {
            self.dirty |= MeshDirty::TEXTURE_COORDS;
        }
        self.uniforms.texture = None;
        self
    }

    /// Load `url` through `provider` and use it as the fill texture.
    ///
    /// A missing image degrades to an untextured mesh instead of failing.
    pub async fn load_texture<P: TextureProvider>(
        &mut self,
        provider: &P,
        url: &str,
        options: TextureOptions,
    ) -> Result<()> {
        match provider.load_image(url).await {
            Ok(image) => {
                let handle = provider.create_texture(&image);
                self.set_texture(Texture::new(handle, image.width, image.height), options);
            }
            Err(err) => {
                let err = match err {
                    MeshError::DegradedRender(_) => err,
                    other => MeshError::DegradedRender(format!("image {url} unavailable: {other}")),
                };
                tracing::warn!("Rendering without texture: {}", err);
                self.clear_texture();
            }
        }
        Ok(())
    }

    // ---- gradients ----------------------------------------------------

    /// Paint `target` with a gradient given by a raw vector of `kind.arity()` floats.
    pub fn set_gradient(
        &mut self,
        kind: GradientKind,
        vector: &[f32],
        stops: Vec<GradientStop>,
        target: GradientTarget,
    ) -> Result<&mut Self> {
        let gradient = Gradient::new(kind, vector, stops)?;
        let world = Some(gradient.transformed(&self.transform));
        match target {
            GradientTarget::Fill => {
                self.fill_gradient = Some(gradient);
                self.uniforms.fill_gradient = world;
            }
            GradientTarget::Stroke => {
                self.stroke_gradient = Some(gradient);
                self.uniforms.stroke_gradient = world;
            }
        }
        self.dirty |= MeshDirty::GRADIENT;
        Ok(self)
    }

    pub fn clear_gradient(&mut self, target: GradientTarget) -> &mut Self {
        match target {
            GradientTarget::Fill => {
                self.fill_gradient = None;
                self.uniforms.fill_gradient = None;
            }
            GradientTarget::Stroke => {
                self.stroke_gradient = None;
                self.uniforms.stroke_gradient = None;
            }
        }
        self.dirty |= MeshDirty::GRADIENT;
        self
    }

    // ---- filters and clipping -------------------------------------------

    /// Append a filter; color-matrix filters compose after the existing ones.
    pub fn add_filter(&mut self, filter: Filter) -> Result<&mut Self> {
        self.filters.push(filter)?;
        self.uniforms.color_matrix = self.filters.color_matrix().copied();
        Ok(self)
    }

    pub fn clear_filters(&mut self) -> &mut Self {
        self.filters.clear();
        self.uniforms.color_matrix = None;
        self
    }

    /// Whether the mesh has filters that cannot be expressed as a color matrix.
    pub fn needs_isolation(&self) -> bool {
        self.filters.needs_isolation()
    }

    pub fn set_clip_mask(&mut self, clip: Option<ClipMask>) -> &mut Self {
        self.clip = clip;
        self.uniforms.clip = clip.map(|c| c.texture);
        self.dirty |= MeshDirty::CLIP;
        self
    }

    // ---- transforms ---------------------------------------------------

    pub fn set_transform(&mut self, transform: Transform2D) -> &mut Self {
        self.transform = transform;
        self.transform_changed();
        self
    }

    /// Apply `m` after the current transform.
    pub fn transform(&mut self, m: Transform2D) -> &mut Self {
        let combined = self.transform.then(&m);
        self.set_transform(combined)
    }

    pub fn translate(&mut self, offset: Vec2) -> &mut Self {
        self.transform(Transform2D::translate(offset))
    }

    /// Rotate by `angle` radians around `origin`.
    pub fn rotate(&mut self, angle: f32, origin: Vec2) -> &mut Self {
        self.transform(Transform2D::rotate(angle).about(origin))
    }

    pub fn scale(&mut self, scale: Vec2, origin: Vec2) -> &mut Self {
        self.transform(Transform2D::scale_xy(scale).about(origin))
    }

    /// Skew by angles in radians around `origin`.
    pub fn skew(&mut self, skew_x: f32, skew_y: f32, origin: Vec2) -> &mut Self {
        self.transform(Transform2D::skew(skew_x, skew_y).about(origin))
    }

    fn transform_changed(&mut self) {
        self.dirty |= MeshDirty::TRANSFORM;
        self.uniforms.fill_gradient = self.fill_gradient.as_ref().map(|g| g.transformed(&self.transform));
        self.uniforms.stroke_gradient = self
            .stroke_gradient
            .as_ref()
            .map(|g| g.transformed(&self.transform));

        let scale = self.transform.uniform_scale();
        if scale.is_finite()
            && scale > 0.0
            && !self.config.within_reflatten_band(self.flatten_scale, scale)
        {
            tracing::debug!(
                "Re-flattening figure: scale {} left band around {}",
                scale,
                self.flatten_scale
            );
            self.contours = self.figure.contours(scale);
            self.flatten_scale = scale;
            self.dirty |= MeshDirty::TOPOLOGY;
        }
    }

    // ---- queries ------------------------------------------------------

    /// Nothing this mesh would draw is visible.
    pub fn can_ignore(&self) -> bool {
        if self.opacity <= 0.0 {
            return true;
        }
        self.program.is_none()
            && self.before_render.is_none()
            && self.after_render.is_none()
            && self.texture.is_none()
            && self.fill_gradient.is_none()
            && self.stroke_gradient.is_none()
            && !self.fill.is_some_and(|f| f.is_visible())
            && !self.stroke.as_ref().is_some_and(StrokeStyle::is_visible)
    }

    /// Whether drawing needs alpha blending.
    pub fn enable_blend(&self) -> bool {
        self.opacity < 1.0
            || self.texture.is_some()
            || self.fill.is_some_and(|f| !f.color.is_opaque())
            || self.stroke.as_ref().is_some_and(|s| !s.color.is_opaque())
            || self.fill_gradient.as_ref().is_some_and(Gradient::is_translucent)
            || self.stroke_gradient.as_ref().is_some_and(Gradient::is_translucent)
    }

    /// World-space bounding box of the figure, including the stroke reach.
    pub fn bounding_box(&self) -> Option<Aabb> {
        let local = self.local_bounds(self.stroke_reach())?;
        let corners = [
            local.min,
            Vec2::new(local.max.x, local.min.y),
            local.max,
            Vec2::new(local.min.x, local.max.y),
        ]
        .map(|c| self.transform.transform_point(c));
        Aabb::from_points(corners.iter())
    }

    pub fn is_point_in_fill(&mut self, point: Vec2) -> bool {
        if self.fill.is_none() {
            return false;
        }
        let Some(local) = self.to_local(point, 0.0) else {
            return false;
        };
        let buffer = self.mesh_data();
        triangles_contain(&buffer.position0, buffer.fill_indices(), local)
    }

    pub fn is_point_in_stroke(&mut self, point: Vec2) -> bool {
        if self.stroke.is_none() {
            return false;
        }
        let Some(local) = self.to_local(point, self.stroke_reach()) else {
            return false;
        };
        let buffer = self.mesh_data();
        triangles_contain(&buffer.position0, buffer.stroke_indices(), local)
    }

    /// Map `point` into figure space, rejecting it early if it is outside the
    /// figure bounds grown by `reach`.
    fn to_local(&self, point: Vec2, reach: f32) -> Option<Vec2> {
        let local = self.transform.inverse()?.transform_point(point);
        self.local_bounds(reach)?.contains(local).then_some(local)
    }

    fn local_bounds(&self, reach: f32) -> Option<Aabb> {
        Some(self.contours.bounding_box()?.inflate(reach))
    }

    /// How far stroke geometry can extend beyond the centerline.
    fn stroke_reach(&self) -> f32 {
        match &self.stroke {
            Some(s) if s.join == LineJoin::Miter => s.half_width() * s.miter_limit.max(SQRT_2),
            Some(s) => s.half_width() * SQRT_2,
            None => 0.0,
        }
    }

    // ---- assembly -----------------------------------------------------

    /// Vertex data for the current state, rebuilding whatever is dirty.
    pub fn mesh_data(&mut self) -> &MeshBuffer {
        if self.dirty.is_empty() {
            return &self.buffer;
        }
        profile_function!();
        let dirty = self.dirty;

        if dirty.needs_topology() {
            self.rebuild_topology();
        }
        if dirty.needs_positions() {
            self.rebuild_positions();
        }
        if dirty.needs_colors() {
            self.rebuild_colors();
        }
        if dirty.needs_texture_coords() {
            self.rebuild_texture_coords();
        }
        if dirty.needs_gradient() {
            self.rebuild_gradient_coords();
        }
        if dirty.needs_clip() {
            self.rebuild_clip_uvs();
        }

        tracing::trace!(
            "Rebuilt mesh buffer ({:?}): {} vertices, {} indices",
            dirty,
            self.buffer.vertex_count(),
            self.buffer.index_count()
        );
        self.dirty = MeshDirty::NONE;
        &self.buffer
    }

    fn rebuild_topology(&mut self) {
        profile_scope!("rebuild_topology");
        let mut position0 = Vec::new();
        let mut indices = Vec::new();

        if let Some(fill) = &self.fill {
            let polygons: Vec<Contour> = self
                .contours
                .iter()
                .filter(|c| c.len() >= 3)
                .cloned()
                .collect();
            if !polygons.is_empty() {
                match self.triangulator.triangulate(&polygons, fill.rule) {
                    Ok(triangulation) => {
                        position0 = triangulation.vertices;
                        indices = triangulation.indices;
                    }
                    Err(err) => {
                        tracing::warn!("Fill triangulation failed, drawing no fill: {}", err);
                    }
                }
            }
        }
        let fill_vertex_count = position0.len();
        let fill_index_count = indices.len();

        if let Some(stroke) = self.stroke.as_ref().filter(|s| s.width > 0.0) {
            match extrude(&self.contours, stroke, self.config.max_miter_value) {
                Ok(mesh) => {
                    let base = position0.len() as u32;
                    position0.extend(mesh.vertices);
                    indices.extend(mesh.indices.into_iter().map(|i| i + base));
                }
                Err(err) => {
                    tracing::warn!("Stroke extrusion failed, drawing no stroke: {}", err);
                }
            }
        }

        self.buffer.position0 = position0;
        self.buffer.indices = indices;
        self.buffer.fill_vertex_count = fill_vertex_count;
        self.buffer.fill_index_count = fill_index_count;
    }

    fn rebuild_positions(&mut self) {
        let buffer = &mut self.buffer;
        let transform = &self.transform;
        let opacity = self.opacity;
        let fill_count = buffer.fill_vertex_count;
        buffer.positions.clear();
        buffer.positions.extend(buffer.position0.iter().enumerate().map(|(i, p)| {
            let world = transform.transform_point(*p);
            let tag = if i < fill_count {
                opacity
            } else {
                -opacity
            };
            [world.x, world.y, tag]
        }));
    }

    fn rebuild_colors(&mut self) {
        let fill = self.fill.map(|f| f.color).unwrap_or(Color::TRANSPARENT).to_rgba8();
        let stroke = self
            .stroke
            .as_ref()
            .map(|s| s.color)
            .unwrap_or(Color::TRANSPARENT)
            .to_rgba8();
        let buffer = &mut self.buffer;
        let total = buffer.position0.len();
        buffer.colors.clear();
        buffer.colors.resize(buffer.fill_vertex_count, fill);
        buffer.colors.resize(total, stroke);
    }

    fn rebuild_texture_coords(&mut self) {
        let buffer = &mut self.buffer;
        let Some((texture, options)) = &self.texture else {
            buffer.tex_coords = None;
            buffer.source_rects = None;
            return;
        };

        let fill = &buffer.position0[..buffer.fill_vertex_count];
        let placed = if options.scale_to_fit {
            Aabb::from_points(fill.iter())
        } else {
            options.rect
        };
        let rect = placed.unwrap_or(Aabb {
            min: Vec2::ZERO,
            max: texture.size(),
        });

        let mut coords: Vec<[f32; 2]> = fill
            .iter()
            .map(|p| texture_coord(*p, &rect, options.rotated))
            .collect();
        coords.resize(buffer.position0.len(), NO_TEXTURE_COORD);
        buffer.tex_coords = Some(coords);

        let size = texture.size().max(Vec2::ONE);
        let source = options.src_rect.map_or([0.0, 0.0, 1.0, 1.0], |src| {
            let min = src.min / size;
            let extent = src.size() / size;
            [min.x, min.y, extent.x, extent.y]
        });
        buffer.source_rects = Some(vec![source; buffer.position0.len()]);
    }

    fn rebuild_gradient_coords(&mut self) {
        let buffer = &mut self.buffer;
        if self.fill_gradient.is_none() && self.stroke_gradient.is_none() {
            buffer.gradient_coords = None;
            return;
        }
        let fill_count = buffer.fill_vertex_count;
        let coords = buffer
            .position0
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let gradient = if i < fill_count {
                    &self.fill_gradient
                } else {
                    &self.stroke_gradient
                };
                gradient.as_ref().map_or(0.0, |g| g.parameter_at(*p))
            })
            .collect();
        buffer.gradient_coords = Some(coords);
    }

    fn rebuild_clip_uvs(&mut self) {
        let buffer = &mut self.buffer;
        let Some(clip) = &self.clip else {
            buffer.clip_uvs = None;
            return;
        };
        let uvs = buffer
            .position0
            .iter()
            .map(|p| texture_coord(self.transform.transform_point(*p), &clip.rect, false))
            .collect();
        buffer.clip_uvs = Some(uvs);
    }
}

/// Whether `p` lies in any triangle of `indices`. Points on an edge count as inside.
fn triangles_contain(vertices: &[Vec2], indices: &[u32], p: Vec2) -> bool {
    indices.chunks_exact(3).any(|tri| {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vertices[i as usize]);
        point_in_triangle(p, a, b, c)
    })
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
