//! Instanced drawing of one mesh many times.

use meshkit_core::{Color, MeshError, Result};
use meshkit_geometry::{Mesh, Texture, Transform2D};

/// Maximum number of texture frames a cloud can switch between.
pub const MAX_CLOUD_FRAMES: usize = 12;

/// Frame value packed for instances without a texture frame.
pub const NO_FRAME: f32 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Instance {
    transform: Transform2D,
    fill: Option<Color>,
    stroke: Option<Color>,
    frame: Option<usize>,
}

impl Default for Instance {
    fn default() -> Self {
        Self {
            transform: Transform2D::IDENTITY,
            fill: None,
            stroke: None,
            frame: None,
        }
    }
}

/// Per-instance attributes ready for upload.
///
/// `attributes[i]` is `[a, b, c, d, e, f, frame]`, the instance transform
/// followed by its texture frame or [`NO_FRAME`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceData {
    pub attributes: Vec<[f32; 7]>,
    pub fill_colors: Vec<[u8; 4]>,
    pub stroke_colors: Vec<[u8; 4]>,
}

impl InstanceData {
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attribute_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.attributes)
    }

    pub fn fill_color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.fill_colors)
    }

    pub fn stroke_color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.stroke_colors)
    }
}

/// A mesh drawn `amount` times with per-instance transform, colors and
/// texture frame.
///
/// Instance transforms apply after the mesh's own transform. Instances
/// without a color override use the mesh's fill and stroke colors.
///
/// ```
/// use glam::Vec2;
/// use meshkit_core::Color;
/// use meshkit_geometry::{Figure, FillStyle, Mesh, Transform2D};
/// use meshkit_render::MeshCloud;
///
/// let mut figure = Figure::new();
/// figure.circle(Vec2::ZERO, 4.0);
/// let mut mesh = Mesh::new(figure);
/// mesh.set_fill(FillStyle::solid(Color::RED));
///
/// let mut cloud = MeshCloud::new(mesh, 100);
/// for i in 0..100 {
///     cloud
///         .set_transform(i, Transform2D::translate(Vec2::new(i as f32 * 10.0, 0.0)))
///         .unwrap();
/// }
/// assert!(cloud.set_transform(100, Transform2D::IDENTITY).is_err());
/// assert_eq!(cloud.instance_data().len(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct MeshCloud {
    mesh: Mesh,
    instances: Vec<Instance>,
    frames: Vec<Texture>,
}

impl MeshCloud {
    pub fn new(mesh: Mesh, amount: usize) -> Self {
        Self {
            mesh,
            instances: vec![Instance::default(); amount],
            frames: Vec::new(),
        }
    }

    pub fn amount(&self) -> usize {
        self.instances.len()
    }

    /// Change the instance count. New instances start untransformed.
    pub fn set_amount(&mut self, amount: usize) -> &mut Self {
        self.instances.resize(amount, Instance::default());
        self
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    fn instance(&self, index: usize) -> Result<&Instance> {
        self.instances
            .get(index)
            .ok_or_else(|| MeshError::invalid("Out of range"))
    }

    fn instance_mut(&mut self, index: usize) -> Result<&mut Instance> {
        self.instances
            .get_mut(index)
            .ok_or_else(|| MeshError::invalid("Out of range"))
    }

    // Transforms

    pub fn transform_of(&self, index: usize) -> Result<Transform2D> {
        Ok(self.instance(index)?.transform)
    }

    pub fn set_transform(&mut self, index: usize, transform: Transform2D) -> Result<&mut Self> {
        self.instance_mut(index)?.transform = transform;
        Ok(self)
    }

    /// Apply `m` after the current transform of instance `index`.
    pub fn transform(&mut self, index: usize, m: Transform2D) -> Result<&mut Self> {
        let instance = self.instance_mut(index)?;
        instance.transform = instance.transform.then(&m);
        Ok(self)
    }

    // Colors

    pub fn set_fill_color(&mut self, index: usize, color: Option<Color>) -> Result<&mut Self> {
        self.instance_mut(index)?.fill = color;
        Ok(self)
    }

    pub fn set_stroke_color(&mut self, index: usize, color: Option<Color>) -> Result<&mut Self> {
        self.instance_mut(index)?.stroke = color;
        Ok(self)
    }

    /// Effective fill color of instance `index`.
    pub fn fill_color(&self, index: usize) -> Result<Color> {
        let instance = self.instance(index)?;
        Ok(instance.fill.unwrap_or_else(|| self.mesh_fill()))
    }

    /// Effective stroke color of instance `index`.
    pub fn stroke_color(&self, index: usize) -> Result<Color> {
        let instance = self.instance(index)?;
        Ok(instance.stroke.unwrap_or_else(|| self.mesh_stroke()))
    }

    fn mesh_fill(&self) -> Color {
        self.mesh.fill().map_or(Color::TRANSPARENT, |f| f.color)
    }

    fn mesh_stroke(&self) -> Color {
        self.mesh.stroke().map_or(Color::TRANSPARENT, |s| s.color)
    }

    // Frames

    /// Register a texture frame and return its index.
    pub fn add_frame(&mut self, texture: Texture) -> Result<usize> {
        if self.frames.len() >= MAX_CLOUD_FRAMES {
            return Err(MeshError::CapacityExceeded {
                what: "cloud frames",
                requested: self.frames.len() + 1,
                limit: MAX_CLOUD_FRAMES,
            });
        }
        self.frames.push(texture);
        Ok(self.frames.len() - 1)
    }

    pub fn frames(&self) -> &[Texture] {
        &self.frames
    }

    /// Drop all frames and reset every instance to no frame.
    pub fn clear_frames(&mut self) -> &mut Self {
        self.frames.clear();
        for instance in &mut self.instances {
            instance.frame = None;
        }
        self
    }

    pub fn frame_index(&self, index: usize) -> Result<Option<usize>> {
        Ok(self.instance(index)?.frame)
    }

    /// Select the texture frame of instance `index`; `None` draws without one.
    pub fn set_frame_index(&mut self, index: usize, frame: Option<usize>) -> Result<&mut Self> {
        if let Some(frame) = frame
            && frame >= self.frames.len()
        {
            return Err(MeshError::invalid(format!(
                "frame {} out of range, cloud has {} frames",
                frame,
                self.frames.len()
            )));
        }
        self.instance_mut(index)?.frame = frame;
        Ok(self)
    }

    /// Pack the per-instance attributes for upload.
    pub fn instance_data(&self) -> InstanceData {
        let fill = self.mesh_fill();
        let stroke = self.mesh_stroke();
        let mut data = InstanceData {
            attributes: Vec::with_capacity(self.instances.len()),
            fill_colors: Vec::with_capacity(self.instances.len()),
            stroke_colors: Vec::with_capacity(self.instances.len()),
        };
        for instance in &self.instances {
            let [a, b, c, d, e, f] = instance.transform.to_array();
            let frame = instance.frame.map_or(NO_FRAME, |frame| frame as f32);
            data.attributes.push([a, b, c, d, e, f, frame]);
            data.fill_colors.push(instance.fill.unwrap_or(fill).to_rgba8());
            data.stroke_colors.push(instance.stroke.unwrap_or(stroke).to_rgba8());
        }
        data
    }
}
