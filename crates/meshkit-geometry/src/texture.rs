//! Texture handles, texture placement and the async image source.

use std::future::Future;

use glam::Vec2;
use meshkit_core::Result;

use crate::contour::Aabb;

/// Opaque backend texture id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// A texture created by a [`TextureProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Texture {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn new(handle: TextureHandle, width: u32, height: u32) -> Self {
        Self {
            handle,
            width,
            height,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// How a texture is laid over the fill of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureOptions {
    /// Target rectangle in figure space. Defaults to the image size at the origin.
    pub rect: Option<Aabb>,
    /// Sub-rectangle of the image in pixels.
    pub src_rect: Option<Aabb>,
    pub repeat: bool,
    /// Stretch over the bounding box of the fill, ignoring `rect`.
    pub scale_to_fit: bool,
    /// Rotate the image a quarter turn.
    pub rotated: bool,
}

impl TextureOptions {
    pub fn with_rect(mut self, rect: Aabb) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn with_src_rect(mut self, src_rect: Aabb) -> Self {
        self.src_rect = Some(src_rect);
        self
    }

    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn scale_to_fit(mut self, scale_to_fit: bool) -> Self {
        self.scale_to_fit = scale_to_fit;
        self
    }

    pub fn rotated(mut self, rotated: bool) -> Self {
        self.rotated = rotated;
        self
    }
}

/// Clip mask texture placed over a world-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipMask {
    pub texture: TextureHandle,
    pub rect: Aabb,
}

/// Source of images and owner of backend textures.
pub trait TextureProvider: Send + Sync {
    /// Fetch and decode the image at `url`.
    fn load_image(&self, url: &str) -> impl Future<Output = Result<Image>> + Send;

    fn create_texture(&self, image: &Image) -> TextureHandle;
}

/// Texture coordinates written for vertices that must not sample the texture.
pub const NO_TEXTURE_COORD: [f32; 2] = [-1.0, -1.0];

/// Compute the texture coordinate of `point` for a texture placed at `rect`.
pub(crate) fn texture_coord(point: Vec2, rect: &Aabb, rotated: bool) -> [f32; 2] {
    let size = rect.size();
    let u = if size.x.abs() > f32::EPSILON {
        (point.x - rect.min.x) / size.x
    } else {
        0.0
    };
    let v = if size.y.abs() > f32::EPSILON {
        (point.y - rect.min.y) / size.y
    } else {
        0.0
    };
    if rotated { [v, 1.0 - u] } else { [u, v] }
}
