//! Mesh assembly through the public API: transforms, hit tests, textures.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;
use meshkit_core::{Color, MeshError, Result};
use meshkit_geometry::{
    FillStyle, Figure, GradientKind, GradientStop, GradientTarget, Image, Mesh, MeshDirty,
    StrokeStyle, TextureHandle, TextureOptions, TextureProvider, Transform2D,
};

fn rect_mesh(size: f32) -> Mesh {
    let mut figure = Figure::new();
    figure.rect(Vec2::ZERO, Vec2::splat(size));
    let mut mesh = Mesh::new(figure);
    mesh.set_fill(FillStyle::solid(Color::RED));
    mesh
}

// ====================
// Transforms
// ====================

#[test]
fn test_set_transform_is_idempotent() {
    let m = Transform2D::rotate(0.3)
        .then(&Transform2D::scale_xy(Vec2::new(1.2, 0.8)))
        .then(&Transform2D::translate(Vec2::new(40.0, -7.0)));

    let mut once = rect_mesh(100.0);
    once.set_transform(m);
    let expected = once.mesh_data().positions.clone();

    let mut twice = rect_mesh(100.0);
    twice.set_transform(m);
    twice.set_transform(m);
    assert_eq!(twice.mesh_data().positions, expected);

    twice.mesh_data();
    twice.set_transform(m);
    assert_eq!(twice.mesh_data().positions, expected);
}

#[test]
fn test_transform_composes_with_current() {
    let mut mesh = rect_mesh(10.0);
    mesh.translate(Vec2::new(5.0, 0.0));
    mesh.scale(Vec2::splat(1.25), Vec2::ZERO);
    let corner = mesh.transform_matrix().transform_point(Vec2::new(10.0, 10.0));
    assert!(corner.distance(Vec2::new(18.75, 12.5)) < 1e-4);
}

#[test]
fn test_shared_figure_between_meshes() {
    let mut figure = Figure::new();
    figure.circle(Vec2::ZERO, 20.0);
    let figure = Arc::new(figure);

    let mut a = Mesh::new(Arc::clone(&figure));
    let mut b = Mesh::new(Arc::clone(&figure));
    a.set_fill(FillStyle::solid(Color::RED));
    b.set_fill(FillStyle::solid(Color::BLUE));
    b.translate(Vec2::new(100.0, 0.0));

    assert!(Arc::ptr_eq(a.contours(), b.contours()));
    assert_eq!(a.mesh_data().position0, b.mesh_data().position0);
}

// ====================
// Hit testing
// ====================

#[test]
fn test_rect_hit_test() {
    let mut mesh = rect_mesh(100.0);
    assert!(mesh.is_point_in_fill(Vec2::new(50.0, 50.0)));
    assert!(!mesh.is_point_in_fill(Vec2::new(150.0, 150.0)));

    let edge = Vec2::new(100.0, 50.0);
    let first = mesh.is_point_in_fill(edge);
    for _ in 0..10 {
        assert_eq!(mesh.is_point_in_fill(edge), first);
    }
}

#[test]
fn test_stroke_hit_test_respects_transform() {
    let mut mesh = rect_mesh(100.0);
    mesh.set_stroke(StrokeStyle::solid(Color::BLACK, 10.0)).unwrap();
    mesh.translate(Vec2::new(50.0, 50.0));
    assert!(mesh.is_point_in_stroke(Vec2::new(52.0, 100.0)));
    assert!(!mesh.is_point_in_stroke(Vec2::new(100.0, 100.0)));
    assert!(!mesh.is_point_in_stroke(Vec2::new(2.0, 100.0)));
}

#[test]
fn test_fine_dashed_stroke_far_from_origin_builds() {
    let mut figure = Figure::new();
    figure
        .move_to(Vec2::new(1e6, 0.0))
        .line_to(Vec2::new(1e6 + 100.0, 0.0));
    let mut mesh = Mesh::new(figure);
    mesh.set_stroke(StrokeStyle::solid(Color::BLACK, 1.0).dashed(0.01, 0.01))
        .unwrap();
    let vertices = mesh.mesh_data().vertex_count();
    assert!(vertices > 0);
    assert!(vertices <= 5001 * 4);
}

// ====================
// Gradients
// ====================

#[test]
fn test_circular_gradient_world_radius() {
    let mut mesh = rect_mesh(100.0);
    let stops = vec![GradientStop::new(0.0, Color::WHITE), GradientStop::new(1.0, Color::BLACK)];
    mesh.set_gradient(GradientKind::Circular, &[50.0, 50.0, 50.0], stops, GradientTarget::Fill)
        .unwrap();
    mesh.set_transform(Transform2D::scale_xy(Vec2::splat(2.0)));

    let world = mesh.uniforms().fill_gradient.clone().unwrap();
    assert_eq!(world.vector(), [100.0, 100.0, 0.0, 100.0, 100.0, 100.0]);
    assert!(mesh.mesh_data().gradient_coords.is_some());

    mesh.clear_gradient(GradientTarget::Fill);
    assert!(mesh.uniforms().fill_gradient.is_none());
    assert!(mesh.mesh_data().gradient_coords.is_none());
}

// ====================
// Textures
// ====================

#[derive(Default)]
struct MemoryTextures {
    next: AtomicU64,
}

impl TextureProvider for MemoryTextures {
    async fn load_image(&self, url: &str) -> Result<Image> {
        if url.ends_with(".png") {
            Ok(Image::new(32, 16, vec![0; 32 * 16 * 4]))
        } else {
            Err(MeshError::InvalidArgument(format!("no such image: {url}")))
        }
    }

    fn create_texture(&self, _image: &Image) -> TextureHandle {
        TextureHandle(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[test]
fn test_load_texture() {
    let provider = MemoryTextures::default();
    let mut mesh = rect_mesh(32.0);
    mesh.mesh_data();

    pollster::block_on(mesh.load_texture(&provider, "sprite.png", TextureOptions::default()))
        .unwrap();
    let (texture, _) = mesh.texture().copied().unwrap();
    assert_eq!(texture.handle, TextureHandle(1));
    assert_eq!((texture.width, texture.height), (32, 16));
    assert_eq!(mesh.dirty(), MeshDirty::TEXTURE_COORDS);
    assert!(mesh.enable_blend());

    let coords = mesh.mesh_data().tex_coords.clone().unwrap();
    assert!(coords.contains(&[1.0, 2.0]));
}

#[test]
fn test_missing_texture_degrades() {
    let provider = MemoryTextures::default();
    let mut mesh = rect_mesh(32.0);
    mesh.set_texture(
        meshkit_geometry::Texture::new(TextureHandle(99), 4, 4),
        TextureOptions::default(),
    );

    let result = pollster::block_on(mesh.load_texture(&provider, "missing.gif", TextureOptions::default()));
    assert!(result.is_ok());
    assert!(mesh.texture().is_none());
    assert!(mesh.uniforms().texture.is_none());
    assert!(mesh.mesh_data().tex_coords.is_none());
}
