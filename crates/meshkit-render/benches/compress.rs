//! Benchmarks for batch compression.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec2;
use meshkit_core::Color;
use meshkit_geometry::{Figure, FillStyle, Mesh, StrokeStyle, Texture, TextureHandle, TextureOptions};
use meshkit_render::{BatchCompressor, ScratchPool};

fn scene(count: usize, textures: u64) -> Vec<Mesh> {
    let mut figure = Figure::new();
    figure.circle(Vec2::ZERO, 6.0);

    (0..count)
        .map(|i| {
            let mut mesh = Mesh::new(figure.clone());
            mesh.set_fill(FillStyle::solid(Color::rgb(0.3, 0.5, 0.9)));
            if i % 3 == 0 {
                let _ = mesh.set_stroke(StrokeStyle::solid(Color::BLACK, 1.5));
            }
            if textures > 0 {
                let handle = TextureHandle(i as u64 % textures);
                mesh.set_texture(Texture::new(handle, 16, 16), TextureOptions::default());
            }
            mesh.translate(Vec2::new((i % 100) as f32 * 14.0, (i / 100) as f32 * 14.0));
            mesh
        })
        .collect()
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    let compressor = BatchCompressor::default();

    for count in [100, 1000, 5000] {
        group.throughput(Throughput::Elements(count as u64));

        let mut meshes = scene(count, 0);
        let mut pool = ScratchPool::default();
        group.bench_function(BenchmarkId::new("uniform", count), |b| {
            b.iter(|| {
                let batches = compressor.compress(black_box(&mut meshes), &mut pool);
                black_box(batches.map(|b| b.len()))
            });
        });

        let mut meshes = scene(count, 4);
        let mut pool = ScratchPool::default();
        group.bench_function(BenchmarkId::new("alternating_textures", count), |b| {
            b.iter(|| {
                let batches = compressor.compress(black_box(&mut meshes), &mut pool);
                black_box(batches.map(|b| b.len()))
            });
        });
    }

    group.finish();
}

fn bench_retransform(c: &mut Criterion) {
    let compressor = BatchCompressor::default();
    let mut meshes = scene(1000, 0);
    let mut pool = ScratchPool::default();

    c.bench_function("compress/retransform_1000", |b| {
        b.iter(|| {
            for mesh in meshes.iter_mut() {
                mesh.translate(Vec2::new(0.5, 0.0));
            }
            let batches = compressor.compress(&mut meshes, &mut pool);
            black_box(batches.map(|b| b.vertex_count()))
        });
    });
}

criterion_group!(benches, bench_compress, bench_retransform);
criterion_main!(benches);
