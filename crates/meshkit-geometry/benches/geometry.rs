//! Benchmarks for flattening, extrusion and mesh assembly.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec2;
use meshkit_core::Color;
use meshkit_geometry::{FillStyle, Figure, LineJoin, Mesh, StrokeStyle, extrude};

fn wavy_figure(segments: usize) -> Figure {
    let mut figure = Figure::new();
    figure.move_to(Vec2::ZERO);
    for i in 0..segments {
        let x = i as f32 * 20.0;
        figure.cubic_to(
            Vec2::new(x + 5.0, 15.0),
            Vec2::new(x + 15.0, -15.0),
            Vec2::new(x + 20.0, 0.0),
        );
    }
    figure
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for segments in [10, 100, 1000] {
        group.throughput(Throughput::Elements(segments as u64));
        let figure = wavy_figure(segments);

        group.bench_with_input(BenchmarkId::new("cubic", segments), &figure, |b, figure| {
            b.iter(|| {
                let mut figure = figure.clone();
                figure.invalidate();
                black_box(figure.contours(black_box(1.0)))
            });
        });
    }

    group.finish();
}

fn bench_extrude(c: &mut Criterion) {
    let mut group = c.benchmark_group("extrude");

    for join in [LineJoin::Miter, LineJoin::Bevel, LineJoin::Round] {
        let contours = wavy_figure(100).contours(1.0);
        let style = StrokeStyle::solid(Color::BLACK, 4.0).with_join(join);

        group.bench_with_input(BenchmarkId::new("join", format!("{join:?}")), &style, |b, style| {
            b.iter(|| black_box(extrude(&contours, style, 1e20)));
        });
    }

    let contours = wavy_figure(100).contours(1.0);
    let dashed = StrokeStyle::solid(Color::BLACK, 4.0).dashed(6.0, 4.0);
    group.bench_function("dashed", |b| {
        b.iter(|| black_box(extrude(&contours, &dashed, 1e20)));
    });

    group.finish();
}

fn bench_mesh_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh");

    let mut figure = Figure::new();
    for i in 0..50 {
        figure.circle(Vec2::new(i as f32 * 30.0, 0.0), 12.0);
    }

    group.bench_function("rebuild_topology", |b| {
        b.iter(|| {
            let mut mesh = Mesh::new(figure.clone());
            mesh.set_fill(FillStyle::solid(Color::RED));
            mesh.set_stroke(StrokeStyle::solid(Color::BLACK, 2.0)).ok();
            black_box(mesh.mesh_data().vertex_count())
        });
    });

    let mut mesh = Mesh::new(figure.clone());
    mesh.set_fill(FillStyle::solid(Color::RED));
    mesh.mesh_data();
    group.bench_function("retransform", |b| {
        b.iter(|| {
            mesh.translate(black_box(Vec2::new(0.5, 0.0)));
            black_box(mesh.mesh_data().vertex_count())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_flatten, bench_extrude, bench_mesh_assembly);
criterion_main!(benches);
