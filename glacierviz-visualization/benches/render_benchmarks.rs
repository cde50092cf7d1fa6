//! Benchmarks for surface building and frame rasterization

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glacierviz_core::{grid_surface, GlacierSeries, GridGeometry};
use glacierviz_visualization::{GlacierSceneAdapter, VizConfig};
use ndarray::Array2;

fn generate_series(size: usize, steps: usize) -> GlacierSeries {
    let geometry = GridGeometry::new((0.0, 0.0), (50.0, 50.0), "");
    let terrain = Array2::from_shape_fn((size, size), |(r, c)| {
        let fx = c as f32 / (size - 1) as f32 * std::f32::consts::PI;
        let fy = r as f32 / (size - 1) as f32 * std::f32::consts::PI;
        2000.0 + 800.0 * fx.sin() * fy.sin()
    });
    let thickness = (0..steps).map(|t| {
        let grid = Array2::from_shape_fn((size, size), |(r, c)| {
            let d = ((r as f32 - size as f32 / 2.0).powi(2) + (c as f32 - size as f32 / 2.0).powi(2)).sqrt();
            (150.0 - d * 6.0 - t as f32 * 10.0).max(0.0)
        });
        (2000.0 + t as f64, grid)
    });
    GlacierSeries::from_static_terrain(terrain, geometry, thickness).unwrap()
}

fn bench_grid_surface(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_surface");

    for &size in &[64, 128, 256] {
        let series = generate_series(size, 1);
        let snapshot = &series[0];
        group.bench_with_input(BenchmarkId::from_parameter(size), snapshot, |b, snapshot| {
            b.iter(|| black_box(grid_surface(&snapshot.geometry, black_box(&snapshot.terrain), 2.0)));
        });
    }

    group.finish();
}

fn bench_time_step(c: &mut Criterion) {
    let series = generate_series(128, 4);
    let mut adapter = GlacierSceneAdapter::new(VizConfig::default());
    adapter.bind(&series).unwrap();

    let mut index = 0i64;
    c.bench_function("set_time_index_128", |b| {
        b.iter(|| {
            index = (index + 1) % 4;
            adapter.set_time_index(black_box(index)).unwrap();
        });
    });
}

fn bench_rasterize(c: &mut Criterion) {
    let series = generate_series(128, 2);
    let mut adapter = GlacierSceneAdapter::new(VizConfig::default());
    adapter.bind(&series).unwrap();
    let handle = adapter.render().unwrap();

    let mut group = c.benchmark_group("rasterize");
    for &(width, height) in &[(320u32, 240u32), (1200, 800)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &(width, height),
            |b, &(width, height)| {
                b.iter(|| black_box(handle.rasterize(width, height)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_grid_surface, bench_time_step, bench_rasterize);
criterion_main!(benches);
