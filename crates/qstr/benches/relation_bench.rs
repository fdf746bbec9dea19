//! Criterion benchmarks for relation classification between sampled shapes.
//!
//! Pairs are drawn at shrinking center distances so every label shows up:
//! disjoint, overlapping and nested.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector2;
use qstr::cfg::TopologyCfg;
use qstr::geometry::{classify, GeoKernel, Shape};
use qstr::registry::rand::{draw_boundary_radial, RadialCfg, ReplayToken, VertexCount};

fn sampled(center: Vector2<f64>, radius: f64, vertices: usize, index: u64) -> Shape {
    let cfg = RadialCfg {
        vertex_count: VertexCount::Fixed(vertices),
        base_radius: radius,
        center,
        ..RadialCfg::default()
    };
    draw_boundary_radial(cfg, ReplayToken { seed: 7, index }).to_shape(&GeoKernel)
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let cases = [("disjoint", 5.0, 1.0), ("overlaps", 1.0, 1.0), ("nested", 0.0, 0.3)];
    for &m in &[8usize, 32, 128] {
        for (label, dx, scale) in cases {
            let a = sampled(Vector2::zeros(), 1.0, m, 1);
            let b = sampled(Vector2::new(dx, 0.0), scale, m, 2);
            group.bench_with_input(BenchmarkId::new(label, m), &m, |bch, _| {
                bch.iter(|| classify(&GeoKernel, &a, &b, TopologyCfg::default()))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
