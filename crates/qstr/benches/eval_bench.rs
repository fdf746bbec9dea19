//! Criterion benchmarks for fixpoint evaluation over sampled entities.
//!
//! - cold: union of n entities, buffered, minus the first entity, on an empty store.
//! - warm: the same batch again on a filled store (memo hits only).
//!
//! Focus sizes: n in {2, 8, 32}. Results live under `target/criterion`.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use nalgebra::Vector2;
use qstr::cfg::TopologyCfg;
use qstr::eval::{Qstr, SpatialStore};
use qstr::geometry::{GeoKernel, NullSink};
use qstr::registry::rand::{draw_boundary_radial, RadialCfg, ReplayToken, VertexCount};
use qstr::registry::MemoryRegistry;
use qstr::term::{Location, ObjectId, SpatialTerm};

fn sampled_registry(n: usize, seed: u64) -> MemoryRegistry {
    let mut reg = MemoryRegistry::new();
    for k in 0..n {
        let cfg = RadialCfg {
            vertex_count: VertexCount::Uniform { min: 8, max: 24 },
            center: Vector2::new(1.5 * k as f64, 0.0),
            hole_scale: if k % 3 == 0 { Some(0.4) } else { None },
            ..RadialCfg::default()
        };
        let tok = ReplayToken {
            seed,
            index: k as u64,
        };
        reg.insert(format!("e{k}"), draw_boundary_radial(cfg, tok));
    }
    reg
}

fn batch(n: usize) -> Vec<SpatialTerm> {
    let ids: Vec<ObjectId> = (0..n).map(|k| ObjectId(format!("e{k}"))).collect();
    // listed consumer-first so every pass schedules one level
    vec![
        SpatialTerm::Diff {
            location: Location::Head,
            left: "b".into(),
            right: "e0".into(),
            result: "d".into(),
        },
        SpatialTerm::Buffer {
            location: Location::Head,
            operand: "u".into(),
            distance: 0.25,
            result: "b".into(),
        },
        SpatialTerm::union(Location::Head, ids, "u".into()),
    ]
}

fn bench_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval");
    for &n in &[2usize, 8, 32] {
        let reg = sampled_registry(n, 42);
        let terms = batch(n);
        group.bench_with_input(BenchmarkId::new("cold", n), &n, |b, _| {
            b.iter_batched(
                SpatialStore::new,
                |mut store| {
                    let mut qstr =
                        Qstr::new(&mut store, &reg, &GeoKernel, &NullSink, TopologyCfg::default());
                    qstr.evaluate(&terms).unwrap();
                    store
                },
                BatchSize::SmallInput,
            )
        });

        let mut warm = SpatialStore::new();
        Qstr::new(&mut warm, &reg, &GeoKernel, &NullSink, TopologyCfg::default())
            .evaluate(&terms)
            .unwrap();
        group.bench_with_input(BenchmarkId::new("warm", n), &n, |b, _| {
            b.iter(|| {
                Qstr::new(&mut warm, &reg, &GeoKernel, &NullSink, TopologyCfg::default())
                    .evaluate(&terms)
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);
