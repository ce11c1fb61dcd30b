//! Benchmarks for the module-graph evaluation pipeline.
//!
//! Measures:
//!   1. Single-point evaluation across node kinds and dimensionalities
//!   2. Fractal cost scaling with octave depth
//!   3. Grid mapping throughput (flat and seamless)
//!
//! Run with:
//!   cargo bench --bench eval_bench
//!
//! Results are written to `target/criterion/` with HTML reports.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use noisegraph::graph::eval::EvalState;
use noisegraph::graph::node::{BasisKind, CombinerKind, FractalKind};
use noisegraph::graph::{params, ModuleGraph, ModuleId};
use noisegraph::mapping::{map_2d_flat, MappingRanges, SeamlessMode};
use noisegraph::noise::InterpKind;

// ── Graph factories ────────────────────────────────────────────────

fn basis_graph(kind: BasisKind) -> (ModuleGraph, ModuleId) {
    let mut g = ModuleGraph::new();
    let b = g.basis(kind, InterpKind::Quintic, 12345);
    (g, b)
}

fn fbm_graph(octaves: usize) -> (ModuleGraph, ModuleId) {
    let mut g = ModuleGraph::new();
    let f = g
        .fractal(
            FractalKind::Fbm,
            BasisKind::Gradient,
            InterpKind::Quintic,
            octaves,
            12345,
        )
        .unwrap();
    (g, f)
}

/// A worldgen-shaped graph: two fractals selected by a third, cached,
/// auto-corrected into [0, 1].
fn terrain_graph() -> (ModuleGraph, ModuleId) {
    let mut g = ModuleGraph::new();
    let lowland = g
        .fractal(
            FractalKind::Fbm,
            BasisKind::Gradient,
            InterpKind::Quintic,
            4,
            100,
        )
        .unwrap();
    let mountains = g
        .fractal(
            FractalKind::RidgedMulti,
            BasisKind::Gradient,
            InterpKind::Quintic,
            4,
            200,
        )
        .unwrap();
    let control = g
        .fractal(
            FractalKind::Fbm,
            BasisKind::Gradient,
            InterpKind::Quintic,
            2,
            300,
        )
        .unwrap();
    let cached_control = g.cache(control);
    let shaped = g.select(cached_control, lowland, mountains, 0.2, 0.15);
    let out = g.auto_correct(shaped, 0.0, 1.0);
    (g, out)
}

// ── 1. Point evaluation ────────────────────────────────────────────

fn bench_point_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_eval");

    for kind in [
        BasisKind::Value,
        BasisKind::Gradient,
        BasisKind::Simplex,
        BasisKind::White,
    ] {
        let (g, b) = basis_graph(kind);
        let mut state = EvalState::new(&g);
        group.bench_function(BenchmarkId::new("basis_2d", format!("{kind:?}")), |bench| {
            let mut x = 0.0;
            bench.iter(|| {
                x += 0.01;
                black_box(g.evaluate_2d(&mut state, b, x, -x))
            })
        });
    }

    let (g, b) = basis_graph(BasisKind::Gradient);
    let mut state = EvalState::new(&g);
    group.bench_function("gradient_6d", |bench| {
        let mut x = 0.0;
        bench.iter(|| {
            x += 0.01;
            black_box(g.evaluate_6d(&mut state, b, x, -x, x * 0.5, 1.0, 2.0, -0.5))
        })
    });

    let mut g = ModuleGraph::new();
    let gen = g.cellular_generator(10000);
    let worley = g.cellular(gen, params([-1.0, 1.0, 0.0, 0.0]));
    let mut state = EvalState::new(&g);
    group.bench_function("cellular_2d", |bench| {
        let mut x = 0.0;
        bench.iter(|| {
            x += 0.37;
            black_box(g.evaluate_2d(&mut state, worley, x, -x))
        })
    });

    group.finish();
}

// ── 2. Fractal depth scaling ───────────────────────────────────────

fn bench_fractal_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("fractal_depth");

    for octaves in [1usize, 4, 8, 16, 20] {
        let (g, f) = fbm_graph(octaves);
        let mut state = EvalState::new(&g);
        group.bench_with_input(BenchmarkId::from_parameter(octaves), &octaves, |bench, _| {
            let mut x = 0.0;
            bench.iter(|| {
                x += 0.01;
                black_box(g.evaluate_3d(&mut state, f, x, -x, x * 0.5))
            })
        });
    }

    group.finish();
}

// ── 3. Grid mapping throughput ─────────────────────────────────────

fn bench_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapping");
    let ranges = MappingRanges::default();

    for resolution in [64usize, 128] {
        let (g, out) = terrain_graph();
        group.throughput(Throughput::Elements((resolution * resolution) as u64));
        group.bench_with_input(
            BenchmarkId::new("terrain_flat", resolution),
            &resolution,
            |bench, &n| {
                bench.iter(|| {
                    black_box(map_2d_flat(&g, out, n, n, SeamlessMode::None, &ranges).unwrap())
                })
            },
        );
    }

    let (g, f) = fbm_graph(4);
    group.throughput(Throughput::Elements(64 * 64));
    group.bench_function("fbm_seamless_xy_64", |bench| {
        bench.iter(|| black_box(map_2d_flat(&g, f, 64, 64, SeamlessMode::Xy, &ranges).unwrap()))
    });

    let mut g = ModuleGraph::new();
    let c1 = g.constant(1.0);
    let sum = g.combiner(CombinerKind::Add);
    g.add_combiner_source(sum, c1).unwrap();
    group.bench_function("trivial_graph_overhead_64", |bench| {
        bench.iter(|| black_box(map_2d_flat(&g, sum, 64, 64, SeamlessMode::None, &ranges).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_point_eval, bench_fractal_depth, bench_mapping);
criterion_main!(benches);
