//! End-to-end benchmarks on synthetic street grids.
//!
//! Run with: `cargo bench --bench pipeline --features synthetic`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use tracerefine::synthetic::GridScenario;
use tracerefine::{sequence_trajectories, RefineConfig, TrajectoryRefiner};

fn bench_refine(c: &mut Criterion) {
    let mut group = c.benchmark_group("refine_grid");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(20);

    for blocks in [4, 8, 16] {
        let run = GridScenario {
            blocks,
            ..GridScenario::default()
        }
        .generate()
        .expect("synthetic grid");

        let plain = TrajectoryRefiner::default();
        group.bench_with_input(BenchmarkId::new("corners", blocks), &run, |b, run| {
            b.iter(|| plain.refine(&run.network, black_box(&run.trace)));
        });

        let filtering = TrajectoryRefiner::new(RefineConfig {
            delete_off_road_points: true,
            ..RefineConfig::default()
        });
        group.bench_with_input(BenchmarkId::new("corners_offroad", blocks), &run, |b, run| {
            b.iter(|| filtering.refine(&run.network, black_box(&run.trace)));
        });
    }

    group.finish();
}

fn bench_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine_partials");

    for blocks in [8, 16] {
        let run = GridScenario {
            blocks,
            partial_count: 5,
            ..GridScenario::default()
        }
        .generate()
        .expect("synthetic grid");

        group.bench_with_input(
            BenchmarkId::new("grid", format!("{}b_{}pts", blocks, run.trace.len())),
            &run.partials,
            |b, partials| {
                b.iter(|| sequence_trajectories(black_box(partials)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_refine, bench_combine);
criterion_main!(benches);
