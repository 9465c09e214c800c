#[macro_use]
extern crate criterion;

use criterion::{Benchmark, Criterion};

use sokoban_fess::config::{Method, SolverConfig};
use sokoban_fess::{LoadLevel, Solve};

// allowing unused so i can bench just one or few
// and still notice other warnings if there are any
#[allow(unused)]
fn bench_fess_two_boxes(c: &mut Criterion) {
    bench_level(c, Method::Fess, "levels/custom/03-two-boxes.txt", 50);
}

#[allow(unused)]
fn bench_astar_two_boxes(c: &mut Criterion) {
    bench_level(c, Method::AStar, "levels/custom/03-two-boxes.txt", 50);
}

#[allow(unused)]
fn bench_fess_corridor(c: &mut Criterion) {
    bench_level(c, Method::Fess, "levels/custom/02-one-way.txt", 100);
}

fn bench_level(c: &mut Criterion, method: Method, level_path: &str, samples: usize) {
    let level = level_path.load_level().unwrap();

    c.bench(
        &format!("{}", method),
        Benchmark::new(level_path, move |b| {
            b.iter(|| {
                criterion::black_box(level.solve(
                    criterion::black_box(method),
                    criterion::black_box(SolverConfig::default()),
                    false,
                ))
            })
        })
        .sample_size(samples),
    );
}

criterion_group!(
    benches,
    bench_fess_two_boxes,
    bench_astar_two_boxes,
    bench_fess_corridor
);
criterion_main!(benches);
