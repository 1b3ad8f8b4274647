use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use nk_core::{Landscape, LandscapeConfig, Topology};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::hint::black_box;
use std::time::Duration;

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn env_list(name: &str, default: &[usize]) -> Vec<usize> {
    std::env::var(name)
        .ok()
        .map(|s| {
            s.split(',')
                .filter_map(|t| t.trim().parse::<usize>().ok())
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_vec())
}

fn bench_config(n: usize, k: usize) -> LandscapeConfig {
    LandscapeConfig {
        n: n as i64,
        k: k as i64,
        a: 2,
        base_allele: 0,
        topology: Topology::Random,
        seed: 0xBEEF,
        show_epistasis: false,
    }
}

fn bench_fitness(c: &mut Criterion) {
    let mut group = c.benchmark_group("nk_fitness");
    group.sample_size(env_usize("NK_BENCH_SAMPLES", 50));
    group.measurement_time(Duration::from_secs(env_usize("NK_BENCH_MEASURE_SECS", 5) as u64));
    let n = env_usize("NK_BENCH_LOCI", 256);
    let batch = env_usize("NK_BENCH_GENOTYPES", 1024);

    for &k in &env_list("NK_BENCH_K", &[0, 2, 8, 32]) {
        let landscape = Landscape::build(&bench_config(n, k.min(n - 1))).expect("landscape");
        let mut rng = SmallRng::seed_from_u64(0xFACE);
        let genotypes: Vec<Vec<u8>> = (0..batch)
            .map(|_| landscape.random_genotype(&mut rng))
            .collect();
        group.bench_function(format!("n{n}_k{k}_genotypes{batch}"), |b| {
            b.iter(|| {
                let mut total = 0.0;
                for genotype in &genotypes {
                    total += landscape.fitness(black_box(genotype)).expect("fitness");
                }
                black_box(total)
            });
        });
    }
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("nk_build");
    group.sample_size(env_usize("NK_BENCH_SAMPLES", 50));
    for &k in &env_list("NK_BENCH_K", &[0, 2, 8, 32]) {
        let n = env_usize("NK_BENCH_LOCI", 256);
        group.bench_function(format!("n{n}_k{k}"), |b| {
            b.iter_batched(
                || bench_config(n, k.min(n - 1)),
                |config| Landscape::build(&config).expect("landscape"),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fitness, bench_build);
criterion_main!(benches);
