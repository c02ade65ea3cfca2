use bylaw_ingest::chunker::{ChunkerConfig, initial_split, recursive_chunk};
use bylaw_ingest::cluster::average_linkage_clusters;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn generate_policy_text(size: usize) -> String {
    let paragraph = "All employees must submit expense reports within thirty days. \
                     Receipts are required for any purchase above fifty dollars.\n\n\
                     Remote work requires written manager approval in advance. \
                     Core collaboration hours run from ten until three.\n\n";
    paragraph.repeat(size / paragraph.len() + 1)[..size].to_string()
}

fn initial_split_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("initial_split");
    let config = ChunkerConfig::default();

    for size in [1_000, 10_000, 100_000] {
        let input = generate_policy_text(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("policy", size), &input, |b, input| {
            b.iter(|| initial_split(black_box(input), &config));
        });
    }

    group.finish();
}

fn recursive_chunk_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("recursive_chunk");
    let config = ChunkerConfig::default();

    for count in [16usize, 64, 256] {
        let fragments: Vec<String> = (0..count)
            .map(|i| format!("Fragment {i}: {}", generate_policy_text(120)))
            .collect();
        let embeddings: Vec<Vec<f32>> = (0..count)
            .map(|i| {
                let angle = (i / 8) as f32;
                vec![angle.cos(), angle.sin(), (i % 8) as f32 * 0.01]
            })
            .collect();
        group.bench_with_input(
            BenchmarkId::new("fragments", count),
            &(fragments, embeddings),
            |b, (fragments, embeddings)| {
                b.iter(|| recursive_chunk(black_box(fragments), black_box(embeddings), &config));
            },
        );
    }

    group.finish();
}

fn clustering_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("average_linkage");

    for count in [16usize, 64] {
        let embeddings: Vec<Vec<f32>> = (0..count)
            .map(|i| {
                let angle = (i % 6) as f32;
                vec![angle.cos(), angle.sin()]
            })
            .collect();
        group.bench_with_input(
            BenchmarkId::new("embeddings", count),
            &embeddings,
            |b, embeddings| {
                b.iter(|| average_linkage_clusters(black_box(embeddings), 6));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    initial_split_bench,
    recursive_chunk_bench,
    clustering_bench
);
criterion_main!(benches);
