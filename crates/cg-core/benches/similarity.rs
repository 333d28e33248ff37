use cg_core::{AuditConfig, Document, ScoringMode, audit, lcs_length, score_text, tokenize};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

const CHUNK_A: &str = "Quantum mechanics describes the behavior of particles at the subatomic \
    scale. Wave functions collapse upon measurement, producing definite outcomes. The \
    uncertainty principle limits simultaneous knowledge of position and momentum.";

const CHUNK_B: &str = "The uncertainty principle limits simultaneous knowledge of position and \
    momentum. Entangled particles share correlations that persist across vast distances. \
    Superposition allows particles to exist in multiple states until observed.";

fn bench_lcs(c: &mut Criterion) {
    let a = tokenize(CHUNK_A);
    let b = tokenize(CHUNK_B);
    c.bench_function("lcs_length/paragraph", |bench| {
        bench.iter(|| lcs_length(black_box(&a), black_box(&b)))
    });
    c.bench_function("score_text/f1", |bench| {
        bench.iter(|| score_text(black_box(CHUNK_A), black_box(CHUNK_B), ScoringMode::F1))
    });
}

fn bench_audit(c: &mut Criterion) {
    let corpus: Vec<Document> = (0..500)
        .map(|i| {
            Document::new(
                format!("doc-{i}"),
                vec![CHUNK_A.to_string(), CHUNK_B.to_string(), CHUNK_A.to_string()],
            )
        })
        .collect();
    let config = AuditConfig::default();
    c.bench_function("audit/500_docs_sample_100", |bench| {
        bench.iter(|| audit(black_box(&corpus), &config))
    });
}

criterion_group!(benches, bench_lcs, bench_audit);
criterion_main!(benches);
