use criterion::{criterion_group, criterion_main, Criterion};
use did_jis_core::DidEngine;

fn bench_document(c: &mut Criterion) {
    let engine = DidEngine::generate().unwrap();
    let did = engine.create_did_from_key();
    let doc = engine.create_document(did.as_str()).unwrap();

    c.bench_function("document_build", |b| {
        b.iter(|| engine.create_document(did.as_str()).unwrap())
    });
    c.bench_function("document_verify", |b| b.iter(|| doc.verify().unwrap()));
}
criterion_group!(benches, bench_document);
criterion_main!(benches);
