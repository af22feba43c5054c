use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hex_literal::hex;

use oblivious_store::{build, get, Config, KeyMaterial, PrivStore, PubStore, Serializable};

#[inline]
fn key() -> KeyMaterial {
    let k = hex!["adfd30251dfc5f6cfe240febf43970dd 0f1e2d3c4b5a69788796a5b4c3d2e1f0"];

    KeyMaterial::from_bytes(black_box(&k)).unwrap()
}

fn entries(n: u32) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..n)
        .map(|i| (i.to_be_bytes().to_vec(), format!("value number {i}").into_bytes()))
        .collect()
}

fn build_store(n: u32) -> (PubStore, PrivStore) {
    build(&key(), entries(n), &Config::default()).unwrap()
}

pub fn benchmarks(c: &mut Criterion) {
    c.bench_function("build 1000 entries", |b| b.iter(|| build_store(1000)));
    c.bench_function("get", |b| {
        let (pub_store, priv_store) = build_store(1000);
        b.iter(|| get(&pub_store, &priv_store, &black_box(42u32).to_be_bytes()))
    });
    c.bench_function("get absent", |b| {
        let (pub_store, priv_store) = build_store(1000);
        b.iter(|| get(&pub_store, &priv_store, &black_box(4242u32).to_be_bytes()))
    });
    c.bench_function("serialise", |b| {
        let (pub_store, _) = build_store(1000);
        b.iter(|| pub_store.to_vec())
    });
    c.bench_function("deserialise", |b| {
        let v = build_store(1000).0.to_vec();
        b.iter(|| PubStore::from_slice(&v).unwrap())
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
