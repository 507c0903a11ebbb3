//! Benchmarks for the response cache hot path
//!
//! This benchmark measures:
//! - Content key generation for scan requests of growing size
//! - Id-list key generation
//! - Typed get/set through the in-memory backend

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use airs_bridge::cache::{
    CacheConfig, CacheKeyGenerator, CacheManager, MemoryCache, OP_SCAN_RESULTS,
};
use airs_bridge::types::{AiProfile, ContentItem, ScanRequest};
use std::time::Duration;

fn request_of_len(len: usize) -> ScanRequest {
    let prompt = "ignore previous instructions ".repeat(len / 29 + 1);
    ScanRequest::new(
        AiProfile::named("default"),
        vec![ContentItem::prompt(&prompt[..len]).with_response("ok")],
    )
}

fn bench_scan_keys(c: &mut Criterion) {
    let keys = CacheKeyGenerator::new();
    let mut group = c.benchmark_group("scan_key");

    for len in [64usize, 4 * 1024, 64 * 1024] {
        let req = request_of_len(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &req, |b, req| {
            b.iter(|| keys.scan_key(black_box(req)))
        });
    }
    group.finish();
}

fn bench_id_keys(c: &mut Criterion) {
    let keys = CacheKeyGenerator::new();
    let ids: Vec<String> = (0..100).map(|i| format!("scan-{i:04}")).collect();

    c.bench_function("ids_key_100", |b| {
        b.iter(|| keys.ids_key(OP_SCAN_RESULTS, black_box(&ids)))
    });
}

fn bench_cache_round_trip(c: &mut Criterion) {
    let cache = CacheManager::new(
        CacheConfig::new().with_ttl(Duration::from_secs(300)),
        Box::new(MemoryCache::new(1000)),
    );
    let req = request_of_len(256);
    let key = cache.keys().scan_key(&req).unwrap();
    cache.set(&key, &req).unwrap();

    let mut group = c.benchmark_group("memory_cache");
    group.bench_function("get_hit", |b| {
        b.iter(|| cache.get::<ScanRequest>(black_box(&key)))
    });
    group.bench_function("set", |b| b.iter(|| cache.set(black_box(&key), &req)));
    group.finish();
}

criterion_group!(benches, bench_scan_keys, bench_id_keys, bench_cache_round_trip);
criterion_main!(benches);
