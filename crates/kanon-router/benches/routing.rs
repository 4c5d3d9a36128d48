//! Route resolution benchmarks.
//!
//! Run with: `cargo bench -p kanon-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use kanon_router::{MethodRouter, Router};

fn build_router(num_templates: usize) -> Router {
    let mut router = Router::new();

    for i in 0..num_templates / 3 {
        router
            .insert(
                &format!("/api/v1/resource{i}"),
                MethodRouter::new().get(format!("list{i}")).post(format!("create{i}")),
            )
            .expect("valid template");
        router
            .insert(
                &format!("/api/v1/resource{i}/{{id}}"),
                MethodRouter::new().get(format!("get{i}")),
            )
            .expect("valid template");
        router
            .insert(
                &format!("/api/v1/org/{{orgId}}/resource{i}/{{id}}"),
                MethodRouter::new().get(format!("getOrg{i}")),
            )
            .expect("valid template");
    }

    // Literal/placeholder collision on the hot path.
    router
        .insert("/api/v1/resource0/latest", MethodRouter::new().get("latest0"))
        .expect("valid template");

    router
}

fn bench_literal(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("literal_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/resource20")));
    });
}

fn bench_placeholder(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("placeholder_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/resource20/12345")));
    });
}

fn bench_collision(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("collision_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/resource0/latest")));
    });
}

fn bench_encoded_capture(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("encoded_capture", |b| {
        b.iter(|| {
            black_box(router.match_route(&Method::GET, "/api/v1/org/acme%20corp/resource10/1"))
        });
    });
}

fn bench_not_found(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("not_found", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v2/nothing/here")));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_templates in [30, 150, 600] {
        let router = build_router(num_templates);
        let path = format!("/api/v1/resource{}/7", num_templates / 6);

        group.bench_with_input(BenchmarkId::new("placeholder", num_templates), &path, |b, p| {
            b.iter(|| black_box(router.match_route(&Method::GET, p)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_literal,
    bench_placeholder,
    bench_collision,
    bench_encoded_capture,
    bench_not_found,
    bench_scaling
);
criterion_main!(benches);
