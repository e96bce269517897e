use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use credkeep::auth::password::{hash_password, verify_password};

const PASSWORD: &str = "very_secure_password";

fn bench_hash_password(c: &mut Criterion) {
    c.bench_function("hash_password", |b| {
        b.iter(|| hash_password(black_box(PASSWORD)))
    });
}

fn bench_verify_password(c: &mut Criterion) {
    let digest = hash_password(PASSWORD);

    c.bench_function("verify_password (correct password)", |b| {
        b.iter(|| assert!(verify_password(black_box(&digest), black_box(PASSWORD))))
    });

    c.bench_function("verify_password (wrong password)", |b| {
        b.iter(|| assert!(!verify_password(black_box(&digest), black_box("wrong_password"))))
    });
}

criterion_group!(benches, bench_hash_password, bench_verify_password);
criterion_main!(benches);
