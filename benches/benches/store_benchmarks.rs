use std::{hint::black_box, time::Duration};

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use credkeep::{AccessControl, Account, CredentialStore};

fn seeded_store(n: usize) -> (tempfile::TempDir, CredentialStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::open(dir.path().join("bench.db")).unwrap();
    for i in 0..n {
        store
            .create_account(&format!("user{i}"), "password", &format!("User {i}"))
            .unwrap();
    }
    (dir, store)
}

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("credential_store");
    group.measurement_time(Duration::from_secs(5));

    let (_dir, store) = seeded_store(100);

    group.bench_function("authenticate", |b| {
        b.iter(|| store.authenticate(black_box("user50"), black_box("password")).unwrap())
    });
    group.bench_function("exists", |b| {
        b.iter(|| store.exists(black_box("user99")).unwrap())
    });
    group.bench_function("list_all (100)", |b| b.iter(|| store.list_all().unwrap()));

    let mut next = 0u64;
    group.bench_function("create_account", |b| {
        b.iter(|| {
            next += 1;
            store
                .create_account(&format!("fresh{next}"), "password", "Fresh")
                .unwrap()
        })
    });

    group.finish();
}

fn bench_access_control(c: &mut Criterion) {
    c.bench_function("access_control authenticate (1000 accounts)", |b| {
        b.iter_batched(
            || {
                let mut ac = AccessControl::new();
                for i in 0..1000 {
                    ac.register(Account::regular(&format!("user{i}"), "password").unwrap())
                        .unwrap();
                }
                ac
            },
            |mut ac| ac.authenticate(black_box("user500"), "password").unwrap(),
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_store, bench_access_control);
criterion_main!(benches);
