//! Criterion benchmarks for `ShadowVar`'s fast path: the lock-free peek
//! every access takes before falling through to the monitor-guarded slow
//! path.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use racetrack_clock::Epoch;
use racetrack_shadow::ShadowVar;

fn bench_fast_read(c: &mut Criterion) {
    let sx = ShadowVar::new_for_write(Epoch::make(0, 1), 64, None);
    c.bench_function("shadow_var_fast_read", |b| {
        b.iter(|| black_box(sx.fast_read()));
    });
}

fn bench_fast_write(c: &mut Criterion) {
    let sx = ShadowVar::new_for_read(Epoch::make(0, 1), 64, None);
    c.bench_function("shadow_var_fast_write", |b| {
        b.iter(|| black_box(sx.fast_write()));
    });
}

fn bench_slow_path_lock(c: &mut Criterion) {
    let sx = ShadowVar::new_for_write(Epoch::make(0, 1), 64, None);
    c.bench_function("shadow_var_lock_and_read_w", |b| {
        b.iter(|| {
            let guard = sx.lock();
            black_box(guard.w())
        });
    });
}

criterion_group!(benches, bench_fast_read, bench_fast_write, bench_slow_path_lock);
criterion_main!(benches);
