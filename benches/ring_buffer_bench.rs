//! Criterion benchmark for the MPMC ring buffer
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use scribe::RingBuffer;

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    group.throughput(Throughput::Elements(1));

    // Benchmark push
    group.bench_function("push", |b| {
        let rb: RingBuffer<u64> = RingBuffer::new(65536);
        let mut i = 0u64;
        b.iter(|| {
            if rb.push(black_box(i)).is_err() {
                rb.pop();
                let _ = rb.push(black_box(i));
            }
            i = i.wrapping_add(1);
        });
    });

    // Benchmark pop
    group.bench_function("pop", |b| {
        let rb: RingBuffer<u64> = RingBuffer::new(65536);
        // Pre-fill
        for i in 0..32768 {
            let _ = rb.push(i);
        }
        b.iter(|| {
            if let Some(v) = rb.pop() {
                let _ = rb.push(black_box(v));
            }
        });
    });

    // Benchmark push+pop cycle
    group.bench_function("push_pop_cycle", |b| {
        let rb: RingBuffer<u64> = RingBuffer::new(65536);
        let mut i = 0u64;
        b.iter(|| {
            let _ = rb.push(black_box(i));
            black_box(rb.pop());
            i = i.wrapping_add(1);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_push_pop);
criterion_main!(benches);
