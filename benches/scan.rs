use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use seqmask::constants::SEQ16_MASK;
use seqmask::{Bitset, SequenceWindow};
use std::env;
use std::hint::black_box;

const DEFAULT_SAMPLE_SIZE: usize = 50;
const CAPACITIES: [usize; 3] = [64, 1_024, 16_384];

fn env_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

fn sparse_bitset(capacity: usize, stride: usize) -> Bitset {
    let mut bits = Bitset::init(capacity).unwrap();
    for i in (0..capacity).step_by(stride) {
        bits.set(i).unwrap();
    }
    bits
}

fn bench_bitset_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitset_scan");
    group.sample_size(env_usize("SCAN_SAMPLE_SIZE").unwrap_or(DEFAULT_SAMPLE_SIZE));

    for capacity in CAPACITIES {
        let bits = sparse_bitset(capacity, 61);
        group.throughput(Throughput::Elements(capacity as u64));

        group.bench_with_input(BenchmarkId::new("next_set", capacity), &bits, |b, bits| {
            b.iter(|| {
                let mut found = 0usize;
                let mut i = 0;
                while let Some(p) = bits.next_set(i) {
                    found += 1;
                    i = p + 1;
                }
                black_box(found)
            })
        });

        group.bench_with_input(BenchmarkId::new("prev_set", capacity), &bits, |b, bits| {
            b.iter(|| {
                let mut found = 0usize;
                let mut i = capacity - 1;
                while let Some(p) = bits.prev_set(i) {
                    found += 1;
                    if p == 0 {
                        break;
                    }
                    i = p - 1;
                }
                black_box(found)
            })
        });

        let dense = {
            let mut bits = Bitset::init(capacity).unwrap();
            bits.fill();
            bits.unset(capacity - 1);
            bits
        };
        group.bench_with_input(BenchmarkId::new("next_unset", capacity), &dense, |b, bits| {
            b.iter(|| black_box(bits.next_unset(black_box(0))))
        });
    }
    group.finish();
}

/// Receiver-style traffic: mark arrivals ahead, retire the oldest behind.
fn bench_window_slide(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_slide");
    group.sample_size(env_usize("SCAN_SAMPLE_SIZE").unwrap_or(DEFAULT_SAMPLE_SIZE));

    for capacity in CAPACITIES {
        let steps = 4 * capacity;
        group.throughput(Throughput::Elements(steps as u64));
        group.bench_function(BenchmarkId::new("set_unset", capacity), |b| {
            b.iter(|| {
                let mut window = SequenceWindow::init(capacity, SEQ16_MASK).unwrap();
                let lag = (capacity / 2) as u32;
                for seq in 0..steps as u32 {
                    window.set(seq & SEQ16_MASK).unwrap();
                    if seq >= lag {
                        window.unset((seq - lag) & SEQ16_MASK);
                    }
                }
                black_box(window.count())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_bitset_scan, bench_window_slide);
criterion_main!(benches);
