//! Inter prediction benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use vprecon_bench::{block_grid, test_plane, REFERENCE_BORDER, RESOLUTIONS};
use vprecon_vp9::{BlockDescriptor, FilterBank, InterPredictor, InterpolationConfig};

fn bench_single_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict_block");
    let reference = test_plane(256, 256, REFERENCE_BORDER);
    let predictor = InterPredictor::new(InterpolationConfig::default());

    for size in [4usize, 8, 16, 32, 64] {
        group.throughput(Throughput::Elements((size * size) as u64));

        for (name, phase_x, phase_y) in [("copy", 0, 0), ("h", 7, 0), ("hv", 5, 11)] {
            let block = BlockDescriptor::new(32, 32, size, size)
                .with_phase(phase_x, phase_y)
                .unwrap()
                .with_bank(FilterBank::Regular);
            group.bench_function(format!("{size}x{size}_{name}"), |b| {
                b.iter(|| black_box(predictor.predict(&block, &reference.view()).unwrap()))
            });
        }
    }

    group.finish();
}

fn bench_frame_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict_frame");
    let predictor = InterPredictor::new(InterpolationConfig::default());

    for (width, height, name) in RESOLUTIONS {
        let reference = test_plane(width, height, REFERENCE_BORDER);
        let blocks = block_grid(width, height, 16);
        group.throughput(Throughput::Elements((width * height) as u64));

        group.bench_function(name, |b| {
            b.iter(|| black_box(predictor.predict_blocks(&blocks, &reference.view()).unwrap()))
        });
    }

    group.finish();
}

fn bench_compound(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict_compound");
    let first = test_plane(256, 256, REFERENCE_BORDER);
    let second = test_plane(256, 256, REFERENCE_BORDER);
    let predictor = InterPredictor::new(InterpolationConfig::default());
    let block = BlockDescriptor::new(40, 24, 32, 32)
        .with_phase(3, 9)
        .unwrap()
        .with_bank(FilterBank::Sharp);

    group.throughput(Throughput::Elements(32 * 32));
    group.bench_function("32x32", |b| {
        let mut dst = vec![0u8; 32 * 32];
        b.iter(|| {
            predictor
                .predict_into(&block, &first.view(), &mut dst, 32)
                .unwrap();
            predictor
                .predict_avg_into(&block, &second.view(), &mut dst, 32)
                .unwrap();
            black_box(&dst);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_single_block, bench_frame_batch, bench_compound);
criterion_main!(benches);
