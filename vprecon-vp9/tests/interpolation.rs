//! Integration tests for motion-compensated prediction.

use pretty_assertions::assert_eq;
use vprecon_core::{PlaneBuffer, Subsampling};
use vprecon_vp9::{
    BlockDescriptor, FilterBank, InterPredictor, InterpolationConfig, MotionVector,
    SubpelPhase, ThreadingConfig, Vp9DspError,
};

const BANKS: [FilterBank; 4] = [
    FilterBank::Regular,
    FilterBank::Smooth,
    FilterBank::Sharp,
    FilterBank::Bilinear,
];

fn textured(width: usize, height: usize) -> PlaneBuffer {
    PlaneBuffer::from_fn(width, height, 32, |x, y| {
        ((x * 31 + y * 17 + (x * y) % 11) % 256) as u8
    })
}

#[test]
fn test_integer_vectors_copy_reference_in_every_bank() {
    let reference = textured(64, 64);
    let predictor = InterPredictor::new(InterpolationConfig::checked());

    for bank in BANKS {
        // Partly inside the replicated border.
        let block = BlockDescriptor::new(-6, -3, 16, 8).with_bank(bank);
        let pred = predictor.predict(&block, &reference.view()).unwrap();
        for y in 0..8 {
            let expected: Vec<u8> = (0..16)
                .map(|x| reference.view().sample(x - 6, y as isize - 3).unwrap())
                .collect();
            assert_eq!(pred.row(y), expected.as_slice(), "bank {bank:?} row {y}");
        }
    }
}

#[test]
fn test_constant_plane_survives_every_phase() {
    let reference = PlaneBuffer::from_fn(64, 64, 8, |_, _| 128);
    let predictor = InterPredictor::new(InterpolationConfig::checked());

    for bank in BANKS {
        for phase in 0..16 {
            let block = BlockDescriptor::new(16, 16, 8, 8)
                .with_phase(phase, 4)
                .unwrap()
                .with_bank(bank);
            let pred = predictor.predict(&block, &reference.view()).unwrap();
            assert!(pred.data().iter().all(|&s| s == 128), "bank {bank:?} phase {phase}");
        }
    }
}

#[test]
fn test_half_pel_bilinear_from_motion_vector() {
    let reference = PlaneBuffer::from_fn(64, 64, 16, |x, _| (x * 2) as u8);
    let predictor = InterPredictor::new(InterpolationConfig::checked());

    // 4/8 luma sample: half-pel horizontally, integer vertically.
    let block = BlockDescriptor::from_motion_vector(
        8,
        8,
        16,
        4,
        MotionVector::new(0, 4),
        Subsampling::None,
        FilterBank::Bilinear,
    );
    assert_eq!(block.phase_x.value(), 8);

    let pred = predictor.predict(&block, &reference.view()).unwrap();
    let expected: Vec<u8> = (8..24).map(|x| (x * 2 + 1) as u8).collect();
    for y in 0..4 {
        assert_eq!(pred.row(y), expected.as_slice());
    }
}

#[test]
fn test_prediction_is_deterministic() {
    let reference = textured(64, 64);
    let predictor = InterPredictor::default();
    let block = BlockDescriptor::new(11, 7, 32, 16)
        .with_phase(5, 11)
        .unwrap()
        .with_bank(FilterBank::Sharp);

    let first = predictor.predict(&block, &reference.view()).unwrap();
    let second = predictor.predict(&block, &reference.view()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_batch_matches_individual_predictions() {
    let reference = textured(128, 96);
    let blocks: Vec<BlockDescriptor> = (0..48)
        .map(|i| {
            let size = [4, 8, 16, 32, 64][i % 5];
            BlockDescriptor::new((i * 5 % 60) as isize - 8, (i * 3 % 30) as isize, size, size.min(32))
                .with_phase((i % 16) as u8, (i * 7 % 16) as u8)
                .unwrap()
                .with_bank(BANKS[i % 4])
        })
        .collect();

    let sequential = InterPredictor::with_threading(
        InterpolationConfig::checked(),
        &ThreadingConfig::single_threaded(),
    )
    .unwrap();
    let pooled = InterPredictor::with_threading(
        InterpolationConfig::checked(),
        &ThreadingConfig::with_threads(3),
    )
    .unwrap();

    let expected: Vec<_> = blocks
        .iter()
        .map(|block| sequential.predict(block, &reference.view()).unwrap())
        .collect();
    assert_eq!(sequential.predict_blocks(&blocks, &reference.view()).unwrap(), expected);
    assert_eq!(pooled.predict_blocks(&blocks, &reference.view()).unwrap(), expected);
}

#[test]
fn test_batch_reports_out_of_bounds_block() {
    let reference = textured(64, 64);
    let predictor = InterPredictor::new(InterpolationConfig::checked());
    let blocks = [
        BlockDescriptor::new(0, 0, 8, 8),
        BlockDescriptor::new(90, 0, 8, 8),
    ];
    let err = predictor.predict_blocks(&blocks, &reference.view()).unwrap_err();
    assert!(err.is_bounds_violation());
    assert!(matches!(err, Vp9DspError::ReferenceOutOfBounds { x: 90, .. }));
}

#[test]
fn test_compound_average_of_two_references() {
    let first_ref = textured(64, 64);
    let second_ref = PlaneBuffer::from_fn(64, 64, 32, |x, y| (255 - (x + y) % 256) as u8);
    let predictor = InterPredictor::new(InterpolationConfig::checked());
    let block = BlockDescriptor::new(4, 4, 16, 16)
        .with_phase(3, 9)
        .unwrap()
        .with_bank(FilterBank::Smooth);

    let first = predictor.predict(&block, &first_ref.view()).unwrap();
    let second = predictor.predict(&block, &second_ref.view()).unwrap();

    let stride = 24;
    let mut dst = vec![0u8; stride * 16];
    predictor
        .predict_into(&block, &first_ref.view(), &mut dst, stride)
        .unwrap();
    predictor
        .predict_avg_into(&block, &second_ref.view(), &mut dst, stride)
        .unwrap();

    for y in 0..16 {
        let expected: Vec<u8> = first
            .row(y)
            .iter()
            .zip(second.row(y))
            .map(|(&a, &b)| ((a as u16 + b as u16 + 1) >> 1) as u8)
            .collect();
        assert_eq!(&dst[y * stride..y * stride + 16], expected.as_slice());
    }
}

#[test]
fn test_chroma_prediction_lands_in_plane() {
    let chroma = textured(32, 32);
    let predictor = InterPredictor::new(InterpolationConfig::checked());
    let block = BlockDescriptor::from_motion_vector(
        8,
        8,
        8,
        8,
        MotionVector::new(-9, 22),
        Subsampling::Yuv420,
        FilterBank::Regular,
    );
    assert_eq!((block.x, block.phase_x.value()), (9, 6));
    assert_eq!((block.y, block.phase_y.value()), (7, 7));

    let pred = predictor.predict(&block, &chroma.view()).unwrap();
    let mut target = PlaneBuffer::new(32, 32);
    pred.write_to(&mut target.view_mut(), 8, 8).unwrap();
    assert_eq!(&target.row(8)[8..16], pred.row(0));
    assert_eq!(target.get(7, 8), Some(0));
}

#[test]
fn test_extreme_inputs_clamp_in_every_phase() {
    let predictor = InterPredictor::new(InterpolationConfig::checked());

    for bank in BANKS {
        for phase in 1..16u8 {
            let taps = bank.taps(SubpelPhase::new(phase).unwrap());
            for pattern in 0..=255u32 {
                let samples: Vec<u8> = (0..8)
                    .map(|k| if pattern >> k & 1 == 1 { 255 } else { 0 })
                    .collect();
                let reference = PlaneBuffer::from_fn(8, 1, 0, |x, _| samples[x]);
                let block = BlockDescriptor::new(3, 0, 1, 1)
                    .with_phase(phase, 0)
                    .unwrap()
                    .with_bank(bank);
                let pred = predictor.predict(&block, &reference.view()).unwrap();

                let sum: i32 = samples
                    .iter()
                    .zip(taps)
                    .map(|(&s, &t)| s as i32 * t as i32)
                    .sum();
                let expected = ((sum + 64) >> 7).clamp(0, 255) as u8;
                assert_eq!(pred.data(), &[expected], "bank {bank:?} phase {phase} pattern {pattern:#04x}");
            }
        }
    }
}
