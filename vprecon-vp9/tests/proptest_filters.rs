//! Property-based tests for the interpolation and loop filters.

use proptest::prelude::*;
use vprecon_core::PlaneBuffer;
use vprecon_vp9::{
    filter_edge, BlockDescriptor, Deblocker, FilterBank, FilterWidth, GridConfig,
    InterPredictor, InterpolationConfig, LoopFilterThresh, PlaneMasks, ThreadingConfig,
    ThresholdTable,
};

fn bank() -> impl Strategy<Value = FilterBank> {
    prop_oneof![
        Just(FilterBank::Regular),
        Just(FilterBank::Smooth),
        Just(FilterBank::Sharp),
        Just(FilterBank::Bilinear),
    ]
}

fn filter_width() -> impl Strategy<Value = FilterWidth> {
    prop_oneof![
        Just(FilterWidth::Narrow),
        Just(FilterWidth::Medium),
        Just(FilterWidth::Wide),
    ]
}

fn block_size() -> impl Strategy<Value = usize> {
    prop_oneof![Just(4usize), Just(8), Just(16), Just(32), Just(64)]
}

// =============================================================================
// Interpolation
// =============================================================================

proptest! {
    /// A phase-zero block is an exact copy of the reference window.
    #[test]
    fn integer_phase_copies(
        seed in any::<u8>(),
        x in -8isize..56,
        y in -8isize..56,
        bank in bank(),
    ) {
        let reference = PlaneBuffer::from_fn(64, 64, 16, |px, py| {
            seed.wrapping_add((px * 3 + py * 5) as u8)
        });
        let block = BlockDescriptor::new(x, y, 8, 8).with_bank(bank);
        let pred = InterPredictor::new(InterpolationConfig::checked())
            .predict(&block, &reference.view())
            .unwrap();
        for row in 0..8 {
            for col in 0..8 {
                let expected = reference.view().sample(x + col as isize, y + row as isize);
                prop_assert_eq!(Some(pred.row(row)[col]), expected);
            }
        }
    }

    /// Constant references predict the same constant at every sub-pixel
    /// position and in every bank.
    #[test]
    fn constant_reference_is_preserved(
        value in any::<u8>(),
        phase_x in 0u8..16,
        phase_y in 0u8..16,
        bank in bank(),
        width in block_size(),
        height in block_size(),
    ) {
        let reference = PlaneBuffer::from_fn(64, 64, 8, |_, _| value);
        let block = BlockDescriptor::new(0, 0, width, height)
            .with_phase(phase_x, phase_y)
            .unwrap()
            .with_bank(bank);
        let pred = InterPredictor::new(InterpolationConfig::checked())
            .predict(&block, &reference.view())
            .unwrap();
        prop_assert!(pred.data().iter().all(|&s| s == value));
    }

    /// Extreme alternating inputs never break determinism or block size.
    #[test]
    fn alternating_extremes_are_deterministic(
        phase_x in 0u8..16,
        phase_y in 0u8..16,
        bank in bank(),
        invert in any::<bool>(),
    ) {
        let reference = PlaneBuffer::from_fn(32, 32, 8, |px, py| {
            if ((px + py) % 2 == 0) ^ invert { 255 } else { 0 }
        });
        let block = BlockDescriptor::new(4, 4, 16, 16)
            .with_phase(phase_x, phase_y)
            .unwrap()
            .with_bank(bank);
        let predictor = InterPredictor::new(InterpolationConfig::checked());
        let first = predictor.predict(&block, &reference.view()).unwrap();
        let second = predictor.predict(&block, &reference.view()).unwrap();
        prop_assert_eq!(first.data().len(), 256);
        prop_assert_eq!(first, second);
    }
}

// =============================================================================
// Loop filter
// =============================================================================

proptest! {
    /// Only the taps a filter may modify ever change.
    #[test]
    fn filter_edge_touches_only_its_taps(
        width in filter_width(),
        samples in prop::collection::vec(any::<u8>(), 16),
        level in 0u8..64,
        sharpness in 0u8..8,
    ) {
        let thresh = LoopFilterThresh::for_level(level, sharpness);
        let reach = width.reach();
        let mut line = samples[..2 * reach].to_vec();
        filter_edge(width, &thresh, &mut line);

        let modified = match width {
            FilterWidth::Narrow => 2,
            FilterWidth::Medium => 3,
            FilterWidth::Wide => 7,
        };
        prop_assert_eq!(&line[..reach - modified], &samples[..reach - modified]);
        prop_assert_eq!(&line[reach + modified..], &samples[reach + modified..2 * reach]);
    }

    /// A line that does not step across the edge is never rewritten.
    #[test]
    fn flat_lines_are_fixed_points(
        width in filter_width(),
        value in any::<u8>(),
        level in 0u8..64,
    ) {
        let thresh = LoopFilterThresh::for_level(level, 0);
        let mut line = vec![value; 2 * width.reach()];
        filter_edge(width, &thresh, &mut line);
        prop_assert!(line.iter().all(|&s| s == value));
    }

    /// Parallel and sequential plane deblocking agree.
    #[test]
    fn deblocking_is_schedule_independent(
        seed in any::<u64>(),
        level in 1u8..64,
        sb_cols in 1usize..4,
        sb_rows in 1usize..3,
        tail in any::<bool>(),
    ) {
        let grid = GridConfig::LUMA;
        let trim = if tail { 4 } else { 0 };
        let (width, height) = (sb_cols * 64 - trim, sb_rows * 64 - trim);
        let plane = PlaneBuffer::from_fn(width, height, 0, |x, y| {
            let block = (x / 8 * 7 + y / 8 * 13) as u64 ^ seed;
            100 + (block % 7) as u8 * 2
        });

        let widths = [FilterWidth::Narrow, FilterWidth::Medium, FilterWidth::Wide];
        let mut masks = Vec::new();
        for sb_y in 0..sb_rows {
            for sb_x in 0..sb_cols {
                let mut sb = PlaneMasks::with_level(level);
                for bit in 0..64u32 {
                    let pick = ((seed >> (bit % 60)) as usize + bit as usize) % 4;
                    let (row, col) = (bit as usize / 8, bit as usize % 8);
                    if pick < 3 && (sb_x > 0 || col > 0) {
                        sb.left.set(bit, widths[pick]);
                    }
                    if pick < 3 && (sb_y > 0 || row > 0) {
                        sb.above.set(bit, widths[(pick + 1) % 3]);
                    }
                }
                sb.internal = seed.rotate_left((sb_x + sb_y) as u32);
                masks.push(sb);
            }
        }

        let mut sequential = plane.clone();
        Deblocker::single_threaded()
            .deblock_plane(&mut sequential.view_mut(), &masks, ThresholdTable::standard(), &grid)
            .unwrap();
        let mut parallel = plane.clone();
        Deblocker::new(&ThreadingConfig::with_threads(3))
            .unwrap()
            .deblock_plane(&mut parallel.view_mut(), &masks, ThresholdTable::standard(), &grid)
            .unwrap();
        prop_assert_eq!(sequential, parallel);
    }
}
