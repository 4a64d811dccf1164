#![no_main]

//! Fuzz target for superblock deblocking.
//!
//! Arbitrary masks, levels and plane contents. Rejected masks must leave the
//! plane untouched.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vprecon_core::PlaneBuffer;
use vprecon_vp9::{
    deblock_superblock, EdgeMasks, GridConfig, Orientation, PlaneMasks, ThresholdTable,
};

#[derive(Arbitrary, Debug)]
struct DeblockInput {
    left: [u64; 3],
    above: [u64; 3],
    internal: u64,
    levels: [u8; 64],
    sharpness: u8,
    chroma: bool,
    tail: bool,
    horizontal: bool,
    sb_x: u8,
    sb_y: u8,
    samples: Vec<u8>,
}

fuzz_target!(|input: DeblockInput| {
    if input.samples.is_empty() {
        return;
    }
    let grid = if input.chroma {
        GridConfig::CHROMA_420
    } else {
        GridConfig::LUMA
    };
    let Ok(thresholds) = ThresholdTable::new(input.sharpness) else {
        return;
    };

    // Optionally end both axes 4 samples into the last 8x8 block.
    let trim = if input.tail { 4 } else { 0 };
    let (width, height) = (grid.block_dim() * 2 - trim, grid.block_dim() * 2 - trim);
    let samples = &input.samples;
    let plane = PlaneBuffer::from_fn(width, height, 0, |x, y| {
        samples[(y * width + x) % samples.len()]
    });

    let masks = PlaneMasks {
        left: EdgeMasks {
            wide: input.left[0],
            medium: input.left[1],
            narrow: input.left[2],
        },
        above: EdgeMasks {
            wide: input.above[0],
            medium: input.above[1],
            narrow: input.above[2],
        },
        internal: input.internal,
        levels: input.levels,
    };
    let orientation = if input.horizontal {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    };

    let mut filtered = plane.clone();
    let result = deblock_superblock(
        &mut filtered.view_mut(),
        (input.sb_x % 3) as usize,
        (input.sb_y % 3) as usize,
        &masks,
        &thresholds,
        orientation,
        &grid,
    );
    if result.is_err() {
        assert_eq!(filtered, plane);
    }
});
