#![no_main]

//! Fuzz target for sub-pixel prediction.
//!
//! Arbitrary block geometry, phases and banks over an arbitrary reference
//! plane. Every call must either succeed with an in-range block or return an
//! error; it must never panic.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vprecon_core::PlaneBuffer;
use vprecon_vp9::{BlockDescriptor, FilterBank, InterPredictor, InterpolationConfig};

#[derive(Arbitrary, Debug)]
struct PredictInput {
    x: i16,
    y: i16,
    width: u8,
    height: u8,
    phase_x: u8,
    phase_y: u8,
    bank: u8,
    seed: u8,
}

fuzz_target!(|input: PredictInput| {
    let reference = PlaneBuffer::from_fn(64, 64, 16, |x, y| {
        input.seed.wrapping_mul(x as u8).wrapping_add(y as u8)
    });
    let predictor = InterPredictor::new(InterpolationConfig::checked());

    let Ok(bank) = FilterBank::try_from(input.bank) else {
        return;
    };
    let Ok(block) = BlockDescriptor::new(
        input.x as isize,
        input.y as isize,
        input.width as usize,
        input.height as usize,
    )
    .with_phase(input.phase_x, input.phase_y) else {
        return;
    };

    if let Ok(pred) = predictor.predict(&block.with_bank(bank), &reference.view()) {
        assert_eq!(pred.data().len(), block.width * block.height);
    }
});
