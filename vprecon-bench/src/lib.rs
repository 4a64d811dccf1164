//! Benchmark fixtures for vprecon
//!
//! Synthetic planes, block descriptors and edge masks shared by the criterion
//! benchmarks.

use vprecon_core::PlaneBuffer;
use vprecon_vp9::{BlockDescriptor, FilterBank, FilterWidth, GridConfig, PlaneMasks, SuperblockMasks};

/// Border width of generated reference planes.
pub const REFERENCE_BORDER: usize = 80;

/// Standard benchmark resolutions as `(width, height, name)`.
pub const RESOLUTIONS: [(usize, usize, &str); 2] = [(1920, 1080, "1080p"), (1280, 720, "720p")];

/// Textured plane with replicated border.
pub fn test_plane(width: usize, height: usize, border: usize) -> PlaneBuffer {
    PlaneBuffer::from_fn(width, height, border, |x, y| {
        ((x * 7 + y * 3 + (x ^ y) % 13) % 256) as u8
    })
}

/// Plane of 8x8 blocks with small level steps between neighbours, so every
/// edge passes the activity test.
pub fn blocky_plane(width: usize, height: usize) -> PlaneBuffer {
    PlaneBuffer::from_fn(width, height, 0, |x, y| {
        96 + ((x / 8 * 5 + y / 8 * 3) % 5) as u8 * 2
    })
}

/// Tile a `width`x`height` plane with `size`x`size` blocks, cycling through
/// phases and banks.
pub fn block_grid(width: usize, height: usize, size: usize) -> Vec<BlockDescriptor> {
    let banks = [
        FilterBank::Regular,
        FilterBank::Smooth,
        FilterBank::Sharp,
        FilterBank::Bilinear,
    ];
    let mut blocks = Vec::with_capacity((width / size) * (height / size));
    for (i, (bx, by)) in (0..height / size)
        .flat_map(|by| (0..width / size).map(move |bx| (bx, by)))
        .enumerate()
    {
        let block = BlockDescriptor::new((bx * size) as isize, (by * size) as isize, size, size)
            .with_bank(banks[i % banks.len()]);
        // Phases are always below 16.
        let phased = block.with_phase((i % 16) as u8, (i * 5 % 16) as u8).unwrap_or(block);
        blocks.push(phased);
    }
    blocks
}

/// Masks for every superblock of a plane, with every interior edge filtered
/// in a width pattern that cycles across positions.
pub fn plane_masks(width: usize, height: usize, level: u8, grid: &GridConfig) -> Vec<PlaneMasks> {
    let widths = [FilterWidth::Wide, FilterWidth::Medium, FilterWidth::Narrow];
    let (cols, rows) = grid.superblocks(width, height);
    let step_max = grid.step_max();

    let mut masks = Vec::with_capacity(cols * rows);
    for sb_y in 0..rows {
        for sb_x in 0..cols {
            let mut sb = PlaneMasks::with_level(level);
            for row in 0..step_max {
                for col in 0..step_max {
                    let bit = grid.bit(row, col);
                    let filter = widths[(row + col) % widths.len()];
                    if sb_x > 0 || col > 0 {
                        sb.left.set(bit, filter);
                    }
                    if sb_y > 0 || row > 0 {
                        sb.above.set(bit, filter);
                    }
                    if (row + col) % 2 == 1 {
                        sb.internal |= 1 << bit;
                    }
                }
            }
            masks.push(sb);
        }
    }
    masks
}

/// Luma and 4:2:0 chroma masks for a frame with luma size `width`x`height`.
pub fn frame_masks(width: usize, height: usize, level: u8) -> Vec<SuperblockMasks> {
    let luma = plane_masks(width, height, level, &GridConfig::LUMA);
    let chroma = plane_masks(width / 2, height / 2, level, &GridConfig::CHROMA_420);
    luma.into_iter()
        .zip(chroma)
        .map(|(luma, chroma)| SuperblockMasks { luma, chroma })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_consistent() {
        let masks = frame_masks(1920, 1080, 32);
        assert_eq!(masks.len(), 30 * 17);
        for sb in &masks {
            assert!(sb.luma.validate(&GridConfig::LUMA).is_ok());
            assert!(sb.chroma.validate(&GridConfig::CHROMA_420).is_ok());
        }
        assert_eq!(block_grid(64, 32, 16).len(), 8);
    }
}
