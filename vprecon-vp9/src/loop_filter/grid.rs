//! Superblock edge grid geometry.

use vprecon_core::Subsampling;

use crate::error::{Result, Vp9DspError};
use crate::tables::MAX_LOOP_FILTER_LEVELS;

/// Spacing of the edge grid in samples.
pub const EDGE_SPACING: usize = 8;

/// Geometry of one plane's superblock edge grid.
///
/// A superblock spans `block_dim` samples per axis and holds `step_max`
/// 8-sample edge positions per axis, starting at its top-left corner. When
/// `step_max * 8 < block_dim` the rest of the superblock carries no edges.
/// Position (`row`, `col`) maps to mask bit
/// `row * step_max + col` and to level index
/// `((row * row_mult) << level_shift) + col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridConfig {
    block_dim: usize,
    step_max: usize,
    level_shift: u32,
    row_mult: usize,
}

impl GridConfig {
    /// Full-resolution grid: 64x64 superblocks, 8x8 positions.
    pub const LUMA: GridConfig = GridConfig {
        block_dim: 64,
        step_max: 8,
        level_shift: 3,
        row_mult: 1,
    };

    /// 4:2:0 chroma grid: 32x32 superblocks, 4x4 positions. Levels come from
    /// the chroma masks' own `levels`, read at `row * 4 + col`.
    pub const CHROMA_420: GridConfig = GridConfig {
        block_dim: 32,
        step_max: 4,
        level_shift: 1,
        row_mult: 2,
    };

    /// Build a validated grid.
    pub fn new(block_dim: usize, step_max: usize, level_shift: u32, row_mult: usize) -> Result<Self> {
        if step_max == 0 || step_max > EDGE_SPACING {
            return Err(Vp9DspError::invalid_grid(format!(
                "step_max {step_max} outside 1..=8"
            )));
        }
        if block_dim % EDGE_SPACING != 0 || block_dim < step_max * EDGE_SPACING {
            return Err(Vp9DspError::invalid_grid(format!(
                "block_dim {block_dim} is not a multiple of 8 covering step_max {step_max}"
            )));
        }
        if row_mult == 0 {
            return Err(Vp9DspError::invalid_grid("row_mult must be non-zero"));
        }
        let row_stride = 1usize
            .checked_shl(level_shift)
            .and_then(|scale| row_mult.checked_mul(scale))
            .ok_or_else(|| Vp9DspError::invalid_grid("level index row stride overflows"))?;
        if row_stride < step_max {
            return Err(Vp9DspError::invalid_grid(format!(
                "level index rows overlap: row stride {row_stride} < step_max {step_max}"
            )));
        }
        let max_index = (step_max - 1)
            .checked_mul(row_stride)
            .and_then(|v| v.checked_add(step_max - 1));
        match max_index {
            Some(index) if index < MAX_LOOP_FILTER_LEVELS => Ok(Self {
                block_dim,
                step_max,
                level_shift,
                row_mult,
            }),
            _ => Err(Vp9DspError::invalid_grid(format!(
                "level index exceeds {} entries",
                MAX_LOOP_FILTER_LEVELS
            ))),
        }
    }

    /// Grid for a plane with `subsampling`.
    pub fn for_subsampling(subsampling: Subsampling) -> Self {
        match subsampling {
            Subsampling::None => Self::LUMA,
            Subsampling::Yuv420 => Self::CHROMA_420,
        }
    }

    /// Superblock edge length in samples.
    pub fn block_dim(&self) -> usize {
        self.block_dim
    }

    /// Edge positions per axis.
    pub fn step_max(&self) -> usize {
        self.step_max
    }

    /// Left shift applied to the scaled row in the level index.
    pub fn level_shift(&self) -> u32 {
        self.level_shift
    }

    /// Row multiplier in the level index.
    pub fn row_mult(&self) -> usize {
        self.row_mult
    }

    /// Number of edge positions per superblock.
    pub fn positions(&self) -> u32 {
        (self.step_max * self.step_max) as u32
    }

    /// Bits addressable by this grid.
    pub fn position_mask(&self) -> u64 {
        let positions = self.positions();
        if positions >= 64 {
            u64::MAX
        } else {
            (1u64 << positions) - 1
        }
    }

    /// Bits of grid row `row`.
    pub fn row_mask(&self, row: usize) -> u64 {
        let row_bits = (1u64 << self.step_max) - 1;
        row_bits << (row * self.step_max)
    }

    /// Bits of grid column `col`.
    pub fn column_mask(&self, col: usize) -> u64 {
        (0..self.step_max).fold(0, |mask, row| mask | (1u64 << self.bit(row, col)))
    }

    /// Mask bit of position (`row`, `col`).
    #[inline]
    pub fn bit(&self, row: usize, col: usize) -> u32 {
        (row * self.step_max + col) as u32
    }

    /// Level index of position (`row`, `col`).
    #[inline]
    pub fn level_index(&self, row: usize, col: usize) -> usize {
        ((row * self.row_mult) << self.level_shift) + col
    }

    /// Sample extent of the edge positions within a superblock.
    pub fn edge_span(&self) -> usize {
        self.step_max * EDGE_SPACING
    }

    /// Superblock columns and rows covering a `width`x`height` plane.
    pub fn superblocks(&self, width: usize, height: usize) -> (usize, usize) {
        (width.div_ceil(self.block_dim), height.div_ceil(self.block_dim))
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::LUMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        let luma = GridConfig::LUMA;
        assert_eq!(
            GridConfig::new(luma.block_dim(), luma.step_max(), luma.level_shift(), luma.row_mult())
                .unwrap(),
            luma
        );
        let chroma = GridConfig::CHROMA_420;
        assert_eq!(GridConfig::new(32, 4, 1, 2).unwrap(), chroma);
    }

    #[test]
    fn test_wide_chroma_grid() {
        let grid = GridConfig::new(64, 4, 1, 2).unwrap();
        assert_eq!(grid.block_dim(), 64);
        assert_eq!(grid.step_max(), 4);
        assert_eq!(grid.edge_span(), 32);
        assert_eq!(grid.positions(), 16);
        assert_eq!(grid.level_index(3, 3), 15);
        assert_eq!(grid.superblocks(960, 540), (15, 9));
    }

    #[test]
    fn test_rejects_inconsistent_grids() {
        assert!(GridConfig::new(0, 0, 0, 1).is_err());
        // block_dim off the 8-sample grid
        assert!(GridConfig::new(60, 4, 1, 2).is_err());
        // edges past the superblock
        assert!(GridConfig::new(24, 4, 1, 2).is_err());
        assert!(GridConfig::new(72, 9, 3, 1).is_err());
        // rows of the level array would alias
        assert!(GridConfig::new(32, 4, 1, 1).is_err());
        // level index past the table
        assert!(GridConfig::new(32, 4, 3, 4).is_err());
    }

    #[test]
    fn test_level_index() {
        let luma = GridConfig::LUMA;
        assert_eq!(luma.level_index(0, 0), 0);
        assert_eq!(luma.level_index(2, 5), 21);
        assert_eq!(luma.level_index(7, 7), 63);

        let chroma = GridConfig::CHROMA_420;
        assert_eq!(chroma.level_index(1, 0), 4);
        assert_eq!(chroma.level_index(3, 3), 15);
    }

    #[test]
    fn test_masks() {
        let chroma = GridConfig::CHROMA_420;
        assert_eq!(chroma.positions(), 16);
        assert_eq!(chroma.position_mask(), 0xffff);
        assert_eq!(chroma.row_mask(0), 0x000f);
        assert_eq!(chroma.row_mask(2), 0x0f00);
        assert_eq!(chroma.column_mask(0), 0x1111);

        let luma = GridConfig::LUMA;
        assert_eq!(luma.position_mask(), u64::MAX);
        assert_eq!(luma.column_mask(0), 0x0101_0101_0101_0101);
        assert_eq!(luma.bit(7, 7), 63);
    }

    #[test]
    fn test_superblock_counts() {
        assert_eq!(GridConfig::LUMA.superblocks(1920, 1080), (30, 17));
        assert_eq!(GridConfig::CHROMA_420.superblocks(960, 540), (30, 17));
        assert_eq!(
            GridConfig::for_subsampling(Subsampling::Yuv420),
            GridConfig::CHROMA_420
        );
    }
}
