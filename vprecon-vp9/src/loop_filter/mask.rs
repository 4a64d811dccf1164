//! Precomputed per-superblock edge masks.

use super::filters::FilterWidth;
use super::grid::GridConfig;
use super::Orientation;
use crate::error::{Result, Vp9DspError};
use crate::tables::MAX_LOOP_FILTER_LEVELS;

/// Filter-width bitmasks for one edge orientation.
///
/// At most one of the three masks may have a given position set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeMasks {
    /// Positions filtered with the 16-wide filter.
    pub wide: u64,
    /// Positions filtered with the 8-wide filter.
    pub medium: u64,
    /// Positions filtered with the 4-wide filter.
    pub narrow: u64,
}

impl EdgeMasks {
    /// No edges.
    pub const EMPTY: EdgeMasks = EdgeMasks {
        wide: 0,
        medium: 0,
        narrow: 0,
    };

    /// Filter width selected at `bit`, widest first.
    #[inline]
    pub fn width_at(&self, bit: u32) -> Option<FilterWidth> {
        let selected = 1u64 << bit;
        if self.wide & selected != 0 {
            Some(FilterWidth::Wide)
        } else if self.medium & selected != 0 {
            Some(FilterWidth::Medium)
        } else if self.narrow & selected != 0 {
            Some(FilterWidth::Narrow)
        } else {
            None
        }
    }

    /// Set `bit` in the mask of `width`.
    pub fn set(&mut self, bit: u32, width: FilterWidth) {
        let selected = 1u64 << bit;
        match width {
            FilterWidth::Wide => self.wide |= selected,
            FilterWidth::Medium => self.medium |= selected,
            FilterWidth::Narrow => self.narrow |= selected,
        }
    }

    /// Drop every width at the positions in `bits`.
    pub fn clear(&mut self, bits: u64) {
        self.wide &= !bits;
        self.medium &= !bits;
        self.narrow &= !bits;
    }

    /// Positions with any filter.
    pub fn union(&self) -> u64 {
        self.wide | self.medium | self.narrow
    }

    /// Positions claimed by more than one width.
    pub fn overlaps(&self) -> u64 {
        (self.wide & self.medium) | (self.wide & self.narrow) | (self.medium & self.narrow)
    }
}

/// Edge masks and filter levels of one plane of one superblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneMasks {
    /// Vertical edges on the left side of each position.
    pub left: EdgeMasks,
    /// Horizontal edges on the top side of each position.
    pub above: EdgeMasks,
    /// Positions whose internal 4x4 edges are filtered, in both orientations.
    pub internal: u64,
    /// Filter level of each position, addressed through the grid's level index.
    pub levels: [u8; MAX_LOOP_FILTER_LEVELS],
}

impl Default for PlaneMasks {
    fn default() -> Self {
        Self {
            left: EdgeMasks::EMPTY,
            above: EdgeMasks::EMPTY,
            internal: 0,
            levels: [0; MAX_LOOP_FILTER_LEVELS],
        }
    }
}

impl PlaneMasks {
    /// Masks with no edges and every level set to `level`.
    pub fn with_level(level: u8) -> Self {
        Self {
            levels: [level; MAX_LOOP_FILTER_LEVELS],
            ..Self::default()
        }
    }

    /// Edge masks of `orientation`.
    pub fn edges(&self, orientation: Orientation) -> &EdgeMasks {
        match orientation {
            Orientation::Vertical => &self.left,
            Orientation::Horizontal => &self.above,
        }
    }

    /// Mutable edge masks of `orientation`.
    pub fn edges_mut(&mut self, orientation: Orientation) -> &mut EdgeMasks {
        match orientation {
            Orientation::Vertical => &mut self.left,
            Orientation::Horizontal => &mut self.above,
        }
    }

    /// Drop main edges that would lie on the plane border: left edges in grid
    /// column 0 when `sb_x == 0` and above edges in grid row 0 when
    /// `sb_y == 0`. Internal edges are kept.
    ///
    /// libvpx builds masks with these bits set and skips them while
    /// filtering; the deblocking drivers here reject them instead.
    pub fn clear_plane_border(&mut self, grid: &GridConfig, sb_x: usize, sb_y: usize) {
        if sb_x == 0 {
            self.left.clear(grid.column_mask(0));
        }
        if sb_y == 0 {
            self.above.clear(grid.row_mask(0));
        }
    }

    /// Check exclusivity, grid coverage and levels.
    pub fn validate(&self, grid: &GridConfig) -> Result<()> {
        for orientation in [Orientation::Vertical, Orientation::Horizontal] {
            let overlaps = self.edges(orientation).overlaps();
            if overlaps != 0 {
                return Err(Vp9DspError::OverlappingFilterWidths {
                    orientation,
                    bits: overlaps,
                });
            }
        }

        let used = self.left.union() | self.above.union() | self.internal;
        let outside = used & !grid.position_mask();
        if outside != 0 {
            return Err(Vp9DspError::MaskOutsideGrid {
                positions: grid.positions(),
                bits: outside,
            });
        }

        let step_max = grid.step_max();
        for row in 0..step_max {
            for col in 0..step_max {
                if used & (1u64 << grid.bit(row, col)) == 0 {
                    continue;
                }
                let position = grid.level_index(row, col);
                let level = self.levels[position];
                if level as usize >= MAX_LOOP_FILTER_LEVELS {
                    return Err(Vp9DspError::InvalidFilterLevel { level, position });
                }
            }
        }
        Ok(())
    }
}

/// Luma and chroma masks of one superblock. Both chroma planes share
/// the chroma masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SuperblockMasks {
    /// Luma plane masks.
    pub luma: PlaneMasks,
    /// Chroma plane masks.
    pub chroma: PlaneMasks,
}
