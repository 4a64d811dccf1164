//! Motion vectors and their conversion to per-plane sub-pixel positions.

use vprecon_core::Subsampling;

use crate::interpolation::{BlockDescriptor, FilterBank, SubpelPhase};

/// Motion vector in 1/8 luma sample units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionVector {
    /// Row component (1/8 pel).
    pub row: i16,
    /// Column component (1/8 pel).
    pub col: i16,
}

impl MotionVector {
    /// Create a new motion vector.
    pub const fn new(row: i16, col: i16) -> Self {
        Self { row, col }
    }

    /// Create a zero motion vector.
    pub const fn zero() -> Self {
        Self { row: 0, col: 0 }
    }

    /// Add two motion vectors.
    pub fn add(&self, other: &Self) -> Self {
        Self {
            row: self.row.saturating_add(other.row),
            col: self.col.saturating_add(other.col),
        }
    }

    /// Check if this is a zero vector.
    pub const fn is_zero(&self) -> bool {
        self.row == 0 && self.col == 0
    }

    /// Components in 1/16 sample units of a plane with `subsampling`,
    /// as `(row, col)`.
    pub fn to_q4(&self, subsampling: Subsampling) -> (i32, i32) {
        let row = self.row as i32 * (1 << (1 - subsampling.shift_y()));
        let col = self.col as i32 * (1 << (1 - subsampling.shift_x()));
        (row, col)
    }

    /// Rounded average of the four sub-block vectors of a sub-8x8 block.
    ///
    /// Rounds half away from zero.
    pub fn average_q4(mvs: &[MotionVector; 4]) -> Self {
        let row: i32 = mvs.iter().map(|mv| mv.row as i32).sum();
        let col: i32 = mvs.iter().map(|mv| mv.col as i32).sum();
        Self {
            row: round_mv_comp_q4(row) as i16,
            col: round_mv_comp_q4(col) as i16,
        }
    }
}

fn round_mv_comp_q4(value: i32) -> i32 {
    (if value < 0 { value - 2 } else { value + 2 }) / 4
}

/// Split a 1/16-unit position into integer sample and phase.
fn split_q4(origin: isize, offset_q4: i32) -> (isize, SubpelPhase) {
    let position = origin as i64 * 16 + offset_q4 as i64;
    ((position >> 4) as isize, SubpelPhase::from_q4(position as i32))
}

impl BlockDescriptor {
    /// Descriptor for a block at (`x`, `y`) of a plane with `subsampling`,
    /// displaced by `mv`.
    pub fn from_motion_vector(
        x: isize,
        y: isize,
        width: usize,
        height: usize,
        mv: MotionVector,
        subsampling: Subsampling,
        bank: FilterBank,
    ) -> Self {
        let (row_q4, col_q4) = mv.to_q4(subsampling);
        let (x, phase_x) = split_q4(x, col_q4);
        let (y, phase_y) = split_q4(y, row_q4);
        Self {
            width,
            height,
            x,
            y,
            phase_x,
            phase_y,
            bank,
        }
    }
}
