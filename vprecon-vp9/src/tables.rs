//! Interpolation coefficient banks and loop-filter thresholds.
//!
//! Every interpolation phase sums to 128 (7-bit fixed point) and phase 0 of
//! every bank is the identity kernel.

use std::sync::OnceLock;

use crate::error::{Result, Vp9DspError};

/// Number of taps per interpolation kernel.
pub const SUBPEL_TAPS: usize = 8;

/// Number of sub-pixel phases (1/16 sample precision).
pub const SUBPEL_PHASES: usize = 16;

/// Fixed-point precision of the interpolation taps.
pub const FILTER_BITS: u32 = 7;

/// Number of loop-filter levels.
pub const MAX_LOOP_FILTER_LEVELS: usize = 64;

/// Highest loop-filter sharpness.
pub const MAX_SHARPNESS: u8 = 7;

/// One bank: 16 phases of 8 taps.
pub type FilterKernels = [[i16; SUBPEL_TAPS]; SUBPEL_PHASES];

/// Regular 8-tap kernels.
pub const SUBPEL_FILTERS_REGULAR: FilterKernels = [
    [0, 0, 0, 128, 0, 0, 0, 0],
    [0, 1, -5, 126, 8, -3, 1, 0],
    [-1, 3, -10, 122, 18, -6, 2, 0],
    [-1, 4, -13, 118, 27, -9, 3, -1],
    [-1, 4, -16, 112, 37, -11, 4, -1],
    [-1, 5, -18, 105, 48, -14, 4, -1],
    [-1, 5, -19, 97, 58, -16, 5, -1],
    [-1, 6, -19, 88, 68, -18, 5, -1],
    [-1, 6, -19, 78, 78, -19, 6, -1],
    [-1, 5, -18, 68, 88, -19, 6, -1],
    [-1, 5, -16, 58, 97, -19, 5, -1],
    [-1, 4, -14, 48, 105, -18, 5, -1],
    [-1, 4, -11, 37, 112, -16, 4, -1],
    [-1, 3, -9, 27, 118, -13, 4, -1],
    [0, 2, -6, 18, 122, -10, 3, -1],
    [0, 1, -3, 8, 126, -5, 1, 0],
];

/// Smooth (low-pass) 8-tap kernels.
pub const SUBPEL_FILTERS_SMOOTH: FilterKernels = [
    [0, 0, 0, 128, 0, 0, 0, 0],
    [-3, -1, 32, 64, 38, 1, -3, 0],
    [-2, -2, 29, 63, 41, 2, -3, 0],
    [-2, -2, 26, 63, 43, 4, -4, 0],
    [-2, -3, 24, 62, 46, 5, -4, 0],
    [-2, -3, 21, 60, 49, 7, -4, 0],
    [-1, -4, 18, 59, 51, 9, -4, 0],
    [-1, -4, 16, 57, 53, 12, -4, -1],
    [-1, -4, 14, 55, 55, 14, -4, -1],
    [-1, -4, 12, 53, 57, 16, -4, -1],
    [0, -4, 9, 51, 59, 18, -4, -1],
    [0, -4, 7, 49, 60, 21, -3, -2],
    [0, -4, 5, 46, 62, 24, -3, -2],
    [0, -4, 4, 43, 63, 26, -2, -2],
    [0, -3, 2, 41, 63, 29, -2, -2],
    [0, -3, 1, 38, 64, 32, -1, -3],
];

/// Sharp 8-tap kernels.
pub const SUBPEL_FILTERS_SHARP: FilterKernels = [
    [0, 0, 0, 128, 0, 0, 0, 0],
    [-1, 3, -7, 127, 8, -3, 1, 0],
    [-2, 5, -13, 125, 17, -6, 3, -1],
    [-3, 7, -17, 121, 27, -10, 5, -2],
    [-4, 9, -20, 115, 37, -13, 6, -2],
    [-4, 10, -23, 108, 48, -16, 8, -3],
    [-4, 10, -24, 100, 59, -19, 9, -3],
    [-4, 11, -24, 90, 70, -21, 10, -4],
    [-4, 11, -23, 80, 80, -23, 11, -4],
    [-4, 10, -21, 70, 90, -24, 11, -4],
    [-3, 9, -19, 59, 100, -24, 10, -4],
    [-3, 8, -16, 48, 108, -23, 10, -4],
    [-2, 6, -13, 37, 115, -20, 9, -4],
    [-2, 5, -10, 27, 121, -17, 7, -3],
    [-1, 3, -6, 17, 125, -13, 5, -2],
    [0, 1, -3, 8, 127, -7, 3, -1],
];

/// Bilinear kernels in 8-tap form.
pub const SUBPEL_FILTERS_BILINEAR: FilterKernels = bilinear_kernels();

const fn bilinear_kernels() -> FilterKernels {
    let mut kernels = [[0i16; SUBPEL_TAPS]; SUBPEL_PHASES];
    let mut phase = 0;
    while phase < SUBPEL_PHASES {
        kernels[phase][3] = 128 - 8 * phase as i16;
        kernels[phase][4] = 8 * phase as i16;
        phase += 1;
    }
    kernels
}

/// Thresholds controlling one loop-filter level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopFilterThresh {
    /// Edge limit: bound on `|p0-q0|*2 + |p1-q1|/2`.
    pub mblim: u8,
    /// Interior limit on neighbouring sample differences.
    pub lim: u8,
    /// High edge variance threshold.
    pub hev_thr: u8,
}

impl LoopFilterThresh {
    /// Thresholds for `level` at `sharpness`.
    ///
    /// `level` is clamped to 0..=63 and `sharpness` to 0..=7.
    pub fn for_level(level: u8, sharpness: u8) -> Self {
        let level = level.min(MAX_LOOP_FILTER_LEVELS as u8 - 1);
        let sharpness = sharpness.min(MAX_SHARPNESS);

        let shift = u8::from(sharpness > 0) + u8::from(sharpness > 4);
        let mut inside = level >> shift;
        if sharpness > 0 {
            inside = inside.min(9 - sharpness);
        }
        let inside = inside.max(1);

        Self {
            mblim: 2 * (level + 2) + inside,
            lim: inside,
            hev_thr: level >> 4,
        }
    }
}

/// Thresholds for every loop-filter level, indexed by level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdTable {
    entries: [LoopFilterThresh; MAX_LOOP_FILTER_LEVELS],
    sharpness: Option<u8>,
}

impl ThresholdTable {
    /// Build the table for a frame's `sharpness` (0..=7).
    pub fn new(sharpness: u8) -> Result<Self> {
        if sharpness > MAX_SHARPNESS {
            return Err(Vp9DspError::InvalidSharpness(sharpness));
        }
        Ok(Self::build(sharpness))
    }

    fn build(sharpness: u8) -> Self {
        let mut entries = [LoopFilterThresh::default(); MAX_LOOP_FILTER_LEVELS];
        for (level, entry) in entries.iter_mut().enumerate() {
            *entry = LoopFilterThresh::for_level(level as u8, sharpness);
        }
        Self {
            entries,
            sharpness: Some(sharpness),
        }
    }

    /// Wrap externally computed thresholds.
    pub fn from_entries(entries: [LoopFilterThresh; MAX_LOOP_FILTER_LEVELS]) -> Self {
        Self {
            entries,
            sharpness: None,
        }
    }

    /// Shared sharpness-0 table.
    pub fn standard() -> &'static ThresholdTable {
        static TABLE: OnceLock<ThresholdTable> = OnceLock::new();
        TABLE.get_or_init(|| Self::build(0))
    }

    /// Sharpness the table was built for, if built from one.
    pub fn sharpness(&self) -> Option<u8> {
        self.sharpness
    }

    /// Thresholds for `level`.
    pub fn get(&self, level: u8) -> Result<&LoopFilterThresh> {
        self.entries
            .get(level as usize)
            .ok_or(Vp9DspError::LevelOutOfRange(level))
    }

    /// All entries.
    pub fn entries(&self) -> &[LoopFilterThresh; MAX_LOOP_FILTER_LEVELS] {
        &self.entries
    }

    pub(crate) fn entry(&self, level: u8) -> &LoopFilterThresh {
        &self.entries[level as usize & (MAX_LOOP_FILTER_LEVELS - 1)]
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::standard().clone()
    }
}
