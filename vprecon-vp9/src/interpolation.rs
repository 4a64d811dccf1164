//! Sub-pixel motion-compensated prediction.
//!
//! Prediction is a separable 8-tap convolution: a horizontal pass over
//! `height + 7` reference rows into an 8-bit intermediate buffer, then a
//! vertical pass over that buffer. Both passes round with `+64 >> 7` and clamp
//! to `0..=255`. A phase of zero turns the corresponding pass into a copy and
//! shrinks the support window in that axis to the block itself.

use rayon::prelude::*;
use rayon::ThreadPool;
use vprecon_core::{PlaneMut, PlaneRef};

use crate::config::{InterpolationConfig, ThreadingConfig};
use crate::error::{Result, Vp9DspError};
use crate::tables::{
    FilterKernels, FILTER_BITS, SUBPEL_FILTERS_BILINEAR, SUBPEL_FILTERS_REGULAR,
    SUBPEL_FILTERS_SHARP, SUBPEL_FILTERS_SMOOTH, SUBPEL_PHASES, SUBPEL_TAPS,
};

/// Largest supported block edge.
pub const MAX_BLOCK_SIZE: usize = 64;

/// Samples read before the block origin by an 8-tap kernel.
pub const SUBPEL_LEAD: usize = SUBPEL_TAPS / 2 - 1;

const ROUND: i32 = 1 << (FILTER_BITS - 1);
const SCRATCH_LEN: usize = MAX_BLOCK_SIZE * (MAX_BLOCK_SIZE + SUBPEL_TAPS - 1);

/// Interpolation filter bank selector.
///
/// Discriminants follow the bitstream's interpolation filter literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FilterBank {
    /// Regular 8-tap.
    #[default]
    Regular = 0,
    /// Smooth 8-tap.
    Smooth = 1,
    /// Sharp 8-tap.
    Sharp = 2,
    /// Bilinear.
    Bilinear = 3,
}

impl FilterBank {
    /// Coefficients for every phase of this bank.
    pub fn kernels(self) -> &'static FilterKernels {
        match self {
            FilterBank::Regular => &SUBPEL_FILTERS_REGULAR,
            FilterBank::Smooth => &SUBPEL_FILTERS_SMOOTH,
            FilterBank::Sharp => &SUBPEL_FILTERS_SHARP,
            FilterBank::Bilinear => &SUBPEL_FILTERS_BILINEAR,
        }
    }

    /// Taps of `phase`.
    pub fn taps(self, phase: SubpelPhase) -> &'static [i16; SUBPEL_TAPS] {
        &self.kernels()[phase.index()]
    }
}

impl TryFrom<u8> for FilterBank {
    type Error = Vp9DspError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(FilterBank::Regular),
            1 => Ok(FilterBank::Smooth),
            2 => Ok(FilterBank::Sharp),
            3 => Ok(FilterBank::Bilinear),
            other => Err(Vp9DspError::InvalidFilterBank(other)),
        }
    }
}

/// Sub-pixel offset in 1/16 sample units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubpelPhase(u8);

impl SubpelPhase {
    /// Integer position.
    pub const ZERO: SubpelPhase = SubpelPhase(0);

    /// Half-sample position.
    pub const HALF: SubpelPhase = SubpelPhase(8);

    /// Create a phase, rejecting values outside 0..16.
    pub fn new(phase: u8) -> Result<Self> {
        if (phase as usize) < SUBPEL_PHASES {
            Ok(Self(phase))
        } else {
            Err(Vp9DspError::InvalidPhase(phase))
        }
    }

    /// Phase from the low four bits of a 1/16-unit position.
    pub(crate) fn from_q4(position: i32) -> Self {
        Self((position & (SUBPEL_PHASES as i32 - 1)) as u8)
    }

    /// Raw phase value.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether this is an integer position.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    fn index(self) -> usize {
        self.0 as usize & (SUBPEL_PHASES - 1)
    }
}

/// A block to predict from a reference plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockDescriptor {
    /// Block width in samples.
    pub width: usize,
    /// Block height in rows.
    pub height: usize,
    /// Integer column of the block origin in the reference plane.
    pub x: isize,
    /// Integer row of the block origin in the reference plane.
    pub y: isize,
    /// Horizontal sub-pixel phase.
    pub phase_x: SubpelPhase,
    /// Vertical sub-pixel phase.
    pub phase_y: SubpelPhase,
    /// Filter bank.
    pub bank: FilterBank,
}

impl BlockDescriptor {
    /// Integer-position block with the regular bank.
    pub fn new(x: isize, y: isize, width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            x,
            y,
            phase_x: SubpelPhase::ZERO,
            phase_y: SubpelPhase::ZERO,
            bank: FilterBank::Regular,
        }
    }

    /// Set the sub-pixel phases.
    pub fn with_phase(mut self, phase_x: u8, phase_y: u8) -> Result<Self> {
        self.phase_x = SubpelPhase::new(phase_x)?;
        self.phase_y = SubpelPhase::new(phase_y)?;
        Ok(self)
    }

    /// Set the filter bank.
    pub fn with_bank(mut self, bank: FilterBank) -> Self {
        self.bank = bank;
        self
    }

    /// Check the dimensions and phases.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_BLOCK_SIZE
            || self.height > MAX_BLOCK_SIZE
        {
            return Err(Vp9DspError::InvalidBlockDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.phase_x.index() != self.phase_x.value() as usize {
            return Err(Vp9DspError::InvalidPhase(self.phase_x.value()));
        }
        if self.phase_y.index() != self.phase_y.value() as usize {
            return Err(Vp9DspError::InvalidPhase(self.phase_y.value()));
        }
        Ok(())
    }

    /// Reference window read by the prediction as `(x, y, width, height)`.
    ///
    /// An axis with a non-zero phase extends 3 samples before and 4 after
    /// the block; an integer axis reads the block extent only.
    pub fn support_window(&self) -> (isize, isize, usize, usize) {
        let (x, width) = support_span(self.x, self.width, self.phase_x);
        let (y, height) = support_span(self.y, self.height, self.phase_y);
        (x, y, width, height)
    }
}

fn support_span(origin: isize, len: usize, phase: SubpelPhase) -> (isize, usize) {
    if phase.is_zero() {
        (origin, len)
    } else {
        (origin - SUBPEL_LEAD as isize, len + SUBPEL_TAPS - 1)
    }
}

/// Owned prediction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionBlock {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PredictionBlock {
    /// Block width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Block height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Samples in row-major order with stride equal to width.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Row `y` of the block.
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Copy the block into `dst` with its top-left corner at (`x`, `y`).
    pub fn write_to(&self, dst: &mut PlaneMut<'_>, x: usize, y: usize) -> Result<()> {
        if x + self.width > dst.width() || y + self.height > dst.height() {
            return Err(Vp9DspError::DestinationTooSmall {
                needed: (y + self.height) * dst.stride(),
                available: dst.height() * dst.stride(),
            });
        }
        for (row, src) in self.data.chunks_exact(self.width).enumerate() {
            dst.row_mut(y + row)[x..x + self.width].copy_from_slice(src);
        }
        Ok(())
    }
}

#[inline]
fn clip_pixel(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

#[inline]
fn convolve8(samples: &[u8], taps: &[i16; SUBPEL_TAPS]) -> u8 {
    let sum: i32 = samples
        .iter()
        .zip(taps.iter())
        .map(|(&s, &t)| s as i32 * t as i32)
        .sum();
    clip_pixel((sum + ROUND) >> FILTER_BITS)
}

fn check_destination(width: usize, height: usize, dst: &[u8], dst_stride: usize) -> Result<()> {
    let needed = (height - 1) * dst_stride + width;
    if dst_stride < width || dst.len() < needed {
        return Err(Vp9DspError::DestinationTooSmall {
            needed,
            available: dst.len(),
        });
    }
    Ok(())
}

/// Inter predictor.
pub struct InterPredictor {
    config: InterpolationConfig,
    pool: Option<ThreadPool>,
    parallel: bool,
}

impl Default for InterPredictor {
    fn default() -> Self {
        Self::new(InterpolationConfig::default())
    }
}

impl std::fmt::Debug for InterPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterPredictor")
            .field("config", &self.config)
            .field("pooled", &self.pool.is_some())
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl InterPredictor {
    /// Predictor whose batch driver runs on rayon's global pool.
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            pool: None,
            parallel: true,
        }
    }

    /// Predictor with a dedicated worker pool for batch prediction.
    pub fn with_threading(config: InterpolationConfig, threading: &ThreadingConfig) -> Result<Self> {
        Ok(Self {
            config,
            pool: threading.build_pool("vp9-inter")?,
            parallel: threading.parallel,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    fn check_block(&self, block: &BlockDescriptor, reference: &PlaneRef<'_>) -> Result<()> {
        block.validate()?;
        if self.config.bounds_check {
            let (x, y, width, height) = block.support_window();
            if !reference.contains_window(x, y, width, height) {
                tracing::warn!(x, y, width, height, "Prediction window outside reference plane");
                return Err(Vp9DspError::ReferenceOutOfBounds {
                    x,
                    y,
                    width,
                    height,
                });
            }
        }
        Ok(())
    }

    /// Predict one block into a new buffer.
    pub fn predict(
        &self,
        block: &BlockDescriptor,
        reference: &PlaneRef<'_>,
    ) -> Result<PredictionBlock> {
        let mut data = vec![0u8; block.width * block.height];
        self.predict_into(block, reference, &mut data, block.width)?;
        Ok(PredictionBlock {
            width: block.width,
            height: block.height,
            data,
        })
    }

    /// Predict one block into `dst`, rows `dst_stride` bytes apart.
    pub fn predict_into(
        &self,
        block: &BlockDescriptor,
        reference: &PlaneRef<'_>,
        dst: &mut [u8],
        dst_stride: usize,
    ) -> Result<()> {
        self.check_block(block, reference)?;
        check_destination(block.width, block.height, dst, dst_stride)?;
        convolve(block, reference, dst, dst_stride);
        Ok(())
    }

    /// Predict one block and average it into `dst` as `(dst + pred + 1) >> 1`.
    ///
    /// Used for the second reference of compound prediction.
    pub fn predict_avg_into(
        &self,
        block: &BlockDescriptor,
        reference: &PlaneRef<'_>,
        dst: &mut [u8],
        dst_stride: usize,
    ) -> Result<()> {
        self.check_block(block, reference)?;
        check_destination(block.width, block.height, dst, dst_stride)?;

        let mut pred = [0u8; MAX_BLOCK_SIZE * MAX_BLOCK_SIZE];
        convolve(block, reference, &mut pred, block.width);
        average_into(
            dst,
            dst_stride,
            &pred,
            block.width,
            block.width,
            block.height,
        );
        Ok(())
    }

    /// Predict many independent blocks in parallel, preserving order.
    ///
    /// The first failing descriptor aborts the batch.
    pub fn predict_blocks(
        &self,
        blocks: &[BlockDescriptor],
        reference: &PlaneRef<'_>,
    ) -> Result<Vec<PredictionBlock>> {
        tracing::debug!(count = blocks.len(), "Predicting block batch");
        if !self.parallel {
            return blocks
                .iter()
                .map(|block| self.predict(block, reference))
                .collect();
        }
        let run = || {
            blocks
                .par_iter()
                .map(|block| self.predict(block, reference))
                .collect::<Result<Vec<_>>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

/// Average `src` into `dst` with round-half-up.
pub fn average_into(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: usize,
    height: usize,
) {
    for row in 0..height {
        let d = &mut dst[row * dst_stride..row * dst_stride + width];
        let s = &src[row * src_stride..row * src_stride + width];
        for (d, &s) in d.iter_mut().zip(s) {
            *d = ((*d as u16 + s as u16 + 1) >> 1) as u8;
        }
    }
}

/// Two-pass separable convolution. The block must already be validated.
fn convolve(block: &BlockDescriptor, reference: &PlaneRef<'_>, dst: &mut [u8], dst_stride: usize) {
    let width = block.width;
    let height = block.height;
    let (win_x, win_y, win_w, win_h) = block.support_window();
    let taps_x = block.bank.taps(block.phase_x);
    let taps_y = block.bank.taps(block.phase_y);

    let mut temp = [0u8; SCRATCH_LEN];

    // Horizontal pass over every row of the vertical support.
    for r in 0..win_h {
        let src = reference.span(win_x, win_y + r as isize, win_w);
        let out = &mut temp[r * width..(r + 1) * width];
        if block.phase_x.is_zero() {
            out.copy_from_slice(&src[..width]);
        } else {
            for (c, sample) in out.iter_mut().enumerate() {
                *sample = convolve8(&src[c..c + SUBPEL_TAPS], taps_x);
            }
        }
    }

    // Vertical pass.
    for r in 0..height {
        let out = &mut dst[r * dst_stride..r * dst_stride + width];
        if block.phase_y.is_zero() {
            out.copy_from_slice(&temp[r * width..(r + 1) * width]);
        } else {
            for (c, sample) in out.iter_mut().enumerate() {
                let mut column = [0u8; SUBPEL_TAPS];
                for (k, tap) in column.iter_mut().enumerate() {
                    *tap = temp[(r + k) * width + c];
                }
                *sample = convolve8(&column, taps_y);
            }
        }
    }
}
