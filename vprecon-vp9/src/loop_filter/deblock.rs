//! Superblock and plane deblocking drivers.
//!
//! Vertical edges are filtered along rows, left to right; horizontal edges
//! are filtered along columns, top to bottom. Every vertical edge of a plane
//! is filtered before its first horizontal edge. Within the vertical pass each
//! row is an independent work unit; within the horizontal pass each
//! superblock column (a lane of `block_dim` sample columns spanning all rows)
//! is one.

use rayon::prelude::*;
use rayon::ThreadPool;
use vprecon_core::PlaneMut;

use super::filters::{filter_edge, FilterWidth};
use super::grid::{GridConfig, EDGE_SPACING};
use super::mask::{PlaneMasks, SuperblockMasks};
use super::Orientation;
use crate::config::ThreadingConfig;
use crate::error::{Result, Vp9DspError};
use crate::tables::{LoopFilterThresh, ThresholdTable};

/// Offset of the internal 4x4 edge from the 8x8 edge.
const INTERNAL_OFFSET: usize = 4;

/// Plane dimensions must be whole 4x4 sub-blocks. A 4:2:0 chroma plane of an
/// 8-aligned luma plane may end half way through its last 8x8 block.
const PLANE_ALIGNMENT: usize = 4;

fn check_plane_alignment(width: usize, height: usize) -> Result<()> {
    if width % PLANE_ALIGNMENT != 0 || height % PLANE_ALIGNMENT != 0 {
        return Err(Vp9DspError::UnalignedPlane { width, height });
    }
    Ok(())
}

/// Validate the masks of superblock (`sb_x`, `sb_y`), including the plane
/// border rule for the superblocks on the left column and top row.
fn check_superblock(masks: &PlaneMasks, sb_x: usize, sb_y: usize, grid: &GridConfig) -> Result<()> {
    masks.validate(grid)?;
    if sb_x == 0 && masks.left.union() & grid.column_mask(0) != 0 {
        return Err(Vp9DspError::EdgeOnPlaneBorder {
            orientation: Orientation::Vertical,
            sb_x,
            sb_y,
        });
    }
    if sb_y == 0 && masks.above.union() & grid.row_mask(0) != 0 {
        return Err(Vp9DspError::EdgeOnPlaneBorder {
            orientation: Orientation::Horizontal,
            sb_x,
            sb_y,
        });
    }
    Ok(())
}

/// Width actually applied at an edge `edge` samples into a line of `len`.
///
/// A wide edge in the last 8x8 block of a plane with a 4-sample tail falls
/// back to the medium filter, like libvpx does for the last chroma row and
/// column. Medium and narrow edges always fit a 4-aligned plane.
fn fit_to_plane(filter: FilterWidth, edge: usize, len: usize) -> FilterWidth {
    if edge + filter.reach() > len {
        FilterWidth::Medium
    } else {
        filter
    }
}

fn check_plane(width: usize, height: usize, masks: &[PlaneMasks], grid: &GridConfig) -> Result<()> {
    check_plane_masks(width, height, masks, grid).map_err(|err| {
        tracing::warn!(width, height, error = %err, "Rejected loop filter input");
        err
    })
}

fn check_plane_masks(width: usize, height: usize, masks: &[PlaneMasks], grid: &GridConfig) -> Result<()> {
    check_plane_alignment(width, height)?;
    let (sb_cols, sb_rows) = grid.superblocks(width, height);
    if masks.len() != sb_cols * sb_rows {
        return Err(Vp9DspError::MaskCountMismatch {
            expected: sb_cols * sb_rows,
            actual: masks.len(),
        });
    }
    for (index, sb) in masks.iter().enumerate() {
        check_superblock(sb, index % sb_cols, index / sb_cols, grid)?;
    }
    Ok(())
}

/// Filter the vertical edges of one superblock on one plane row.
///
/// `row` is the full plane row and `mi_row` the edge-grid row of the
/// superblock it passes through.
fn filter_row(
    row: &mut [u8],
    mi_row: usize,
    sb_x: usize,
    masks: &PlaneMasks,
    thresholds: &ThresholdTable,
    grid: &GridConfig,
) {
    let width = row.len();
    let origin = sb_x * grid.block_dim();

    for step in 0..grid.step_max() {
        let x = origin + step * EDGE_SPACING;
        if x >= width {
            break;
        }
        let bit = grid.bit(mi_row, step);
        let thresh = thresholds.entry(masks.levels[grid.level_index(mi_row, step)]);

        if let Some(filter) = masks.left.width_at(bit) {
            let filter = fit_to_plane(filter, x, width);
            let reach = filter.reach();
            filter_edge(filter, thresh, &mut row[x - reach..x + reach]);
        }
        let inner = x + INTERNAL_OFFSET;
        if masks.internal & (1u64 << bit) != 0 && inner < width {
            let reach = FilterWidth::Narrow.reach();
            filter_edge(FilterWidth::Narrow, thresh, &mut row[inner - reach..inner + reach]);
        }
    }
}

fn filter_column_edge(
    rows: &mut [&mut [u8]],
    x: usize,
    y: usize,
    filter: FilterWidth,
    thresh: &LoopFilterThresh,
) {
    let reach = filter.reach();
    let mut line = [0u8; 2 * EDGE_SPACING];
    let span = y - reach..y + reach;

    for (sample, row) in line.iter_mut().zip(&rows[span.clone()]) {
        *sample = row[x];
    }
    filter_edge(filter, thresh, &mut line[..2 * reach]);
    for (sample, row) in line.iter().zip(&mut rows[span]) {
        row[x] = *sample;
    }
}

/// Filter the horizontal edges of one superblock on one sample column.
///
/// `rows` spans the whole plane height; `x` indexes into each row slice and
/// `mi_col` is the edge-grid column of the superblock it passes through.
fn filter_column(
    rows: &mut [&mut [u8]],
    x: usize,
    mi_col: usize,
    sb_y: usize,
    masks: &PlaneMasks,
    thresholds: &ThresholdTable,
    grid: &GridConfig,
) {
    let height = rows.len();
    let origin = sb_y * grid.block_dim();

    for step in 0..grid.step_max() {
        let y = origin + step * EDGE_SPACING;
        if y >= height {
            break;
        }
        let bit = grid.bit(step, mi_col);
        let thresh = thresholds.entry(masks.levels[grid.level_index(step, mi_col)]);

        if let Some(filter) = masks.above.width_at(bit) {
            filter_column_edge(rows, x, y, fit_to_plane(filter, y, height), thresh);
        }
        let inner = y + INTERNAL_OFFSET;
        if masks.internal & (1u64 << bit) != 0 && inner < height {
            filter_column_edge(rows, x, inner, FilterWidth::Narrow, thresh);
        }
    }
}

/// Deblock one orientation of one superblock.
///
/// The masks are validated before any sample is written. Calling this for
/// every superblock in raster order with [`Orientation::Vertical`], then
/// again with [`Orientation::Horizontal`], produces the same plane as
/// [`Deblocker::deblock_plane`].
pub fn deblock_superblock(
    plane: &mut PlaneMut<'_>,
    sb_x: usize,
    sb_y: usize,
    masks: &PlaneMasks,
    thresholds: &ThresholdTable,
    orientation: Orientation,
    grid: &GridConfig,
) -> Result<()> {
    let width = plane.width();
    let height = plane.height();
    check_plane_alignment(width, height)?;
    let (sb_cols, sb_rows) = grid.superblocks(width, height);
    if sb_x >= sb_cols || sb_y >= sb_rows {
        return Err(Vp9DspError::InvalidPlane(format!(
            "superblock ({sb_x}, {sb_y}) outside {sb_cols}x{sb_rows} grid"
        )));
    }
    check_superblock(masks, sb_x, sb_y, grid)?;

    let dim = grid.block_dim();
    let top = sb_y * dim;
    let bottom = (top + grid.edge_span()).min(height);
    tracing::trace!(sb_x, sb_y, %orientation, "Deblocking superblock");

    match orientation {
        Orientation::Vertical => {
            for y in top..bottom {
                let mi_row = (y - top) / EDGE_SPACING;
                filter_row(plane.row_mut(y), mi_row, sb_x, masks, thresholds, grid);
            }
        }
        Orientation::Horizontal => {
            let left = sb_x * dim;
            let right = (left + grid.edge_span()).min(width);
            let mut rows = plane.split_rows();
            for x in left..right {
                let mi_col = (x - left) / EDGE_SPACING;
                filter_column(&mut rows, x, mi_col, sb_y, masks, thresholds, grid);
            }
        }
    }
    Ok(())
}

fn vertical_pass(
    plane: &mut PlaneMut<'_>,
    masks: &[PlaneMasks],
    thresholds: &ThresholdTable,
    grid: &GridConfig,
    parallel: bool,
) {
    let dim = grid.block_dim();
    let (sb_cols, _) = grid.superblocks(plane.width(), plane.height());
    let filter = |y: usize, row: &mut [u8]| {
        let sb_y = y / dim;
        let mi_row = (y % dim) / EDGE_SPACING;
        if mi_row >= grid.step_max() {
            return;
        }
        for sb_x in 0..sb_cols {
            filter_row(row, mi_row, sb_x, &masks[sb_y * sb_cols + sb_x], thresholds, grid);
        }
    };

    let mut rows = plane.split_rows();
    if parallel {
        rows.par_iter_mut()
            .enumerate()
            .for_each(|(y, row)| filter(y, &mut row[..]));
    } else {
        rows.iter_mut()
            .enumerate()
            .for_each(|(y, row)| filter(y, &mut row[..]));
    }
}

fn horizontal_pass(
    plane: &mut PlaneMut<'_>,
    masks: &[PlaneMasks],
    thresholds: &ThresholdTable,
    grid: &GridConfig,
    parallel: bool,
) {
    let dim = grid.block_dim();
    let height = plane.height();
    let (sb_cols, sb_rows) = grid.superblocks(plane.width(), height);

    let mut lanes: Vec<Vec<&mut [u8]>> = (0..sb_cols).map(|_| Vec::with_capacity(height)).collect();
    for row in plane.rows_mut() {
        for (lane, segment) in lanes.iter_mut().zip(row.chunks_mut(dim)) {
            lane.push(segment);
        }
    }

    let filter = |sb_x: usize, lane: &mut [&mut [u8]]| {
        let lane_width = lane
            .first()
            .map_or(0, |row| row.len())
            .min(grid.edge_span());
        for sb_y in 0..sb_rows {
            let sb_masks = &masks[sb_y * sb_cols + sb_x];
            for x in 0..lane_width {
                filter_column(lane, x, x / EDGE_SPACING, sb_y, sb_masks, thresholds, grid);
            }
        }
    };

    if parallel {
        lanes
            .par_iter_mut()
            .enumerate()
            .for_each(|(sb_x, lane)| filter(sb_x, lane.as_mut_slice()));
    } else {
        lanes
            .iter_mut()
            .enumerate()
            .for_each(|(sb_x, lane)| filter(sb_x, lane.as_mut_slice()));
    }
}

/// Plane and frame deblocking driver.
pub struct Deblocker {
    pool: Option<ThreadPool>,
    parallel: bool,
}

impl Default for Deblocker {
    fn default() -> Self {
        Self {
            pool: None,
            parallel: true,
        }
    }
}

impl std::fmt::Debug for Deblocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deblocker")
            .field("pooled", &self.pool.is_some())
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl Deblocker {
    /// Create a driver with its own worker pool as configured.
    pub fn new(config: &ThreadingConfig) -> Result<Self> {
        Ok(Self {
            pool: config.build_pool("vp9-lf")?,
            parallel: config.parallel,
        })
    }

    /// Driver that runs on the calling thread only.
    pub fn single_threaded() -> Self {
        Self {
            pool: None,
            parallel: false,
        }
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Filter one orientation across a whole plane.
    ///
    /// `masks` holds one entry per superblock in raster order.
    pub fn deblock_pass(
        &self,
        plane: &mut PlaneMut<'_>,
        masks: &[PlaneMasks],
        thresholds: &ThresholdTable,
        orientation: Orientation,
        grid: &GridConfig,
    ) -> Result<()> {
        check_plane(plane.width(), plane.height(), masks, grid)?;
        let parallel = self.parallel;
        self.install(|| match orientation {
            Orientation::Vertical => vertical_pass(plane, masks, thresholds, grid, parallel),
            Orientation::Horizontal => horizontal_pass(plane, masks, thresholds, grid, parallel),
        });
        Ok(())
    }

    /// Filter all vertical edges of a plane, then all horizontal edges.
    pub fn deblock_plane(
        &self,
        plane: &mut PlaneMut<'_>,
        masks: &[PlaneMasks],
        thresholds: &ThresholdTable,
        grid: &GridConfig,
    ) -> Result<()> {
        check_plane(plane.width(), plane.height(), masks, grid)?;
        tracing::debug!(
            width = plane.width(),
            height = plane.height(),
            superblocks = masks.len(),
            block_dim = grid.block_dim(),
            "Deblocking plane"
        );
        let parallel = self.parallel;
        self.install(|| filter_plane(plane, masks, thresholds, grid, parallel));
        Ok(())
    }

    /// Deblock the luma and both chroma planes of a frame.
    ///
    /// Every plane is validated before any is modified; the planes are then
    /// filtered concurrently.
    pub fn deblock_frame(
        &self,
        luma: &mut PlaneMut<'_>,
        cb: &mut PlaneMut<'_>,
        cr: &mut PlaneMut<'_>,
        masks: &[SuperblockMasks],
        thresholds: &ThresholdTable,
        luma_grid: &GridConfig,
        chroma_grid: &GridConfig,
    ) -> Result<()> {
        let luma_masks: Vec<PlaneMasks> = masks.iter().map(|sb| sb.luma).collect();
        let chroma_masks: Vec<PlaneMasks> = masks.iter().map(|sb| sb.chroma).collect();

        check_plane(luma.width(), luma.height(), &luma_masks, luma_grid)?;
        check_plane(cb.width(), cb.height(), &chroma_masks, chroma_grid)?;
        check_plane(cr.width(), cr.height(), &chroma_masks, chroma_grid)?;
        tracing::debug!(
            width = luma.width(),
            height = luma.height(),
            superblocks = masks.len(),
            "Deblocking frame"
        );

        if self.parallel {
            self.install(|| {
                rayon::join(
                    || filter_plane(luma, &luma_masks, thresholds, luma_grid, true),
                    || {
                        rayon::join(
                            || filter_plane(cb, &chroma_masks, thresholds, chroma_grid, true),
                            || filter_plane(cr, &chroma_masks, thresholds, chroma_grid, true),
                        )
                    },
                );
            });
        } else {
            filter_plane(luma, &luma_masks, thresholds, luma_grid, false);
            filter_plane(cb, &chroma_masks, thresholds, chroma_grid, false);
            filter_plane(cr, &chroma_masks, thresholds, chroma_grid, false);
        }
        Ok(())
    }
}

fn filter_plane(
    plane: &mut PlaneMut<'_>,
    masks: &[PlaneMasks],
    thresholds: &ThresholdTable,
    grid: &GridConfig,
    parallel: bool,
) {
    vertical_pass(plane, masks, thresholds, grid, parallel);
    // Barrier: the horizontal pass reads samples written by vertical edges.
    horizontal_pass(plane, masks, thresholds, grid, parallel);
}
