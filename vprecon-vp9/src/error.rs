//! VP9 DSP error types.
//!
//! Every error is raised before any output sample is written. Errors fall in
//! two classes: precondition violations (malformed descriptors, masks or
//! configuration) and bounds violations (reads outside the addressable
//! reference area, reported only when bounds checking is enabled).

use thiserror::Error;

use crate::loop_filter::Orientation;

/// VP9 DSP error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Vp9DspError {
    /// Block width or height outside the supported range.
    #[error("Invalid block dimensions: {width}x{height} (supported 1..=64)")]
    InvalidBlockDimensions {
        /// Block width.
        width: usize,
        /// Block height.
        height: usize,
    },

    /// Sub-pixel phase outside 0..16.
    #[error("Invalid sub-pixel phase: {0} (expected 0..16)")]
    InvalidPhase(u8),

    /// Unknown interpolation filter bank index.
    #[error("Invalid interpolation filter bank: {0}")]
    InvalidFilterBank(u8),

    /// Filter level index beyond the threshold table.
    #[error("Invalid filter level {level} at mask position {position}")]
    InvalidFilterLevel {
        /// Offending level.
        level: u8,
        /// Index into the level array.
        position: usize,
    },

    /// Filter level looked up directly beyond the threshold table.
    #[error("Filter level {0} outside the threshold table (expected 0..=63)")]
    LevelOutOfRange(u8),

    /// Sharpness outside 0..=7.
    #[error("Invalid sharpness: {0} (expected 0..=7)")]
    InvalidSharpness(u8),

    /// More than one filter width selected for a single edge position.
    #[error("Overlapping filter widths on {orientation} edges: {bits:#018x}")]
    OverlappingFilterWidths {
        /// Orientation of the offending mask.
        orientation: Orientation,
        /// Positions selected by more than one width.
        bits: u64,
    },

    /// Mask bits set beyond the superblock grid.
    #[error("Mask bits outside the {positions}-position grid: {bits:#018x}")]
    MaskOutsideGrid {
        /// Number of positions in the grid.
        positions: u32,
        /// Offending bits.
        bits: u64,
    },

    /// An edge is requested on the left column or top row of the plane.
    ///
    /// Masks built the libvpx way keep above bits in row 0 of the top
    /// superblock row; [`PlaneMasks::clear_plane_border`] drops them.
    ///
    /// [`PlaneMasks::clear_plane_border`]: crate::PlaneMasks::clear_plane_border
    #[error("{orientation} edge requested on plane border in superblock ({sb_x}, {sb_y})")]
    EdgeOnPlaneBorder {
        /// Orientation of the offending edge.
        orientation: Orientation,
        /// Superblock column.
        sb_x: usize,
        /// Superblock row.
        sb_y: usize,
    },

    /// Inconsistent superblock grid parameters.
    #[error("Invalid grid configuration: {0}")]
    InvalidGridConfig(String),

    /// Plane dimensions not aligned to the 4-sample sub-block grid.
    #[error("Plane dimensions {width}x{height} are not multiples of 4")]
    UnalignedPlane {
        /// Plane width.
        width: usize,
        /// Plane height.
        height: usize,
    },

    /// Number of mask sets does not match the superblock count.
    #[error("Expected {expected} superblock mask sets, got {actual}")]
    MaskCountMismatch {
        /// Superblocks covering the plane.
        expected: usize,
        /// Mask sets supplied.
        actual: usize,
    },

    /// Destination buffer cannot hold the block.
    #[error("Destination too small: need {needed} bytes, have {available}")]
    DestinationTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes provided.
        available: usize,
    },

    /// Interpolation support window leaves the reference plane.
    #[error("Reference window {width}x{height} at ({x}, {y}) is out of bounds")]
    ReferenceOutOfBounds {
        /// Window column.
        x: isize,
        /// Window row.
        y: isize,
        /// Window width.
        width: usize,
        /// Window height.
        height: usize,
    },

    /// Plane geometry rejected by the buffer layer.
    #[error("Invalid plane: {0}")]
    InvalidPlane(String),

    /// Worker pool construction failed.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// VP9 DSP result type.
pub type Result<T> = std::result::Result<T, Vp9DspError>;

impl Vp9DspError {
    /// Create an invalid grid configuration error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGridConfig(msg.into())
    }

    /// Check if this error reports a malformed input or configuration.
    #[must_use]
    pub fn is_precondition_violation(&self) -> bool {
        !self.is_bounds_violation() && !matches!(self, Self::ThreadPool(_))
    }

    /// Check if this error reports a read outside the reference plane.
    #[must_use]
    pub fn is_bounds_violation(&self) -> bool {
        matches!(self, Self::ReferenceOutOfBounds { .. })
    }
}

impl From<vprecon_core::Error> for Vp9DspError {
    fn from(err: vprecon_core::Error) -> Self {
        match err {
            vprecon_core::Error::OutOfBounds {
                x,
                y,
                width,
                height,
            } => Self::ReferenceOutOfBounds {
                x,
                y,
                width,
                height,
            },
            vprecon_core::Error::BufferTooSmall { needed, available } => {
                Self::DestinationTooSmall { needed, available }
            }
            other => Self::InvalidPlane(other.to_string()),
        }
    }
}

impl From<Vp9DspError> for vprecon_core::Error {
    fn from(err: Vp9DspError) -> Self {
        vprecon_core::Error::Dsp(err.to_string())
    }
}
