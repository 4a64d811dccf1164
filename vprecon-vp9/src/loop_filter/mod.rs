//! VP9 deblocking.
//!
//! Edge filters are selected per 8x8 grid position from precomputed
//! superblock masks ([`PlaneMasks`]). [`deblock_superblock`] filters a single
//! superblock; [`Deblocker`] filters whole planes and frames with every
//! vertical edge done before the first horizontal edge.

pub mod deblock;
pub mod filters;
pub mod grid;
pub mod mask;

use std::fmt;

pub use deblock::{deblock_superblock, Deblocker};
pub use filters::{filter_edge, FilterWidth};
pub use grid::{GridConfig, EDGE_SPACING};
pub use mask::{EdgeMasks, PlaneMasks, SuperblockMasks};

/// Edge orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Vertical edges, filtered across columns along each row.
    Vertical,
    /// Horizontal edges, filtered across rows along each column.
    Horizontal,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Vertical => write!(f, "vertical"),
            Orientation::Horizontal => write!(f, "horizontal"),
        }
    }
}
