//! # vprecon-vp9
//!
//! VP9 pixel reconstruction primitives: inter prediction and deblocking.
//!
//! ## Features
//!
//! - **Sub-pixel Interpolation**: 8-tap separable filters at 1/16 sample
//!   precision with the regular, smooth, sharp and bilinear banks
//! - **Compound Prediction**: Rounded averaging of a second prediction
//! - **Motion Vectors**: Conversion of 1/8 luma vectors to per-plane
//!   positions for full resolution and 4:2:0 chroma
//! - **Loop Filter**: 4, 8 and 16-wide edge filters driven by 64x64
//!   superblock edge masks
//! - **Parallelism**: Independent blocks, rows and superblock columns run on a
//!   rayon pool
//!
//! ## Example
//!
//! ```
//! use vprecon_core::PlaneBuffer;
//! use vprecon_vp9::{BlockDescriptor, FilterBank, InterPredictor, InterpolationConfig};
//!
//! let reference = PlaneBuffer::from_fn(64, 64, 16, |x, y| (x + y) as u8);
//! let predictor = InterPredictor::new(InterpolationConfig::checked());
//!
//! let block = BlockDescriptor::new(8, 8, 16, 16)
//!     .with_phase(8, 0)
//!     .unwrap()
//!     .with_bank(FilterBank::Sharp);
//! let prediction = predictor.predict(&block, &reference.view()).unwrap();
//! assert_eq!(prediction.width(), 16);
//! ```
//!
//! ## Deblocking Order
//!
//! Within a plane every vertical edge is filtered before any horizontal edge.
//! Vertical edges along one row are filtered left to right and horizontal
//! edges along one column top to bottom. Rows (vertical pass) and superblock
//! columns (horizontal pass) are processed concurrently.

#![warn(missing_docs)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod error;
pub mod interpolation;
pub mod loop_filter;
pub mod mv;
pub mod tables;

pub use config::{InterpolationConfig, ThreadingConfig};
pub use error::{Result, Vp9DspError};
pub use interpolation::{
    average_into, BlockDescriptor, FilterBank, InterPredictor, PredictionBlock, SubpelPhase,
    MAX_BLOCK_SIZE,
};
pub use loop_filter::{
    deblock_superblock, filter_edge, Deblocker, EdgeMasks, FilterWidth, GridConfig, Orientation,
    PlaneMasks, SuperblockMasks,
};
pub use mv::MotionVector;
pub use tables::{LoopFilterThresh, ThresholdTable};
