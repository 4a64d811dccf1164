//! # vprecon core
//!
//! Shared building blocks for the reconstruction crates:
//! - Error handling types
//! - Owned plane buffers with replicated borders
//! - Borrowed read-only and mutable plane views
//! - Chroma subsampling descriptors

pub mod error;
pub mod plane;

pub use error::{Error, Result};
pub use plane::{PlaneBuffer, PlaneMut, PlaneRef, Subsampling, STRIDE_ALIGNMENT};
