//! Runtime configuration for the interpolation and deblocking drivers.

use rayon::ThreadPool;

use crate::error::{Result, Vp9DspError};

/// Worker pool configuration shared by the batch drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreadingConfig {
    /// Number of threads to use (0 = auto-detect based on CPU cores).
    pub num_threads: usize,
    /// Run work units on the pool; when false everything runs on the caller's thread.
    pub parallel: bool,
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            parallel: true,
        }
    }
}

impl ThreadingConfig {
    /// Create a new threading configuration with custom thread count.
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Default::default()
        }
    }

    /// Configuration that never leaves the calling thread.
    pub fn single_threaded() -> Self {
        Self {
            num_threads: 1,
            parallel: false,
        }
    }

    /// Get the effective number of threads.
    pub fn effective_threads(&self) -> usize {
        if !self.parallel {
            1
        } else if self.num_threads == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        } else {
            self.num_threads
        }
    }

    /// Build the pool described by this configuration, or `None` when
    /// parallelism is disabled.
    pub(crate) fn build_pool(&self, name: &'static str) -> Result<Option<ThreadPool>> {
        if !self.parallel {
            return Ok(None);
        }
        let num_threads = self.effective_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(move |idx| format!("{name}-{idx}"))
            .build()
            .map_err(|e| Vp9DspError::ThreadPool(e.to_string()))?;
        tracing::debug!(num_threads, name, "Created worker pool");
        Ok(Some(pool))
    }
}

/// Interpolation engine options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpolationConfig {
    /// Verify that every support window lies inside the reference plane's
    /// extended area before reading it.
    pub bounds_check: bool,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            bounds_check: cfg!(debug_assertions),
        }
    }
}

impl InterpolationConfig {
    /// Configuration with bounds checking forced on.
    pub fn checked() -> Self {
        Self { bounds_check: true }
    }
}
