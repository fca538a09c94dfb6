//! Fan-out strategies for per-building work

use crate::CancellationToken;
use naturf_core::{Error, Result};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How per-building stages are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing using the global rayon pool
    Parallel,
    /// Parallel with a dedicated pool of the given size
    ParallelWith(usize),
}

impl Default for ProcessingMode {
    fn default() -> Self {
        if cfg!(feature = "parallel") {
            ProcessingMode::Parallel
        } else {
            ProcessingMode::Sequential
        }
    }
}

/// Strategy for mapping a fallible function over building indices.
pub trait ParallelStrategy {
    /// Map `f` over `range`, preserving order.
    ///
    /// `cancel` is checked before each index; the first error (including
    /// cancellation) aborts the map.
    fn try_par_map<T, F>(
        &self,
        range: std::ops::Range<usize>,
        cancel: &CancellationToken,
        f: F,
    ) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync + Send;
}

impl ParallelStrategy for ProcessingMode {
    fn try_par_map<T, F>(
        &self,
        range: std::ops::Range<usize>,
        cancel: &CancellationToken,
        f: F,
    ) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync + Send,
    {
        let guarded = |i: usize| -> Result<T> {
            cancel.check()?;
            f(i)
        };

        match self {
            ProcessingMode::Sequential => range.map(guarded).collect(),
            #[cfg(feature = "parallel")]
            ProcessingMode::Parallel => range.into_par_iter().map(guarded).collect(),
            #[cfg(feature = "parallel")]
            ProcessingMode::ParallelWith(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(*threads)
                    .build()
                    .map_err(|e| Error::Other(format!("cannot build thread pool: {e}")))?;
                pool.install(|| range.into_par_iter().map(guarded).collect())
            }
            #[cfg(not(feature = "parallel"))]
            ProcessingMode::Parallel | ProcessingMode::ParallelWith(_) => {
                range.map(guarded).collect()
            }
        }
    }
}
