//! `into_par_iter` that degrades to `into_iter` without the `parallel` feature.
//!
//! Only the fan-out steps that ignore [`ProcessingMode`](naturf_parallel::ProcessingMode)
//! go through here: neighbor resolution from a bare table and footprint
//! rasterization. Everything else is routed through `ParallelStrategy`.

#[cfg(feature = "parallel")]
pub(crate) use rayon::iter::{IntoParallelIterator, ParallelIterator};

#[cfg(not(feature = "parallel"))]
pub(crate) trait IntoParallelIterator: IntoIterator + Sized {
    fn into_par_iter(self) -> Self::IntoIter {
        self.into_iter()
    }
}

#[cfg(not(feature = "parallel"))]
impl<I: IntoIterator> IntoParallelIterator for I {}
