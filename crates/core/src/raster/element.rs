//! Cell types a layer can hold

use num_traits::Zero;
use std::fmt::Debug;

/// Values burned into a [`Raster`](crate::Raster): `f32` parameter averages,
/// `u32` building counts and `f64` intermediates.
pub trait RasterElement: Copy + Debug + PartialEq + Zero + Send + Sync + 'static {}

macro_rules! impl_raster_element {
    ($($t:ty),*) => {
        $(impl RasterElement for $t {})*
    };
}

impl_raster_element!(u32, f32, f64);
